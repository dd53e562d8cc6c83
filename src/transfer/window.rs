//! Client-side cancellation window
//!
//! Advisory only: the transfer service enforces its own deadline.

use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_WINDOW_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationWindow {
    deadline: Instant,
    remaining: u32,
    open: bool,
}

impl CancellationWindow {
    pub fn open(now: Instant, secs: u32) -> Self {
        Self {
            deadline: now + Duration::from_secs(u64::from(secs)),
            remaining: secs,
            open: secs > 0,
        }
    }

    /// Whole seconds left, rounded up. Never negative.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Recompute `remaining` from the deadline. Closes the window at 0.
    ///
    /// `remaining` only ever decreases, even if `now` goes backwards.
    pub fn tick(&mut self, now: Instant) {
        if !self.open {
            return;
        }
        let left = self.deadline.saturating_duration_since(now);
        let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
        let secs = u32::try_from(secs).unwrap_or(u32::MAX);
        self.remaining = self.remaining.min(secs);
        if self.remaining == 0 {
            self.open = false;
        }
    }

    /// Closing is permanent
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Elapsed share of the window in percent, for progress display
    pub fn progress_percent(&self, total_secs: u32) -> u8 {
        if total_secs == 0 {
            return 100;
        }
        let elapsed = u64::from(total_secs.saturating_sub(self.remaining));
        (elapsed * 100 / u64::from(total_secs)).min(100) as u8
    }
}
