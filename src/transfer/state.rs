//! Transfer Confirmation State Machine
//!
//! One explicit state at a time; events drive a pure transition function.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::transfer::errors::{CancellationError, SubmissionError};
use crate::transfer::types::{TransactionId, TransferResult};
use crate::transfer::window::CancellationWindow;

/// Data-free tag of a [`ConfirmationState`]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
    strum_macros::Display, strum_macros::EnumString, strum_macros::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Idle,
    Pending,
    Failed,
    Completed,
    CancelWindowExpired,
    Cancelling,
    Cancelled,
    CancelRejected,
}

impl Phase {
    /// Check if this is a terminal phase (no further transitions except reset)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::Failed | Phase::CancelWindowExpired | Phase::Cancelled | Phase::CancelRejected
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationState {
    /// Nothing submitted yet
    Idle,
    /// Submission in flight
    Pending,
    /// Submission refused; no transaction exists
    Failed { error: SubmissionError },
    /// Transaction exists, cancellation window open
    Completed {
        result: TransferResult,
        window: CancellationWindow,
    },
    /// Countdown ran out; the transaction stands
    CancelWindowExpired { result: TransferResult },
    /// Cancellation call in flight; the window is closed for good
    Cancelling {
        result: TransferResult,
        window: CancellationWindow,
    },
    /// Backend reversed the transaction
    Cancelled { result: TransferResult },
    /// Cancellation refused; the transaction stands.
    /// `reason` is set only when the refusal should be shown.
    CancelRejected {
        result: TransferResult,
        reason: Option<String>,
    },
}

impl ConfirmationState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Pending => Phase::Pending,
            Self::Failed { .. } => Phase::Failed,
            Self::Completed { .. } => Phase::Completed,
            Self::CancelWindowExpired { .. } => Phase::CancelWindowExpired,
            Self::Cancelling { .. } => Phase::Cancelling,
            Self::Cancelled { .. } => Phase::Cancelled,
            Self::CancelRejected { .. } => Phase::CancelRejected,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    pub fn result(&self) -> Option<&TransferResult> {
        match self {
            Self::Completed { result, .. }
            | Self::CancelWindowExpired { result }
            | Self::Cancelling { result, .. }
            | Self::Cancelled { result }
            | Self::CancelRejected { result, .. } => Some(result),
            Self::Idle | Self::Pending | Self::Failed { .. } => None,
        }
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.result().map(|r| r.transaction_id)
    }

    /// Seconds left on the cancel countdown, while it is showing
    pub fn remaining(&self) -> Option<u32> {
        match self {
            Self::Completed { window, .. } => Some(window.remaining()),
            _ => None,
        }
    }

    /// Countdown window, while one is attached
    pub fn window(&self) -> Option<&CancellationWindow> {
        match self {
            Self::Completed { window, .. } | Self::Cancelling { window, .. } => Some(window),
            _ => None,
        }
    }

    /// Whether the cancel affordance should be offered
    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::Completed { window, .. } if window.is_open())
    }

    /// Settled from the user's point of view: the transfer went through and
    /// can no longer be cancelled here. A rejected cancel renders the same
    /// as an expired window.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::CancelWindowExpired { .. } | Self::CancelRejected { .. })
    }

    /// Error text to show, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error.message()),
            Self::CancelRejected { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

/// FSM Events (inputs that trigger state transitions)
#[derive(Debug, Clone)]
pub enum ConfirmationEvent {
    /// Submission issued
    Submit,
    /// Submission accepted; the window opens
    SubmitOk {
        result: TransferResult,
        window: CancellationWindow,
    },
    /// Submission refused
    SubmitFail(SubmissionError),
    /// Countdown timer fired
    Tick(Instant),
    /// User clicked cancel
    CancelRequested,
    /// Cancellation accepted
    CancelOk,
    /// Cancellation refused
    CancelFail(CancellationError),
    /// User chose to start a new transfer
    Reset,
}

/// State transition function
///
/// Given the current state and an event, returns the next state.
/// Invalid transitions return the current state (no change).
pub fn transition(current: ConfirmationState, event: ConfirmationEvent) -> ConfirmationState {
    use ConfirmationEvent::*;
    use ConfirmationState::*;

    match (current, event) {
        // Reset from anywhere
        (_, Reset) => Idle,

        // From Idle
        (Idle, Submit) => Pending,

        // From Pending
        (Pending, SubmitOk { result, window }) => {
            if window.is_open() {
                Completed { result, window }
            } else {
                CancelWindowExpired { result }
            }
        }
        (Pending, SubmitFail(error)) => Failed { error },

        // From Completed
        (Completed { result, mut window }, Tick(now)) => {
            window.tick(now);
            if window.is_open() {
                Completed { result, window }
            } else {
                CancelWindowExpired { result }
            }
        }
        (Completed { result, mut window }, CancelRequested) if window.is_open() => {
            window.close();
            Cancelling { result, window }
        }

        // From Cancelling
        (Cancelling { result, .. }, CancelOk) => Cancelled { result },
        (Cancelling { result, .. }, CancelFail(err)) => CancelRejected {
            result,
            reason: err.user_message().map(str::to_string),
        },

        // Invalid transitions - stay in current state
        (current, _) => current,
    }
}
