//! Transfer Confirmation Controller
//!
//! Drives one transfer from submission to a terminal state and gates a
//! single cancellation attempt behind a countdown.
//!
//! Lifecycle rules:
//! - `start` issues exactly one submission per lifecycle
//! - the countdown task exists only while the state is `Completed`
//! - `request_cancel` issues at most one cancellation per lifecycle
//! - `new_transfer` bumps the generation so late ticks and late responses
//!   from the previous lifecycle are dropped

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::configure::AppConfig;
use crate::logging::LogEvent;
use crate::transfer::adapters::TransferService;
use crate::transfer::receipt::Receipt;
use crate::transfer::state::{transition, ConfirmationEvent, ConfirmationState, Phase};
use crate::transfer::types::TransferRequest;
use crate::transfer::window::{CancellationWindow, DEFAULT_WINDOW_SECS};

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Length of the client-side cancellation window
    pub window_secs: u32,
    /// Countdown refresh period
    pub tick_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl From<&AppConfig> for ControllerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            window_secs: config.cancel_window_secs,
            ..Self::default()
        }
    }
}

/// What a cancel click led to
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// Backend reversed the transaction
    Cancelled,
    /// Backend refused; the transaction stands.
    /// `reason` is `None` for a "too late" refusal.
    Rejected { reason: Option<String> },
    /// No open window, or a cancellation was already requested
    Ignored,
}

struct Inner {
    state: ConfirmationState,
    generation: u64,
    submitted: bool,
    cancel_requested: bool,
    ticker: Option<JoinHandle<()>>,
}

struct Shared {
    service: Arc<dyn TransferService>,
    config: ControllerConfig,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ConfirmationState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply an event, stop the countdown if we left `Completed`, publish.
    fn apply(&self, inner: &mut Inner, event: ConfirmationEvent) -> Phase {
        let before = inner.state.phase();
        let current = std::mem::replace(&mut inner.state, ConfirmationState::Idle);
        inner.state = transition(current, event);
        let after = inner.state.phase();

        if after != Phase::Completed {
            if let Some(handle) = inner.ticker.take() {
                handle.abort();
            }
        }
        if before != after {
            log::debug!("Confirmation {} -> {} (generation {})", before, after, inner.generation);
        }

        self.state_tx.send_replace(inner.state.clone());
        after
    }

    /// Returns false once the countdown has nothing left to do
    fn on_tick(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation || inner.state.phase() != Phase::Completed {
            return false;
        }

        let phase = self.apply(&mut inner, ConfirmationEvent::Tick(Instant::now()));
        if phase == Phase::CancelWindowExpired {
            if let Some(id) = inner.state.transaction_id() {
                LogEvent::new("CANCEL_WINDOW_EXPIRED")
                    .field("transaction_id", id.as_u64())
                    .generation(generation)
                    .info();
            }
        }
        phase == Phase::Completed
    }
}

fn spawn_ticker(shared: Arc<Shared>, generation: u64, opened_at: Instant) -> JoinHandle<()> {
    let period = shared.config.tick_interval;
    tokio::spawn(async move {
        let mut ticker = interval_at(opened_at + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !shared.on_tick(generation) {
                break;
            }
        }
    })
}

/// Confirmation step of the transfer wizard
pub struct TransferConfirmation {
    shared: Arc<Shared>,
}

impl TransferConfirmation {
    pub fn new(service: Arc<dyn TransferService>, config: ControllerConfig) -> Self {
        let (state_tx, _) = watch::channel(ConfirmationState::Idle);
        Self {
            shared: Arc::new(Shared {
                service,
                config,
                inner: Mutex::new(Inner {
                    state: ConfirmationState::Idle,
                    generation: 0,
                    submitted: false,
                    cancel_requested: false,
                    ticker: None,
                }),
                state_tx,
            }),
        }
    }

    pub fn state(&self) -> ConfirmationState {
        self.shared.lock().state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().state.phase()
    }

    /// Every state change, countdown ticks included
    pub fn subscribe(&self) -> watch::Receiver<ConfirmationState> {
        self.shared.state_tx.subscribe()
    }

    pub fn window_secs(&self) -> u32 {
        self.shared.config.window_secs
    }

    /// Whether a countdown task is currently owned by the controller
    pub fn is_ticking(&self) -> bool {
        self.shared
            .lock()
            .ticker
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Submit `request` and wait for the service's answer.
    ///
    /// Only the first call of a lifecycle reaches the service; later calls
    /// return the current state untouched.
    pub async fn start(&self, request: TransferRequest) -> ConfirmationState {
        let generation = {
            let mut inner = self.shared.lock();
            if inner.submitted {
                log::debug!("Submission already issued for generation {}", inner.generation);
                return inner.state.clone();
            }
            inner.submitted = true;
            self.shared.apply(&mut inner, ConfirmationEvent::Submit);
            inner.generation
        };

        LogEvent::new("TRANSFER_SUBMITTED")
            .field("service", self.shared.service.name())
            .field("source_account_id", request.source_account_id())
            .field("destination", request.destination_account_number())
            .field("amount", request.amount().to_string())
            .generation(generation)
            .info();

        let outcome = self.shared.service.submit_transfer(&request).await;

        let mut inner = self.shared.lock();
        if inner.generation != generation {
            if let Ok(result) = &outcome {
                log::warn!(
                    "Transfer {} settled after the flow was restarted; not tracking it",
                    result.transaction_id
                );
            }
            return inner.state.clone();
        }

        match outcome {
            Ok(result) => {
                LogEvent::new("TRANSFER_COMPLETED")
                    .field("transaction_id", result.transaction_id.as_u64())
                    .field("amount", result.amount.to_string())
                    .field("window_secs", self.shared.config.window_secs)
                    .generation(generation)
                    .info();

                let opened_at = Instant::now();
                let window = CancellationWindow::open(opened_at, self.shared.config.window_secs);
                let phase = self.shared.apply(&mut inner, ConfirmationEvent::SubmitOk { result, window });
                if phase == Phase::Completed {
                    inner.ticker = Some(spawn_ticker(Arc::clone(&self.shared), generation, opened_at));
                }
            }
            Err(error) => {
                LogEvent::new("TRANSFER_FAILED")
                    .field("message", error.message())
                    .generation(generation)
                    .warn();
                self.shared.apply(&mut inner, ConfirmationEvent::SubmitFail(error));
            }
        }

        inner.state.clone()
    }

    /// Cancel click. Effective once per lifecycle, and only while the
    /// window is open.
    pub async fn request_cancel(&self) -> CancelOutcome {
        let (transaction_id, generation) = {
            let mut inner = self.shared.lock();
            if inner.cancel_requested || !inner.state.can_cancel() {
                return CancelOutcome::Ignored;
            }
            let Some(transaction_id) = inner.state.transaction_id() else {
                return CancelOutcome::Ignored;
            };
            inner.cancel_requested = true;
            self.shared.apply(&mut inner, ConfirmationEvent::CancelRequested);
            (transaction_id, inner.generation)
        };

        LogEvent::new("CANCEL_REQUESTED")
            .field("transaction_id", transaction_id.as_u64())
            .generation(generation)
            .info();

        let outcome = self.shared.service.cancel_transfer(transaction_id).await;

        let mut inner = self.shared.lock();
        if inner.generation != generation {
            log::warn!(
                "Cancellation of {} resolved after the flow was restarted (ok={})",
                transaction_id,
                outcome.is_ok()
            );
            return CancelOutcome::Ignored;
        }

        match outcome {
            Ok(()) => {
                self.shared.apply(&mut inner, ConfirmationEvent::CancelOk);
                LogEvent::new("TRANSFER_CANCELLED")
                    .field("transaction_id", transaction_id.as_u64())
                    .generation(generation)
                    .info();
                CancelOutcome::Cancelled
            }
            Err(err) => {
                let reason = err.user_message().map(str::to_string);
                LogEvent::new("CANCEL_REJECTED")
                    .field("transaction_id", transaction_id.as_u64())
                    .field("expired", err.is_expired())
                    .field("reason", err.to_string())
                    .generation(generation)
                    .warn();
                self.shared.apply(&mut inner, ConfirmationEvent::CancelFail(err));
                CancelOutcome::Rejected { reason }
            }
        }
    }

    /// "New transfer" callback: back to pre-submission state
    pub fn new_transfer(&self) {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        inner.submitted = false;
        inner.cancel_requested = false;
        self.shared.apply(&mut inner, ConfirmationEvent::Reset);
    }

    /// Receipt for the current transfer, unless it was (or is being) cancelled
    pub fn receipt(&self) -> Option<Receipt> {
        let inner = self.shared.lock();
        match &inner.state {
            ConfirmationState::Completed { result, .. }
            | ConfirmationState::CancelWindowExpired { result }
            | ConfirmationState::CancelRejected { result, .. } => {
                Some(Receipt::from_result(result, chrono::Local::now().naive_local()))
            }
            _ => None,
        }
    }
}

impl Drop for TransferConfirmation {
    fn drop(&mut self) {
        if let Some(handle) = self.shared.lock().ticker.take() {
            handle.abort();
        }
    }
}
