//! Mock transfer service for testing
//!
//! Allows setting expected results and a simulated latency for each call.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::traits::TransferService;
use crate::models::AccountSnapshot;
use crate::transfer::errors::{CancellationError, SubmissionError};
use crate::transfer::types::{TransactionId, TransferRequest, TransferResult};

/// Mock service for testing
pub struct MockTransferService {
    name: String,
    /// `None` means: succeed with a result echoing the request
    submit_error: Mutex<Option<SubmissionError>>,
    cancel_result: Mutex<Result<(), CancellationError>>,
    latency: Mutex<Duration>,
    next_transaction_id: AtomicU64,
    submit_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    last_request: Mutex<Option<TransferRequest>>,
}

impl MockTransferService {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            submit_error: Mutex::new(None),
            cancel_result: Mutex::new(Ok(())),
            latency: Mutex::new(Duration::ZERO),
            next_transaction_id: AtomicU64::new(1),
            submit_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Make every submission fail with `error`
    pub fn set_submit_error(&self, error: SubmissionError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    pub fn set_cancel_result(&self, result: Result<(), CancellationError>) {
        *self.cancel_result.lock().unwrap() = result;
    }

    /// Simulated round-trip time for both calls
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn set_next_transaction_id(&self, id: u64) {
        self.next_transaction_id.store(id, Ordering::SeqCst);
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<TransferRequest> {
        self.last_request.lock().unwrap().clone()
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn echo_result(&self, request: &TransferRequest) -> TransferResult {
        let id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst);
        TransferResult {
            transaction_id: TransactionId::new(id),
            source_account: AccountSnapshot {
                id: request.source_account_id(),
                account_number: format!("FR{:08}", request.source_account_id()),
                balance: None,
                user: None,
            },
            destination_account: AccountSnapshot {
                id: 0,
                account_number: request.destination_account_number().to_string(),
                balance: None,
                user: None,
            },
            amount: request.amount(),
            description: request.description().map(str::to_string),
            created_at: chrono::Utc::now().naive_utc(),
            message: "Virement effectué".to_string(),
        }
    }
}

#[async_trait]
impl TransferService for MockTransferService {
    async fn submit_transfer(&self, request: &TransferRequest) -> Result<TransferResult, SubmissionError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        log::debug!(
            "[{}] submit_transfer(source={}, dest={}, amount={})",
            self.name,
            request.source_account_id(),
            request.destination_account_number(),
            request.amount()
        );

        self.simulate_latency().await;

        let error = self.submit_error.lock().unwrap().clone();
        match error {
            Some(e) => Err(e),
            None => Ok(self.echo_result(request)),
        }
    }

    async fn cancel_transfer(&self, transaction_id: TransactionId) -> Result<(), CancellationError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        log::debug!("[{}] cancel_transfer({})", self.name, transaction_id);

        self.simulate_latency().await;

        self.cancel_result.lock().unwrap().clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
