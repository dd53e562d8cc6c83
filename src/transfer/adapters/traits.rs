//! Transfer service trait
//!
//! The external collaborator that actually moves money.

use async_trait::async_trait;

use crate::transfer::errors::{CancellationError, SubmissionError};
use crate::transfer::types::{TransactionId, TransferRequest, TransferResult};

#[async_trait]
pub trait TransferService: Send + Sync {
    /// Execute a transfer.
    ///
    /// Returns:
    /// - Ok: transaction recorded, funds debited and credited
    /// - Err: nothing happened; the message is meant for the user
    async fn submit_transfer(&self, request: &TransferRequest) -> Result<TransferResult, SubmissionError>;

    /// Reverse a transaction inside the service's cancellation window.
    ///
    /// Returns:
    /// - Ok: transaction reversed
    /// - Err(Expired): window already closed server-side
    /// - Err(Other): any other refusal
    async fn cancel_transfer(&self, transaction_id: TransactionId) -> Result<(), CancellationError>;

    /// Get service name for logging
    fn name(&self) -> &str;
}
