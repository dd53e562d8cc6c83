//! Transfer service backed by the FINVO HTTP API

use async_trait::async_trait;

use super::traits::TransferService;
use crate::api::FinvoClient;
use crate::transfer::errors::{classify_cancel_rejection, CancellationError, SubmissionError};
use crate::transfer::types::{TransactionId, TransferRequest, TransferResult};

pub struct HttpTransferService {
    client: FinvoClient,
}

impl HttpTransferService {
    pub fn new(client: FinvoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransferService for HttpTransferService {
    async fn submit_transfer(&self, request: &TransferRequest) -> Result<TransferResult, SubmissionError> {
        let resp = self.client.transfer(request).await.map_err(|e| {
            log::warn!(
                "[{}] transfer rejected ({}, status {}): {}",
                self.name(),
                e.error_code(),
                e.status().map_or_else(|| "-".to_string(), |s| s.to_string()),
                e
            );
            SubmissionError::from(e)
        })?;
        Ok(TransferResult::from(resp))
    }

    async fn cancel_transfer(&self, transaction_id: TransactionId) -> Result<(), CancellationError> {
        self.client.cancel_transaction(transaction_id).await.map_err(|e| {
            let classified = classify_cancel_rejection(&e);
            log::warn!(
                "[{}] cancel of {} rejected ({}, status {}): {} -> expired={}",
                self.name(),
                transaction_id,
                e.error_code(),
                e.status().map_or_else(|| "-".to_string(), |s| s.to_string()),
                e,
                classified.is_expired()
            );
            classified
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
