//! Core types for the transfer confirmation flow

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{AccountSnapshot, TransferResponse};

/// Transaction identifier assigned by the transfer service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    NonPositiveAmount,
    /// More than two decimal places (cents)
    TooPrecise(u32),
    MissingDestination,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Le montant doit être positif"),
            Self::TooPrecise(scale) => write!(f, "Montant invalide: {} décimales, 2 maximum", scale),
            Self::MissingDestination => write!(f, "Veuillez sélectionner un compte à créditer"),
        }
    }
}

impl std::error::Error for RequestError {}

/// A validated transfer order.
///
/// Fields are private: once built the request cannot be altered, only
/// submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    source_account_id: u64,
    destination_account_number: String,
    amount: Decimal,
    description: Option<String>,
}

impl TransferRequest {
    pub const MAX_SCALE: u32 = 2;

    pub fn new(
        source_account_id: u64,
        destination_account_number: impl Into<String>,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<Self, RequestError> {
        let destination_account_number = destination_account_number.into().trim().to_string();
        if destination_account_number.is_empty() {
            return Err(RequestError::MissingDestination);
        }
        if amount <= Decimal::ZERO {
            return Err(RequestError::NonPositiveAmount);
        }
        let amount = amount.normalize();
        if amount.scale() > Self::MAX_SCALE {
            return Err(RequestError::TooPrecise(amount.scale()));
        }
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            source_account_id,
            destination_account_number,
            amount,
            description,
        })
    }

    pub fn source_account_id(&self) -> u64 {
        self.source_account_id
    }

    pub fn destination_account_number(&self) -> &str {
        &self.destination_account_number
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    pub transaction_id: TransactionId,
    pub source_account: AccountSnapshot,
    pub destination_account: AccountSnapshot,
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub message: String,
}

impl From<TransferResponse> for TransferResult {
    fn from(resp: TransferResponse) -> Self {
        let description = Some(resp.transaction.description.trim().to_string()).filter(|d| !d.is_empty());
        Self {
            transaction_id: TransactionId::new(resp.transaction.id),
            source_account: resp.source_account,
            destination_account: resp.destination_account,
            amount: resp.transaction.amount,
            description,
            created_at: resp.transaction.created_at,
            message: resp.message,
        }
    }
}
