use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::account::AccountSnapshot;
use crate::models::serde_utils::{decimal_as_number, flexible_datetime};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    #[serde(with = "decimal_as_number")]
    pub amount: Decimal,
    pub transaction_type: String,
    pub source_account_id: Option<u64>,
    pub destination_account_id: Option<u64>,
    #[serde(with = "flexible_datetime")]
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub is_confirmed: bool,
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    pub fn touches_account(&self, account_id: u64) -> bool {
        self.source_account_id == Some(account_id) || self.destination_account_id == Some(account_id)
    }
}

/// Response body of `POST /accounts/{id}/transfer/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResponse {
    #[serde(default)]
    pub message: String,
    pub source_account: AccountSnapshot,
    pub destination_account: AccountSnapshot,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferBody {
    pub destination_account_number: String,
    #[serde(with = "decimal_as_number")]
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardAccount {
    pub id: u64,
    pub account_number: String,
    #[serde(with = "decimal_as_number")]
    pub balance: Decimal,
    pub is_main: bool,
}

/// Transaction as classified by the dashboard endpoint, relative to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(default)]
    pub is_income: bool,
    #[serde(default)]
    pub is_expense: bool,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(with = "decimal_as_number")]
    pub total_balance: Decimal,
    pub accounts: Vec<DashboardAccount>,
    pub transactions: Vec<DashboardTransaction>,
}
