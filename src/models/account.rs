use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::serde_utils::{decimal_as_number, flexible_datetime};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub account_number: String,
    #[serde(with = "decimal_as_number")]
    pub balance: Decimal,
    pub is_main: bool,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(with = "flexible_datetime")]
    pub created_at: NaiveDateTime,
}

impl Account {
    /// "Compte principal" / "Compte secondaire", as the web UI labels them
    pub fn label(&self) -> &'static str {
        if self.is_main {
            "Compte principal"
        } else {
            "Compte secondaire"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountOwner {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
}

impl AccountOwner {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Account as embedded in a transfer response.
///
/// The destination side is returned without a balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: u64,
    pub account_number: String,
    #[serde(default, with = "optional_decimal", skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub user: Option<AccountOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: u64,
    pub name: String,
    pub account_number: String,
    pub user_id: u64,
    #[serde(with = "flexible_datetime")]
    pub added_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccountRequest {
    pub account_name: String,
    pub account_type: String,
}

impl NewAccountRequest {
    pub const DEFAULT_TYPE: &'static str = "Compte courant";

    pub fn new(account_name: Option<&str>, account_type: Option<&str>) -> Self {
        Self {
            account_name: account_name.unwrap_or_default().to_string(),
            account_type: account_type.unwrap_or(Self::DEFAULT_TYPE).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseAccountRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeneficiaryRequest {
    pub name: String,
    pub account_number: String,
}

mod optional_decimal {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => super::decimal_as_number::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super::decimal_as_number")] Decimal);

        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_json() {
        let json = r#"{
            "id": 7,
            "account_number": "FR00000007",
            "balance": 1520.35,
            "is_main": true,
            "is_closed": false,
            "created_at": "2025-01-02T10:00:00"
        }"#;

        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.id, 7);
        assert_eq!(account.balance.to_string(), "1520.35");
        assert_eq!(account.label(), "Compte principal");
    }

    #[test]
    fn test_destination_snapshot_without_balance() {
        let json = r#"{
            "id": 9,
            "account_number": "FR12345678",
            "user": {"id": 3, "first_name": "Ada", "last_name": "Lovelace"}
        }"#;

        let snapshot: AccountSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.balance.is_none());
        assert_eq!(snapshot.user.unwrap().full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_new_account_defaults() {
        let req = NewAccountRequest::new(None, None);
        assert_eq!(req.account_name, "");
        assert_eq!(req.account_type, "Compte courant");
    }
}
