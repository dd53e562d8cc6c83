//! Transfer receipt derived from a settled transfer

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::transfer::types::{TransactionId, TransferResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub transaction_id: TransactionId,
    pub issued_at: NaiveDateTime,
    pub source_account_number: String,
    pub destination_account_number: String,
    /// Owner of the credited account, when the service disclosed it
    pub beneficiary_name: Option<String>,
    pub description: Option<String>,
    pub amount: Decimal,
}

/// `1234.5` -> `1234.50 €`
pub fn format_euros(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    format!("{} €", rounded)
}

impl Receipt {
    pub fn from_result(result: &TransferResult, issued_at: NaiveDateTime) -> Self {
        Self {
            transaction_id: result.transaction_id,
            issued_at,
            source_account_number: result.source_account.account_number.clone(),
            destination_account_number: result.destination_account.account_number.clone(),
            beneficiary_name: result.destination_account.user.as_ref().map(|u| u.full_name()),
            description: result.description.clone(),
            amount: result.amount,
        }
    }

    /// `recu-virement-{id}-{dd-mm-yyyy}.txt`
    pub fn file_name(&self) -> String {
        format!(
            "recu-virement-{}-{}.txt",
            self.transaction_id,
            self.issued_at.format("%d-%m-%Y")
        )
    }

    pub fn render_text(&self) -> String {
        let mut lines = vec![
            "FINVO".to_string(),
            "Reçu de virement".to_string(),
            String::new(),
            format!("Date d'émission: {}", self.issued_at.format("%d/%m/%Y à %H:%M:%S")),
            format!("Numéro de transaction: #{}", self.transaction_id),
            String::new(),
            "VIREMENT EFFECTUÉ".to_string(),
            String::new(),
            format!("Compte débité:   {}", self.source_account_number),
            format!("Compte crédité:  {}", self.destination_account_number),
        ];
        if let Some(name) = &self.beneficiary_name {
            lines.push(format!("Bénéficiaire:    {}", name));
        }
        if let Some(description) = &self.description {
            lines.push(format!("Libellé:         {}", description));
        }
        lines.extend([
            String::new(),
            format!("Montant transféré: {}", format_euros(self.amount)),
            String::new(),
            "Ce document certifie l'exécution du virement bancaire.".to_string(),
            "Conservez ce reçu pour vos archives.".to_string(),
        ]);
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountOwner, AccountSnapshot};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn result(with_owner: bool) -> TransferResult {
        TransferResult {
            transaction_id: TransactionId::new(555),
            source_account: AccountSnapshot {
                id: 1,
                account_number: "FR00000001".to_string(),
                balance: Some(Decimal::from(900)),
                user: None,
            },
            destination_account: AccountSnapshot {
                id: 2,
                account_number: "FR12345678".to_string(),
                balance: None,
                user: with_owner.then(|| AccountOwner {
                    id: 4,
                    first_name: "Marie".to_string(),
                    last_name: "Curie".to_string(),
                }),
            },
            amount: Decimal::from_str("100.5").unwrap(),
            description: Some("rent".to_string()),
            created_at: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            message: String::new(),
        }
    }

    fn issued() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(9, 15, 0).unwrap()
    }

    #[test]
    fn test_format_euros() {
        assert_eq!(format_euros(Decimal::from(100)), "100.00 €");
        assert_eq!(format_euros(Decimal::from_str("0.5").unwrap()), "0.50 €");
        assert_eq!(format_euros(Decimal::from_str("12.345").unwrap()), "12.34 €");
    }

    #[test]
    fn test_receipt_fields() {
        let receipt = Receipt::from_result(&result(true), issued());

        assert_eq!(receipt.beneficiary_name.as_deref(), Some("Marie Curie"));
        assert_eq!(receipt.file_name(), "recu-virement-555-01-06-2025.txt");

        let text = receipt.render_text();
        assert!(text.contains("Numéro de transaction: #555"));
        assert!(text.contains("Compte crédité:  FR12345678"));
        assert!(text.contains("Bénéficiaire:    Marie Curie"));
        assert!(text.contains("Libellé:         rent"));
        assert!(text.contains("100.50 €"));
    }

    #[test]
    fn test_receipt_without_owner() {
        let receipt = Receipt::from_result(&result(false), issued());
        assert!(receipt.beneficiary_name.is_none());
        assert!(!receipt.render_text().contains("Bénéficiaire"));
    }

    #[test]
    fn test_receipt_line_layout() {
        let text = Receipt::from_result(&result(true), issued()).render_text();
        let lines: Vec<&str> = text.lines().collect();

        assert!(text.ends_with("archives.\n"));
        assert_eq!(lines[0], "FINVO");
        assert_eq!(lines[3], "Date d'émission: 01/06/2025 à 09:15:00");
        assert_eq!(lines[10], "Bénéficiaire:    Marie Curie");
        assert_eq!(lines[11], "Libellé:         rent");
        assert_eq!(lines[13], "Montant transféré: 100.50 €");
    }
}
