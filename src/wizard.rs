//! Steps 1 and 2 of the transfer wizard
//!
//! Step 1 picks internal (between the user's own accounts) or external (to a
//! saved beneficiary). Step 2 validates the form and yields the
//! [`TransferRequest`] handed to the confirmation controller in step 3.

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::models::{Account, Beneficiary, BeneficiaryRequest};
use crate::transfer::types::{RequestError, TransferRequest};

/// Per-transfer ceiling enforced client-side (10 000 €)
pub const DAILY_LIMIT: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
    strum_macros::Display, strum_macros::EnumString, strum_macros::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransferKind {
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardError {
    WrongStep,
    NoSourceAccount,
    UnknownAccount(u64),
    AccountClosed(String),
    MissingDestination,
    SameAccount,
    DestinationNotOwned(String),
    NoBeneficiary,
    UnknownBeneficiary(u64),
    AmountRequired,
    InvalidAmount(String),
    NonPositiveAmount,
    InsufficientBalance { available: Decimal },
    DailyLimitExceeded,
    BeneficiaryNameRequired,
    InvalidAccountNumber(String),
    Request(RequestError),
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongStep => write!(f, "Étape du virement invalide"),
            Self::NoSourceAccount => write!(f, "Veuillez sélectionner un compte à débiter"),
            Self::UnknownAccount(id) => write!(f, "Compte {} introuvable", id),
            Self::AccountClosed(number) => write!(f, "Le compte {} est clôturé", number),
            Self::MissingDestination => write!(f, "Veuillez sélectionner un compte à créditer"),
            Self::SameAccount => write!(f, "Le compte crédité doit être différent du compte débité"),
            Self::DestinationNotOwned(number) => {
                write!(f, "Le compte {} ne fait pas partie de vos comptes", number)
            }
            Self::NoBeneficiary => write!(f, "Veuillez sélectionner un bénéficiaire"),
            Self::UnknownBeneficiary(id) => write!(f, "Bénéficiaire {} introuvable", id),
            Self::AmountRequired => write!(f, "Le montant est requis"),
            Self::InvalidAmount(raw) => write!(f, "Montant invalide: {}", raw),
            Self::NonPositiveAmount => write!(f, "Le montant doit être positif"),
            Self::InsufficientBalance { available } => {
                write!(f, "Solde insuffisant (disponible: {} €)", available)
            }
            Self::DailyLimitExceeded => write!(f, "Limite journalière dépassée (10 000€)"),
            Self::BeneficiaryNameRequired => write!(f, "Le nom est requis"),
            Self::InvalidAccountNumber(_) => write!(f, "Format invalide (ex: FR12345678)"),
            Self::Request(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for WizardError {}

impl From<RequestError> for WizardError {
    fn from(err: RequestError) -> Self {
        WizardError::Request(err)
    }
}

/// Step 2 form, internal transfer
#[derive(Debug, Clone, Default)]
pub struct InternalTransferForm {
    pub source_account_id: Option<u64>,
    pub destination_account_number: String,
    pub amount: String,
    pub description: String,
}

/// Step 2 form, transfer to a beneficiary
#[derive(Debug, Clone, Default)]
pub struct ExternalTransferForm {
    pub source_account_id: Option<u64>,
    pub beneficiary_id: Option<u64>,
    pub amount: String,
    pub description: String,
}

/// Accepts `12.5`, `12,50` and surrounding blanks
pub fn parse_amount(raw: &str) -> Result<Decimal, WizardError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WizardError::AmountRequired);
    }
    Decimal::from_str(&trimmed.replace(',', "."))
        .map_err(|_| WizardError::InvalidAmount(trimmed.to_string()))
}

/// Accounts that can take part in a transfer
pub fn open_accounts(accounts: &[Account]) -> impl Iterator<Item = &Account> {
    accounts.iter().filter(|a| !a.is_closed)
}

fn source_account(accounts: &[Account], source_account_id: Option<u64>) -> Result<&Account, WizardError> {
    let id = source_account_id.ok_or(WizardError::NoSourceAccount)?;
    let account = accounts
        .iter()
        .find(|a| a.id == id)
        .ok_or(WizardError::UnknownAccount(id))?;
    if account.is_closed {
        return Err(WizardError::AccountClosed(account.account_number.clone()));
    }
    Ok(account)
}

fn check_amount(amount: Decimal, source: &Account) -> Result<(), WizardError> {
    if amount <= Decimal::ZERO {
        return Err(WizardError::NonPositiveAmount);
    }
    if amount > source.balance {
        return Err(WizardError::InsufficientBalance {
            available: source.balance,
        });
    }
    if amount > DAILY_LIMIT {
        return Err(WizardError::DailyLimitExceeded);
    }
    Ok(())
}

fn non_empty(description: &str) -> Option<String> {
    Some(description.trim().to_string()).filter(|d| !d.is_empty())
}

pub fn validate_internal(form: &InternalTransferForm, accounts: &[Account]) -> Result<TransferRequest, WizardError> {
    let source = source_account(accounts, form.source_account_id)?;

    let destination_number = form.destination_account_number.trim();
    if destination_number.is_empty() {
        return Err(WizardError::MissingDestination);
    }
    if destination_number == source.account_number {
        return Err(WizardError::SameAccount);
    }
    let destination = open_accounts(accounts)
        .find(|a| a.account_number == destination_number)
        .ok_or_else(|| WizardError::DestinationNotOwned(destination_number.to_string()))?;

    let amount = parse_amount(&form.amount)?;
    check_amount(amount, source)?;

    Ok(TransferRequest::new(
        source.id,
        destination.account_number.clone(),
        amount,
        non_empty(&form.description),
    )?)
}

pub fn validate_external(
    form: &ExternalTransferForm,
    accounts: &[Account],
    beneficiaries: &[Beneficiary],
) -> Result<TransferRequest, WizardError> {
    let beneficiary_id = form.beneficiary_id.ok_or(WizardError::NoBeneficiary)?;
    let beneficiary = beneficiaries
        .iter()
        .find(|b| b.id == beneficiary_id)
        .ok_or(WizardError::UnknownBeneficiary(beneficiary_id))?;

    let source = source_account(accounts, form.source_account_id)?;
    if beneficiary.account_number == source.account_number {
        return Err(WizardError::SameAccount);
    }

    let amount = parse_amount(&form.amount)?;
    check_amount(amount, source)?;

    Ok(TransferRequest::new(
        source.id,
        beneficiary.account_number.clone(),
        amount,
        non_empty(&form.description),
    )?)
}

/// Case-insensitive match on name or account number
pub fn search_beneficiaries<'a>(beneficiaries: &'a [Beneficiary], term: &str) -> Vec<&'a Beneficiary> {
    let term = term.trim().to_lowercase();
    beneficiaries
        .iter()
        .filter(|b| {
            term.is_empty()
                || b.name.to_lowercase().contains(&term)
                || b.account_number.to_lowercase().contains(&term)
        })
        .collect()
}

fn account_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^FR\d{8}$").expect("account number regex"))
}

pub fn is_valid_account_number(number: &str) -> bool {
    account_number_re().is_match(number)
}

pub fn validate_new_beneficiary(name: &str, account_number: &str) -> Result<BeneficiaryRequest, WizardError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WizardError::BeneficiaryNameRequired);
    }
    let account_number = account_number.trim();
    if !is_valid_account_number(account_number) {
        return Err(WizardError::InvalidAccountNumber(account_number.to_string()));
    }
    Ok(BeneficiaryRequest {
        name: name.to_string(),
        account_number: account_number.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardStep {
    ChooseKind,
    Details { kind: TransferKind },
    Confirm { kind: TransferKind, request: TransferRequest },
}

/// Host-side wizard: which step is showing and what it produced
#[derive(Debug, Clone)]
pub struct Wizard {
    step: WizardStep,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::ChooseKind,
        }
    }

    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    /// 1, 2 or 3, as shown in the progress header
    pub fn step_number(&self) -> u8 {
        match self.step {
            WizardStep::ChooseKind => 1,
            WizardStep::Details { .. } => 2,
            WizardStep::Confirm { .. } => 3,
        }
    }

    pub fn choose_kind(&mut self, kind: TransferKind) -> Result<(), WizardError> {
        match self.step {
            WizardStep::ChooseKind => {
                self.step = WizardStep::Details { kind };
                Ok(())
            }
            _ => Err(WizardError::WrongStep),
        }
    }

    /// Step 2 back to step 1. The confirmation step has no way back.
    pub fn back(&mut self) {
        if let WizardStep::Details { .. } = self.step {
            self.step = WizardStep::ChooseKind;
        }
    }

    pub fn submit_internal(&mut self, form: &InternalTransferForm, accounts: &[Account]) -> Result<&TransferRequest, WizardError> {
        if self.step != (WizardStep::Details { kind: TransferKind::Internal }) {
            return Err(WizardError::WrongStep);
        }
        let request = validate_internal(form, accounts)?;
        Ok(self.confirm(TransferKind::Internal, request))
    }

    pub fn submit_external(
        &mut self,
        form: &ExternalTransferForm,
        accounts: &[Account],
        beneficiaries: &[Beneficiary],
    ) -> Result<&TransferRequest, WizardError> {
        if self.step != (WizardStep::Details { kind: TransferKind::External }) {
            return Err(WizardError::WrongStep);
        }
        let request = validate_external(form, accounts, beneficiaries)?;
        Ok(self.confirm(TransferKind::External, request))
    }

    fn confirm(&mut self, kind: TransferKind, request: TransferRequest) -> &TransferRequest {
        self.step = WizardStep::Confirm { kind, request };
        match &self.step {
            WizardStep::Confirm { request, .. } => request,
            _ => unreachable!("step was just set to Confirm"),
        }
    }

    /// Request produced by step 2, once in step 3
    pub fn request(&self) -> Option<&TransferRequest> {
        match &self.step {
            WizardStep::Confirm { request, .. } => Some(request),
            _ => None,
        }
    }

    /// "Nouveau virement" / "Réessayer": back to step 1
    pub fn restart(&mut self) {
        self.step = WizardStep::ChooseKind;
    }
}
