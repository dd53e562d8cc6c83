//! Registration and password-change checks done before calling the API

use std::fmt;

use crate::models::{ChangeEmailRequest, ChangePasswordRequest, RegisterRequest};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    NameRequired,
    EmailRequired,
    PasswordMismatch,
    TooShort,
    MissingDigit,
    MissingSpecialChar,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NameRequired => "Le prénom et le nom sont requis",
            Self::EmailRequired => "L'email est requis",
            Self::PasswordMismatch => "Les mots de passe ne correspondent pas !",
            Self::TooShort => "Le mot de passe doit contenir au moins 8 caractères",
            Self::MissingDigit => "Le mot de passe doit contenir au moins 1 chiffre",
            Self::MissingSpecialChar => {
                "Le mot de passe doit contenir au moins 1 caractère spécial (!@#$%^&*(), etc.)"
            }
        };
        f.write_str(msg)
    }
}

impl std::error::Error for CredentialError {}

/// First failing rule, checked in order: length, digit, special char
pub fn check_password(password: &str) -> Result<(), CredentialError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(CredentialError::MissingDigit);
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(CredentialError::MissingSpecialChar);
    }
    Ok(())
}

/// Every failing rule, for forms that list them all
pub fn password_problems(password: &str) -> Vec<CredentialError> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(CredentialError::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push(CredentialError::MissingDigit);
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        problems.push(CredentialError::MissingSpecialChar);
    }
    problems
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest, CredentialError> {
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(CredentialError::NameRequired);
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(CredentialError::EmailRequired);
        }
        if self.password != self.confirm_password {
            return Err(CredentialError::PasswordMismatch);
        }
        check_password(&self.password)?;

        Ok(RegisterRequest {
            email: email.to_string(),
            password: self.password.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
    }
}

pub fn validate_password_change(
    current_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<ChangePasswordRequest, CredentialError> {
    if new_password != confirm_password {
        return Err(CredentialError::PasswordMismatch);
    }
    check_password(new_password)?;
    Ok(ChangePasswordRequest {
        current_password: current_password.to_string(),
        new_password: new_password.to_string(),
    })
}

pub fn validate_email_change(new_email: &str) -> Result<ChangeEmailRequest, CredentialError> {
    let new_email = new_email.trim();
    if new_email.is_empty() {
        return Err(CredentialError::EmailRequired);
    }
    Ok(ChangeEmailRequest {
        new_email: new_email.to_string(),
    })
}
