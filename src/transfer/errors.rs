// Error taxonomy for transfer submission and cancellation
use std::fmt;

use crate::api::ApiError;

/// Structured code for a cancellation refused because the window closed
pub const CANCEL_WINDOW_EXPIRED: &str = "CANCEL_WINDOW_EXPIRED";

/// Fragments of the legacy French "too late" message, for servers that
/// send no code.
const LEGACY_EXPIRED_MARKERS: [&str; 2] = ["délai", "5 secondes"];

/// Submission failed; no transaction exists
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionError {
    /// Service refused the transfer (validation, business rule)
    Rejected { status: u16, message: String },
    /// Service could not be reached or answered garbage
    Unavailable(String),
}

impl SubmissionError {
    /// Text shown to the user, verbatim from the service when it sent one
    pub fn message(&self) -> &str {
        match self {
            Self::Rejected { message, .. } => message,
            Self::Unavailable(message) => message,
        }
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SubmissionError {}

impl From<ApiError> for SubmissionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { status, detail, .. } => Self::Rejected { status, message: detail },
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Cancellation failed; the transaction stands
#[derive(Debug, Clone, PartialEq)]
pub enum CancellationError {
    /// Server-side window already closed. Not shown to the user.
    Expired,
    /// Any other refusal or transport failure. Shown to the user.
    Other(String),
}

impl CancellationError {
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Message to surface, `None` when the failure is silent
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Expired => None,
            Self::Other(message) => Some(message),
        }
    }
}

impl fmt::Display for CancellationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "Cancellation window expired"),
            Self::Other(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CancellationError {}

/// Translate a cancel-endpoint failure into a [`CancellationError`].
///
/// Order: structured code, then the legacy message-text match. Any other
/// refusal, whatever its status, is surfaced. Nothing else in the crate
/// inspects message text.
pub fn classify_cancel_rejection(err: &ApiError) -> CancellationError {
    match err {
        ApiError::Rejected { code: Some(code), detail, .. } => {
            if code == CANCEL_WINDOW_EXPIRED {
                CancellationError::Expired
            } else {
                CancellationError::Other(detail.clone())
            }
        }
        ApiError::Rejected { detail, .. } if is_legacy_expired_message(detail) => CancellationError::Expired,
        other => CancellationError::Other(other.to_string()),
    }
}

fn is_legacy_expired_message(detail: &str) -> bool {
    LEGACY_EXPIRED_MARKERS.iter().any(|marker| detail.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16, detail: &str, code: Option<&str>) -> ApiError {
        ApiError::Rejected {
            status,
            detail: detail.to_string(),
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_structured_code_expired() {
        let err = rejected(400, "whatever", Some(CANCEL_WINDOW_EXPIRED));
        assert_eq!(classify_cancel_rejection(&err), CancellationError::Expired);
    }

    #[test]
    fn test_other_code_is_surfaced_even_with_legacy_text() {
        let err = rejected(400, "délai de traitement", Some("ACCOUNT_LOCKED"));
        assert_eq!(
            classify_cancel_rejection(&err),
            CancellationError::Other("délai de traitement".to_string())
        );
    }

    #[test]
    fn test_conflict_status_alone_is_surfaced() {
        let classified = classify_cancel_rejection(&rejected(409, "Transaction déjà annulée", None));
        assert_eq!(classified.user_message(), Some("Transaction déjà annulée"));

        let classified = classify_cancel_rejection(&rejected(410, "Transaction supprimée", None));
        assert!(!classified.is_expired());

        // Status plus legacy text still counts as too late
        let classified = classify_cancel_rejection(&rejected(409, "Le délai d'annulation est dépassé", None));
        assert!(classified.is_expired());
    }

    #[test]
    fn test_legacy_text_markers() {
        let err = rejected(400, "Le délai d'annulation est dépassé", None);
        assert!(classify_cancel_rejection(&err).is_expired());

        let err = rejected(400, "Annulation possible uniquement dans les 5 secondes", None);
        assert!(classify_cancel_rejection(&err).is_expired());
    }

    #[test]
    fn test_unrelated_rejection_surfaced() {
        let err = rejected(404, "Transaction introuvable", None);
        let classified = classify_cancel_rejection(&err);
        assert_eq!(classified.user_message(), Some("Transaction introuvable"));
    }

    #[test]
    fn test_transport_failure_surfaced() {
        let err = ApiError::Transport("connection refused".to_string());
        let classified = classify_cancel_rejection(&err);
        assert!(!classified.is_expired());
        assert_eq!(classified.user_message(), Some("Network error: connection refused"));
    }

    #[test]
    fn test_submission_error_verbatim() {
        let err = SubmissionError::from(rejected(400, "Solde insuffisant", None));
        assert_eq!(err.message(), "Solde insuffisant");
        assert_eq!(err.to_string(), "Solde insuffisant");
    }
}
