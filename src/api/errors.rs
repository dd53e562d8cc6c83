// Errors raised by the FINVO HTTP client
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Endpoint needs a session and none was supplied
    MissingSession,
    /// Request never produced an HTTP response (DNS, connect, timeout)
    Transport(String),
    /// Server answered with a non-2xx status
    Rejected {
        status: u16,
        detail: String,
        code: Option<String>,
    },
    /// 2xx response whose body did not match the expected shape
    Decode(String),
    /// Client could not be built from configuration
    Config(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSession => write!(f, "Not logged in"),
            Self::Transport(msg) => write!(f, "Network error: {}", msg),
            // Surfaced verbatim to the user
            Self::Rejected { detail, .. } => write!(f, "{}", detail),
            Self::Decode(msg) => write!(f, "Unexpected response: {}", msg),
            Self::Config(msg) => write!(f, "Invalid client configuration: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl ApiError {
    pub fn error_code(&self) -> &str {
        match self {
            Self::MissingSession => "MISSING_SESSION",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Rejected { code: Some(code), .. } => code.as_str(),
            Self::Rejected { .. } => "REJECTED",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_displays_detail_verbatim() {
        let err = ApiError::Rejected {
            status: 400,
            detail: "Solde insuffisant".to_string(),
            code: None,
        };
        assert_eq!(err.to_string(), "Solde insuffisant");
        assert_eq!(err.error_code(), "REJECTED");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_structured_code_wins() {
        let err = ApiError::Rejected {
            status: 409,
            detail: "too late".to_string(),
            code: Some("CANCEL_WINDOW_EXPIRED".to_string()),
        };
        assert_eq!(err.error_code(), "CANCEL_WINDOW_EXPIRED");
    }
}
