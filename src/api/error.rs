//! Gateway API errors
//!
//! Every failure of the dispatcher ends up as one of these variants, each
//! carrying a message fit to show an operator.

use crate::settings::validation::ValidationErrors;
use thiserror::Error;

/// Errors produced while talking to the gateway API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never completed (offline, DNS, TLS, connection refused).
    ///
    /// `message` is the translated connectivity text; `cause` keeps the raw
    /// transport error for logs.
    #[error("{message}")]
    Transport { message: String, cause: String },

    /// Non-success HTTP status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// 2xx response whose envelope reported `success: false`.
    #[error("{0}")]
    Envelope(String),

    /// The payload did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built (bad base URL, header value, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The payload failed client-side validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl ApiError {
    /// HTTP status when the server answered with an error status.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for connectivity failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }

    /// True when the API rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ApiError::Http { status, message } => {
                *status == 401 || message.to_lowercase().contains("unauthorized")
            }
            ApiError::Envelope(message) => message.to_lowercase().contains("unauthorized"),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_hides_cause() {
        let err = ApiError::Transport {
            message: "connection error".to_string(),
            cause: "tcp connect error: Connection refused (os error 111)".to_string(),
        };
        assert_eq!(err.to_string(), "connection error");
        assert!(err.is_transport());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = ApiError::Http {
            status: 401,
            message: "nope".to_string(),
        };
        assert!(err.is_unauthorized());

        let err = ApiError::Envelope("Unauthorized".to_string());
        assert!(err.is_unauthorized());

        let err = ApiError::Http {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_unauthorized());
    }
}
