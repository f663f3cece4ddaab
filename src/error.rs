//! Crate-level error type
//!
//! Library operations that cross module boundaries (login, settings, pollers)
//! return [`ConsoleError`]. Each variant maps to a stable [`ErrorCode`] used for
//! JSON error bodies and process exit codes.

use crate::api::ApiError;
use crate::auth::Role;
use crate::settings::validation::ValidationErrors;
use crate::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error(transparent)]
    Api(ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    NotAuthenticated(String),

    #[error("This operation requires the {required} role (logged in as {actual})")]
    WrongRole { required: Role, actual: Role },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApiError> for ConsoleError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(errors) => ConsoleError::Validation(errors),
            other => ConsoleError::Api(other),
        }
    }
}

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Transport,
    Http,
    Envelope,
    Decode,
    InvalidRequest,
    Storage,
    Validation,
    NotAuthenticated,
    Forbidden,
    Config,
    Io,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Transport => "transport",
            ErrorCode::Http => "http",
            ErrorCode::Envelope => "envelope",
            ErrorCode::Decode => "decode",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::Storage => "storage",
            ErrorCode::Validation => "validation",
            ErrorCode::NotAuthenticated => "not_authenticated",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::Config => "config",
            ErrorCode::Io => "io",
        }
    }

    pub fn of_api(err: &ApiError) -> Self {
        match err {
            ApiError::Transport { .. } => ErrorCode::Transport,
            ApiError::Http { .. } => ErrorCode::Http,
            ApiError::Envelope(_) => ErrorCode::Envelope,
            ApiError::Decode(_) => ErrorCode::Decode,
            ApiError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            ApiError::Validation(_) => ErrorCode::Validation,
        }
    }

    /// Process exit status for the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCode::Validation | ErrorCode::InvalidRequest | ErrorCode::Config => 2,
            ErrorCode::NotAuthenticated | ErrorCode::Forbidden => 3,
            ErrorCode::Transport => 4,
            _ => 1,
        }
    }
}

impl ConsoleError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConsoleError::Api(e) => ErrorCode::of_api(e),
            ConsoleError::Storage(_) => ErrorCode::Storage,
            ConsoleError::Validation(_) => ErrorCode::Validation,
            ConsoleError::NotAuthenticated(_) => ErrorCode::NotAuthenticated,
            ConsoleError::WrongRole { .. } => ErrorCode::Forbidden,
            ConsoleError::Config(_) => ErrorCode::Config,
            ConsoleError::Io(_) => ErrorCode::Io,
        }
    }

    /// JSON error body: `{"error": ..., "code": ...}` plus per-field errors
    /// for validation failures.
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code().as_str(),
        });
        if let ConsoleError::Validation(errors) = self {
            body["fields"] = serde_json::to_value(errors.fields()).unwrap_or_default();
        }
        if let ConsoleError::Api(ApiError::Http { status, .. }) = self {
            body["status"] = serde_json::json!(status);
        }
        body
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
