//! Client error types

use reqwest::StatusCode;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflicting state on the service side
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// The envelope carried a non-zero error code
    #[error("Service rejected request: {0}")]
    Rejected(#[from] AppError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Map a non-success HTTP status and its body text to an error
    pub fn from_status(status: StatusCode, text: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden(text),
            StatusCode::NOT_FOUND => Self::NotFound(text),
            StatusCode::CONFLICT => Self::Conflict(text),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::Validation(text),
            _ => Self::Internal(text),
        }
    }

    /// Whether the service could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// The unified error code closest to this failure
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Http(_) | Self::Internal(_) => ErrorCode::ServiceUnavailable,
            Self::InvalidResponse(_) | Self::Serialization(_) => ErrorCode::InvalidResponse,
            Self::Rejected(e) => e.code,
            Self::Unauthorized
            | Self::Forbidden(_)
            | Self::NotFound(_)
            | Self::Conflict(_)
            | Self::Validation(_) => ErrorCode::ServiceRejected,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
