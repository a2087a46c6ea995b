//! Error types and API response structures

use super::codes::ErrorCode;
use super::kind::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (balances, ids, context)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// The operation-level kind of this error
    pub fn kind(&self) -> ErrorKind {
        self.code.kind().unwrap_or(ErrorKind::ExternalService)
    }

    // ==================== Convenience constructors ====================

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::Conflict, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

/// Unified API response envelope used by the persistence service
///
/// - `code`: Error code (0 for success)
/// - `message`: Human-readable message
/// - `data`: Response payload (on success)
/// - `details`: Additional error details (on failure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            code: Some(0),
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }

    /// Whether the envelope reports success (absent code counts as success)
    pub fn is_success(&self) -> bool {
        matches!(self.code, None | Some(0))
    }

    /// Convert the envelope into its payload or the error it carries
    pub fn into_result(self) -> Result<Option<T>, AppError> {
        if self.is_success() {
            return Ok(self.data);
        }
        let code = self
            .code
            .and_then(|c| ErrorCode::try_from(c).ok())
            .unwrap_or(ErrorCode::ServiceRejected);
        Err(AppError {
            code,
            message: self.message,
            details: self.details,
        })
    }
}

impl ApiResponse<()> {
    /// Create a success response without data
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            message: "OK".to_string(),
            data: None,
            details: None,
        }
    }

    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::KotNotFound);
        assert_eq!(err.code, ErrorCode::KotNotFound);
        assert_eq!(err.message, "KOT not found");
        assert!(err.details.is_none());
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::with_message(ErrorCode::SettlementMismatch, "balance 62.00")
            .with_detail("balance", "62.00")
            .with_detail("grand_total", "1062.00");

        let details = err.details.unwrap();
        assert_eq!(details.get("balance").unwrap(), "62.00");
        assert_eq!(details.get("grand_total").unwrap(), "1062.00");
    }

    #[test]
    fn test_app_error_convenience_constructors() {
        let err = AppError::not_found("Table 12");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Table 12 not found");
        assert!(err.details.as_ref().unwrap().contains_key("resource"));

        assert_eq!(AppError::conflict("x").kind(), ErrorKind::Conflict);
        assert_eq!(AppError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(AppError::internal("x").kind(), ErrorKind::ExternalService);
    }

    #[test]
    fn test_api_response_into_result() {
        let ok: ApiResponse<i32> = serde_json::from_str(r#"{"code":0,"message":"OK","data":7}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), Some(7));

        let bare: ApiResponse<i32> = serde_json::from_str(r#"{"data":7}"#).unwrap();
        assert!(bare.is_success());

        let err: ApiResponse<i32> =
            serde_json::from_str(r#"{"code":7001,"message":"no such table"}"#).unwrap();
        let err = err.into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);
        assert_eq!(err.message, "no such table");
    }

    #[test]
    fn test_api_response_unknown_code_is_rejection() {
        let err: ApiResponse<()> =
            serde_json::from_str(r#"{"code":4242,"message":"db down"}"#).unwrap();
        assert_eq!(err.into_result().unwrap_err().code, ErrorCode::ServiceRejected);
    }

    #[test]
    fn test_api_response_error_serialize() {
        let err = AppError::new(ErrorCode::OverReversal).with_detail("remaining", 1);
        let json = serde_json::to_string(&ApiResponse::<()>::error(&err)).unwrap();
        assert!(json.contains("\"code\":4004"));
        assert!(json.contains("\"remaining\":1"));
        assert!(!json.contains("\"data\""));
    }
}
