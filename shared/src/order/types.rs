//! Command response types

use crate::error::{AppError, ErrorCode, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Command Response
// ============================================================================

/// Structured result of one terminal command
///
/// Failures never escape as errors; they are reported here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Table the command acted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
    /// Result payload (view, bill, settlement, transfer, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandResponse {
    pub fn success(command_id: String, table_id: Option<i64>, data: Option<Value>) -> Self {
        Self {
            command_id,
            success: true,
            table_id,
            error: None,
            data,
        }
    }

    pub fn error(command_id: String, table_id: Option<i64>, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            table_id,
            error: Some(error),
            data: None,
        }
    }

    /// Human-readable outcome (`"OK"` or the error message)
    pub fn message(&self) -> &str {
        self.error.as_ref().map(|e| e.message.as_str()).unwrap_or("OK")
    }
}

// ============================================================================
// Command Error
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandError {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: code.kind().unwrap_or(ErrorKind::ExternalService),
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Whether the presentation layer should offer a retry
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        Self {
            kind: err.kind(),
            code: err.code,
            message: err.message,
            details: err.details,
        }
    }
}
