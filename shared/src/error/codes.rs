//! Unified error codes for the POS terminal
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 4xxx: Order / KOT errors
//! - 5xxx: Payment errors
//! - 7xxx: Table errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the presentation layer
/// can match on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Conflicting state
    Conflict = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Elevated approver required
    ApprovalRequired = 2002,

    // ==================== 4xxx: Order / KOT ====================
    /// No positive delta to send to the kitchen
    NothingToCommit = 4001,
    /// Line item not found in the ledger
    LineNotFound = 4002,
    /// KOT not found
    KotNotFound = 4003,
    /// Reversal exceeds the remaining committed quantity
    OverReversal = 4004,
    /// Committed quantity can only be reduced by reversal
    CommittedQuantityLocked = 4005,
    /// Table has uncommitted edits
    PendingEdits = 4006,
    /// Ledger must be refetched before further edits
    ReconcileRequired = 4007,
    /// Discount is invalid
    InvalidDiscount = 4008,
    /// Nothing to transfer
    NothingToTransfer = 4009,

    // ==================== 5xxx: Payment ====================
    /// Payments plus tip do not equal the grand total
    SettlementMismatch = 5001,
    /// Payment amount is invalid
    InvalidPaymentAmount = 5002,
    /// Settlement not found
    SettlementNotFound = 5003,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is already billed
    TableBilled = 7002,
    /// Table is closed for new items
    TableClosed = 7003,
    /// Table status transition not allowed
    InvalidTransition = 7004,
    /// Source and destination table are the same
    SameTable = 7005,

    // ==================== 9xxx: System ====================
    /// Persistence service unreachable
    ServiceUnavailable = 9001,
    /// Persistence service rejected the request
    ServiceRejected = 9002,
    /// Internal error
    InternalError = 9003,
    /// Persistence service returned an unusable response
    InvalidResponse = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Conflicting state",
            Self::InvalidRequest => "Invalid request",
            Self::ValueOutOfRange => "Value out of range",

            Self::PermissionDenied => "Permission denied",
            Self::ApprovalRequired => "An elevated approver is required",

            Self::NothingToCommit => "No new quantities to send to the kitchen",
            Self::LineNotFound => "Line item not found",
            Self::KotNotFound => "KOT not found",
            Self::OverReversal => "Reversal exceeds the remaining committed quantity",
            Self::CommittedQuantityLocked => "Committed quantities can only be reduced by reversal",
            Self::PendingEdits => "Table has uncommitted edits",
            Self::ReconcileRequired => "Ledger must be refetched before further edits",
            Self::InvalidDiscount => "Invalid discount",
            Self::NothingToTransfer => "Nothing to transfer",

            Self::SettlementMismatch => "Payments do not match the grand total",
            Self::InvalidPaymentAmount => "Invalid payment amount",
            Self::SettlementNotFound => "Settlement not found",

            Self::TableNotFound => "Table not found",
            Self::TableBilled => "Table is already billed",
            Self::TableClosed => "Table is closed for new items",
            Self::InvalidTransition => "Table status transition not allowed",
            Self::SameTable => "Source and destination table are the same",

            Self::ServiceUnavailable => "Persistence service unavailable",
            Self::ServiceRejected => "Persistence service rejected the request",
            Self::InternalError => "Internal error",
            Self::InvalidResponse => "Invalid response from persistence service",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::Conflict,
            5 => Self::InvalidRequest,
            8 => Self::ValueOutOfRange,

            2001 => Self::PermissionDenied,
            2002 => Self::ApprovalRequired,

            4001 => Self::NothingToCommit,
            4002 => Self::LineNotFound,
            4003 => Self::KotNotFound,
            4004 => Self::OverReversal,
            4005 => Self::CommittedQuantityLocked,
            4006 => Self::PendingEdits,
            4007 => Self::ReconcileRequired,
            4008 => Self::InvalidDiscount,
            4009 => Self::NothingToTransfer,

            5001 => Self::SettlementMismatch,
            5002 => Self::InvalidPaymentAmount,
            5003 => Self::SettlementNotFound,

            7001 => Self::TableNotFound,
            7002 => Self::TableBilled,
            7003 => Self::TableClosed,
            7004 => Self::InvalidTransition,
            7005 => Self::SameTable,

            9001 => Self::ServiceUnavailable,
            9002 => Self::ServiceRejected,
            9003 => Self::InternalError,
            9004 => Self::InvalidResponse,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
