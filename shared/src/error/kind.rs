//! Projection of error codes onto the four operation-level error kinds

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// The error kind surfaced to the presentation layer
///
/// Every failing operation resolves to exactly one kind. Only
/// `ExternalService` offers a retry affordance; the others are rejected
/// locally before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    ExternalService,
}

impl ErrorKind {
    /// Whether retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalService)
    }
}

impl ErrorCode {
    /// Get the error kind for this code (`None` for success)
    pub fn kind(&self) -> Option<ErrorKind> {
        let kind = match self {
            Self::Success => return None,

            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::ValueOutOfRange
            | Self::PermissionDenied
            | Self::ApprovalRequired
            | Self::NothingToCommit
            | Self::InvalidDiscount
            | Self::NothingToTransfer
            | Self::SettlementMismatch
            | Self::InvalidPaymentAmount
            | Self::SameTable => ErrorKind::Validation,

            Self::NotFound
            | Self::LineNotFound
            | Self::KotNotFound
            | Self::SettlementNotFound
            | Self::TableNotFound => ErrorKind::NotFound,

            Self::Conflict
            | Self::OverReversal
            | Self::CommittedQuantityLocked
            | Self::PendingEdits
            | Self::ReconcileRequired
            | Self::TableBilled
            | Self::TableClosed
            | Self::InvalidTransition => ErrorKind::Conflict,

            Self::Unknown
            | Self::ServiceUnavailable
            | Self::ServiceRejected
            | Self::InternalError
            | Self::InvalidResponse => ErrorKind::ExternalService,
        };
        Some(kind)
    }
}
