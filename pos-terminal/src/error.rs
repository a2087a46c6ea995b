use pos_client::ClientError;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode, ErrorKind};
use shared::models::{TableStatus, TransitionError};
use shared::order::{CommandError, KotNumber, LineId};
use thiserror::Error;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    // ========== Validation ==========
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    OutOfRange(String),

    #[error("No new quantities to send to the kitchen")]
    NothingToCommit,

    #[error("Invalid discount: {0}")]
    InvalidDiscount(String),

    #[error("Discount of {percent}% exceeds the {threshold}% threshold and needs an elevated approver")]
    ApprovalRequired { percent: Decimal, threshold: Decimal },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Payments plus tip ({tendered}) do not match grand total {grand_total}, balance {balance}")]
    SettlementMismatch {
        grand_total: Decimal,
        tendered: Decimal,
        balance: Decimal,
    },

    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    #[error("Cannot transfer table {0} onto itself")]
    SameTable(i64),

    #[error("Nothing to transfer from table {0}")]
    NothingToTransfer(i64),

    // ========== Not found ==========
    #[error("Table not found: {0}")]
    TableNotFound(i64),

    #[error("Line not found: {0}")]
    LineNotFound(LineId),

    #[error("KOT not found: {0}")]
    KotNotFound(KotNumber),

    #[error("Line {line} was not committed under KOT {kot}")]
    KotEntryNotFound { line: LineId, kot: KotNumber },

    #[error("Settlement not found: {0}")]
    SettlementNotFound(i64),

    // ========== Conflict ==========
    #[error("Reversal of {requested} exceeds the {remaining} remaining for line {line} in KOT {kot}")]
    OverReversal {
        line: LineId,
        kot: KotNumber,
        requested: u32,
        remaining: u32,
    },

    #[error("Line {line} has {committed} already sent to the kitchen; reduce it by reversal")]
    CommittedQuantityLocked { line: LineId, committed: u32 },

    #[error("Table {0} has uncommitted edits")]
    PendingEdits(i64),

    #[error("Table {0} must be refetched before further edits")]
    ReconcileRequired(i64),

    #[error("Table {0} is already billed")]
    TableBilled(i64),

    #[error("Table {table} is {status} and closed for new items")]
    TableClosed { table: i64, status: TableStatus },

    #[error("Invalid table transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    // ========== External service ==========
    #[error("Service error: {0}")]
    Client(#[from] ClientError),

    #[error("Service rejected request: {0}")]
    Rejected(AppError),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Unsettle stopped at settlement {failed} after deleting {deleted:?}: {source}")]
    PartialUnsettle {
        deleted: Vec<i64>,
        failed: i64,
        source: Box<EngineError>,
    },

    #[error("Transfer verification failed: {0}")]
    TransferMismatch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// The unified error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::OutOfRange(_) => ErrorCode::ValueOutOfRange,
            Self::NothingToCommit => ErrorCode::NothingToCommit,
            Self::InvalidDiscount(_) => ErrorCode::InvalidDiscount,
            Self::ApprovalRequired { .. } => ErrorCode::ApprovalRequired,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::SettlementMismatch { .. } => ErrorCode::SettlementMismatch,
            Self::InvalidPayment(_) => ErrorCode::InvalidPaymentAmount,
            Self::SameTable(_) => ErrorCode::SameTable,
            Self::NothingToTransfer(_) => ErrorCode::NothingToTransfer,

            Self::TableNotFound(_) => ErrorCode::TableNotFound,
            Self::LineNotFound(_) => ErrorCode::LineNotFound,
            Self::KotNotFound(_) | Self::KotEntryNotFound { .. } => ErrorCode::KotNotFound,
            Self::SettlementNotFound(_) => ErrorCode::SettlementNotFound,

            Self::OverReversal { .. } => ErrorCode::OverReversal,
            Self::CommittedQuantityLocked { .. } => ErrorCode::CommittedQuantityLocked,
            Self::PendingEdits(_) => ErrorCode::PendingEdits,
            Self::ReconcileRequired(_) => ErrorCode::ReconcileRequired,
            Self::TableBilled(_) => ErrorCode::TableBilled,
            Self::TableClosed { .. } => ErrorCode::TableClosed,
            Self::InvalidTransition(_) => ErrorCode::InvalidTransition,

            Self::Client(e) => match e.error_code() {
                code if code.kind() == Some(ErrorKind::ExternalService) => code,
                _ => ErrorCode::ServiceRejected,
            },
            Self::Rejected(_) => ErrorCode::ServiceRejected,
            Self::Unavailable(_) | Self::PartialUnsettle { .. } => ErrorCode::ServiceUnavailable,
            Self::TransferMismatch(_) => ErrorCode::InvalidResponse,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// One of the four operation-level kinds
    pub fn kind(&self) -> ErrorKind {
        self.code().kind().unwrap_or(ErrorKind::ExternalService)
    }

    pub fn is_external(&self) -> bool {
        self.kind() == ErrorKind::ExternalService
    }

    /// Convert into the wire error, attaching structured details
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::with_message(self.code(), self.to_string());
        match self {
            Self::SettlementMismatch {
                grand_total,
                tendered,
                balance,
            } => err
                .with_detail("grand_total", grand_total.to_string())
                .with_detail("tendered", tendered.to_string())
                .with_detail("balance", balance.to_string()),
            Self::ApprovalRequired { percent, threshold } => err
                .with_detail("percent", percent.to_string())
                .with_detail("threshold", threshold.to_string()),
            Self::OverReversal {
                requested,
                remaining,
                ..
            } => err
                .with_detail("requested", *requested)
                .with_detail("remaining", *remaining),
            Self::PartialUnsettle {
                deleted, failed, ..
            } => err
                .with_detail("deleted", deleted.clone())
                .with_detail("failed", *failed),
            Self::Rejected(app) => err.with_detail("service_code", app.code.code()),
            Self::Client(e) => err.with_detail("service_code", e.error_code().code()),
            _ => err,
        }
    }
}

impl From<EngineError> for CommandError {
    fn from(err: EngineError) -> Self {
        if err.is_external() {
            tracing::error!(error = %err, error_code = %err.code(), "External service error");
        }
        CommandError::from(err.to_app_error())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
