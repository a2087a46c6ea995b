//! Terminal commands issued by the presentation layer

use super::bill::Discount;
use super::kot::KotNumber;
use super::line::{LineId, NcTag};
use crate::models::{Approver, MenuItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A command with its correlation id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalCommand {
    pub command_id: String,
    pub payload: TerminalCommandPayload,
}

impl TerminalCommand {
    pub fn new(command_id: impl Into<String>, payload: TerminalCommandPayload) -> Self {
        Self {
            command_id: command_id.into(),
            payload,
        }
    }

    /// Create a command with a generated id
    pub fn from_payload(payload: TerminalCommandPayload) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), payload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalCommandPayload {
    // ========== Tables ==========
    RefreshTables,
    ListTables {
        department_id: i64,
    },
    SelectTable {
        table_id: i64,
    },
    /// De-select: discard pending edits and drop the session
    CloseTable {
        table_id: i64,
    },
    SetPax {
        table_id: i64,
        pax: u32,
    },
    Reconcile {
        table_id: i64,
    },
    View {
        table_id: i64,
    },

    // ========== Ledger edits ==========
    AddItem {
        table_id: i64,
        item: MenuItem,
        quantity: i64,
        #[serde(default)]
        instruction: Option<String>,
    },
    AdjustQuantity {
        table_id: i64,
        line_id: LineId,
        quantity: i64,
    },
    SetInstruction {
        table_id: i64,
        line_id: LineId,
        instruction: Option<String>,
    },
    ClearPending {
        table_id: i64,
    },

    // ========== Kitchen ==========
    CommitKot {
        table_id: i64,
        #[serde(default)]
        nc: Option<NcTag>,
        #[serde(default)]
        approver: Option<Approver>,
    },
    Reverse {
        table_id: i64,
        line_id: LineId,
        kot_number: KotNumber,
        quantity: i64,
    },
    ReverseKotTicket {
        table_id: i64,
        #[serde(default)]
        kot_number: Option<KotNumber>,
    },

    // ========== Billing ==========
    ApplyDiscount {
        table_id: i64,
        discount: Discount,
    },
    RemoveDiscount {
        table_id: i64,
    },
    PrintBill {
        table_id: i64,
    },
    Settle {
        table_id: i64,
        payments: BTreeMap<String, Decimal>,
        #[serde(default)]
        tip: Decimal,
    },
    PrintAndSettle {
        table_id: i64,
        payments: BTreeMap<String, Decimal>,
        #[serde(default)]
        tip: Decimal,
    },
    Unsettle {
        table_id: i64,
        /// Empty means the session's last settlement
        #[serde(default)]
        settlement_ids: Vec<i64>,
        edited_by: Approver,
    },
    ReleaseTable {
        table_id: i64,
    },
    AdminReset {
        table_id: i64,
        approver: Approver,
    },

    // ========== Transfers ==========
    TransferTable {
        source_table: i64,
        dest_table: i64,
    },
    TransferKot {
        source_table: i64,
        kot_number: KotNumber,
        dest_table: i64,
    },
}

impl TerminalCommandPayload {
    /// The table this command primarily acts on
    pub fn table_id(&self) -> Option<i64> {
        match self {
            Self::RefreshTables | Self::ListTables { .. } => None,
            Self::SelectTable { table_id }
            | Self::CloseTable { table_id }
            | Self::SetPax { table_id, .. }
            | Self::Reconcile { table_id }
            | Self::View { table_id }
            | Self::AddItem { table_id, .. }
            | Self::AdjustQuantity { table_id, .. }
            | Self::SetInstruction { table_id, .. }
            | Self::ClearPending { table_id }
            | Self::CommitKot { table_id, .. }
            | Self::Reverse { table_id, .. }
            | Self::ReverseKotTicket { table_id, .. }
            | Self::ApplyDiscount { table_id, .. }
            | Self::RemoveDiscount { table_id }
            | Self::PrintBill { table_id }
            | Self::Settle { table_id, .. }
            | Self::PrintAndSettle { table_id, .. }
            | Self::Unsettle { table_id, .. }
            | Self::ReleaseTable { table_id }
            | Self::AdminReset { table_id, .. } => Some(*table_id),
            Self::TransferTable { source_table, .. } | Self::TransferKot { source_table, .. } => {
                Some(*source_table)
            }
        }
    }
}
