//! Read-only views handed to the presentation layer

use super::bill::Bill;
use super::kot::KotTicket;
use super::line::LineItem;
use super::settlement::Settlement;
use crate::models::Table;
use serde::{Deserialize, Serialize};

/// Synchronisation state of a table session
///
/// `Clean → Dirty` on local edits, `→ AwaitingReconcile` once a commit
/// succeeded remotely, `→ Clean` after the ledger is refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Clean,
    Dirty,
    AwaitingReconcile,
}

/// Snapshot of one open table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub table: Table,
    pub session: SessionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_ref: Option<String>,
    pub lines: Vec<LineItem>,
    pub kots: Vec<KotTicket>,
    pub bill: Bill,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<Settlement>,
}
