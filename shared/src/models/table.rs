//! Dining Table Model
//!
//! Status is a finite-state model driven by [`TableEvent`]s. The normal
//! cycle is `Vacant → Occupied → Printed → Billed → Vacant`; only
//! [`TableEvent::AdminReset`] may jump states.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Table status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Vacant,
    Occupied,
    Printed,
    Billed,
}

impl TableStatus {
    /// Whether new items may be ordered without an override
    pub fn accepts_kot(&self) -> bool {
        !matches!(self, Self::Billed)
    }

    /// Whether the table can receive transferred items
    pub fn accepts_transfer(&self) -> bool {
        matches!(self, Self::Vacant | Self::Occupied)
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Vacant => "vacant",
            Self::Occupied => "occupied",
            Self::Printed => "printed",
            Self::Billed => "billed",
        };
        f.write_str(s)
    }
}

/// Events that move a table between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableEvent {
    /// A KOT was committed against the table
    KotCommitted,
    /// A KOT was committed against a billed table by an elevated approver
    KotCommittedWithOverride,
    /// The bill was printed
    BillPrinted,
    /// The bill was settled
    Settled,
    /// Settlement records were deleted for re-entry
    Unsettled,
    /// Post-settlement release
    Released,
    /// All items moved away by a transfer
    SourceEmptied,
    /// Items arrived from a transfer
    TransferReceived,
    /// Administrative reset (day-end)
    AdminReset,
}

/// Rejected status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event:?} to a {from} table")]
pub struct TransitionError {
    pub from: TableStatus,
    pub event: TableEvent,
}

impl TableStatus {
    /// Pure transition function
    ///
    /// Status only advances, with one exception: committing a KOT on a
    /// printed table reopens it (`Printed → Occupied`). The billing backend
    /// resets every table that receives a KOT to occupied, and the printed
    /// bill no longer matches the ledger anyway.
    pub fn apply(self, event: TableEvent) -> Result<TableStatus, TransitionError> {
        use TableEvent as E;
        use TableStatus as S;

        let next = match (self, event) {
            (_, E::AdminReset) => S::Vacant,

            (S::Vacant | S::Occupied | S::Printed, E::KotCommitted) => S::Occupied,
            (_, E::KotCommittedWithOverride) => S::Occupied,

            (S::Occupied | S::Printed, E::BillPrinted) => S::Printed,
            (S::Printed, E::Settled) => S::Billed,
            (S::Billed, E::Unsettled) => S::Printed,
            (S::Billed, E::Released) => S::Vacant,

            (S::Occupied | S::Printed, E::SourceEmptied) => S::Vacant,
            (S::Vacant | S::Occupied, E::TransferReceived) => S::Occupied,

            (from, event) => return Err(TransitionError { from, event }),
        };
        Ok(next)
    }
}

/// Dining table entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub name: String,
    pub department_id: i64,
    pub outlet_id: i64,
    #[serde(default)]
    pub status: TableStatus,
    /// Party size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pax: Option<u32>,
    #[serde(default)]
    pub is_billed: bool,
}

impl Table {
    pub fn new(id: i64, name: impl Into<String>, department_id: i64, outlet_id: i64) -> Self {
        Self {
            id,
            name: name.into(),
            department_id,
            outlet_id,
            status: TableStatus::Vacant,
            pax: None,
            is_billed: false,
        }
    }
}
