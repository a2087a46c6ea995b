//! Ledger line items

use super::kot::KotNumber;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger-local line identifier
///
/// Assigned by the ledger arena and never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Non-chargeable (NCKOT) tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NcTag {
    /// Who the items were given to
    pub name: String,
    /// Why (complimentary, tasting, staff meal, ...)
    pub purpose: String,
}

/// A ledger record
///
/// Regular lines carry an ordered quantity. Reversal records
/// (`is_reverse = true`) carry `reverse_quantity` and point at the line and
/// KOT they reduce; they never alter the line they reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineId,
    /// Persistence-side detail row, `None` until committed and refetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_id: Option<i64>,
    pub item_id: i64,
    pub item_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Quantity already sent to the kitchen, `None` for brand-new lines
    #[serde(default)]
    pub original_quantity: Option<u32>,
    #[serde(default)]
    pub kot_number: Option<KotNumber>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_billed: bool,
    #[serde(default)]
    pub is_reverse: bool,
    #[serde(default)]
    pub reverse_quantity: u32,
    /// For reversal records: the line being reduced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverses: Option<LineId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nc: Option<NcTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

impl LineItem {
    /// Quantity pending for the next KOT: `max(0, quantity − original)`
    pub fn pending_delta(&self) -> u32 {
        if self.is_reverse {
            return 0;
        }
        self.quantity
            .saturating_sub(self.original_quantity.unwrap_or(0))
    }

    /// Quantity already committed to the kitchen
    pub fn committed_quantity(&self) -> u32 {
        if self.is_reverse {
            return 0;
        }
        self.original_quantity.unwrap_or(0)
    }

    pub fn is_committed(&self) -> bool {
        self.kot_number.is_some() && self.original_quantity.is_some()
    }

    pub fn is_non_chargeable(&self) -> bool {
        self.nc.is_some()
    }

    /// Signed value of this record (reversals are negative)
    pub fn value(&self) -> Decimal {
        if self.is_reverse {
            -(Decimal::from(self.reverse_quantity) * self.unit_price)
        } else {
            Decimal::from(self.quantity) * self.unit_price
        }
    }
}
