//! Kitchen order tickets

use super::line::{LineId, NcTag};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// KOT sequence number
pub type KotNumber = u32;

/// Per-unit tax components of a KOT delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UnitTax {
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub cess: Decimal,
}

/// One committable delta extracted from the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KotDelta {
    pub line_id: LineId,
    pub item_id: i64,
    pub item_name: String,
    pub delta_qty: u32,
    pub unit_price: Decimal,
    pub unit_tax: UnitTax,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

/// A line within an issued KOT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KotEntry {
    pub line_id: LineId,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Immutable view of an issued KOT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KotTicket {
    pub number: KotNumber,
    pub entries: Vec<KotEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nc: Option<NcTag>,
}

impl KotTicket {
    pub fn total_quantity(&self) -> u32 {
        self.entries.iter().map(|e| e.quantity).sum()
    }
}

/// A line of the kitchen-facing reverse ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseKotEntry {
    /// The reversal record
    pub line_id: LineId,
    /// The line being reduced
    pub reverses: LineId,
    pub item_id: i64,
    pub item_name: String,
    pub kot_number: KotNumber,
    pub quantity: u32,
}

/// Kitchen-facing reversal ticket, built from reversal records only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReverseKotTicket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kot_number: Option<KotNumber>,
    pub entries: Vec<ReverseKotEntry>,
}

impl ReverseKotTicket {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
