//! Transfer results

use super::kot::KotNumber;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A committed line moved by a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovedLine {
    pub detail_id: Option<i64>,
    pub item_id: i64,
    pub item_name: String,
    pub kot_number: KotNumber,
    /// Net quantity after reversals
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl MovedLine {
    pub fn value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// Outcome of a table or KOT transfer
///
/// Destination totals are additive: `variance = dest_total_after −
/// dest_total_before`, which equals `moved_total` exactly.
///
/// When the refetch after the commit fails, `verified` is false and the
/// after-totals are projected from the moved set. Both tables then need a
/// reconcile before further edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOperation {
    pub source_table: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kot_filter: Option<KotNumber>,
    pub dest_table: i64,
    pub moved: Vec<MovedLine>,
    pub moved_total: Decimal,
    pub source_total_before: Decimal,
    pub source_total_after: Decimal,
    pub dest_total_before: Decimal,
    pub dest_total_after: Decimal,
    pub variance: Decimal,
    pub verified: bool,
}
