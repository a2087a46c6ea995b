//! Settlement records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One `(payment mode, amount)` pair of a settlement request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLine {
    pub mode: String,
    pub amount: Decimal,
}

/// A persisted settlement row, one per non-zero payment mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub settlement_id: i64,
    pub order_ref: String,
    pub payment_mode: String,
    pub amount: Decimal,
    pub settled_at: DateTime<Utc>,
}

/// A committed settlement: the per-mode records plus tip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub order_ref: String,
    pub records: Vec<SettlementRecord>,
    pub tip: Decimal,
    pub grand_total: Decimal,
    pub settled_at: DateTime<Utc>,
}

impl Settlement {
    /// Sum of payment amounts, tip excluded
    pub fn paid(&self) -> Decimal {
        self.records.iter().map(|r| r.amount).sum()
    }

    pub fn settlement_ids(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.settlement_id).collect()
    }
}
