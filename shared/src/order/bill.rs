//! Bill and discount types
//!
//! A [`Bill`] is derived from a ledger snapshot and tax rates on every read;
//! it is never persisted on its own.

use crate::models::Approver;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a discount is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage of the chargeable subtotal
    Percentage(Decimal),
    /// Flat amount subtracted before tax
    Flat(Decimal),
}

/// Discount held for a table session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub kind: DiscountKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<Approver>,
}

impl Discount {
    pub fn percentage(percent: Decimal) -> Self {
        Self {
            kind: DiscountKind::Percentage(percent),
            reason: None,
            approver: None,
        }
    }

    pub fn flat(amount: Decimal) -> Self {
        Self {
            kind: DiscountKind::Flat(amount),
            reason: None,
            approver: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn approved_by(mut self, approver: Approver) -> Self {
        self.approver = Some(approver);
        self
    }
}

/// Per-component tax amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaxAmounts {
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub cess: Decimal,
}

impl TaxAmounts {
    pub fn total(&self) -> Decimal {
        self.cgst + self.sgst + self.igst + self.cess
    }
}

/// Computed bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Bill {
    /// Chargeable value, net of reversals
    pub subtotal: Decimal,
    /// Value of NCKOT lines, shown but not charged
    pub non_chargeable: Decimal,
    pub discount_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
    /// `subtotal − discount_amount`
    pub taxable: Decimal,
    pub taxes: TaxAmounts,
    /// Signed adjustment applied by the round-off step
    pub round_off: Decimal,
    pub grand_total: Decimal,
}
