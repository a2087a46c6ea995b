//! Tax Rate Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tax percentages resolved per (outlet, department)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaxRates {
    #[serde(default)]
    pub cgst: Decimal,
    #[serde(default)]
    pub sgst: Decimal,
    #[serde(default)]
    pub igst: Decimal,
    #[serde(default)]
    pub cess: Decimal,
}

impl TaxRates {
    /// All-zero rates, used when no configuration resolves
    pub fn zero() -> Self {
        Self::default()
    }

    /// Sum of all component percentages
    pub fn total_rate(&self) -> Decimal {
        self.cgst + self.sgst + self.igst + self.cess
    }

    pub fn is_zero(&self) -> bool {
        self.total_rate().is_zero()
    }
}
