//! Tax Calculator
//!
//! The bill is a pure function of the ledger, the resolved rates and the
//! session discount. It is recomputed on every read.

use crate::error::{EngineError, EngineResult};
use crate::ledger::Ledger;
use crate::money::{percent_of, round_money, round_to_step};
use dashmap::DashMap;
use rust_decimal::Decimal;
use shared::models::TaxRates;
use shared::order::{Bill, Discount, DiscountKind, TaxAmounts};

/// Smallest accepted percentage discount
pub const MIN_DISCOUNT_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Grand-total round-off setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOff {
    pub enabled: bool,
    pub step: Decimal,
}

impl RoundOff {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            step: Decimal::ONE,
        }
    }

    pub fn to_step(step: Decimal) -> Self {
        Self {
            enabled: true,
            step,
        }
    }

    fn apply(&self, amount: Decimal) -> Decimal {
        if self.enabled {
            round_to_step(amount, self.step)
        } else {
            amount
        }
    }
}

/// Effective percentage of a discount against a subtotal
pub fn effective_percent(discount: &Discount, subtotal: Decimal) -> Decimal {
    match discount.kind {
        DiscountKind::Percentage(p) => p,
        DiscountKind::Flat(amount) => {
            if subtotal > Decimal::ZERO {
                round_money(amount * Decimal::ONE_HUNDRED / subtotal)
            } else {
                Decimal::ONE_HUNDRED
            }
        }
    }
}

/// Check a discount's range and approval before it is applied
pub fn validate_discount(
    discount: &Discount,
    subtotal: Decimal,
    threshold: Decimal,
) -> EngineResult<()> {
    match discount.kind {
        DiscountKind::Percentage(p) => {
            if p < MIN_DISCOUNT_PERCENT || p > Decimal::ONE_HUNDRED {
                return Err(EngineError::InvalidDiscount(format!(
                    "percentage must be between {} and 100, got {}",
                    MIN_DISCOUNT_PERCENT, p
                )));
            }
        }
        DiscountKind::Flat(amount) => {
            if amount <= Decimal::ZERO {
                return Err(EngineError::InvalidDiscount(format!(
                    "flat amount must be positive, got {}",
                    amount
                )));
            }
            if amount > subtotal {
                return Err(EngineError::InvalidDiscount(format!(
                    "flat amount {} exceeds subtotal {}",
                    amount, subtotal
                )));
            }
        }
    }

    let percent = effective_percent(discount, subtotal);
    let approved = discount.approver.as_ref().is_some_and(|a| a.is_elevated());
    if percent > threshold && !approved {
        return Err(EngineError::ApprovalRequired { percent, threshold });
    }
    Ok(())
}

/// Amount a discount is measured against: the chargeable subtotal
pub fn discount_base(ledger: &Ledger) -> Decimal {
    ledger.chargeable_total().max(Decimal::ZERO)
}

/// Compute the bill for a ledger
pub fn compute(
    ledger: &Ledger,
    rates: &TaxRates,
    discount: Option<&Discount>,
    round_off: RoundOff,
) -> Bill {
    let subtotal = discount_base(ledger);
    let non_chargeable = ledger.non_chargeable_total();

    let discount_amount = match discount.map(|d| d.kind) {
        Some(DiscountKind::Percentage(p)) => percent_of(subtotal, p),
        Some(DiscountKind::Flat(amount)) => round_money(amount),
        None => Decimal::ZERO,
    }
    .clamp(Decimal::ZERO, subtotal);

    let taxable = subtotal - discount_amount;
    let taxes = TaxAmounts {
        cgst: percent_of(taxable, rates.cgst),
        sgst: percent_of(taxable, rates.sgst),
        igst: percent_of(taxable, rates.igst),
        cess: percent_of(taxable, rates.cess),
    };

    let before_round_off = taxable + taxes.total();
    let grand_total = round_off.apply(before_round_off);

    Bill {
        subtotal,
        non_chargeable,
        discount_amount,
        discount: discount.cloned(),
        taxable,
        taxes,
        round_off: grand_total - before_round_off,
        grand_total,
    }
}

/// Tax rates resolved per `(outlet_id, department_id)`
///
/// Shared read-only across table views.
#[derive(Debug, Default)]
pub struct TaxRateCache {
    rates: DashMap<(i64, i64), TaxRates>,
}

impl TaxRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, outlet_id: i64, department_id: i64) -> Option<TaxRates> {
        self.rates.get(&(outlet_id, department_id)).map(|r| *r)
    }

    pub fn insert(&self, outlet_id: i64, department_id: i64, rates: TaxRates) {
        self.rates.insert((outlet_id, department_id), rates);
    }

    pub fn invalidate(&self, outlet_id: i64, department_id: i64) {
        self.rates.remove(&(outlet_id, department_id));
    }

    pub fn clear(&self) {
        self.rates.clear();
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
