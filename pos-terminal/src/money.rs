//! Money helpers using rust_decimal for precision
//!
//! All monetary values are `Decimal`, rounded to 2 decimal places with
//! midpoint-away-from-zero. Input limits are enforced here before any
//! ledger or service mutation.

use crate::error::{EngineError, EngineResult};
use rust_decimal::prelude::*;

/// Rounding precision for monetary values
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price per item
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: u32 = 9999;
/// Maximum allowed amount per payment mode
pub const MAX_PAYMENT_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Valid party size
pub const MAX_PAX: u32 = 99;

/// Round to 2 decimal places, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `base × percent / 100`, rounded
#[inline]
pub fn percent_of(base: Decimal, percent: Decimal) -> Decimal {
    round_money(base * percent / Decimal::ONE_HUNDRED)
}

/// Round to the nearest multiple of `step` (no-op for a non-positive step)
pub fn round_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    let units = (value / step).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    round_money(units * step)
}

/// Validate a requested quantity for a new or growing line (1..=MAX_QUANTITY)
pub fn validate_quantity(quantity: i64) -> EngineResult<u32> {
    if quantity <= 0 {
        return Err(EngineError::OutOfRange(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > i64::from(MAX_QUANTITY) {
        return Err(EngineError::OutOfRange(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    // Bounded above by MAX_QUANTITY
    Ok(quantity as u32)
}

/// Validate a unit price (0..=MAX_PRICE)
pub fn validate_price(price: Decimal) -> EngineResult<()> {
    if price < Decimal::ZERO {
        return Err(EngineError::OutOfRange(format!(
            "price must be non-negative, got {}",
            price
        )));
    }
    if price > MAX_PRICE {
        return Err(EngineError::OutOfRange(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        )));
    }
    Ok(())
}

/// Validate one payment-mode amount (zero is allowed and later skipped)
pub fn validate_payment_amount(mode: &str, amount: Decimal) -> EngineResult<()> {
    if mode.trim().is_empty() {
        return Err(EngineError::InvalidPayment(
            "payment mode must not be empty".to_string(),
        ));
    }
    if amount < Decimal::ZERO {
        return Err(EngineError::InvalidPayment(format!(
            "{} amount must be non-negative, got {}",
            mode, amount
        )));
    }
    if amount > MAX_PAYMENT_AMOUNT {
        return Err(EngineError::InvalidPayment(format!(
            "{} amount exceeds maximum allowed ({}), got {}",
            mode, MAX_PAYMENT_AMOUNT, amount
        )));
    }
    if amount.scale() > DECIMAL_PLACES && amount != round_money(amount) {
        return Err(EngineError::InvalidPayment(format!(
            "{} amount has more than {} decimal places: {}",
            mode, DECIMAL_PLACES, amount
        )));
    }
    Ok(())
}

/// Validate a party size (1..=MAX_PAX)
pub fn validate_pax(pax: u32) -> EngineResult<()> {
    if pax == 0 || pax > MAX_PAX {
        return Err(EngineError::OutOfRange(format!(
            "pax must be between 1 and {}, got {}",
            MAX_PAX, pax
        )));
    }
    Ok(())
}
