//! Settlement Reconciler
//!
//! Payments plus tip must equal the grand total exactly. Records are
//! append-only on the service side; an edit is delete-then-settle.

use crate::error::{EngineError, EngineResult};
use crate::money::{MAX_PAYMENT_AMOUNT, validate_payment_amount};
use chrono::Utc;
use rust_decimal::Decimal;
use shared::order::{Bill, PaymentLine, Settlement, SettlementRecord};
use shared::request::SettleBillRequest;
use std::collections::BTreeMap;

/// Validate tendered amounts against a bill
///
/// Returns one payment line per non-zero mode.
pub fn validate(
    bill: &Bill,
    payments: &BTreeMap<String, Decimal>,
    tip: Decimal,
) -> EngineResult<Vec<PaymentLine>> {
    for (mode, amount) in payments {
        validate_payment_amount(mode, *amount)?;
    }
    if tip < Decimal::ZERO || tip > MAX_PAYMENT_AMOUNT {
        return Err(EngineError::InvalidPayment(format!(
            "tip must be between 0 and {}, got {}",
            MAX_PAYMENT_AMOUNT, tip
        )));
    }

    let tendered: Decimal = payments.values().copied().sum::<Decimal>() + tip;
    if tendered != bill.grand_total {
        return Err(EngineError::SettlementMismatch {
            grand_total: bill.grand_total,
            tendered,
            balance: bill.grand_total - tendered,
        });
    }

    Ok(payments
        .iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(mode, amount)| PaymentLine {
            mode: mode.clone(),
            amount: *amount,
        })
        .collect())
}

pub fn request(
    table_id: i64,
    order_ref: &str,
    payments: Vec<PaymentLine>,
    tip: Decimal,
    bill: &Bill,
) -> SettleBillRequest {
    SettleBillRequest {
        table_id,
        order_ref: order_ref.to_string(),
        payments,
        tip,
        grand_total: bill.grand_total,
    }
}

/// Assemble the session's settlement from the committed records
pub fn assemble(
    order_ref: &str,
    records: Vec<SettlementRecord>,
    tip: Decimal,
    bill: &Bill,
) -> Settlement {
    let settled_at = records
        .iter()
        .map(|r| r.settled_at)
        .max()
        .unwrap_or_else(Utc::now);
    Settlement {
        order_ref: order_ref.to_string(),
        records,
        tip,
        grand_total: bill.grand_total,
        settled_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bill(grand_total: Decimal) -> Bill {
        Bill {
            grand_total,
            ..Default::default()
        }
    }

    fn payments(entries: &[(&str, Decimal)]) -> BTreeMap<String, Decimal> {
        entries
            .iter()
            .map(|(mode, amount)| (mode.to_string(), *amount))
            .collect()
    }

    #[test]
    fn test_short_payment_reports_balance() {
        let err = validate(
            &bill(dec!(1062)),
            &payments(&[("Cash", dec!(600)), ("Card", dec!(400))]),
            Decimal::ZERO,
        )
        .unwrap_err();
        match err {
            EngineError::SettlementMismatch {
                tendered, balance, ..
            } => {
                assert_eq!(tendered, dec!(1000));
                assert_eq!(balance, dec!(62));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_exact_payment_accepted() {
        let lines = validate(
            &bill(dec!(1062)),
            &payments(&[("Cash", dec!(662)), ("Card", dec!(400))]),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.iter().map(|l| l.amount).sum::<Decimal>(), dec!(1062));
    }

    #[test]
    fn test_overpayment_rejected() {
        let err = validate(
            &bill(dec!(1062)),
            &payments(&[("Cash", dec!(1100))]),
            Decimal::ZERO,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::SettlementMismatch { balance, .. } if balance == dec!(-38)
        ));
    }

    #[test]
    fn test_tip_counts_toward_total() {
        let lines = validate(
            &bill(dec!(500)),
            &payments(&[("UPI", dec!(450)), ("Cash", dec!(0))]),
            dec!(50),
        )
        .unwrap();
        // Zero-amount modes produce no record
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].mode, "UPI");
        assert!(validate(&bill(dec!(500)), &payments(&[("UPI", dec!(500))]), dec!(-1)).is_err());
    }

    #[test]
    fn test_invalid_amounts() {
        assert!(matches!(
            validate(&bill(dec!(10)), &payments(&[("Cash", dec!(-5)), ("Card", dec!(15))]), Decimal::ZERO),
            Err(EngineError::InvalidPayment(_))
        ));
    }

    #[test]
    fn test_assemble() {
        let now = Utc::now();
        let records = vec![
            SettlementRecord {
                settlement_id: 1,
                order_ref: "ORD-1".into(),
                payment_mode: "Cash".into(),
                amount: dec!(662),
                settled_at: now,
            },
            SettlementRecord {
                settlement_id: 2,
                order_ref: "ORD-1".into(),
                payment_mode: "Card".into(),
                amount: dec!(400),
                settled_at: now,
            },
        ];
        let settlement = assemble("ORD-1", records, Decimal::ZERO, &bill(dec!(1062)));
        assert_eq!(settlement.paid(), dec!(1062));
        assert_eq!(settlement.settlement_ids(), vec![1, 2]);
        assert_eq!(settlement.settled_at, now);
    }
}
