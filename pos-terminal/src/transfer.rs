//! Transfer Coordinator
//!
//! The moved item set is computed here before a single commit request;
//! totals on both sides are checked against the refetched ledgers.

use crate::error::{EngineError, EngineResult};
use crate::ledger::Ledger;
use rust_decimal::Decimal;
use shared::models::TableStatus;
use shared::order::{KotNumber, MovedLine, TransferOperation};
use shared::request::{TransferKotRequest, TransferTableRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub source_table: i64,
    pub dest_table: i64,
    pub kot_filter: Option<KotNumber>,
    pub moved: Vec<MovedLine>,
    pub moved_total: Decimal,
    pub source_total_before: Decimal,
    /// Nothing with a positive quantity stays behind
    pub empties_source: bool,
}

impl TransferPlan {
    pub fn detail_ids(&self) -> Vec<i64> {
        self.moved.iter().filter_map(|m| m.detail_id).collect()
    }

    pub fn table_request(&self) -> TransferTableRequest {
        TransferTableRequest {
            source_table_id: self.source_table,
            dest_table_id: self.dest_table,
        }
    }

    pub fn kot_request(&self, kot_no: KotNumber) -> TransferKotRequest {
        TransferKotRequest {
            source_table_id: self.source_table,
            kot_no,
            dest_table_id: self.dest_table,
            detail_ids: self.detail_ids(),
        }
    }
}

/// Compute what a transfer would move, rejecting it before any request is made
pub fn plan(
    source: &Ledger,
    source_status: TableStatus,
    dest_table: i64,
    dest_status: TableStatus,
    kot_filter: Option<KotNumber>,
) -> EngineResult<TransferPlan> {
    let source_table = source.table_id();
    if source_table == dest_table {
        return Err(EngineError::SameTable(source_table));
    }
    if !dest_status.accepts_transfer() {
        return Err(EngineError::TableClosed {
            table: dest_table,
            status: dest_status,
        });
    }
    if source_status == TableStatus::Billed {
        return Err(EngineError::TableBilled(source_table));
    }
    if source.has_pending() {
        return Err(EngineError::PendingEdits(source_table));
    }
    if let Some(kot) = kot_filter {
        if !source.kots().iter().any(|t| t.number == kot) {
            return Err(EngineError::KotNotFound(kot));
        }
    }

    let mut moved = Vec::new();
    let mut left_behind = false;
    for line in source
        .lines()
        .iter()
        .filter(|l| !l.is_reverse && l.is_committed())
    {
        let net = source.net_quantity(line.id);
        if net == 0 {
            continue;
        }
        let Some(kot_number) = line.kot_number else {
            continue;
        };
        if kot_filter.is_some_and(|k| k != kot_number) {
            left_behind = true;
            continue;
        }
        if line.detail_id.is_none() {
            return Err(EngineError::ReconcileRequired(source_table));
        }
        moved.push(MovedLine {
            detail_id: line.detail_id,
            item_id: line.item_id,
            item_name: line.item_name.clone(),
            kot_number,
            quantity: net,
            unit_price: line.unit_price,
        });
    }

    if moved.is_empty() {
        return Err(EngineError::NothingToTransfer(source_table));
    }

    let moved_total = moved.iter().map(MovedLine::value).sum();
    Ok(TransferPlan {
        source_table,
        dest_table,
        kot_filter,
        moved,
        moved_total,
        source_total_before: source.total(),
        empties_source: !left_behind,
    })
}

/// Check refetched totals against the plan
pub fn verify(
    plan: TransferPlan,
    source_total_after: Decimal,
    dest_total_before: Decimal,
    dest_total_after: Decimal,
) -> EngineResult<TransferOperation> {
    let expected_source = plan.source_total_before - plan.moved_total;
    let expected_dest = dest_total_before + plan.moved_total;
    if source_total_after != expected_source || dest_total_after != expected_dest {
        return Err(EngineError::TransferMismatch(format!(
            "moved {} but source went {} -> {} and destination {} -> {}",
            plan.moved_total,
            plan.source_total_before,
            source_total_after,
            dest_total_before,
            dest_total_after
        )));
    }

    Ok(TransferOperation {
        source_table: plan.source_table,
        kot_filter: plan.kot_filter,
        dest_table: plan.dest_table,
        moved_total: plan.moved_total,
        moved: plan.moved,
        source_total_before: plan.source_total_before,
        source_total_after,
        dest_total_before,
        dest_total_after,
        variance: dest_total_after - dest_total_before,
        verified: true,
    })
}

/// Result for a committed transfer whose refetch failed
pub fn unverified(plan: TransferPlan, dest_total_before: Decimal) -> TransferOperation {
    let source_total_after = plan.source_total_before - plan.moved_total;
    let dest_total_after = dest_total_before + plan.moved_total;
    TransferOperation {
        source_table: plan.source_table,
        kot_filter: plan.kot_filter,
        dest_table: plan.dest_table,
        moved_total: plan.moved_total,
        moved: plan.moved,
        source_total_before: plan.source_total_before,
        source_total_after,
        dest_total_before,
        dest_total_after,
        variance: dest_total_after - dest_total_before,
        verified: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::models::MenuItem;
    use shared::response::{OrderHeader, UnbilledItem, UnbilledItems};

    fn row(detail_id: i64, price: Decimal, qty: u32, kot_no: u32) -> UnbilledItem {
        UnbilledItem {
            detail_id,
            item_id: detail_id,
            item_name: format!("Item {}", detail_id),
            price,
            qty,
            rev_qty: 0,
            kot_no,
            nc_name: None,
            nc_purpose: None,
            instruction: None,
            is_billed: false,
        }
    }

    fn ledger(table_id: i64, items: Vec<UnbilledItem>) -> Ledger {
        Ledger::from_snapshot(
            table_id,
            &UnbilledItems {
                items,
                reversed_items: vec![],
                current_kot_no: None,
                header: OrderHeader {
                    table_id,
                    ..Default::default()
                },
            },
        )
    }

    fn table_a() -> Ledger {
        // 500 total: KOT 1 = 250, KOT 2 = 250
        ledger(
            1,
            vec![
                row(10, dec!(100), 1, 1),
                row(11, dec!(150), 1, 1),
                row(12, dec!(250), 1, 2),
            ],
        )
    }

    #[test]
    fn test_kot_transfer_plan() {
        let a = table_a();
        let plan = plan(&a, TableStatus::Occupied, 2, TableStatus::Vacant, Some(1)).unwrap();
        assert_eq!(plan.moved.len(), 2);
        assert_eq!(plan.moved_total, dec!(250));
        assert_eq!(plan.source_total_before, dec!(500));
        assert!(!plan.empties_source);
        assert_eq!(plan.kot_request(1).detail_ids, vec![10, 11]);
    }

    #[test]
    fn test_verify_500_to_250_250() {
        let a = table_a();
        let plan = plan(&a, TableStatus::Occupied, 2, TableStatus::Vacant, Some(1)).unwrap();
        let op = verify(plan, dec!(250), dec!(0), dec!(250)).unwrap();
        assert_eq!(op.variance, dec!(250));
        assert_eq!(op.variance, op.moved_total);
        assert_eq!(op.source_total_before - op.source_total_after, op.moved_total);
        assert!(op.verified);
    }

    #[test]
    fn test_unverified_projects_totals() {
        let a = table_a();
        let plan = plan(&a, TableStatus::Occupied, 2, TableStatus::Occupied, None).unwrap();
        let op = unverified(plan, dec!(300));
        assert!(!op.verified);
        assert_eq!(op.source_total_after, Decimal::ZERO);
        assert_eq!(op.dest_total_after, dec!(800));
        assert_eq!(op.variance, dec!(500));
    }

    #[test]
    fn test_verify_detects_drift() {
        let a = table_a();
        let plan = plan(&a, TableStatus::Occupied, 2, TableStatus::Occupied, None).unwrap();
        assert!(plan.empties_source);
        assert!(matches!(
            verify(plan, dec!(0), dec!(100), dec!(580)),
            Err(EngineError::TransferMismatch(_))
        ));
    }

    #[test]
    fn test_rejections() {
        let a = table_a();
        assert!(matches!(
            plan(&a, TableStatus::Occupied, 1, TableStatus::Occupied, None),
            Err(EngineError::SameTable(1))
        ));
        assert!(matches!(
            plan(&a, TableStatus::Occupied, 2, TableStatus::Printed, None),
            Err(EngineError::TableClosed { table: 2, .. })
        ));
        assert!(matches!(
            plan(&a, TableStatus::Occupied, 2, TableStatus::Billed, None),
            Err(EngineError::TableClosed { .. })
        ));
        assert!(matches!(
            plan(&a, TableStatus::Billed, 2, TableStatus::Vacant, None),
            Err(EngineError::TableBilled(1))
        ));
        assert!(matches!(
            plan(&a, TableStatus::Occupied, 2, TableStatus::Vacant, Some(9)),
            Err(EngineError::KotNotFound(9))
        ));
        assert!(matches!(
            plan(&ledger(3, vec![]), TableStatus::Vacant, 2, TableStatus::Vacant, None),
            Err(EngineError::NothingToTransfer(3))
        ));
    }

    #[test]
    fn test_pending_edits_block_transfer() {
        let mut a = table_a();
        a.add_item(&MenuItem::new(99, "Kulfi", dec!(70)), 1, None).unwrap();
        assert!(matches!(
            plan(&a, TableStatus::Occupied, 2, TableStatus::Vacant, None),
            Err(EngineError::PendingEdits(1))
        ));
    }

    #[test]
    fn test_fully_reversed_lines_do_not_move() {
        let mut a = table_a();
        let id = a.lines()[0].id;
        a.push_reversal(id, 1).unwrap();
        let plan = plan(&a, TableStatus::Occupied, 2, TableStatus::Vacant, Some(1)).unwrap();
        assert_eq!(plan.moved.len(), 1);
        assert_eq!(plan.moved_total, dec!(150));
        assert_eq!(plan.source_total_before, dec!(400));
    }
}
