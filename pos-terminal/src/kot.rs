//! KOT Diff Engine
//!
//! Only positive increases since the last commit are ever sent to the
//! kitchen. Decreases of committed quantities go through reversals.

use crate::error::{EngineError, EngineResult};
use crate::ledger::Ledger;
use crate::money::percent_of;
use rust_decimal::Decimal;
use shared::models::TaxRates;
use shared::order::{KotDelta, KotNumber, LineId, LineItem, NcTag, UnitTax};

/// Per-unit tax components for a price
pub fn unit_tax(price: Decimal, rates: &TaxRates) -> UnitTax {
    UnitTax {
        cgst: percent_of(price, rates.cgst),
        sgst: percent_of(price, rates.sgst),
        igst: percent_of(price, rates.igst),
        cess: percent_of(price, rates.cess),
    }
}

/// Deltas for every line whose quantity exceeds its committed quantity
pub fn build_delta(ledger: &Ledger, rates: &TaxRates) -> EngineResult<Vec<KotDelta>> {
    let deltas: Vec<KotDelta> = ledger
        .lines()
        .iter()
        .filter_map(|line| {
            let delta_qty = line.pending_delta();
            (delta_qty > 0).then(|| KotDelta {
                line_id: line.id,
                item_id: line.item_id,
                item_name: line.item_name.clone(),
                delta_qty,
                unit_price: line.unit_price,
                unit_tax: unit_tax(line.unit_price, rates),
                instruction: line.instruction.clone(),
            })
        })
        .collect();

    if deltas.is_empty() {
        return Err(EngineError::NothingToCommit);
    }
    Ok(deltas)
}

/// Record a successful commit in the ledger
///
/// A never-committed line moves under `kot` as a whole. An increment on an
/// already-committed line leaves that line at its committed quantity and
/// becomes a new line under `kot`, so earlier tickets stay unchanged.
/// Returns the ids of the lines now carrying `kot`.
pub fn apply_commit(
    ledger: &mut Ledger,
    deltas: &[KotDelta],
    kot: KotNumber,
    nc: Option<&NcTag>,
) -> Vec<LineId> {
    let mut committed = Vec::with_capacity(deltas.len());

    for delta in deltas {
        let Some(pos) = ledger
            .lines()
            .iter()
            .position(|l| l.id == delta.line_id && !l.is_reverse)
        else {
            tracing::warn!(line_id = %delta.line_id, kot_no = kot, "Committed delta has no ledger line");
            continue;
        };

        let line = &mut ledger.lines_mut()[pos];
        if !line.is_committed() {
            line.original_quantity = Some(line.quantity);
            line.kot_number = Some(kot);
            line.is_new = false;
            line.nc = nc.cloned();
            committed.push(line.id);
            continue;
        }

        let template = line.clone();
        line.quantity = line.committed_quantity();
        line.is_new = false;

        let id = ledger.next_line_id();
        ledger.lines_mut().push(LineItem {
            id,
            detail_id: None,
            quantity: delta.delta_qty,
            original_quantity: Some(delta.delta_qty),
            kot_number: Some(kot),
            is_new: false,
            is_billed: false,
            reverse_quantity: 0,
            reverses: None,
            nc: nc.cloned(),
            instruction: delta.instruction.clone(),
            ..template
        });
        committed.push(id);
    }

    ledger.set_current_kot(kot);
    committed
}
