//! Reversal Handler
//!
//! Reductions of committed quantities are separate records; the original
//! line is never rewritten.

use crate::error::{EngineError, EngineResult};
use crate::ledger::Ledger;
use shared::order::{KotNumber, LineId, ReverseKotEntry, ReverseKotTicket};
use shared::request::ReverseQuantityRequest;

/// A validated reversal, ready to be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReversalPlan {
    pub line_id: LineId,
    pub kot_number: KotNumber,
    pub quantity: u32,
    pub remaining: u32,
    pub detail_id: i64,
    pub item_id: i64,
}

impl ReversalPlan {
    pub fn request(&self, table_id: i64) -> ReverseQuantityRequest {
        ReverseQuantityRequest {
            table_id,
            detail_id: self.detail_id,
            item_id: self.item_id,
            kot_no: self.kot_number,
            quantity: self.quantity,
        }
    }
}

/// Validate a reversal of `quantity` from `line_id` under `kot_number`
pub fn validate(
    ledger: &Ledger,
    line_id: LineId,
    kot_number: KotNumber,
    quantity: i64,
) -> EngineResult<ReversalPlan> {
    if quantity <= 0 {
        return Err(EngineError::OutOfRange(format!(
            "reversal quantity must be positive, got {}",
            quantity
        )));
    }

    let line = ledger
        .line(line_id)
        .filter(|l| !l.is_reverse)
        .ok_or(EngineError::LineNotFound(line_id))?;

    if !line.is_committed() || line.kot_number != Some(kot_number) {
        return Err(EngineError::KotEntryNotFound {
            line: line_id,
            kot: kot_number,
        });
    }

    let remaining = ledger.net_quantity(line_id);
    let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
    if requested > remaining {
        return Err(EngineError::OverReversal {
            line: line_id,
            kot: kot_number,
            requested,
            remaining,
        });
    }

    // Lines committed in this session are only addressable after a refetch
    let detail_id = line
        .detail_id
        .ok_or(EngineError::ReconcileRequired(ledger.table_id()))?;

    Ok(ReversalPlan {
        line_id,
        kot_number,
        quantity: requested,
        remaining,
        detail_id,
        item_id: line.item_id,
    })
}

/// Record an accepted reversal in the ledger
pub fn record(ledger: &mut Ledger, plan: &ReversalPlan) -> EngineResult<LineId> {
    ledger.push_reversal(plan.line_id, plan.quantity)
}

/// Kitchen-facing reverse ticket, built from reversal records only
pub fn reverse_ticket(
    ledger: &Ledger,
    kot_number: Option<KotNumber>,
) -> EngineResult<ReverseKotTicket> {
    if let Some(kot) = kot_number {
        if !ledger.kots().iter().any(|t| t.number == kot) {
            return Err(EngineError::KotNotFound(kot));
        }
    }

    let entries = ledger
        .reversal_records()
        .filter(|r| kot_number.is_none() || r.kot_number == kot_number)
        .filter_map(|r| {
            Some(ReverseKotEntry {
                line_id: r.id,
                reverses: r.reverses?,
                item_id: r.item_id,
                item_name: r.item_name.clone(),
                kot_number: r.kot_number?,
                quantity: r.reverse_quantity,
            })
        })
        .collect();

    Ok(ReverseKotTicket {
        kot_number,
        entries,
    })
}
