//! Order Item Ledger
//!
//! Per-table arena of [`LineItem`]s addressed by [`LineId`]. KOT tickets and
//! reversal records refer to lines by id only; nothing points back.
//!
//! A committed line keeps its committed quantity in `original_quantity`.
//! Local edits may only raise `quantity` above it; reductions go through
//! reversal records appended next to the original line.

use crate::error::{EngineError, EngineResult};
use crate::money::{self, MAX_QUANTITY};
use rust_decimal::Decimal;
use shared::models::MenuItem;
use shared::order::{KotEntry, KotNumber, KotTicket, LineId, LineItem, NcTag};
use shared::response::UnbilledItems;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct Ledger {
    table_id: i64,
    lines: Vec<LineItem>,
    next_id: u32,
    current_kot: Option<KotNumber>,
    order_ref: Option<String>,
}

impl Ledger {
    pub fn new(table_id: i64) -> Self {
        Self {
            table_id,
            lines: Vec::new(),
            next_id: 1,
            current_kot: None,
            order_ref: None,
        }
    }

    /// Build a ledger from the service snapshot
    pub fn from_snapshot(table_id: i64, snapshot: &UnbilledItems) -> Self {
        let mut ledger = Self::new(table_id);
        ledger.load(snapshot);
        ledger
    }

    /// Replace the contents with the service snapshot
    ///
    /// Every loaded line is committed with nothing pending. Line ids of rows
    /// already known by `detail_id` are kept stable across reloads.
    pub fn load(&mut self, snapshot: &UnbilledItems) {
        let known: HashMap<i64, LineId> = self
            .lines
            .iter()
            .filter(|l| !l.is_reverse)
            .filter_map(|l| l.detail_id.map(|d| (d, l.id)))
            .collect();

        self.lines.clear();
        self.current_kot = snapshot.current_kot_no;
        self.order_ref = snapshot.header.order_ref.clone();

        for row in &snapshot.items {
            let id = match known.get(&row.detail_id) {
                Some(id) => *id,
                None => self.allocate_id(),
            };
            let nc = row.nc_name.as_ref().map(|name| NcTag {
                name: name.clone(),
                purpose: row.nc_purpose.clone().unwrap_or_default(),
            });
            self.lines.push(LineItem {
                id,
                detail_id: Some(row.detail_id),
                item_id: row.item_id,
                item_name: row.item_name.clone(),
                unit_price: row.price,
                quantity: row.qty,
                original_quantity: Some(row.qty),
                kot_number: Some(row.kot_no),
                is_new: false,
                is_billed: row.is_billed,
                is_reverse: false,
                reverse_quantity: 0,
                reverses: None,
                nc,
                instruction: row.instruction.clone(),
            });
        }

        for rev in &snapshot.reversed_items {
            let Some(target) = self.line_by_detail(rev.detail_id) else {
                tracing::warn!(
                    table_id = self.table_id,
                    detail_id = rev.detail_id,
                    reversal_id = rev.reversal_id,
                    "Reversal row without a matching detail row, skipped"
                );
                continue;
            };
            let record = self.reversal_record(target, rev.qty);
            self.lines.push(record);
        }

        // Rows may report reversed quantity without itemised reversal rows
        for row in &snapshot.items {
            let Some(target) = self.line_by_detail(row.detail_id) else {
                continue;
            };
            let listed = self.reversed_quantity(target);
            if row.rev_qty > listed {
                let record = self.reversal_record(target, row.rev_qty - listed);
                self.lines.push(record);
            }
        }
    }

    fn allocate_id(&mut self) -> LineId {
        let id = LineId(self.next_id);
        self.next_id += 1;
        id
    }

    fn line_by_detail(&self, detail_id: i64) -> Option<LineId> {
        self.lines
            .iter()
            .find(|l| !l.is_reverse && l.detail_id == Some(detail_id))
            .map(|l| l.id)
    }

    fn reversal_record(&mut self, target: LineId, quantity: u32) -> LineItem {
        let id = self.allocate_id();
        let original = self.lines.iter().find(|l| l.id == target);
        LineItem {
            id,
            detail_id: None,
            item_id: original.map(|l| l.item_id).unwrap_or_default(),
            item_name: original.map(|l| l.item_name.clone()).unwrap_or_default(),
            unit_price: original.map(|l| l.unit_price).unwrap_or_default(),
            quantity: 0,
            original_quantity: None,
            kot_number: original.and_then(|l| l.kot_number),
            is_new: false,
            is_billed: original.is_some_and(|l| l.is_billed),
            is_reverse: true,
            reverse_quantity: quantity,
            reverses: Some(target),
            nc: original.and_then(|l| l.nc.clone()),
            instruction: None,
        }
    }

    // ========== Accessors ==========

    pub fn table_id(&self) -> i64 {
        self.table_id
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, line_id: LineId) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn current_kot(&self) -> Option<KotNumber> {
        self.current_kot
    }

    pub fn order_ref(&self) -> Option<&str> {
        self.order_ref.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.lines.iter().any(|l| l.pending_delta() > 0)
    }

    // ========== Edits ==========

    /// Add a menu item, merging into an uncommitted line of the same item and price
    pub fn add_item(
        &mut self,
        item: &MenuItem,
        quantity: i64,
        instruction: Option<String>,
    ) -> EngineResult<LineId> {
        let quantity = money::validate_quantity(quantity)?;
        money::validate_price(item.price)?;

        if let Some(line) = self.lines.iter_mut().find(|l| {
            !l.is_reverse
                && !l.is_committed()
                && l.item_id == item.id
                && l.unit_price == item.price
        }) {
            let merged = line.quantity + quantity;
            if merged > MAX_QUANTITY {
                return Err(EngineError::OutOfRange(format!(
                    "quantity exceeds maximum allowed ({}), got {}",
                    MAX_QUANTITY, merged
                )));
            }
            line.quantity = merged;
            line.is_new = true;
            if instruction.is_some() {
                line.instruction = instruction;
            }
            return Ok(line.id);
        }

        let id = self.allocate_id();
        self.lines.push(LineItem {
            id,
            detail_id: None,
            item_id: item.id,
            item_name: item.name.clone(),
            unit_price: item.price,
            quantity,
            original_quantity: None,
            kot_number: None,
            is_new: true,
            is_billed: false,
            is_reverse: false,
            reverse_quantity: 0,
            reverses: None,
            nc: None,
            instruction,
        });
        Ok(id)
    }

    /// Set a line's quantity
    ///
    /// Returns `None` when an uncommitted line was removed.
    pub fn adjust_quantity(
        &mut self,
        line_id: LineId,
        quantity: i64,
    ) -> EngineResult<Option<LineId>> {
        let pos = self
            .lines
            .iter()
            .position(|l| l.id == line_id && !l.is_reverse)
            .ok_or(EngineError::LineNotFound(line_id))?;

        let line = &mut self.lines[pos];
        if !line.is_committed() {
            if quantity <= 0 {
                self.lines.remove(pos);
                return Ok(None);
            }
            line.quantity = money::validate_quantity(quantity)?;
            line.is_new = true;
            return Ok(Some(line_id));
        }

        let committed = line.committed_quantity();
        if quantity < i64::from(committed) {
            return Err(EngineError::CommittedQuantityLocked {
                line: line_id,
                committed,
            });
        }
        line.quantity = money::validate_quantity(quantity)?;
        line.is_new = line.quantity > committed;
        Ok(Some(line_id))
    }

    /// Set the kitchen instruction of an uncommitted line
    pub fn set_instruction(
        &mut self,
        line_id: LineId,
        instruction: Option<String>,
    ) -> EngineResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id && !l.is_reverse)
            .ok_or(EngineError::LineNotFound(line_id))?;
        if line.is_committed() {
            return Err(EngineError::Validation(format!(
                "line {} was already sent to the kitchen",
                line_id
            )));
        }
        line.instruction = instruction.filter(|s| !s.trim().is_empty());
        Ok(())
    }

    /// Discard every uncommitted edit; returns the number of lines touched
    pub fn clear(&mut self) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| l.is_reverse || l.is_committed());
        let mut touched = before - self.lines.len();
        for line in self.lines.iter_mut().filter(|l| l.pending_delta() > 0) {
            line.quantity = line.committed_quantity();
            line.is_new = false;
            touched += 1;
        }
        touched
    }

    // ========== Commit bookkeeping ==========

    pub(crate) fn lines_mut(&mut self) -> &mut Vec<LineItem> {
        &mut self.lines
    }

    pub(crate) fn next_line_id(&mut self) -> LineId {
        self.allocate_id()
    }

    pub(crate) fn set_current_kot(&mut self, kot: KotNumber) {
        self.current_kot = Some(kot);
    }

    /// Append a reversal record against a committed line
    pub fn push_reversal(&mut self, line_id: LineId, quantity: u32) -> EngineResult<LineId> {
        if !self
            .lines
            .iter()
            .any(|l| l.id == line_id && !l.is_reverse && l.is_committed())
        {
            return Err(EngineError::LineNotFound(line_id));
        }
        let record = self.reversal_record(line_id, quantity);
        let id = record.id;
        self.lines.push(record);
        Ok(id)
    }

    pub fn mark_billed(&mut self, billed: bool) {
        for line in &mut self.lines {
            line.is_billed = billed;
        }
    }

    // ========== Derived views ==========

    pub fn reversal_records(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.iter().filter(|l| l.is_reverse)
    }

    /// Quantity already reversed against a line
    pub fn reversed_quantity(&self, line_id: LineId) -> u32 {
        self.reversal_records()
            .filter(|r| r.reverses == Some(line_id))
            .map(|r| r.reverse_quantity)
            .sum()
    }

    /// Committed quantity still standing after reversals
    pub fn net_quantity(&self, line_id: LineId) -> u32 {
        self.line(line_id)
            .map(|l| l.committed_quantity().saturating_sub(self.reversed_quantity(line_id)))
            .unwrap_or(0)
    }

    /// Total of every line, reversals subtracted, non-chargeable included
    pub fn total(&self) -> Decimal {
        money::round_money(self.lines.iter().map(LineItem::value).sum())
    }

    pub fn chargeable_total(&self) -> Decimal {
        money::round_money(
            self.lines
                .iter()
                .filter(|l| !l.is_non_chargeable())
                .map(LineItem::value)
                .sum(),
        )
    }

    pub fn non_chargeable_total(&self) -> Decimal {
        money::round_money(
            self.lines
                .iter()
                .filter(|l| l.is_non_chargeable())
                .map(LineItem::value)
                .sum(),
        )
    }

    /// KOT tickets reconstructed from committed lines, ordered by number
    pub fn kots(&self) -> Vec<KotTicket> {
        let mut tickets: BTreeMap<KotNumber, KotTicket> = BTreeMap::new();
        for line in self.lines.iter().filter(|l| !l.is_reverse && l.is_committed()) {
            let Some(number) = line.kot_number else {
                continue;
            };
            let ticket = tickets.entry(number).or_insert_with(|| KotTicket {
                number,
                entries: Vec::new(),
                nc: line.nc.clone(),
            });
            ticket.entries.push(KotEntry {
                line_id: line.id,
                item_id: line.item_id,
                item_name: line.item_name.clone(),
                quantity: line.committed_quantity(),
                unit_price: line.unit_price,
            });
        }
        tickets.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::response::{OrderHeader, ReversedItem, UnbilledItem};

    fn dal() -> MenuItem {
        MenuItem::new(3, "Dal Makhani", dec!(120))
    }

    fn naan() -> MenuItem {
        MenuItem::new(4, "Butter Naan", dec!(40))
    }

    fn row(detail_id: i64, item_id: i64, price: Decimal, qty: u32, kot_no: u32) -> UnbilledItem {
        UnbilledItem {
            detail_id,
            item_id,
            item_name: format!("Item {}", item_id),
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

    fn snapshot(items: Vec<UnbilledItem>) -> UnbilledItems {
        UnbilledItems {
            items,
            reversed_items: vec![],
            current_kot_no: Some(12),
            header: OrderHeader {
                table_id: 5,
                order_ref: Some("ORD-1".into()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_load_leaves_nothing_pending() {
        let ledger = Ledger::from_snapshot(
            5,
            &snapshot(vec![row(100, 3, dec!(120), 2, 11), row(101, 4, dec!(40), 3, 12)]),
        );
        assert_eq!(ledger.lines().len(), 2);
        assert!(!ledger.has_pending());
        assert!(ledger.lines().iter().all(|l| l.original_quantity == Some(l.quantity)));
        assert_eq!(ledger.current_kot(), Some(12));
        assert_eq!(ledger.order_ref(), Some("ORD-1"));
        assert_eq!(ledger.total(), dec!(360));
    }

    #[test]
    fn test_load_links_reversals() {
        let mut snap = snapshot(vec![row(100, 3, dec!(120), 3, 11)]);
        snap.items[0].rev_qty = 2;
        snap.reversed_items.push(ReversedItem {
            reversal_id: 900,
            detail_id: 100,
            item_id: 3,
            item_name: "Item 3".into(),
            price: dec!(120),
            kot_no: 11,
            qty: 1,
        });
        snap.reversed_items.push(ReversedItem {
            reversal_id: 901,
            detail_id: 555,
            item_id: 9,
            item_name: "Ghost".into(),
            price: dec!(10),
            kot_no: 11,
            qty: 1,
        });
        let ledger = Ledger::from_snapshot(5, &snap);
        let original = ledger.lines()[0].id;
        // One listed record plus one synthesized for the unlisted remainder
        assert_eq!(ledger.reversal_records().count(), 2);
        assert_eq!(ledger.reversed_quantity(original), 2);
        assert_eq!(ledger.net_quantity(original), 1);
        assert_eq!(ledger.total(), dec!(120));
    }

    #[test]
    fn test_reload_keeps_line_ids() {
        let mut ledger = Ledger::from_snapshot(5, &snapshot(vec![row(100, 3, dec!(120), 2, 11)]));
        let id = ledger.lines()[0].id;
        ledger.load(&snapshot(vec![row(101, 4, dec!(40), 1, 12), row(100, 3, dec!(120), 2, 11)]));
        let reloaded = ledger.lines().iter().find(|l| l.detail_id == Some(100)).unwrap();
        assert_eq!(reloaded.id, id);
        let fresh = ledger.lines().iter().find(|l| l.detail_id == Some(101)).unwrap();
        assert_ne!(fresh.id, id);
    }

    #[test]
    fn test_add_item_merges_uncommitted() {
        let mut ledger = Ledger::new(5);
        let a = ledger.add_item(&dal(), 2, None).unwrap();
        let b = ledger.add_item(&dal(), 1, Some("less spicy".into())).unwrap();
        let c = ledger.add_item(&naan(), 4, None).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        let line = ledger.line(a).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.instruction.as_deref(), Some("less spicy"));
        assert!(ledger.has_pending());
    }

    #[test]
    fn test_add_item_does_not_merge_committed() {
        let mut ledger = Ledger::from_snapshot(5, &snapshot(vec![row(100, 3, dec!(120), 2, 11)]));
        let committed = ledger.lines()[0].id;
        let added = ledger.add_item(&dal(), 1, None).unwrap();
        assert_ne!(committed, added);
        assert_eq!(ledger.line(committed).unwrap().quantity, 2);
    }

    #[test]
    fn test_add_item_limits() {
        let mut ledger = Ledger::new(5);
        assert!(ledger.add_item(&dal(), 0, None).is_err());
        ledger.add_item(&dal(), 9999, None).unwrap();
        assert!(matches!(
            ledger.add_item(&dal(), 1, None),
            Err(EngineError::OutOfRange(_))
        ));
        let pricey = MenuItem::new(8, "Caviar", dec!(1000000.01));
        assert!(ledger.add_item(&pricey, 1, None).is_err());
    }

    #[test]
    fn test_adjust_uncommitted_to_zero_removes() {
        let mut ledger = Ledger::new(5);
        let a = ledger.add_item(&dal(), 2, None).unwrap();
        let b = ledger.add_item(&naan(), 1, None).unwrap();
        assert_eq!(ledger.adjust_quantity(a, 0).unwrap(), None);
        assert!(ledger.line(a).is_none());
        // Untouched line is unchanged
        assert_eq!(ledger.line(b).unwrap().quantity, 1);
        assert_eq!(ledger.line(b).unwrap().id, b);
    }

    #[test]
    fn test_adjust_committed_cannot_drop_below_committed() {
        let mut ledger = Ledger::from_snapshot(5, &snapshot(vec![row(100, 3, dec!(120), 2, 11)]));
        let id = ledger.lines()[0].id;
        assert!(matches!(
            ledger.adjust_quantity(id, 0),
            Err(EngineError::CommittedQuantityLocked { committed: 2, .. })
        ));
        assert!(matches!(
            ledger.adjust_quantity(id, 1),
            Err(EngineError::CommittedQuantityLocked { .. })
        ));
        ledger.adjust_quantity(id, 5).unwrap();
        assert_eq!(ledger.line(id).unwrap().pending_delta(), 3);
        assert!(ledger.line(id).unwrap().is_new);
        ledger.adjust_quantity(id, 2).unwrap();
        assert!(!ledger.line(id).unwrap().is_new);
        assert!(!ledger.has_pending());
    }

    #[test]
    fn test_adjust_unknown_line() {
        let mut ledger = Ledger::new(5);
        assert!(matches!(
            ledger.adjust_quantity(LineId(77), 1),
            Err(EngineError::LineNotFound(LineId(77)))
        ));
    }

    #[test]
    fn test_set_instruction_only_before_commit() {
        let mut ledger = Ledger::from_snapshot(5, &snapshot(vec![row(100, 3, dec!(120), 2, 11)]));
        let committed = ledger.lines()[0].id;
        assert!(ledger.set_instruction(committed, Some("hot".into())).is_err());
        let fresh = ledger.add_item(&naan(), 1, None).unwrap();
        ledger.set_instruction(fresh, Some("extra butter".into())).unwrap();
        assert_eq!(ledger.line(fresh).unwrap().instruction.as_deref(), Some("extra butter"));
        ledger.set_instruction(fresh, Some("  ".into())).unwrap();
        assert!(ledger.line(fresh).unwrap().instruction.is_none());
    }

    #[test]
    fn test_clear_discards_only_uncommitted() {
        let mut ledger = Ledger::from_snapshot(5, &snapshot(vec![row(100, 3, dec!(120), 2, 11)]));
        let committed = ledger.lines()[0].id;
        ledger.adjust_quantity(committed, 4).unwrap();
        ledger.add_item(&naan(), 3, None).unwrap();
        assert_eq!(ledger.clear(), 2);
        assert_eq!(ledger.lines().len(), 1);
        assert_eq!(ledger.line(committed).unwrap().quantity, 2);
        assert!(!ledger.has_pending());
    }

    #[test]
    fn test_totals_split_non_chargeable() {
        let mut snap = snapshot(vec![row(100, 3, dec!(120), 2, 11), row(101, 4, dec!(40), 1, 12)]);
        snap.items[1].nc_name = Some("Staff meal".into());
        let ledger = Ledger::from_snapshot(5, &snap);
        assert_eq!(ledger.total(), dec!(280));
        assert_eq!(ledger.chargeable_total(), dec!(240));
        assert_eq!(ledger.non_chargeable_total(), dec!(40));
        let nc = ledger.lines()[1].nc.as_ref().unwrap();
        assert_eq!(nc.name, "Staff meal");
        assert_eq!(nc.purpose, "");
    }

    #[test]
    fn test_kots_grouped_by_number() {
        let ledger = Ledger::from_snapshot(
            5,
            &snapshot(vec![
                row(100, 3, dec!(120), 2, 11),
                row(101, 4, dec!(40), 3, 12),
                row(102, 5, dec!(60), 1, 11),
            ]),
        );
        let kots = ledger.kots();
        assert_eq!(kots.len(), 2);
        assert_eq!(kots[0].number, 11);
        assert_eq!(kots[0].entries.len(), 2);
        assert_eq!(kots[0].total_quantity(), 3);
        assert_eq!(kots[1].number, 12);
    }

    #[test]
    fn test_push_reversal_requires_committed_line() {
        let mut ledger = Ledger::from_snapshot(5, &snapshot(vec![row(100, 3, dec!(120), 2, 11)]));
        let id = ledger.lines()[0].id;
        let rev = ledger.push_reversal(id, 1).unwrap();
        let record = ledger.line(rev).unwrap();
        assert!(record.is_reverse);
        assert_eq!(record.reverses, Some(id));
        assert_eq!(record.kot_number, Some(11));
        assert_eq!(ledger.line(id).unwrap().quantity, 2);
        assert_eq!(ledger.net_quantity(id), 1);

        let fresh = ledger.add_item(&naan(), 1, None).unwrap();
        assert!(ledger.push_reversal(fresh, 1).is_err());
    }
}
