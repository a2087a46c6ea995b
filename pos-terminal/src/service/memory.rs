//! In-process persistence service
//!
//! Keeps orders, per-KOT detail rows, reversal rows and settlements the way
//! the real service does, and can be told to fail specific operations.

use super::PosService;
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{Table, TableStatus, TaxRates};
use shared::order::{Discount, KotNumber, NcTag, SettlementRecord};
use shared::request::{
    CreateKotRequest, DeleteSettlementRequest, MarkBillPrintedRequest, ReverseQuantityRequest,
    SetPaxRequest, SetTableStatusRequest, SettleBillRequest, TransferKotRequest,
    TransferTableRequest,
};
use shared::response::{CreateKotResponse, OrderHeader, ReversedItem, UnbilledItem, UnbilledItems};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Operations of the service, for call logs and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOp {
    ListTables,
    GetUnbilledItems,
    CreateKot,
    ReverseQuantity,
    GetTaxRates,
    MarkBillPrinted,
    SettleBill,
    DeleteSettlement,
    TransferTable,
    TransferKot,
    SetPax,
    SetTableStatus,
}

/// One settlement deletion, as recorded in the edit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementEdit {
    pub settlement_id: i64,
    pub edited_by: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
struct Order {
    id: i64,
    order_ref: String,
    table_id: i64,
    open: bool,
    discount: Option<Discount>,
}

#[derive(Debug, Clone)]
struct DetailRow {
    detail_id: i64,
    order_id: i64,
    item_id: i64,
    item_name: String,
    price: Decimal,
    qty: u32,
    kot_no: KotNumber,
    nc: Option<NcTag>,
    instruction: Option<String>,
    is_billed: bool,
}

#[derive(Debug, Clone)]
struct ReversalRow {
    reversal_id: i64,
    detail_id: i64,
    qty: u32,
}

#[derive(Debug, Clone)]
struct SettlementRow {
    order_id: i64,
    record: SettlementRecord,
    deleted: bool,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<i64, Table>,
    orders: Vec<Order>,
    details: Vec<DetailRow>,
    reversals: Vec<ReversalRow>,
    settlements: Vec<SettlementRow>,
    edit_log: Vec<SettlementEdit>,
    tax_rates: HashMap<(i64, i64), TaxRates>,
    last_kot: KotNumber,
    next_id: i64,
    calls: Vec<ServiceOp>,
    /// Remaining successful calls before the op fails once
    failures: HashMap<ServiceOp, u32>,
}

fn reject(code: ErrorCode, message: impl Into<String>) -> EngineError {
    EngineError::Rejected(AppError::with_message(code, message))
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn enter(&mut self, op: ServiceOp) -> EngineResult<()> {
        self.calls.push(op);
        if let Some(remaining) = self.failures.get_mut(&op) {
            if *remaining == 0 {
                self.failures.remove(&op);
                return Err(EngineError::Unavailable(format!("{:?} failed", op)));
            }
            *remaining -= 1;
        }
        Ok(())
    }

    fn table_mut(&mut self, table_id: i64) -> EngineResult<&mut Table> {
        self.tables
            .get_mut(&table_id)
            .ok_or_else(|| reject(ErrorCode::TableNotFound, format!("table {}", table_id)))
    }

    fn open_order(&self, table_id: i64) -> Option<&Order> {
        self.orders.iter().find(|o| o.open && o.table_id == table_id)
    }

    fn open_order_id(&self, table_id: i64) -> Option<i64> {
        self.open_order(table_id).map(|o| o.id)
    }

    fn ensure_order(&mut self, table_id: i64) -> i64 {
        if let Some(id) = self.open_order_id(table_id) {
            return id;
        }
        let id = self.next_id();
        self.orders.push(Order {
            id,
            order_ref: format!("ORD-{}", id),
            table_id,
            open: true,
            discount: None,
        });
        id
    }

    fn close_order(&mut self, order_id: i64) {
        if let Some(order) = self.orders.iter_mut().find(|o| o.id == order_id) {
            order.open = false;
        }
    }

    fn reversed_qty(&self, detail_id: i64) -> u32 {
        self.reversals
            .iter()
            .filter(|r| r.detail_id == detail_id)
            .map(|r| r.qty)
            .sum()
    }

    fn net_qty(&self, row: &DetailRow) -> u32 {
        row.qty.saturating_sub(self.reversed_qty(row.detail_id))
    }

    fn has_open_items(&self, order_id: i64) -> bool {
        self.details
            .iter()
            .any(|d| d.order_id == order_id && self.net_qty(d) > 0)
    }

    fn set_status(&mut self, table_id: i64, status: TableStatus) {
        if let Some(table) = self.tables.get_mut(&table_id) {
            table.status = status;
            table.is_billed = status == TableStatus::Billed;
            if status == TableStatus::Vacant {
                table.pax = None;
            }
        }
    }

    fn snapshot(&self, table_id: i64) -> UnbilledItems {
        let table = self.tables.get(&table_id);
        let mut header = OrderHeader {
            table_id,
            status: table.map(|t| t.status),
            pax: table.and_then(|t| t.pax),
            ..Default::default()
        };
        let Some(order) = self.open_order(table_id) else {
            return UnbilledItems {
                header,
                ..Default::default()
            };
        };
        header.order_ref = Some(order.order_ref.clone());
        header.discount = order.discount.clone();

        let rows: Vec<&DetailRow> = self
            .details
            .iter()
            .filter(|d| d.order_id == order.id)
            .collect();

        let items = rows
            .iter()
            .map(|d| UnbilledItem {
                detail_id: d.detail_id,
                item_id: d.item_id,
                item_name: d.item_name.clone(),
                price: d.price,
                qty: d.qty,
                rev_qty: self.reversed_qty(d.detail_id),
                kot_no: d.kot_no,
                nc_name: d.nc.as_ref().map(|nc| nc.name.clone()),
                nc_purpose: d.nc.as_ref().map(|nc| nc.purpose.clone()),
                instruction: d.instruction.clone(),
                is_billed: d.is_billed,
            })
            .collect();

        let reversed_items = self
            .reversals
            .iter()
            .filter_map(|r| {
                let d = rows.iter().find(|d| d.detail_id == r.detail_id)?;
                Some(ReversedItem {
                    reversal_id: r.reversal_id,
                    detail_id: d.detail_id,
                    item_id: d.item_id,
                    item_name: d.item_name.clone(),
                    price: d.price,
                    kot_no: d.kot_no,
                    qty: r.qty,
                })
            })
            .collect();

        UnbilledItems {
            items,
            reversed_items,
            current_kot_no: rows.iter().map(|d| d.kot_no).max(),
            header,
        }
    }
}

/// In-memory persistence service; clones share state
#[derive(Debug, Clone, Default)]
pub struct InMemoryService {
    state: Arc<Mutex<State>>,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: Table) -> Self {
        self.state.lock().tables.insert(table.id, table);
        self
    }

    pub fn with_tax_rates(self, outlet_id: i64, department_id: i64, rates: TaxRates) -> Self {
        self.state
            .lock()
            .tax_rates
            .insert((outlet_id, department_id), rates);
        self
    }

    /// Fail the next call of `op`
    pub fn fail_next(&self, op: ServiceOp) {
        self.fail_after(op, 0);
    }

    /// Let `successes` calls of `op` through, then fail one
    pub fn fail_after(&self, op: ServiceOp, successes: u32) {
        self.state.lock().failures.insert(op, successes);
    }

    pub fn table(&self, table_id: i64) -> Option<Table> {
        self.state.lock().tables.get(&table_id).cloned()
    }

    pub fn order_ref(&self, table_id: i64) -> Option<String> {
        self.state
            .lock()
            .open_order(table_id)
            .map(|o| o.order_ref.clone())
    }

    pub fn calls(&self) -> Vec<ServiceOp> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, op: ServiceOp) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == op).count()
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Settlement records not yet deleted, across all orders
    pub fn active_settlements(&self) -> Vec<SettlementRecord> {
        self.state
            .lock()
            .settlements
            .iter()
            .filter(|s| !s.deleted)
            .map(|s| s.record.clone())
            .collect()
    }

    pub fn edit_log(&self) -> Vec<SettlementEdit> {
        self.state.lock().edit_log.clone()
    }

    /// Net value of a table's open order
    pub fn table_total(&self, table_id: i64) -> Decimal {
        let state = self.state.lock();
        let Some(order_id) = state.open_order_id(table_id) else {
            return Decimal::ZERO;
        };
        state
            .details
            .iter()
            .filter(|d| d.order_id == order_id)
            .map(|d| Decimal::from(state.net_qty(d)) * d.price)
            .sum()
    }
}

#[async_trait]
impl PosService for InMemoryService {
    async fn list_tables(&self, department_id: Option<i64>) -> EngineResult<Vec<Table>> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::ListTables)?;
        Ok(state
            .tables
            .values()
            .filter(|t| department_id.is_none_or(|d| t.department_id == d))
            .cloned()
            .collect())
    }

    async fn get_unbilled_items(&self, table_id: i64) -> EngineResult<UnbilledItems> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::GetUnbilledItems)?;
        state.table_mut(table_id)?;
        Ok(state.snapshot(table_id))
    }

    async fn create_kot(&self, request: &CreateKotRequest) -> EngineResult<CreateKotResponse> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::CreateKot)?;
        let table = state.table_mut(request.table_id)?;
        if table.status == TableStatus::Billed && request.approved_by.is_none() {
            return Err(reject(
                ErrorCode::TableBilled,
                format!("table {} is billed", request.table_id),
            ));
        }
        if request.items.is_empty() || request.items.iter().any(|i| i.delta_qty == 0) {
            return Err(reject(ErrorCode::NothingToCommit, "empty KOT"));
        }

        let order_id = state.ensure_order(request.table_id);
        state.last_kot += 1;
        let kot_no = state.last_kot;
        for item in &request.items {
            let detail_id = state.next_id();
            state.details.push(DetailRow {
                detail_id,
                order_id,
                item_id: item.item_id,
                item_name: item.item_name.clone(),
                price: item.unit_price,
                qty: item.delta_qty,
                kot_no,
                nc: request.nc.clone(),
                instruction: item.instruction.clone(),
                is_billed: false,
            });
        }
        state.set_status(request.table_id, TableStatus::Occupied);
        Ok(CreateKotResponse { kot_no })
    }

    async fn reverse_quantity(&self, request: &ReverseQuantityRequest) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::ReverseQuantity)?;
        let order_id = state
            .open_order_id(request.table_id)
            .ok_or_else(|| reject(ErrorCode::NotFound, "no open order"))?;
        let row = state
            .details
            .iter()
            .find(|d| d.detail_id == request.detail_id && d.order_id == order_id)
            .cloned()
            .ok_or_else(|| reject(ErrorCode::LineNotFound, format!("detail {}", request.detail_id)))?;
        if row.kot_no != request.kot_no {
            return Err(reject(
                ErrorCode::KotNotFound,
                format!("detail {} is not in KOT {}", row.detail_id, request.kot_no),
            ));
        }
        let remaining = state.net_qty(&row);
        if request.quantity == 0 || request.quantity > remaining {
            return Err(reject(
                ErrorCode::OverReversal,
                format!("{} requested, {} remaining", request.quantity, remaining),
            ));
        }
        let reversal_id = state.next_id();
        state.reversals.push(ReversalRow {
            reversal_id,
            detail_id: row.detail_id,
            qty: request.quantity,
        });
        Ok(())
    }

    async fn get_tax_rates(
        &self,
        outlet_id: i64,
        department_id: i64,
    ) -> EngineResult<Option<TaxRates>> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::GetTaxRates)?;
        Ok(state.tax_rates.get(&(outlet_id, department_id)).copied())
    }

    async fn mark_bill_printed(&self, request: &MarkBillPrintedRequest) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::MarkBillPrinted)?;
        let status = state.table_mut(request.table_id)?.status;
        if !matches!(status, TableStatus::Occupied | TableStatus::Printed) {
            return Err(reject(
                ErrorCode::InvalidTransition,
                format!("cannot print a {} table", status),
            ));
        }
        let discount = request.bill.discount.clone();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.open && o.table_id == request.table_id)
            .ok_or_else(|| reject(ErrorCode::NotFound, "no open order"))?;
        order.discount = discount;
        state.set_status(request.table_id, TableStatus::Printed);
        Ok(())
    }

    async fn settle_bill(
        &self,
        request: &SettleBillRequest,
    ) -> EngineResult<Vec<SettlementRecord>> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::SettleBill)?;
        let status = state.table_mut(request.table_id)?.status;
        let order_id = state
            .open_order(request.table_id)
            .filter(|o| o.order_ref == request.order_ref)
            .map(|o| o.id)
            .ok_or_else(|| reject(ErrorCode::NotFound, format!("order {}", request.order_ref)))?;
        if status != TableStatus::Printed {
            return Err(reject(
                ErrorCode::InvalidTransition,
                format!("cannot settle a {} table", status),
            ));
        }
        let tendered: Decimal =
            request.payments.iter().map(|p| p.amount).sum::<Decimal>() + request.tip;
        if tendered != request.grand_total {
            return Err(reject(
                ErrorCode::SettlementMismatch,
                format!("{} tendered for {}", tendered, request.grand_total),
            ));
        }

        let settled_at = Utc::now();
        let mut records = Vec::with_capacity(request.payments.len());
        for payment in &request.payments {
            let record = SettlementRecord {
                settlement_id: state.next_id(),
                order_ref: request.order_ref.clone(),
                payment_mode: payment.mode.clone(),
                amount: payment.amount,
                settled_at,
            };
            state.settlements.push(SettlementRow {
                order_id,
                record: record.clone(),
                deleted: false,
            });
            records.push(record);
        }
        for row in state.details.iter_mut().filter(|d| d.order_id == order_id) {
            row.is_billed = true;
        }
        state.set_status(request.table_id, TableStatus::Billed);
        Ok(records)
    }

    async fn delete_settlement(
        &self,
        settlement_id: i64,
        request: &DeleteSettlementRequest,
    ) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::DeleteSettlement)?;
        let row = state
            .settlements
            .iter_mut()
            .find(|s| s.record.settlement_id == settlement_id && !s.deleted)
            .ok_or_else(|| {
                reject(
                    ErrorCode::SettlementNotFound,
                    format!("settlement {}", settlement_id),
                )
            })?;
        row.deleted = true;
        let order_id = row.order_id;
        state.edit_log.push(SettlementEdit {
            settlement_id,
            edited_by: request.edited_by,
            reason: request.reason.clone(),
        });

        let still_settled = state
            .settlements
            .iter()
            .any(|s| s.order_id == order_id && !s.deleted);
        if !still_settled {
            for row in state.details.iter_mut().filter(|d| d.order_id == order_id) {
                row.is_billed = false;
            }
            let table_id = state
                .orders
                .iter()
                .find(|o| o.id == order_id && o.open)
                .map(|o| o.table_id);
            if let Some(table_id) = table_id {
                state.set_status(table_id, TableStatus::Printed);
            }
        }
        Ok(())
    }

    async fn transfer_table(&self, request: &TransferTableRequest) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::TransferTable)?;
        let (source, dest) = (request.source_table_id, request.dest_table_id);
        if source == dest {
            return Err(reject(ErrorCode::SameTable, "source equals destination"));
        }
        state.table_mut(source)?;
        let dest_status = state.table_mut(dest)?.status;
        if !dest_status.accepts_transfer() {
            return Err(reject(
                ErrorCode::TableClosed,
                format!("table {} is {}", dest, dest_status),
            ));
        }
        let source_order = state
            .open_order_id(source)
            .filter(|id| state.has_open_items(*id))
            .ok_or_else(|| reject(ErrorCode::NothingToTransfer, format!("table {}", source)))?;

        match state.open_order_id(dest) {
            Some(dest_order) => {
                for row in state.details.iter_mut().filter(|d| d.order_id == source_order) {
                    row.order_id = dest_order;
                }
                state.close_order(source_order);
            }
            None => {
                if let Some(order) = state.orders.iter_mut().find(|o| o.id == source_order) {
                    order.table_id = dest;
                }
            }
        }

        let pax = state.tables.get(&source).and_then(|t| t.pax);
        state.set_status(source, TableStatus::Vacant);
        state.set_status(dest, TableStatus::Occupied);
        if let Some(table) = state.tables.get_mut(&dest) {
            table.pax = table.pax.or(pax);
        }
        Ok(())
    }

    async fn transfer_kot(&self, request: &TransferKotRequest) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::TransferKot)?;
        let (source, dest) = (request.source_table_id, request.dest_table_id);
        if source == dest {
            return Err(reject(ErrorCode::SameTable, "source equals destination"));
        }
        state.table_mut(source)?;
        let dest_status = state.table_mut(dest)?.status;
        if !dest_status.accepts_transfer() {
            return Err(reject(
                ErrorCode::TableClosed,
                format!("table {} is {}", dest, dest_status),
            ));
        }
        let source_order = state
            .open_order_id(source)
            .ok_or_else(|| reject(ErrorCode::NotFound, format!("no open order on {}", source)))?;

        let in_kot: Vec<i64> = state
            .details
            .iter()
            .filter(|d| d.order_id == source_order && d.kot_no == request.kot_no)
            .map(|d| d.detail_id)
            .collect();
        if in_kot.is_empty() {
            return Err(reject(
                ErrorCode::KotNotFound,
                format!("KOT {} on table {}", request.kot_no, source),
            ));
        }
        let moving: Vec<i64> = if request.detail_ids.is_empty() {
            in_kot
        } else {
            if let Some(missing) = request.detail_ids.iter().find(|id| !in_kot.contains(id)) {
                return Err(reject(
                    ErrorCode::LineNotFound,
                    format!("detail {} is not in KOT {}", missing, request.kot_no),
                ));
            }
            request.detail_ids.clone()
        };

        let dest_order = state.ensure_order(dest);
        for row in state
            .details
            .iter_mut()
            .filter(|d| moving.contains(&d.detail_id))
        {
            row.order_id = dest_order;
        }

        if !state.has_open_items(source_order) {
            state.close_order(source_order);
            state.set_status(source, TableStatus::Vacant);
        }
        state.set_status(dest, TableStatus::Occupied);
        Ok(())
    }

    async fn set_pax(&self, request: &SetPaxRequest) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::SetPax)?;
        state.table_mut(request.table_id)?.pax = Some(request.pax);
        Ok(())
    }

    async fn set_table_status(&self, request: &SetTableStatusRequest) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.enter(ServiceOp::SetTableStatus)?;
        state.table_mut(request.table_id)?;
        if request.status == TableStatus::Vacant {
            if let Some(order_id) = state.open_order_id(request.table_id) {
                state.close_order(order_id);
            }
        }
        state.set_status(request.table_id, request.status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::order::{KotDelta, LineId, PaymentLine, UnitTax};

    fn service() -> InMemoryService {
        InMemoryService::new()
            .with_table(Table::new(1, "T1", 10, 1))
            .with_table(Table::new(2, "T2", 10, 1))
    }

    fn delta(item_id: i64, qty: u32, price: Decimal) -> KotDelta {
        KotDelta {
            line_id: LineId(item_id as u32),
            item_id,
            item_name: format!("Item {}", item_id),
            delta_qty: qty,
            unit_price: price,
            unit_tax: UnitTax::default(),
            instruction: None,
        }
    }

    async fn kot(svc: &InMemoryService, table_id: i64, items: Vec<KotDelta>) -> KotNumber {
        svc.create_kot(&CreateKotRequest {
            table_id,
            items,
            nc: None,
            approved_by: None,
        })
        .await
        .unwrap()
        .kot_no
    }

    #[tokio::test]
    async fn test_kot_numbers_are_global() {
        let svc = service();
        assert_eq!(kot(&svc, 1, vec![delta(1, 2, dec!(100))]).await, 1);
        assert_eq!(kot(&svc, 2, vec![delta(2, 1, dec!(50))]).await, 2);
        assert_eq!(kot(&svc, 1, vec![delta(1, 3, dec!(100))]).await, 3);

        let snap = svc.get_unbilled_items(1).await.unwrap();
        assert_eq!(snap.items.len(), 2);
        assert_eq!(snap.current_kot_no, Some(3));
        assert_eq!(snap.header.status, Some(TableStatus::Occupied));
        assert_eq!(svc.table_total(1), dec!(500));
    }

    #[tokio::test]
    async fn test_reverse_quantity_bounds() {
        let svc = service();
        let kot_no = kot(&svc, 1, vec![delta(1, 2, dec!(100))]).await;
        let detail_id = svc.get_unbilled_items(1).await.unwrap().items[0].detail_id;
        let req = ReverseQuantityRequest {
            table_id: 1,
            detail_id,
            item_id: 1,
            kot_no,
            quantity: 2,
        };
        svc.reverse_quantity(&req).await.unwrap();
        let err = svc.reverse_quantity(&req).await.unwrap_err();
        assert!(matches!(err, EngineError::Rejected(ref e) if e.code == ErrorCode::OverReversal));

        let snap = svc.get_unbilled_items(1).await.unwrap();
        assert_eq!(snap.items[0].rev_qty, 2);
        assert_eq!(snap.reversed_items.len(), 1);
    }

    #[tokio::test]
    async fn test_settle_and_delete() {
        let svc = service();
        kot(&svc, 1, vec![delta(1, 1, dec!(300))]).await;
        let order_ref = svc.order_ref(1).unwrap();
        svc.set_table_status(&SetTableStatusRequest {
            table_id: 1,
            status: TableStatus::Printed,
        })
        .await
        .unwrap();

        let records = svc
            .settle_bill(&SettleBillRequest {
                table_id: 1,
                order_ref: order_ref.clone(),
                payments: vec![
                    PaymentLine {
                        mode: "Cash".into(),
                        amount: dec!(100),
                    },
                    PaymentLine {
                        mode: "Card".into(),
                        amount: dec!(200),
                    },
                ],
                tip: Decimal::ZERO,
                grand_total: dec!(300),
            })
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(svc.table(1).unwrap().status, TableStatus::Billed);

        let req = DeleteSettlementRequest {
            edited_by: 9,
            reason: Some("wrong mode".into()),
        };
        svc.delete_settlement(records[0].settlement_id, &req).await.unwrap();
        assert_eq!(svc.table(1).unwrap().status, TableStatus::Billed);
        svc.delete_settlement(records[1].settlement_id, &req).await.unwrap();
        assert_eq!(svc.table(1).unwrap().status, TableStatus::Printed);
        assert!(svc.active_settlements().is_empty());
        assert_eq!(svc.edit_log().len(), 2);
        assert!(svc.delete_settlement(records[1].settlement_id, &req).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let svc = service();
        svc.fail_after(ServiceOp::ListTables, 1);
        assert!(svc.list_tables(None).await.is_ok());
        assert!(matches!(
            svc.list_tables(None).await,
            Err(EngineError::Unavailable(_))
        ));
        assert_eq!(svc.list_tables(Some(10)).await.unwrap().len(), 2);
        assert_eq!(svc.call_count(ServiceOp::ListTables), 3);
    }

    #[tokio::test]
    async fn test_transfer_kot_moves_rows() {
        let svc = service();
        let first = kot(&svc, 1, vec![delta(1, 1, dec!(100)), delta(2, 1, dec!(150))]).await;
        kot(&svc, 1, vec![delta(3, 1, dec!(250))]).await;
        svc.transfer_kot(&TransferKotRequest {
            source_table_id: 1,
            kot_no: first,
            dest_table_id: 2,
            detail_ids: vec![],
        })
        .await
        .unwrap();
        assert_eq!(svc.table_total(1), dec!(250));
        assert_eq!(svc.table_total(2), dec!(250));
        assert_eq!(svc.table(2).unwrap().status, TableStatus::Occupied);
        assert_eq!(svc.table(1).unwrap().status, TableStatus::Occupied);
    }

    #[tokio::test]
    async fn test_transfer_table_empties_source() {
        let svc = service();
        kot(&svc, 1, vec![delta(1, 2, dec!(100))]).await;
        let order_ref = svc.order_ref(1);
        svc.transfer_table(&TransferTableRequest {
            source_table_id: 1,
            dest_table_id: 2,
        })
        .await
        .unwrap();
        assert_eq!(svc.table(1).unwrap().status, TableStatus::Vacant);
        assert_eq!(svc.order_ref(2), order_ref);
        assert!(svc.order_ref(1).is_none());
        assert_eq!(svc.table_total(2), dec!(200));
    }
}
