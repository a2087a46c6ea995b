//! Terminal - per-table order lifecycle orchestration
//!
//! # Session protocol
//!
//! ```text
//! select ──► Clean ──edit──► Dirty ──commit──► AwaitingReconcile ──refetch──► Clean
//!              ▲                │                                              │
//!              └──── clear ─────┘◄─────────────────────────────────────────────┘
//! ```
//!
//! - Local edits never touch the service
//! - Every persistence-affecting operation is followed by a full refetch
//! - Edits are refused until that refetch succeeds
//! - All mutators take `&mut self`: one in-flight mutation per terminal

use crate::TerminalConfig;
use crate::error::{EngineError, EngineResult};
use crate::kot;
use crate::ledger::Ledger;
use crate::money;
use crate::registry::TableRegistry;
use crate::reversal;
use crate::service::PosService;
use crate::settlement;
use crate::tax::{self, RoundOff, TaxRateCache};
use crate::transfer;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use shared::models::{Approver, MenuItem, Table, TableEvent, TableStatus, TaxRates};
use shared::order::{
    Bill, CommandResponse, Discount, KotNumber, KotTicket, LineId, NcTag, ReverseKotEntry,
    ReverseKotTicket, SessionState, Settlement, TableView, TerminalCommand,
    TerminalCommandPayload, TransferOperation,
};
use shared::request::{
    CreateKotRequest, DeleteSettlementRequest, MarkBillPrintedRequest, SetPaxRequest,
    SetTableStatusRequest,
};
use shared::response::OrderHeader;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Local state of one opened table
#[derive(Debug, Clone)]
pub struct TableSession {
    pub ledger: Ledger,
    pub discount: Option<Discount>,
    pub state: SessionState,
    pub settlement: Option<Settlement>,
    pub rates: TaxRates,
}

impl TableSession {
    fn touch(&mut self) {
        if self.state == SessionState::AwaitingReconcile {
            return;
        }
        self.state = if self.ledger.has_pending() {
            SessionState::Dirty
        } else {
            SessionState::Clean
        };
    }
}

pub struct Terminal<S: PosService> {
    service: S,
    config: Arc<TerminalConfig>,
    registry: TableRegistry,
    tax_cache: Arc<TaxRateCache>,
    sessions: HashMap<i64, TableSession>,
}

impl<S: PosService> Terminal<S> {
    pub fn new(service: S, config: TerminalConfig) -> Self {
        Self::with_shared(service, Arc::new(config), Arc::new(TaxRateCache::new()))
    }

    /// Build a terminal sharing configuration and the tax-rate cache with others
    pub fn with_shared(
        service: S,
        config: Arc<TerminalConfig>,
        tax_cache: Arc<TaxRateCache>,
    ) -> Self {
        Self {
            registry: TableRegistry::new(config.outlet_id),
            service,
            config,
            tax_cache,
            sessions: HashMap::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn tax_cache(&self) -> &Arc<TaxRateCache> {
        &self.tax_cache
    }

    pub fn session(&self, table_id: i64) -> Option<&TableSession> {
        self.sessions.get(&table_id)
    }

    fn round_off(&self) -> RoundOff {
        if self.config.round_off_enabled {
            RoundOff::to_step(self.config.round_off_to)
        } else {
            RoundOff::disabled()
        }
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    fn session_ref(&self, table_id: i64) -> EngineResult<&TableSession> {
        self.sessions
            .get(&table_id)
            .ok_or_else(|| EngineError::Internal(format!("no session for table {}", table_id)))
    }

    fn session_mut(&mut self, table_id: i64) -> EngineResult<&mut TableSession> {
        self.sessions
            .get_mut(&table_id)
            .ok_or_else(|| EngineError::Internal(format!("no session for table {}", table_id)))
    }

    /// Make sure the table is in the directory, refreshing it once on a miss
    async fn ensure_table(&mut self, table_id: i64) -> EngineResult<()> {
        if self.registry.select(table_id).is_ok() {
            return Ok(());
        }
        self.refresh_tables().await?;
        self.registry.select(table_id).map(|_| ())
    }

    async fn ensure_session(&mut self, table_id: i64) -> EngineResult<()> {
        if self.sessions.contains_key(&table_id) {
            return Ok(());
        }
        self.open_session(table_id).await
    }

    async fn open_session(&mut self, table_id: i64) -> EngineResult<()> {
        self.ensure_table(table_id).await?;
        let snapshot = self.service.get_unbilled_items(table_id).await?;
        let department_id = self.registry.select(table_id)?.department_id;
        let rates = self.resolve_rates(department_id).await;

        self.sync_header(table_id, &snapshot.header)?;
        let session = TableSession {
            ledger: Ledger::from_snapshot(table_id, &snapshot),
            discount: snapshot.header.discount.clone(),
            state: SessionState::Clean,
            settlement: None,
            rates,
        };
        tracing::debug!(
            table_id,
            lines = session.ledger.lines().len(),
            order_ref = ?session.ledger.order_ref(),
            "Table session opened"
        );
        self.sessions.insert(table_id, session);
        self.recheck_discount(table_id)
    }

    /// Replace the session's ledger with the service's view
    async fn refetch(&mut self, table_id: i64) -> EngineResult<()> {
        let snapshot = self.service.get_unbilled_items(table_id).await?;
        self.sync_header(table_id, &snapshot.header)?;
        let billed = self.registry.status(table_id)? == TableStatus::Billed;

        let session = self.session_mut(table_id)?;
        session.ledger.load(&snapshot);
        if session.discount.is_none() {
            session.discount = snapshot.header.discount.clone();
        }
        if !billed {
            session.settlement = None;
        }
        session.state = SessionState::Clean;
        self.recheck_discount(table_id)
    }

    /// Refetch after a committed mutation; a failure leaves the session awaiting reconcile
    async fn refetch_after_commit(&mut self, table_id: i64) {
        if let Err(e) = self.refetch(table_id).await {
            tracing::warn!(table_id, error = %e, "Refetch after commit failed, reconcile required");
        }
    }

    /// Re-check the stored discount against the current subtotal
    ///
    /// A discount that no longer passes its range or approval check is dropped.
    fn recheck_discount(&mut self, table_id: i64) -> EngineResult<()> {
        let threshold = self.config.discount_approval_threshold;
        let session = self.session_mut(table_id)?;
        let Some(discount) = session.discount.as_ref() else {
            return Ok(());
        };
        let subtotal = tax::discount_base(&session.ledger);
        if let Err(e) = tax::validate_discount(discount, subtotal, threshold) {
            tracing::warn!(table_id, subtotal = %subtotal, error = %e, "Discount no longer valid, removed");
            session.discount = None;
        }
        Ok(())
    }

    fn sync_header(&mut self, table_id: i64, header: &OrderHeader) -> EngineResult<()> {
        if let Some(status) = header.status {
            self.registry.set_status(table_id, status)?;
        }
        if header.pax.is_some() {
            self.registry.set_pax(table_id, header.pax)?;
        }
        Ok(())
    }

    /// Resolve tax rates for a department of the active outlet
    ///
    /// Never fails: unresolved pairs bill at zero tax.
    async fn resolve_rates(&self, department_id: i64) -> TaxRates {
        let outlet_id = self.config.outlet_id;
        if let Some(rates) = self.tax_cache.get(outlet_id, department_id) {
            return rates;
        }
        match self.service.get_tax_rates(outlet_id, department_id).await {
            Ok(Some(rates)) => {
                self.tax_cache.insert(outlet_id, department_id, rates);
                rates
            }
            Ok(None) => {
                tracing::warn!(outlet_id, department_id, "No tax rates configured, billing at zero tax");
                self.tax_cache.insert(outlet_id, department_id, TaxRates::zero());
                TaxRates::zero()
            }
            Err(e) => {
                tracing::warn!(outlet_id, department_id, error = %e, "Tax rate lookup failed, billing at zero tax");
                TaxRates::zero()
            }
        }
    }

    /// Edits are refused while a refetch is outstanding
    fn ensure_editable(&self, table_id: i64) -> EngineResult<()> {
        match self.session_ref(table_id)?.state {
            SessionState::AwaitingReconcile => Err(EngineError::ReconcileRequired(table_id)),
            _ => Ok(()),
        }
    }

    /// Persistence operations other than KOT commit need a clean session
    fn ensure_clean(&self, table_id: i64) -> EngineResult<()> {
        match self.session_ref(table_id)?.state {
            SessionState::Clean => Ok(()),
            SessionState::Dirty => Err(EngineError::PendingEdits(table_id)),
            SessionState::AwaitingReconcile => Err(EngineError::ReconcileRequired(table_id)),
        }
    }

    fn compute_bill(&self, table_id: i64) -> EngineResult<Bill> {
        let session = self.session_ref(table_id)?;
        Ok(tax::compute(
            &session.ledger,
            &session.rates,
            session.discount.as_ref(),
            self.round_off(),
        ))
    }

    fn build_view(&self, table_id: i64) -> EngineResult<TableView> {
        let session = self.session_ref(table_id)?;
        Ok(TableView {
            table: self.registry.select(table_id)?.clone(),
            session: session.state,
            order_ref: session.ledger.order_ref().map(str::to_string),
            lines: session.ledger.lines().to_vec(),
            kots: session.ledger.kots(),
            bill: self.compute_bill(table_id)?,
            settlement: session.settlement.clone(),
        })
    }

    // ========================================================================
    // Tables
    // ========================================================================

    /// Reload the whole table directory
    pub async fn refresh_tables(&mut self) -> EngineResult<Vec<Table>> {
        let tables = self.service.list_tables(None).await?;
        self.registry.load(tables);
        tracing::debug!(tables = self.registry.len(), "Table directory refreshed");
        Ok(self.registry.all())
    }

    /// Tables of one department, refreshed from the service
    pub async fn list_tables(&mut self, department_id: i64) -> EngineResult<Vec<Table>> {
        let tables = self.service.list_tables(Some(department_id)).await?;
        self.registry.refresh(tables);
        Ok(self.registry.list_by_department(department_id))
    }

    /// Open (or return) a table's session
    pub async fn select_table(&mut self, table_id: i64) -> EngineResult<TableView> {
        self.ensure_session(table_id).await?;
        self.build_view(table_id)
    }

    /// De-select a table, discarding uncommitted edits
    pub fn close_table(&mut self, table_id: i64) -> usize {
        match self.sessions.remove(&table_id) {
            Some(mut session) => {
                let discarded = session.ledger.clear();
                if discarded > 0 {
                    tracing::info!(table_id, discarded, "Uncommitted edits discarded");
                }
                discarded
            }
            None => 0,
        }
    }

    pub async fn set_pax(&mut self, table_id: i64, pax: u32) -> EngineResult<()> {
        money::validate_pax(pax)?;
        self.ensure_table(table_id).await?;
        self.service
            .set_pax(&SetPaxRequest { table_id, pax })
            .await?;
        self.registry.set_pax(table_id, Some(pax))?;
        tracing::info!(table_id, pax, "Pax updated");
        Ok(())
    }

    /// Refetch a table's ledger from the service
    pub async fn reconcile(&mut self, table_id: i64) -> EngineResult<TableView> {
        if !self.sessions.contains_key(&table_id) {
            self.open_session(table_id).await?;
            return self.build_view(table_id);
        }
        if self.session_ref(table_id)?.state == SessionState::Dirty {
            tracing::warn!(table_id, "Reconcile discards uncommitted edits");
        }
        self.refetch(table_id).await?;
        self.build_view(table_id)
    }

    pub async fn view(&mut self, table_id: i64) -> EngineResult<TableView> {
        self.ensure_session(table_id).await?;
        self.build_view(table_id)
    }

    pub async fn bill(&mut self, table_id: i64) -> EngineResult<Bill> {
        self.ensure_session(table_id).await?;
        self.compute_bill(table_id)
    }

    pub async fn kots(&mut self, table_id: i64) -> EngineResult<Vec<KotTicket>> {
        self.ensure_session(table_id).await?;
        Ok(self.session_ref(table_id)?.ledger.kots())
    }

    // ========================================================================
    // Ledger edits (local only)
    // ========================================================================

    pub async fn add_item(
        &mut self,
        table_id: i64,
        item: &MenuItem,
        quantity: i64,
        instruction: Option<String>,
    ) -> EngineResult<LineId> {
        self.ensure_session(table_id).await?;
        self.ensure_editable(table_id)?;
        let session = self.session_mut(table_id)?;
        let line_id = session.ledger.add_item(item, quantity, instruction)?;
        session.touch();
        tracing::debug!(table_id, line_id = %line_id, item_id = item.id, quantity, "Item added");
        Ok(line_id)
    }

    pub async fn adjust_quantity(
        &mut self,
        table_id: i64,
        line_id: LineId,
        quantity: i64,
    ) -> EngineResult<Option<LineId>> {
        self.ensure_session(table_id).await?;
        self.ensure_editable(table_id)?;
        let session = self.session_mut(table_id)?;
        let result = session.ledger.adjust_quantity(line_id, quantity)?;
        session.touch();
        self.recheck_discount(table_id)?;
        Ok(result)
    }

    pub async fn set_instruction(
        &mut self,
        table_id: i64,
        line_id: LineId,
        instruction: Option<String>,
    ) -> EngineResult<()> {
        self.ensure_session(table_id).await?;
        self.ensure_editable(table_id)?;
        self.session_mut(table_id)?
            .ledger
            .set_instruction(line_id, instruction)
    }

    /// Discard uncommitted edits, keeping the session
    pub fn clear_pending(&mut self, table_id: i64) -> EngineResult<usize> {
        let session = self.session_mut(table_id)?;
        let discarded = session.ledger.clear();
        session.touch();
        self.recheck_discount(table_id)?;
        Ok(discarded)
    }

    // ========================================================================
    // Kitchen
    // ========================================================================

    /// Send pending deltas to the kitchen as a new KOT
    ///
    /// A billed table only accepts a KOT carrying an elevated approver.
    pub async fn commit_kot(
        &mut self,
        table_id: i64,
        nc: Option<NcTag>,
        approver: Option<Approver>,
    ) -> EngineResult<KotTicket> {
        self.ensure_session(table_id).await?;
        self.ensure_editable(table_id)?;

        let status = self.registry.status(table_id)?;
        let override_by = match status {
            TableStatus::Billed => match approver.as_ref().filter(|a| a.is_elevated()) {
                Some(a) => Some(a.user_id),
                None => return Err(EngineError::TableBilled(table_id)),
            },
            _ => None,
        };
        let event = if override_by.is_some() {
            TableEvent::KotCommittedWithOverride
        } else {
            TableEvent::KotCommitted
        };
        let next = self.registry.preview(table_id, event)?;

        let session = self.session_ref(table_id)?;
        let deltas = kot::build_delta(&session.ledger, &session.rates)?;
        let request = CreateKotRequest {
            table_id,
            items: deltas.clone(),
            nc: nc.clone(),
            approved_by: override_by,
        };
        let response = self.service.create_kot(&request).await?;
        let kot_no = response.kot_no;

        let session = self.session_mut(table_id)?;
        kot::apply_commit(&mut session.ledger, &deltas, kot_no, nc.as_ref());
        session.state = SessionState::AwaitingReconcile;
        if override_by.is_some() {
            session.settlement = None;
        }
        let ticket = session
            .ledger
            .kots()
            .into_iter()
            .find(|t| t.number == kot_no)
            .ok_or(EngineError::KotNotFound(kot_no))?;
        self.registry.set_status(table_id, next)?;

        tracing::info!(
            table_id,
            kot_no,
            items = deltas.len(),
            quantity = ticket.total_quantity(),
            nc = nc.is_some(),
            override_by = ?override_by,
            "KOT committed"
        );

        self.refetch_after_commit(table_id).await;
        Ok(ticket)
    }

    /// Reverse quantity of a committed line
    ///
    /// Validated locally before any request; over-reversals never reach the service.
    pub async fn reverse(
        &mut self,
        table_id: i64,
        line_id: LineId,
        kot_number: KotNumber,
        quantity: i64,
    ) -> EngineResult<ReverseKotEntry> {
        self.ensure_session(table_id).await?;
        self.ensure_clean(table_id)?;
        if self.registry.status(table_id)? == TableStatus::Billed {
            return Err(EngineError::TableBilled(table_id));
        }

        let plan = reversal::validate(&self.session_ref(table_id)?.ledger, line_id, kot_number, quantity)?;
        self.service.reverse_quantity(&plan.request(table_id)).await?;

        let session = self.session_mut(table_id)?;
        let record_id = reversal::record(&mut session.ledger, &plan)?;
        session.state = SessionState::AwaitingReconcile;
        let item_name = session
            .ledger
            .line(plan.line_id)
            .map(|l| l.item_name.clone())
            .unwrap_or_default();
        self.recheck_discount(table_id)?;
        let entry = ReverseKotEntry {
            line_id: record_id,
            reverses: plan.line_id,
            item_id: plan.item_id,
            item_name,
            kot_number,
            quantity: plan.quantity,
        };
        tracing::info!(
            table_id,
            line_id = %line_id,
            kot_no = kot_number,
            quantity = plan.quantity,
            remaining = plan.remaining - plan.quantity,
            "Quantity reversed"
        );

        self.refetch_after_commit(table_id).await;
        Ok(entry)
    }

    /// Kitchen-facing reverse ticket
    pub async fn reverse_kot_ticket(
        &mut self,
        table_id: i64,
        kot_number: Option<KotNumber>,
    ) -> EngineResult<ReverseKotTicket> {
        self.ensure_session(table_id).await?;
        reversal::reverse_ticket(&self.session_ref(table_id)?.ledger, kot_number)
    }

    // ========================================================================
    // Billing
    // ========================================================================

    pub async fn apply_discount(&mut self, table_id: i64, discount: Discount) -> EngineResult<Bill> {
        self.ensure_session(table_id).await?;
        if self.registry.status(table_id)? == TableStatus::Billed {
            return Err(EngineError::TableBilled(table_id));
        }
        let subtotal = tax::discount_base(&self.session_ref(table_id)?.ledger);
        tax::validate_discount(&discount, subtotal, self.config.discount_approval_threshold)?;

        tracing::info!(
            table_id,
            discount = ?discount.kind,
            approver = ?discount.approver.as_ref().map(|a| a.user_id),
            "Discount applied"
        );
        self.session_mut(table_id)?.discount = Some(discount);
        self.compute_bill(table_id)
    }

    pub async fn remove_discount(&mut self, table_id: i64) -> EngineResult<Bill> {
        self.ensure_session(table_id).await?;
        if self.registry.status(table_id)? == TableStatus::Billed {
            return Err(EngineError::TableBilled(table_id));
        }
        self.session_mut(table_id)?.discount = None;
        self.compute_bill(table_id)
    }

    /// Send the bill to the service and move the table to `Printed`
    pub async fn print_bill(&mut self, table_id: i64) -> EngineResult<Bill> {
        self.ensure_session(table_id).await?;
        self.ensure_clean(table_id)?;
        let next = self.registry.preview(table_id, TableEvent::BillPrinted)?;
        self.recheck_discount(table_id)?;
        let bill = self.compute_bill(table_id)?;

        let request = MarkBillPrintedRequest {
            table_id,
            order_ref: self.session_ref(table_id)?.ledger.order_ref().map(str::to_string),
            bill: bill.clone(),
        };
        self.service.mark_bill_printed(&request).await?;
        self.registry.set_status(table_id, next)?;

        tracing::info!(table_id, grand_total = %bill.grand_total, "Bill printed");
        Ok(bill)
    }

    /// Settle a printed bill
    ///
    /// Payments plus tip must equal the grand total; a mismatch is rejected
    /// before any request is made.
    pub async fn settle(
        &mut self,
        table_id: i64,
        payments: BTreeMap<String, Decimal>,
        tip: Decimal,
    ) -> EngineResult<Settlement> {
        self.ensure_session(table_id).await?;
        self.ensure_clean(table_id)?;
        let next = self.registry.preview(table_id, TableEvent::Settled)?;
        self.recheck_discount(table_id)?;
        let bill = self.compute_bill(table_id)?;
        let lines = settlement::validate(&bill, &payments, tip)?;

        let order_ref = self
            .session_ref(table_id)?
            .ledger
            .order_ref()
            .map(str::to_string)
            .ok_or(EngineError::ReconcileRequired(table_id))?;
        let request = settlement::request(table_id, &order_ref, lines, tip, &bill);
        let records = self.service.settle_bill(&request).await?;

        let result = settlement::assemble(&order_ref, records, tip, &bill);
        let session = self.session_mut(table_id)?;
        session.ledger.mark_billed(true);
        session.settlement = Some(result.clone());
        self.registry.set_status(table_id, next)?;

        tracing::info!(
            table_id,
            order_ref = %order_ref,
            grand_total = %bill.grand_total,
            tip = %tip,
            records = result.records.len(),
            "Bill settled"
        );
        Ok(result)
    }

    /// Print (if not yet printed) and settle in one step
    pub async fn print_and_settle(
        &mut self,
        table_id: i64,
        payments: BTreeMap<String, Decimal>,
        tip: Decimal,
    ) -> EngineResult<Settlement> {
        self.ensure_session(table_id).await?;
        self.ensure_clean(table_id)?;
        self.recheck_discount(table_id)?;
        let bill = self.compute_bill(table_id)?;
        settlement::validate(&bill, &payments, tip)?;

        if self.registry.status(table_id)? == TableStatus::Occupied {
            self.print_bill(table_id).await?;
        }
        self.settle(table_id, payments, tip).await
    }

    /// Delete settlement records so the bill can be settled again
    ///
    /// Records are deleted one by one; a failure part-way reports which
    /// records are already gone.
    pub async fn unsettle(
        &mut self,
        table_id: i64,
        settlement_ids: Vec<i64>,
        edited_by: Approver,
    ) -> EngineResult<Vec<i64>> {
        self.ensure_session(table_id).await?;
        self.registry.preview(table_id, TableEvent::Unsettled)?;

        let ids = if settlement_ids.is_empty() {
            self.session_ref(table_id)?
                .settlement
                .as_ref()
                .map(Settlement::settlement_ids)
                .unwrap_or_default()
        } else {
            settlement_ids
        };
        if ids.is_empty() {
            return Err(EngineError::Validation(format!(
                "no settlement to reverse on table {}",
                table_id
            )));
        }

        let request = DeleteSettlementRequest {
            edited_by: edited_by.user_id,
            reason: None,
        };
        let mut deleted = Vec::with_capacity(ids.len());
        let mut failure = None;
        for id in ids {
            match self.service.delete_settlement(id, &request).await {
                Ok(()) => deleted.push(id),
                Err(e) => {
                    failure = Some((id, e));
                    break;
                }
            }
        }

        if !deleted.is_empty() {
            let session = self.session_mut(table_id)?;
            let fully_reversed = match session.settlement.as_mut() {
                Some(s) => {
                    s.records.retain(|r| !deleted.contains(&r.settlement_id));
                    s.records.is_empty()
                }
                None => failure.is_none(),
            };
            if fully_reversed {
                session.settlement = None;
                session.ledger.mark_billed(false);
                self.registry.apply(table_id, TableEvent::Unsettled)?;
            }
            tracing::info!(
                table_id,
                deleted = ?deleted,
                edited_by = edited_by.user_id,
                "Settlement records deleted"
            );
            self.refetch_after_commit(table_id).await;
        }

        match failure {
            None => Ok(deleted),
            Some((_, e)) if deleted.is_empty() => Err(e),
            Some((failed, e)) => Err(EngineError::PartialUnsettle {
                deleted,
                failed,
                source: Box::new(e),
            }),
        }
    }

    /// Post-settlement `Billed → Vacant`
    pub async fn release_table(&mut self, table_id: i64) -> EngineResult<()> {
        self.ensure_table(table_id).await?;
        self.registry.preview(table_id, TableEvent::Released)?;
        self.service
            .set_table_status(&SetTableStatusRequest {
                table_id,
                status: TableStatus::Vacant,
            })
            .await?;
        self.registry.apply(table_id, TableEvent::Released)?;
        self.sessions.remove(&table_id);
        tracing::info!(table_id, "Table released");
        Ok(())
    }

    /// Force a table back to `Vacant` from any status
    pub async fn admin_reset(&mut self, table_id: i64, approver: Approver) -> EngineResult<()> {
        if !approver.is_elevated() {
            return Err(EngineError::PermissionDenied(format!(
                "{} cannot reset tables",
                approver.name
            )));
        }
        self.ensure_table(table_id).await?;
        self.service
            .set_table_status(&SetTableStatusRequest {
                table_id,
                status: TableStatus::Vacant,
            })
            .await?;
        let from = self.registry.status(table_id)?;
        self.registry.apply(table_id, TableEvent::AdminReset)?;
        self.sessions.remove(&table_id);
        tracing::warn!(table_id, from = %from, approver = approver.user_id, "Table reset by administrator");
        Ok(())
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    /// Move every KOT of `source` to `dest`
    pub async fn transfer_table(&mut self, source: i64, dest: i64) -> EngineResult<TransferOperation> {
        self.transfer(source, dest, None).await
    }

    /// Move one KOT of `source` to `dest`
    pub async fn transfer_kot(
        &mut self,
        source: i64,
        kot_number: KotNumber,
        dest: i64,
    ) -> EngineResult<TransferOperation> {
        self.transfer(source, dest, Some(kot_number)).await
    }

    async fn transfer(
        &mut self,
        source: i64,
        dest: i64,
        kot_filter: Option<KotNumber>,
    ) -> EngineResult<TransferOperation> {
        if source == dest {
            return Err(EngineError::SameTable(source));
        }
        self.ensure_session(source).await?;
        self.ensure_editable(source)?;
        self.ensure_table(dest).await?;

        // Destination totals come from the service, not from a local session
        let dest_snapshot = self.service.get_unbilled_items(dest).await?;
        self.sync_header(dest, &dest_snapshot.header)?;
        let dest_total_before = Ledger::from_snapshot(dest, &dest_snapshot).total();

        let plan = transfer::plan(
            &self.session_ref(source)?.ledger,
            self.registry.status(source)?,
            dest,
            self.registry.status(dest)?,
            kot_filter,
        )?;
        // The destination refetch would discard its uncommitted edits
        if self
            .sessions
            .get(&dest)
            .is_some_and(|s| s.state == SessionState::Dirty)
        {
            return Err(EngineError::PendingEdits(dest));
        }

        match kot_filter {
            None => self.service.transfer_table(&plan.table_request()).await?,
            Some(kot) => self.service.transfer_kot(&plan.kot_request(kot)).await?,
        }
        self.session_mut(source)?.state = SessionState::AwaitingReconcile;
        if let Some(session) = self.sessions.get_mut(&dest) {
            session.state = SessionState::AwaitingReconcile;
        }

        if plan.empties_source {
            if let Err(e) = self.registry.apply(source, TableEvent::SourceEmptied) {
                tracing::warn!(table_id = source, error = %e, "Source status not updated");
            }
        }
        if let Err(e) = self.registry.apply(dest, TableEvent::TransferReceived) {
            tracing::warn!(table_id = dest, error = %e, "Destination status not updated");
        }

        // The move is committed; a failed refetch leaves it unverified
        let (source_total_after, dest_total_after) = match self.transfer_totals(source, dest).await {
            Ok(totals) => totals,
            Err(e) => {
                tracing::warn!(
                    source_table = source,
                    dest_table = dest,
                    error = %e,
                    "Refetch after transfer failed, reconcile required"
                );
                return Ok(transfer::unverified(plan, dest_total_before));
            }
        };

        let moved = plan.moved.len();
        match transfer::verify(plan, source_total_after, dest_total_before, dest_total_after) {
            Ok(op) => {
                tracing::info!(
                    source_table = source,
                    dest_table = dest,
                    kot_no = ?kot_filter,
                    moved,
                    variance = %op.variance,
                    "Transfer committed"
                );
                Ok(op)
            }
            Err(e) => {
                tracing::warn!(source_table = source, dest_table = dest, error = %e, "Transfer totals disagree");
                Err(e)
            }
        }
    }

    /// Refetch both sides of a committed transfer and return their totals
    async fn transfer_totals(&mut self, source: i64, dest: i64) -> EngineResult<(Decimal, Decimal)> {
        self.refetch(source).await?;
        let source_total = self.session_ref(source)?.ledger.total();
        let dest_total = if self.sessions.contains_key(&dest) {
            self.refetch(dest).await?;
            self.session_ref(dest)?.ledger.total()
        } else {
            let snapshot = self.service.get_unbilled_items(dest).await?;
            self.sync_header(dest, &snapshot.header)?;
            Ledger::from_snapshot(dest, &snapshot).total()
        };
        Ok((source_total, dest_total))
    }

    // ========================================================================
    // Command dispatch
    // ========================================================================

    /// Execute a presentation-layer command
    ///
    /// Never fails: errors are reported in the response.
    pub async fn execute(&mut self, cmd: TerminalCommand) -> CommandResponse {
        let table_id = cmd.payload.table_id();
        tracing::debug!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing command");

        match self.dispatch(cmd.payload).await {
            Ok(data) => CommandResponse::success(cmd.command_id, table_id, data),
            Err(err) => {
                if !err.is_external() {
                    tracing::warn!(
                        command_id = %cmd.command_id,
                        table_id = ?table_id,
                        error_code = %err.code(),
                        error = %err,
                        "Command rejected"
                    );
                }
                CommandResponse::error(cmd.command_id, table_id, err.into())
            }
        }
    }

    async fn dispatch(&mut self, payload: TerminalCommandPayload) -> EngineResult<Option<Value>> {
        use TerminalCommandPayload as P;

        match payload {
            P::RefreshTables => to_data(&self.refresh_tables().await?),
            P::ListTables { department_id } => to_data(&self.list_tables(department_id).await?),
            P::SelectTable { table_id } => to_data(&self.select_table(table_id).await?),
            P::CloseTable { table_id } => to_data(&self.close_table(table_id)),
            P::SetPax { table_id, pax } => {
                self.set_pax(table_id, pax).await?;
                Ok(None)
            }
            P::Reconcile { table_id } => to_data(&self.reconcile(table_id).await?),
            P::View { table_id } => to_data(&self.view(table_id).await?),

            P::AddItem {
                table_id,
                item,
                quantity,
                instruction,
            } => to_data(&self.add_item(table_id, &item, quantity, instruction).await?),
            P::AdjustQuantity {
                table_id,
                line_id,
                quantity,
            } => to_data(&self.adjust_quantity(table_id, line_id, quantity).await?),
            P::SetInstruction {
                table_id,
                line_id,
                instruction,
            } => {
                self.set_instruction(table_id, line_id, instruction).await?;
                Ok(None)
            }
            P::ClearPending { table_id } => to_data(&self.clear_pending(table_id)?),

            P::CommitKot {
                table_id,
                nc,
                approver,
            } => to_data(&self.commit_kot(table_id, nc, approver).await?),
            P::Reverse {
                table_id,
                line_id,
                kot_number,
                quantity,
            } => to_data(&self.reverse(table_id, line_id, kot_number, quantity).await?),
            P::ReverseKotTicket {
                table_id,
                kot_number,
            } => to_data(&self.reverse_kot_ticket(table_id, kot_number).await?),

            P::ApplyDiscount { table_id, discount } => {
                to_data(&self.apply_discount(table_id, discount).await?)
            }
            P::RemoveDiscount { table_id } => to_data(&self.remove_discount(table_id).await?),
            P::PrintBill { table_id } => to_data(&self.print_bill(table_id).await?),
            P::Settle {
                table_id,
                payments,
                tip,
            } => to_data(&self.settle(table_id, payments, tip).await?),
            P::PrintAndSettle {
                table_id,
                payments,
                tip,
            } => to_data(&self.print_and_settle(table_id, payments, tip).await?),
            P::Unsettle {
                table_id,
                settlement_ids,
                edited_by,
            } => to_data(&self.unsettle(table_id, settlement_ids, edited_by).await?),
            P::ReleaseTable { table_id } => {
                self.release_table(table_id).await?;
                Ok(None)
            }
            P::AdminReset { table_id, approver } => {
                self.admin_reset(table_id, approver).await?;
                Ok(None)
            }

            P::TransferTable {
                source_table,
                dest_table,
            } => to_data(&self.transfer_table(source_table, dest_table).await?),
            P::TransferKot {
                source_table,
                kot_number,
                dest_table,
            } => to_data(&self.transfer_kot(source_table, kot_number, dest_table).await?),
        }
    }
}

fn to_data<T: Serialize>(value: &T) -> EngineResult<Option<Value>> {
    serde_json::to_value(value)
        .map(Some)
        .map_err(|e| EngineError::Internal(format!("failed to serialize result: {}", e)))
}

#[cfg(test)]
mod tests;
