//! Order lifecycle scenarios across many tables
//!
//! Drives the public terminal API against the in-memory service, with
//! commands interleaved across tables the way a busy floor issues them.

use pos_terminal::{InMemoryService, ServiceOp, Terminal, TerminalConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::models::{Approver, MenuItem, Role, Table, TableStatus, TaxRates};
use shared::order::{
    CommandResponse, Discount, KotTicket, SessionState, TerminalCommand, TransferOperation,
};
use std::collections::{BTreeMap, HashSet};

const OUTLET: i64 = 1;
const DINING: i64 = 10;
const BAR: i64 = 30;
const TABLE_COUNT: i64 = 12;

const MENU: &[(i64, &str, Decimal)] = &[
    (1, "Paneer Tikka", dec!(280)),
    (2, "Dal Makhani", dec!(240)),
    (3, "Butter Naan", dec!(45)),
    (4, "Jeera Rice", dec!(160)),
    (5, "Chicken Biryani", dec!(320)),
    (6, "Masala Papad", dec!(60)),
    (7, "Fresh Lime Soda", dec!(90)),
    (8, "Gulab Jamun", dec!(110)),
];

/// Table lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    FirstKot,
    SecondKot,
    Print,
    Settle,
    Release,
    Done,
}

impl Phase {
    fn next(self) -> Self {
        match self {
            Self::FirstKot => Self::SecondKot,
            Self::SecondKot => Self::Print,
            Self::Print => Self::Settle,
            Self::Settle => Self::Release,
            Self::Release | Self::Done => Self::Done,
        }
    }
}

fn menu_item(idx: usize) -> MenuItem {
    let (id, name, price) = MENU[idx % MENU.len()];
    MenuItem::new(id, name, price)
}

fn floor_service() -> InMemoryService {
    let mut service = InMemoryService::new();
    for id in 1..=TABLE_COUNT {
        let department = if id % 4 == 0 { BAR } else { DINING };
        service = service.with_table(Table::new(id, format!("T{}", id), department, OUTLET));
    }
    service.with_tax_rates(
        OUTLET,
        DINING,
        TaxRates {
            cgst: dec!(2.5),
            sgst: dec!(2.5),
            ..TaxRates::zero()
        },
    )
}

fn floor_terminal(service: &InMemoryService) -> Terminal<InMemoryService> {
    let config = TerminalConfig::with_overrides(OUTLET, "http://localhost:0/api")
        .with_round_off(dec!(1))
        .with_discount_threshold(dec!(15));
    Terminal::new(service.clone(), config)
}

fn manager() -> Approver {
    Approver::new(2, "Anita", Role::OutletAdmin)
}

/// Split `total` across two modes, cash taking the remainder
fn split_payment(total: Decimal, seed: i64) -> BTreeMap<String, Decimal> {
    let card = (total * Decimal::from(seed % 3) / dec!(4)).round_dp(0);
    let mut payments = BTreeMap::new();
    if card > Decimal::ZERO {
        payments.insert("Card".to_string(), card);
    }
    payments.insert("Cash".to_string(), total - card);
    payments
}

// ============================================================================
// Interleaved floor service
// ============================================================================

#[tokio::test]
async fn test_interleaved_tables_full_cycle() {
    let service = floor_service();
    let mut terminal = floor_terminal(&service);
    terminal.refresh_tables().await.unwrap();

    let mut phases: BTreeMap<i64, Phase> = (1..=TABLE_COUNT).map(|id| (id, Phase::FirstKot)).collect();
    let mut tickets: Vec<KotTicket> = Vec::new();
    let mut grand_totals: BTreeMap<i64, Decimal> = BTreeMap::new();

    // Round-robin one step per table until every table is released
    while phases.values().any(|p| *p != Phase::Done) {
        for table_id in 1..=TABLE_COUNT {
            let phase = phases[&table_id];
            match phase {
                Phase::FirstKot | Phase::SecondKot => {
                    let offset = if phase == Phase::FirstKot { 0 } else { 3 };
                    for i in 0..2 {
                        let idx = (table_id as usize + offset + i) % MENU.len();
                        terminal
                            .add_item(table_id, &menu_item(idx), (i + 1) as i64, None)
                            .await
                            .unwrap();
                    }
                    let ticket = terminal.commit_kot(table_id, None, None).await.unwrap();
                    assert_eq!(terminal.registry().status(table_id).unwrap(), TableStatus::Occupied);
                    tickets.push(ticket);
                }
                Phase::Print => {
                    if table_id % 3 == 0 {
                        terminal
                            .apply_discount(table_id, Discount::percentage(dec!(10)))
                            .await
                            .unwrap();
                    }
                    let bill = terminal.print_bill(table_id).await.unwrap();
                    assert_eq!(bill.grand_total.fract(), Decimal::ZERO);
                    grand_totals.insert(table_id, bill.grand_total);
                }
                Phase::Settle => {
                    let total = grand_totals[&table_id];
                    let settlement = terminal
                        .settle(table_id, split_payment(total, table_id), Decimal::ZERO)
                        .await
                        .unwrap();
                    assert_eq!(settlement.paid(), total);
                    assert_eq!(settlement.grand_total, total);
                }
                Phase::Release => {
                    terminal.release_table(table_id).await.unwrap();
                }
                Phase::Done => {}
            }
            phases.insert(table_id, phase.next());
        }
    }

    // 1. Every table is back to vacant with no open order
    for table_id in 1..=TABLE_COUNT {
        assert_eq!(terminal.registry().status(table_id).unwrap(), TableStatus::Vacant);
        assert!(service.order_ref(table_id).is_none());
        assert!(terminal.session(table_id).is_none());
    }

    // 2. KOT numbers are unique and increase in commit order
    let numbers: Vec<u32> = tickets.iter().map(|t| t.number).collect();
    assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(numbers.iter().collect::<HashSet<_>>().len(), numbers.len());
    assert_eq!(service.call_count(ServiceOp::CreateKot), tickets.len());

    // 3. Settled amounts add up to the printed bills
    let settled: Decimal = service.active_settlements().iter().map(|r| r.amount).sum();
    let printed: Decimal = grand_totals.values().copied().sum();
    assert_eq!(settled, printed);
}

// ============================================================================
// Tickets are immutable once issued
// ============================================================================

#[tokio::test]
async fn test_issued_tickets_never_change() {
    let service = floor_service();
    let mut terminal = floor_terminal(&service);

    terminal.add_item(1, &menu_item(0), 2, None).await.unwrap();
    terminal.add_item(1, &menu_item(1), 1, None).await.unwrap();
    let first = terminal.commit_kot(1, None, None).await.unwrap();

    // Increase a committed line and add another item
    let view = terminal.view(1).await.unwrap();
    let tikka = view.lines.iter().find(|l| l.item_id == 1).unwrap().id;
    terminal.adjust_quantity(1, tikka, 4).await.unwrap();
    terminal.add_item(1, &menu_item(2), 3, None).await.unwrap();
    let second = terminal.commit_kot(1, None, None).await.unwrap();

    let quantities: BTreeMap<i64, u32> = second
        .entries
        .iter()
        .map(|e| (e.item_id, e.quantity))
        .collect();
    assert_eq!(quantities, BTreeMap::from([(1, 2), (3, 3)]));

    let kots = terminal.kots(1).await.unwrap();
    assert_eq!(kots.len(), 2);
    assert_eq!(kots[0].number, first.number);
    assert_eq!(kots[0].total_quantity(), first.total_quantity());
    assert_eq!(kots[1].number, second.number);
}

// ============================================================================
// Settlement must match exactly
// ============================================================================

#[tokio::test]
async fn test_only_exact_payments_settle() {
    let service = floor_service();
    let mut terminal = floor_terminal(&service);
    terminal.add_item(2, &menu_item(4), 3, None).await.unwrap();
    terminal.commit_kot(2, None, None).await.unwrap();
    let bill = terminal.print_bill(2).await.unwrap();
    // 960 + 24 + 24
    assert_eq!(bill.grand_total, dec!(1008));

    for short in [dec!(0.01), dec!(1), dec!(500)] {
        let payments = BTreeMap::from([("Cash".to_string(), bill.grand_total - short)]);
        assert!(terminal.settle(2, payments, Decimal::ZERO).await.is_err());
    }
    let over = BTreeMap::from([("Cash".to_string(), bill.grand_total + dec!(1))]);
    assert!(terminal.settle(2, over, Decimal::ZERO).await.is_err());
    assert_eq!(service.call_count(ServiceOp::SettleBill), 0);
    assert_eq!(terminal.registry().status(2).unwrap(), TableStatus::Printed);

    let exact = BTreeMap::from([
        ("Card".to_string(), dec!(1000)),
        ("UPI".to_string(), dec!(0)),
    ]);
    let settlement = terminal.settle(2, exact, dec!(8)).await.unwrap();
    // Zero-amount modes produce no record
    assert_eq!(settlement.records.len(), 1);
    assert_eq!(settlement.tip, dec!(8));
}

// ============================================================================
// Transfers conserve value
// ============================================================================

fn assert_conserved(op: &TransferOperation) {
    assert!(op.verified);
    assert_eq!(op.source_total_before - op.moved_total, op.source_total_after);
    assert_eq!(op.dest_total_after - op.dest_total_before, op.moved_total);
    assert_eq!(op.variance, op.moved_total);
}

#[tokio::test]
async fn test_transfer_chain_conserves_value() {
    let service = floor_service();
    let mut terminal = floor_terminal(&service);

    // Table 1: two KOTs; table 2: one KOT
    terminal.add_item(1, &menu_item(0), 1, None).await.unwrap();
    let kot_a = terminal.commit_kot(1, None, None).await.unwrap();
    terminal.add_item(1, &menu_item(1), 2, None).await.unwrap();
    terminal.commit_kot(1, None, None).await.unwrap();
    terminal.add_item(2, &menu_item(5), 1, None).await.unwrap();
    terminal.commit_kot(2, None, None).await.unwrap();

    let floor_before: Decimal = (1..=3).map(|t| service.table_total(t)).sum();

    // 1. Move one KOT into an occupied table
    let op = terminal.transfer_kot(1, kot_a.number, 2).await.unwrap();
    assert_conserved(&op);
    assert_eq!(terminal.registry().status(1).unwrap(), TableStatus::Occupied);

    // 2. Move what is left of table 1 to a vacant table
    let op = terminal.transfer_table(1, 3).await.unwrap();
    assert_conserved(&op);
    assert_eq!(terminal.registry().status(1).unwrap(), TableStatus::Vacant);
    assert_eq!(terminal.registry().status(3).unwrap(), TableStatus::Occupied);

    // 3. Merge everything onto table 3
    let op = terminal.transfer_table(2, 3).await.unwrap();
    assert_conserved(&op);

    let floor_after: Decimal = (1..=3).map(|t| service.table_total(t)).sum();
    assert_eq!(floor_before, floor_after);
    assert_eq!(service.table_total(3), floor_after);
    assert_eq!(terminal.view(3).await.unwrap().session, SessionState::Clean);
}

// ============================================================================
// Reversal keeps the audit trail
// ============================================================================

#[tokio::test]
async fn test_reversals_accumulate_until_exhausted() {
    let service = floor_service();
    let mut terminal = floor_terminal(&service);
    terminal.add_item(1, &menu_item(2), 4, None).await.unwrap();
    let kot = terminal.commit_kot(1, None, None).await.unwrap();
    let naan = terminal.view(1).await.unwrap().lines[0].id;

    for _ in 0..4 {
        terminal.reverse(1, naan, kot.number, 1).await.unwrap();
    }
    assert!(terminal.reverse(1, naan, kot.number, 1).await.is_err());
    assert_eq!(service.call_count(ServiceOp::ReverseQuantity), 4);
    assert_eq!(service.table_total(1), Decimal::ZERO);

    let view = terminal.view(1).await.unwrap();
    assert_eq!(view.lines.iter().filter(|l| l.is_reverse).count(), 4);
    assert_eq!(view.bill.subtotal, Decimal::ZERO);

    let ticket = terminal.reverse_kot_ticket(1, None).await.unwrap();
    assert_eq!(ticket.entries.iter().map(|e| e.quantity).sum::<u32>(), 4);
}

// ============================================================================
// Billed tables and overrides
// ============================================================================

#[tokio::test]
async fn test_post_settlement_order_with_override() {
    let service = floor_service();
    let mut terminal = floor_terminal(&service);
    terminal.add_item(4, &menu_item(6), 2, None).await.unwrap();
    terminal.commit_kot(4, None, None).await.unwrap();
    // Bar department has no configured rates
    let bill = terminal.print_bill(4).await.unwrap();
    assert_eq!(bill.grand_total, dec!(180));
    terminal
        .settle(4, BTreeMap::from([("Cash".to_string(), dec!(180))]), Decimal::ZERO)
        .await
        .unwrap();

    terminal.add_item(4, &menu_item(6), 1, None).await.unwrap();
    assert!(terminal.commit_kot(4, None, None).await.is_err());
    terminal.commit_kot(4, None, Some(manager())).await.unwrap();
    assert_eq!(terminal.registry().status(4).unwrap(), TableStatus::Occupied);

    // The reopened bill covers the whole order
    let bill = terminal.bill(4).await.unwrap();
    assert_eq!(bill.grand_total, dec!(270));
}

// ============================================================================
// JSON command protocol
// ============================================================================

async fn run(terminal: &mut Terminal<InMemoryService>, json: &str) -> CommandResponse {
    let cmd: TerminalCommand = serde_json::from_str(json).expect("valid command");
    terminal.execute(cmd).await
}

#[tokio::test]
async fn test_json_command_round() {
    let service = floor_service();
    let mut terminal = floor_terminal(&service);

    let resp = run(
        &mut terminal,
        r#"{"command_id":"c1","payload":{"type":"ADD_ITEM","table_id":5,
            "item":{"id":1,"name":"Paneer Tikka","price":"280"},"quantity":2}"#,
    )
    .await;
    assert!(resp.success, "{}", resp.message());

    let resp = run(
        &mut terminal,
        r#"{"command_id":"c2","payload":{"type":"COMMIT_KOT","table_id":5}}"#,
    )
    .await;
    assert!(resp.success, "{}", resp.message());

    let resp = run(
        &mut terminal,
        r#"{"command_id":"c3","payload":{"type":"PRINT_BILL","table_id":5}}"#,
    )
    .await;
    assert!(resp.success);
    let bill = resp.data.unwrap();
    // 560 + 14 + 14
    let grand_total: Decimal = serde_json::from_value(bill["grand_total"].clone()).unwrap();
    assert_eq!(grand_total, dec!(588));

    let resp = run(
        &mut terminal,
        r#"{"command_id":"c4","payload":{"type":"SETTLE","table_id":5,
            "payments":{"Cash":"500"},"tip":"0"}"#,
    )
    .await;
    assert!(!resp.success);
    let wire = serde_json::to_value(&resp).unwrap();
    assert_eq!(wire["command_id"], "c4");
    assert_eq!(wire["error"]["kind"], "validation");
    assert!(wire.get("data").is_none());

    let resp = run(
        &mut terminal,
        r#"{"command_id":"c5","payload":{"type":"PRINT_AND_SETTLE","table_id":5,
            "payments":{"Cash":"588"},"tip":"0"}"#,
    )
    .await;
    assert!(resp.success, "{}", resp.message());
    assert_eq!(terminal.registry().status(5).unwrap(), TableStatus::Billed);
}
