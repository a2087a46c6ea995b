use super::*;
use crate::service::{InMemoryService, ServiceOp};
use rust_decimal_macros::dec;
use shared::error::{ErrorCode, ErrorKind};
use shared::models::Role;


const OUTLET: i64 = 1;
const DINING: i64 = 10;
const TERRACE: i64 = 20;

fn gst_18() -> TaxRates {
    TaxRates {
        cgst: dec!(9),
        sgst: dec!(9),
        ..TaxRates::zero()
    }
}

fn create_test_service() -> InMemoryService {
    InMemoryService::new()
        .with_table(Table::new(1, "T1", DINING, OUTLET))
        .with_table(Table::new(2, "T2", DINING, OUTLET))
        .with_table(Table::new(3, "Terrace 1", TERRACE, OUTLET))
        .with_table(Table::new(9, "Other outlet", DINING, 2))
        .with_tax_rates(OUTLET, DINING, gst_18())
}

fn test_config() -> TerminalConfig {
    let mut config = TerminalConfig::with_overrides(OUTLET, "http://localhost:0/api");
    config.round_off_enabled = false;
    config.discount_approval_threshold = dec!(20);
    config
}

fn create_test_terminal() -> (Terminal<InMemoryService>, InMemoryService) {
    let service = create_test_service();
    (Terminal::new(service.clone(), test_config()), service)
}

fn simple_item(id: i64, name: &str, price: Decimal) -> MenuItem {
    MenuItem::new(id, name, price)
}

fn admin() -> Approver {
    Approver::new(1, "Meera", Role::OutletAdmin)
}

fn cashier() -> Approver {
    Approver::new(7, "Ravi", Role::Cashier)
}

fn payments(entries: &[(&str, Decimal)]) -> BTreeMap<String, Decimal> {
    entries
        .iter()
        .map(|(mode, amount)| (mode.to_string(), *amount))
        .collect()
}

// ========================================================================
// Helper: commit items to a table as one KOT
// ========================================================================

async fn commit_items(
    terminal: &mut Terminal<InMemoryService>,
    table_id: i64,
    items: &[(MenuItem, i64)],
) -> KotTicket {
    for (item, qty) in items {
        terminal
            .add_item(table_id, item, *qty, None)
            .await
            .expect("add item");
    }
    terminal
        .commit_kot(table_id, None, None)
        .await
        .expect("commit KOT")
}

/// Table with 2 × 500 committed, bill 1000 before discount
async fn open_thali_table(terminal: &mut Terminal<InMemoryService>, table_id: i64) -> KotTicket {
    commit_items(
        terminal,
        table_id,
        &[(simple_item(1, "Thali", dec!(500)), 2)],
    )
    .await
}

fn line_of(terminal: &Terminal<InMemoryService>, table_id: i64, item_id: i64) -> LineId {
    terminal
        .session(table_id)
        .and_then(|s| {
            s.ledger
                .lines()
                .iter()
                .find(|l| l.item_id == item_id && !l.is_reverse)
                .map(|l| l.id)
        })
        .expect("line present")
}
