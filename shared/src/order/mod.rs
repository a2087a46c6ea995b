//! Order & KOT types
//!
//! - Lines and reversal records owned by a table ledger
//! - KOT tickets (immutable views by sequence number)
//! - Bills, settlements and transfers derived from the ledger
//! - Commands from the presentation layer and their responses

pub mod bill;
pub mod command;
pub mod kot;
pub mod line;
pub mod settlement;
pub mod snapshot;
pub mod transfer;
pub mod types;

// Re-exports
pub use bill::{Bill, Discount, DiscountKind, TaxAmounts};
pub use command::{TerminalCommand, TerminalCommandPayload};
pub use kot::{KotDelta, KotEntry, KotNumber, KotTicket, ReverseKotEntry, ReverseKotTicket, UnitTax};
pub use line::{LineId, LineItem, NcTag};
pub use settlement::{PaymentLine, Settlement, SettlementRecord};
pub use snapshot::{SessionState, TableView};
pub use transfer::{MovedLine, TransferOperation};
pub use types::*;
