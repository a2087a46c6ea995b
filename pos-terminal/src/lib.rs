//! POS Terminal - Order & KOT lifecycle engine
//!
//! # Module structure
//!
//! ```text
//! pos-terminal/src/
//! ├── registry.rs    # table directory and status transitions
//! ├── ledger.rs      # per-table line items
//! ├── kot.rs         # KOT delta computation and commit bookkeeping
//! ├── tax.rs         # bill computation, discount rules, tax-rate cache
//! ├── reversal.rs    # quantity reversals and reverse-KOT tickets
//! ├── settlement.rs  # payment reconciliation
//! ├── transfer.rs    # table / KOT transfers
//! ├── service/       # persistence service seam (HTTP + in-memory)
//! └── terminal/      # session orchestration and command dispatch
//! ```

pub mod config;
pub mod error;
pub mod kot;
pub mod ledger;
pub mod logger;
pub mod money;
pub mod registry;
pub mod reversal;
pub mod service;
pub mod settlement;
pub mod tax;
pub mod terminal;
pub mod transfer;

pub use config::TerminalConfig;
pub use error::{EngineError, EngineResult};
pub use ledger::Ledger;
pub use logger::{init_from_config, init_logger, init_logger_with_file};
pub use registry::TableRegistry;
pub use service::{InMemoryService, PosService, ServiceOp, http_service};
pub use terminal::{TableSession, Terminal};
