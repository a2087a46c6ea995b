//! Data models
//!
//! Shared between the terminal engine and the persistence service (via API).
//! All service-side IDs are `i64`.

pub mod menu;
pub mod staff;
pub mod table;
pub mod tax;

// Re-exports
pub use menu::*;
pub use staff::*;
pub use table::*;
pub use tax::*;
