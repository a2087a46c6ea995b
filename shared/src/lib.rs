//! Shared types for the POS terminal
//!
//! Domain model, wire DTOs for the persistence service, and the unified
//! error codes used by every crate in the workspace.

pub mod error;
pub mod models;
pub mod order;
pub mod request;
pub mod response;

// Re-exports
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};
