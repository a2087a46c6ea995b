//! POS Client - HTTP client for the persistence service
//!
//! Typed calls for the order, KOT, settlement and transfer endpoints.
//! Every response travels in a [`ApiResponse`] envelope.

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;

// Re-export shared types for convenience
pub use shared::error::ApiResponse;
