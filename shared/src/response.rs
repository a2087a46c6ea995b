//! Response payloads returned by the persistence service
//!
//! Every payload travels inside an [`ApiResponse`](crate::error::ApiResponse)
//! envelope.

use crate::models::TableStatus;
use crate::order::{Discount, KotNumber};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One unbilled detail row (one item under one KOT)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbilledItem {
    pub detail_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub price: Decimal,
    /// Quantity committed under `kot_no`
    pub qty: u32,
    /// Quantity reversed so far
    #[serde(default)]
    pub rev_qty: u32,
    pub kot_no: KotNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nc_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nc_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default)]
    pub is_billed: bool,
}

impl UnbilledItem {
    pub fn net_qty(&self) -> u32 {
        self.qty.saturating_sub(self.rev_qty)
    }
}

/// One reversal row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversedItem {
    pub reversal_id: i64,
    pub detail_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub price: Decimal,
    pub kot_no: KotNumber,
    pub qty: u32,
}

/// Order header of an open table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrderHeader {
    pub table_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_ref: Option<String>,
    /// Authoritative status when the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pax: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
}

/// `getUnbilledItems` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UnbilledItems {
    pub items: Vec<UnbilledItem>,
    #[serde(default)]
    pub reversed_items: Vec<ReversedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_kot_no: Option<KotNumber>,
    pub header: OrderHeader,
}

/// `createOrUpdateKOT` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateKotResponse {
    pub kot_no: KotNumber,
}
