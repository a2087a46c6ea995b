//! Request types sent to the persistence service

use crate::models::TableStatus;
use crate::order::{Bill, KotDelta, KotNumber, NcTag, PaymentLine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `createOrUpdateKOT` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateKotRequest {
    pub table_id: i64,
    pub items: Vec<KotDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nc: Option<NcTag>,
    /// Elevated approver for commits against a billed table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<i64>,
}

/// `reverseQuantity` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseQuantityRequest {
    pub table_id: i64,
    pub detail_id: i64,
    pub item_id: i64,
    pub kot_no: KotNumber,
    pub quantity: u32,
}

/// `settleBill` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleBillRequest {
    pub table_id: i64,
    pub order_ref: String,
    pub payments: Vec<PaymentLine>,
    pub tip: Decimal,
    pub grand_total: Decimal,
}

/// `deleteSettlement` body, recorded in the settlement edit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSettlementRequest {
    pub edited_by: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `transferTable` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTableRequest {
    pub source_table_id: i64,
    pub dest_table_id: i64,
}

/// `transferKOT` body; the moved detail rows are computed client-side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferKotRequest {
    pub source_table_id: i64,
    pub kot_no: KotNumber,
    pub dest_table_id: i64,
    pub detail_ids: Vec<i64>,
}

/// `markBillPrinted` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkBillPrintedRequest {
    pub table_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_ref: Option<String>,
    pub bill: Bill,
}

/// `setPax` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPaxRequest {
    pub table_id: i64,
    pub pax: u32,
}

/// `setTableStatus` body (release and administrative reset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTableStatusRequest {
    pub table_id: i64,
    pub status: TableStatus,
}
