//! Persistence service seam
//!
//! Every persistence-affecting operation goes through [`PosService`]. The
//! HTTP client implements it for production; [`InMemoryService`] is an
//! in-process stand-in used by tests.

mod http;
mod memory;

pub use http::http_service;
pub use memory::{InMemoryService, ServiceOp};

use crate::error::EngineResult;
use async_trait::async_trait;
use shared::models::{Table, TaxRates};
use shared::order::SettlementRecord;
use shared::request::{
    CreateKotRequest, DeleteSettlementRequest, MarkBillPrintedRequest, ReverseQuantityRequest,
    SetPaxRequest, SetTableStatusRequest, SettleBillRequest, TransferKotRequest,
    TransferTableRequest,
};
use shared::response::{CreateKotResponse, UnbilledItems};

#[async_trait]
pub trait PosService: Send + Sync {
    async fn list_tables(&self, department_id: Option<i64>) -> EngineResult<Vec<Table>>;

    async fn get_unbilled_items(&self, table_id: i64) -> EngineResult<UnbilledItems>;

    async fn create_kot(&self, request: &CreateKotRequest) -> EngineResult<CreateKotResponse>;

    async fn reverse_quantity(&self, request: &ReverseQuantityRequest) -> EngineResult<()>;

    /// `None` when no rates are configured for the pair
    async fn get_tax_rates(
        &self,
        outlet_id: i64,
        department_id: i64,
    ) -> EngineResult<Option<TaxRates>>;

    async fn mark_bill_printed(&self, request: &MarkBillPrintedRequest) -> EngineResult<()>;

    async fn settle_bill(&self, request: &SettleBillRequest)
    -> EngineResult<Vec<SettlementRecord>>;

    async fn delete_settlement(
        &self,
        settlement_id: i64,
        request: &DeleteSettlementRequest,
    ) -> EngineResult<()>;

    async fn transfer_table(&self, request: &TransferTableRequest) -> EngineResult<()>;

    async fn transfer_kot(&self, request: &TransferKotRequest) -> EngineResult<()>;

    async fn set_pax(&self, request: &SetPaxRequest) -> EngineResult<()>;

    async fn set_table_status(&self, request: &SetTableStatusRequest) -> EngineResult<()>;
}
