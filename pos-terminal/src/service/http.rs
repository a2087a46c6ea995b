use super::PosService;
use crate::TerminalConfig;
use crate::error::EngineResult;
use async_trait::async_trait;
use pos_client::HttpClient;
use shared::models::{Table, TaxRates};
use shared::order::SettlementRecord;
use shared::request::{
    CreateKotRequest, DeleteSettlementRequest, MarkBillPrintedRequest, ReverseQuantityRequest,
    SetPaxRequest, SetTableStatusRequest, SettleBillRequest, TransferKotRequest,
    TransferTableRequest,
};
use shared::response::{CreateKotResponse, UnbilledItems};

/// HTTP-backed service built from terminal configuration
pub fn http_service(config: &TerminalConfig) -> EngineResult<HttpClient> {
    Ok(config.client_config().build_http_client()?)
}

#[async_trait]
impl PosService for HttpClient {
    async fn list_tables(&self, department_id: Option<i64>) -> EngineResult<Vec<Table>> {
        Ok(HttpClient::list_tables(self, department_id).await?)
    }

    async fn get_unbilled_items(&self, table_id: i64) -> EngineResult<UnbilledItems> {
        Ok(HttpClient::get_unbilled_items(self, table_id).await?)
    }

    async fn create_kot(&self, request: &CreateKotRequest) -> EngineResult<CreateKotResponse> {
        Ok(HttpClient::create_kot(self, request).await?)
    }

    async fn reverse_quantity(&self, request: &ReverseQuantityRequest) -> EngineResult<()> {
        Ok(HttpClient::reverse_quantity(self, request).await?)
    }

    async fn get_tax_rates(
        &self,
        outlet_id: i64,
        department_id: i64,
    ) -> EngineResult<Option<TaxRates>> {
        Ok(HttpClient::get_tax_rates(self, outlet_id, department_id).await?)
    }

    async fn mark_bill_printed(&self, request: &MarkBillPrintedRequest) -> EngineResult<()> {
        Ok(HttpClient::mark_bill_printed(self, request).await?)
    }

    async fn settle_bill(
        &self,
        request: &SettleBillRequest,
    ) -> EngineResult<Vec<SettlementRecord>> {
        Ok(HttpClient::settle_bill(self, request).await?)
    }

    async fn delete_settlement(
        &self,
        settlement_id: i64,
        request: &DeleteSettlementRequest,
    ) -> EngineResult<()> {
        Ok(HttpClient::delete_settlement(self, settlement_id, request).await?)
    }

    async fn transfer_table(&self, request: &TransferTableRequest) -> EngineResult<()> {
        Ok(HttpClient::transfer_table(self, request).await?)
    }

    async fn transfer_kot(&self, request: &TransferKotRequest) -> EngineResult<()> {
        Ok(HttpClient::transfer_kot(self, request).await?)
    }

    async fn set_pax(&self, request: &SetPaxRequest) -> EngineResult<()> {
        Ok(HttpClient::set_pax(self, request).await?)
    }

    async fn set_table_status(&self, request: &SetTableStatusRequest) -> EngineResult<()> {
        Ok(HttpClient::set_table_status(self, request).await?)
    }
}
