//! HTTP client for the persistence service

use crate::{ApiResponse, ClientConfig, ClientError, ClientResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::models::{Table, TaxRates};
use shared::order::SettlementRecord;
use shared::request::{
    CreateKotRequest, DeleteSettlementRequest, MarkBillPrintedRequest, ReverseQuantityRequest,
    SetPaxRequest, SetTableStatusRequest, SettleBillRequest, TransferKotRequest,
    TransferTableRequest,
};
use shared::response::{CreateKotResponse, UnbilledItems};

/// HTTP client for making requests to the persistence service
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Build authorization header value
    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        tracing::debug!(method = "GET", %url, "service request");
        let mut request = self.client.get(&url);

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.url(path);
        tracing::debug!(method = "POST", %url, "service request");
        let mut request = self.client.post(&url).json(body);

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request without body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        tracing::debug!(method = "POST", %url, "service request");
        let mut request = self.client.post(&url);

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return Err(ClientError::from_status(status, text));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Unwrap an envelope that must carry data
    fn data<T>(envelope: ApiResponse<T>, what: &str) -> ClientResult<T> {
        envelope
            .into_result()?
            .ok_or_else(|| ClientError::InvalidResponse(format!("Missing {} data", what)))
    }

    /// Unwrap an envelope that carries no data
    fn unit(envelope: ApiResponse<serde_json::Value>) -> ClientResult<()> {
        envelope.into_result()?;
        Ok(())
    }

    // ========== Tables ==========

    /// `listTables(departmentId?)`
    pub async fn list_tables(&self, department_id: Option<i64>) -> ClientResult<Vec<Table>> {
        let path = match department_id {
            Some(id) => format!("tables?department_id={}", id),
            None => "tables".to_string(),
        };
        let envelope = self.get::<ApiResponse<Vec<Table>>>(&path).await?;
        Self::data(envelope, "table list")
    }

    pub async fn set_pax(&self, request: &SetPaxRequest) -> ClientResult<()> {
        let path = format!("tables/{}/pax", request.table_id);
        Self::unit(self.post(&path, request).await?)
    }

    pub async fn set_table_status(&self, request: &SetTableStatusRequest) -> ClientResult<()> {
        let path = format!("tables/{}/status", request.table_id);
        Self::unit(self.post(&path, request).await?)
    }

    // ========== Orders / KOT ==========

    /// `getUnbilledItems(tableId)`
    pub async fn get_unbilled_items(&self, table_id: i64) -> ClientResult<UnbilledItems> {
        let path = format!("tables/{}/unbilled-items", table_id);
        let envelope = self.get::<ApiResponse<UnbilledItems>>(&path).await?;
        Self::data(envelope, "unbilled items")
    }

    /// `createOrUpdateKOT(tableId, deltaItems[])`
    pub async fn create_kot(&self, request: &CreateKotRequest) -> ClientResult<CreateKotResponse> {
        let envelope = self
            .post::<ApiResponse<CreateKotResponse>, _>("kots", request)
            .await?;
        Self::data(envelope, "KOT")
    }

    /// `reverseQuantity(itemId, kotNo, qty)`
    pub async fn reverse_quantity(&self, request: &ReverseQuantityRequest) -> ClientResult<()> {
        Self::unit(self.post("kots/reverse", request).await?)
    }

    // ========== Tax ==========

    /// `getTaxRates(outletId, departmentId)`; `None` when nothing is configured
    pub async fn get_tax_rates(
        &self,
        outlet_id: i64,
        department_id: i64,
    ) -> ClientResult<Option<TaxRates>> {
        let path = format!(
            "tax-rates?outlet_id={}&department_id={}",
            outlet_id, department_id
        );
        let envelope = self.get::<ApiResponse<TaxRates>>(&path).await?;
        Ok(envelope.into_result()?)
    }

    // ========== Billing ==========

    pub async fn mark_bill_printed(&self, request: &MarkBillPrintedRequest) -> ClientResult<()> {
        Self::unit(self.post("bills/print", request).await?)
    }

    /// `settleBill(orderRef, payments[], tip)`
    pub async fn settle_bill(
        &self,
        request: &SettleBillRequest,
    ) -> ClientResult<Vec<SettlementRecord>> {
        let envelope = self
            .post::<ApiResponse<Vec<SettlementRecord>>, _>("settlements", request)
            .await?;
        Self::data(envelope, "settlement")
    }

    /// `deleteSettlement(settlementId)`
    pub async fn delete_settlement(
        &self,
        settlement_id: i64,
        request: &DeleteSettlementRequest,
    ) -> ClientResult<()> {
        let path = format!("settlements/{}/delete", settlement_id);
        Self::unit(self.post(&path, request).await?)
    }

    // ========== Transfers ==========

    pub async fn transfer_table(&self, request: &TransferTableRequest) -> ClientResult<()> {
        Self::unit(self.post("transfers/table", request).await?)
    }

    pub async fn transfer_kot(&self, request: &TransferKotRequest) -> ClientResult<()> {
        Self::unit(self.post("transfers/kot", request).await?)
    }
}
