use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use models::{encode_items, NewReceipt, Receipt};

pub mod models;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Failed to fetch receipts: {0}")]
    Fetch(String),
    #[error("Failed to add receipt: {0}")]
    Insert(String),
}

/// The two operations the application needs from the backend.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Every receipt, newest first.
    async fn list_receipts(&self) -> Result<Vec<Receipt>, StoreError>;

    /// Inserts one receipt and returns the stored row.
    async fn create_receipt(&self, receipt: &NewReceipt) -> Result<Receipt, StoreError>;
}

/// PostgREST client for the hosted `receipts` table.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
    items_as_text: bool,
}

#[derive(Deserialize)]
struct BackendError {
    message: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            items_as_text: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            &config.receipts_table,
        )
        .items_as_text(config.items_as_text)
    }

    /// Send `items` as a JSON-encoded string, for tables whose column is text.
    pub fn items_as_text(mut self, enabled: bool) -> Self {
        self.items_as_text = enabled;
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    fn insert_payload(&self, receipt: &NewReceipt) -> serde_json::Value {
        let mut row = serde_json::json!({
            "pharmacy_name": receipt.pharmacy_name,
            "patient_name": receipt.patient_name,
            "items": receipt.items,
            "total": receipt.total,
        });
        if self.items_as_text {
            row["items"] = serde_json::Value::String(encode_items(&receipt.items));
        }
        serde_json::Value::Array(vec![row])
    }
}

/// Pulls the backend's `message` out of an error response, falling back to the raw body.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<BackendError>(&body) {
        Ok(err) => err.message,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body,
    }
}

#[async_trait]
impl ReceiptStore for SupabaseClient {
    async fn list_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Fetch(error_message(response).await));
        }

        response
            .json::<Vec<Receipt>>()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))
    }

    async fn create_receipt(&self, receipt: &NewReceipt) -> Result<Receipt, StoreError> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, "application/vnd.pgrst.object+json")
            .json(&self.insert_payload(receipt))
            .send()
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Insert(error_message(response).await));
        }

        response
            .json::<Receipt>()
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))
    }
}
