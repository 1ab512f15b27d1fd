use async_trait::async_trait;
use pos_purchase_core::InvoiceNumber;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Generic detail used when a failing response carries no message.
pub const NOT_OK_TEXT: &str = "Network response was not ok.";

/// Answer of the invoice number lookup.
///
/// Only an explicit `"exists": true` marks the number as used; a reply
/// without the field (or with `null`) lets the submission go ahead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCheck {
    #[serde(default)]
    pub exists: Option<bool>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl InvoiceCheck {
    pub fn free() -> Self {
        Self {
            exists: Some(false),
            available: Some(true),
            message: None,
        }
    }

    pub fn taken() -> Self {
        Self {
            exists: Some(true),
            available: Some(false),
            message: None,
        }
    }

    pub fn is_taken(&self) -> bool {
        self.exists == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub status: u16,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("{} (HTTP {status})", .message.as_deref().unwrap_or(NOT_OK_TEXT))]
    Status { status: u16, message: Option<String> },
}

#[async_trait]
pub trait PurchaseApi: Send + Sync {
    /// `GET /api/check_invoice_number?invoice_number=<number>`
    async fn check_invoice_number(&self, number: &InvoiceNumber) -> Result<InvoiceCheck, ApiError>;

    /// POST the form body as JSON to the form's action URL.
    async fn submit_form(
        &self,
        action: &str,
        body: &Map<String, Value>,
    ) -> Result<SubmitReceipt, ApiError>;

    /// Fetch a page again, returning its HTTP status.
    async fn load_page(&self, path: &str) -> Result<u16, ApiError>;
}

pub mod http;
pub mod mock;
