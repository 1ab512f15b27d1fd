use super::{ApiError, InvoiceCheck, PurchaseApi, SubmitReceipt};
use async_trait::async_trait;
use pos_purchase_core::InvoiceNumber;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Check(String),
    Submit { action: String, body: Value },
    LoadPage(String),
}

/// In-process stand-in for the purchase backend.
///
/// Every invoice number is free until a submission carrying it succeeds.
#[derive(Default)]
pub struct MockPurchaseApi {
    invoice_field: String,
    taken: Mutex<HashSet<String>>,
    check_reply: Option<InvoiceCheck>,
    check_error: Option<ApiError>,
    submit_error: Option<ApiError>,
    page_error: Option<ApiError>,
    latency: Duration,
    calls: Mutex<Vec<MockCall>>,
}

impl MockPurchaseApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::builder())
    }

    pub fn builder() -> Self {
        Self {
            invoice_field: "no_faktur".to_string(),
            ..Self::default()
        }
    }

    /// Form field whose value is recorded as taken after a successful
    /// submission.
    pub fn with_invoice_field(mut self, field: &str) -> Self {
        self.invoice_field = field.to_string();
        self
    }

    pub fn with_taken(mut self, number: &str) -> Self {
        self.taken.get_mut().insert(number.to_string());
        self
    }

    /// Answer every lookup with `reply` instead of the taken/free answer.
    pub fn answering_check(mut self, reply: InvoiceCheck) -> Self {
        self.check_reply = Some(reply);
        self
    }

    pub fn failing_check(mut self, err: ApiError) -> Self {
        self.check_error = Some(err);
        self
    }

    pub fn failing_submit(mut self, err: ApiError) -> Self {
        self.submit_error = Some(err);
        self
    }

    pub fn failing_page(mut self, err: ApiError) -> Self {
        self.page_error = Some(err);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().await.clone()
    }

    pub async fn submissions(&self) -> Vec<Value> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|c| match c {
                MockCall::Submit { body, .. } => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl PurchaseApi for MockPurchaseApi {
    async fn check_invoice_number(&self, number: &InvoiceNumber) -> Result<InvoiceCheck, ApiError> {
        self.calls
            .lock()
            .await
            .push(MockCall::Check(number.to_string()));
        self.simulate_latency().await;

        if let Some(err) = &self.check_error {
            return Err(err.clone());
        }
        if let Some(reply) = &self.check_reply {
            return Ok(reply.clone());
        }

        if self.taken.lock().await.contains(number.as_str()) {
            Ok(InvoiceCheck::taken())
        } else {
            Ok(InvoiceCheck::free())
        }
    }

    async fn submit_form(
        &self,
        action: &str,
        body: &Map<String, Value>,
    ) -> Result<SubmitReceipt, ApiError> {
        self.calls.lock().await.push(MockCall::Submit {
            action: action.to_string(),
            body: Value::Object(body.clone()),
        });
        self.simulate_latency().await;

        if let Some(err) = &self.submit_error {
            return Err(err.clone());
        }

        if let Some(Value::String(number)) = body.get(&self.invoice_field) {
            self.taken.lock().await.insert(number.trim().to_string());
        }

        Ok(SubmitReceipt {
            status: 200,
            body: json!({"success": true, "message": "Pembelian berhasil disimpan."}),
        })
    }

    async fn load_page(&self, path: &str) -> Result<u16, ApiError> {
        self.calls
            .lock()
            .await
            .push(MockCall::LoadPage(path.to_string()));

        match &self.page_error {
            Some(err) => Err(err.clone()),
            None => Ok(200),
        }
    }
}
