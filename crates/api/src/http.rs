use super::{ApiError, InvoiceCheck, PurchaseApi, SubmitReceipt};
use async_trait::async_trait;
use pos_purchase_core::InvoiceNumber;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CHECK_PATH: &str = "/api/check_invoice_number";

#[derive(Clone)]
pub enum Session {
    Anonymous,
    /// Raw `Cookie` header value of a logged-in browser session.
    Cookie(String),
}

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub check_path: String,
    /// `None` waits for as long as the server takes.
    pub timeout: Option<Duration>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            check_path: DEFAULT_CHECK_PATH.to_string(),
            timeout: None,
        }
    }
}

/// Failure bodies of the purchase backend look like
/// `{"success": false, "message": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct HttpPurchaseApi {
    pub base_url: Url,
    options: HttpOptions,
    session: Session,
    http_client: reqwest::Client,
}

impl HttpPurchaseApi {
    pub fn new(base_url: &str, session: Session, options: HttpOptions) -> Result<Arc<Self>, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Arc::new(Self {
            base_url,
            options,
            session,
            http_client,
        }))
    }

    /// Resolve `target` the way a browser resolves a form action: absolute
    /// URLs are kept, anything else is joined onto the base URL.
    pub fn resolve(&self, target: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(target)
            .map_err(|e| ApiError::InvalidUrl(format!("{target}: {e}")))
    }

    fn check_url(&self) -> Result<Url, ApiError> {
        self.resolve(&self.options.check_path)
    }

    fn with_session(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session {
            Session::Anonymous => req,
            Session::Cookie(cookie) => req.header(reqwest::header::COOKIE, cookie),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

async fn status_error(resp: reqwest::Response) -> ApiError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());
    ApiError::Status { status, message }
}

#[async_trait]
impl PurchaseApi for HttpPurchaseApi {
    async fn check_invoice_number(&self, number: &InvoiceNumber) -> Result<InvoiceCheck, ApiError> {
        let url = self.check_url()?;

        let resp = self
            .with_session(self.http_client.get(url))
            .query(&[("invoice_number", number.as_str())])
            .send()
            .await?;

        // The lookup answer is read from the body whatever the status says;
        // only a body that is not a lookup answer fails the check.
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        let check: InvoiceCheck = serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("HTTP {status}: {e}")))?;

        tracing::debug!(invoice_number = %number, status, exists = ?check.exists, "Invoice number checked");
        Ok(check)
    }

    async fn submit_form(
        &self,
        action: &str,
        body: &Map<String, Value>,
    ) -> Result<SubmitReceipt, ApiError> {
        let url = self.resolve(action)?;

        let resp = self
            .with_session(self.http_client.post(url.clone()))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let status = resp.status().as_u16();
        let body: Value = resp.json().await?;

        tracing::info!(%url, status, response = %body, "Purchase form submitted");

        Ok(SubmitReceipt { status, body })
    }

    async fn load_page(&self, path: &str) -> Result<u16, ApiError> {
        let url = self.resolve(path)?;
        let resp = self.with_session(self.http_client.get(url)).send().await?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        Ok(resp.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_action_resolves_like_a_browser() {
        let api = HttpPurchaseApi::new(
            "http://pos.local/app/",
            Session::Anonymous,
            HttpOptions::default(),
        )
        .unwrap();

        assert_eq!(
            api.resolve("/pembelian").unwrap().as_str(),
            "http://pos.local/pembelian"
        );
        assert_eq!(
            api.resolve("pembelian").unwrap().as_str(),
            "http://pos.local/app/pembelian"
        );
        assert_eq!(
            api.resolve("https://other.host/x").unwrap().as_str(),
            "https://other.host/x"
        );
    }

    #[test]
    fn check_url_follows_configured_path() {
        let api = HttpPurchaseApi::new("http://pos.local/", Session::Anonymous, HttpOptions::default())
            .unwrap();
        assert_eq!(
            api.check_url().unwrap().as_str(),
            "http://pos.local/api/check_invoice_number"
        );

        let api = HttpPurchaseApi::new(
            "http://pos.local/",
            Session::Anonymous,
            HttpOptions {
                check_path: "/v2/faktur/cek".to_string(),
                timeout: None,
            },
        )
        .unwrap();
        assert_eq!(api.check_url().unwrap().as_str(), "http://pos.local/v2/faktur/cek");
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let err = HttpPurchaseApi::new("not a url", Session::Anonymous, HttpOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn status_error_text_falls_back_to_generic_detail() {
        let err = ApiError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.to_string(), "Network response was not ok. (HTTP 500)");

        let err = ApiError::Status {
            status: 400,
            message: Some("Nomor faktur INV-001 sudah ada.".into()),
        };
        assert_eq!(err.to_string(), "Nomor faktur INV-001 sudah ada. (HTTP 400)");
    }
}
