use crate::{Notifier, Page};
use pos_purchase_core::validation::{coerce, FormSchema};
use pos_purchase_core::{Alert, FormData};
use purchase_api::{ApiError, PurchaseApi, SubmitReceipt};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// How form values are put on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BodyEncoding {
    /// Every value as the text that was entered.
    #[default]
    Verbatim,
    /// Values of schema fields converted to their JSON type first.
    Typed(FormSchema),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitFailure {
    InvalidFields(Vec<String>),
    Api(ApiError),
}

impl fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitFailure::InvalidFields(errs) => f.write_str(&errs.join("; ")),
            SubmitFailure::Api(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResult {
    Saved {
        receipt: SubmitReceipt,
        reloaded: bool,
    },
    Failed(SubmitFailure),
}

pub struct FormSubmitter {
    api: Arc<dyn PurchaseApi>,
    action: String,
    encoding: BodyEncoding,
}

impl FormSubmitter {
    pub fn new(api: Arc<dyn PurchaseApi>, action: impl Into<String>) -> Self {
        Self {
            api,
            action: action.into(),
            encoding: BodyEncoding::Verbatim,
        }
    }

    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn encode(&self, form: &FormData) -> Result<Map<String, Value>, Vec<String>> {
        match &self.encoding {
            BodyEncoding::Verbatim => Ok(form.to_json_object()),
            BodyEncoding::Typed(schema) => coerce(form, schema),
        }
    }

    /// Send the form. Success is reported before the page reload starts.
    pub async fn submit(
        &self,
        form: &FormData,
        notifier: &dyn Notifier,
        page: &dyn Page,
    ) -> SubmitResult {
        let body = match self.encode(form) {
            Ok(body) => body,
            Err(errs) => return self.fail(SubmitFailure::InvalidFields(errs), notifier),
        };

        let receipt = match self.api.submit_form(&self.action, &body).await {
            Ok(receipt) => receipt,
            Err(err) => return self.fail(SubmitFailure::Api(err), notifier),
        };

        tracing::info!(status = receipt.status, response = %receipt.body, "Success");
        notifier.alert(&Alert::Saved);

        let reloaded = match page.reload().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Page reload failed");
                false
            }
        };

        SubmitResult::Saved { receipt, reloaded }
    }

    fn fail(&self, failure: SubmitFailure, notifier: &dyn Notifier) -> SubmitResult {
        tracing::error!(action = %self.action, error = %failure, "Error");
        notifier.alert(&Alert::SaveFailed(failure.to_string()));
        SubmitResult::Failed(failure)
    }
}
