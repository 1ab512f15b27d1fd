use crate::Notifier;
use pos_purchase_core::{Alert, FormData, InvoiceNumber};
use purchase_api::{ApiError, PurchaseApi};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    MissingInvoiceNumber,
    InvoiceNumberTaken(InvoiceNumber),
    CheckFailed(ApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Proceed(InvoiceNumber),
    Rejected(Rejection),
}

/// Lets a submission through only when the server reports the invoice
/// number as unused.
pub struct SubmissionGuard {
    api: Arc<dyn PurchaseApi>,
    invoice_field: String,
    report_check_failures: bool,
}

impl SubmissionGuard {
    pub fn new(api: Arc<dyn PurchaseApi>, invoice_field: impl Into<String>) -> Self {
        Self {
            api,
            invoice_field: invoice_field.into(),
            report_check_failures: false,
        }
    }

    /// Alert on lookup failures instead of blocking silently.
    pub fn report_check_failures(mut self, report: bool) -> Self {
        self.report_check_failures = report;
        self
    }

    pub async fn check(&self, form: &FormData, notifier: &dyn Notifier) -> GuardDecision {
        let number = match form.invoice_number(&self.invoice_field) {
            Ok(number) => number,
            Err(_) => {
                notifier.alert(&Alert::InvoiceNumberRequired);
                return GuardDecision::Rejected(Rejection::MissingInvoiceNumber);
            }
        };

        match self.api.check_invoice_number(&number).await {
            Ok(check) if check.is_taken() => {
                tracing::info!(invoice_number = %number, "Invoice number already used");
                notifier.alert(&Alert::InvoiceNumberTaken);
                GuardDecision::Rejected(Rejection::InvoiceNumberTaken(number))
            }
            Ok(_) => GuardDecision::Proceed(number),
            Err(err) => {
                tracing::error!(invoice_number = %number, error = %err, "Error checking invoice number");
                if self.report_check_failures {
                    notifier.alert(&Alert::CheckFailed(err.to_string()));
                }
                GuardDecision::Rejected(Rejection::CheckFailed(err))
            }
        }
    }
}
