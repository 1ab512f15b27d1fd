//! Submit flow of the purchase form: invoice number check, then JSON
//! submission, then page reload.
//!
//! The two network calls of one attempt run strictly one after the other.
//! Attempts themselves are not serialized: calling [`SubmitHandler::on_submit`]
//! again while an attempt is in flight starts a second, independent attempt.

mod guard;
mod submitter;

pub use guard::{GuardDecision, Rejection, SubmissionGuard};
pub use submitter::{BodyEncoding, FormSubmitter, SubmitFailure, SubmitResult};

use async_trait::async_trait;
use pos_purchase_core::{Alert, FormData};
use purchase_api::{ApiError, PurchaseApi, SubmitReceipt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// Shows a message to the user and returns once it was shown.
pub trait Notifier: Send + Sync {
    fn alert(&self, alert: &Alert);
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn reload(&self) -> Result<(), ApiError>;
}

/// Reloads by fetching the page from the backend again.
pub struct ApiPage {
    api: Arc<dyn PurchaseApi>,
    path: String,
}

impl ApiPage {
    pub fn new(api: Arc<dyn PurchaseApi>, path: impl Into<String>) -> Self {
        Self {
            api,
            path: path.into(),
        }
    }
}

#[async_trait]
impl Page for ApiPage {
    async fn reload(&self) -> Result<(), ApiError> {
        let status = self.api.load_page(&self.path).await?;
        tracing::debug!(path = %self.path, status, "Page reloaded");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Checking,
    Submitting,
    IdleWithReload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Rejected(Rejection),
    Saved {
        receipt: SubmitReceipt,
        reloaded: bool,
    },
    Failed(SubmitFailure),
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved { .. })
    }
}

pub struct SubmitHandler {
    guard: SubmissionGuard,
    submitter: FormSubmitter,
    notifier: Arc<dyn Notifier>,
    page: Arc<dyn Page>,
    state: watch::Sender<FlowState>,
}

impl SubmitHandler {
    pub fn new(
        guard: SubmissionGuard,
        submitter: FormSubmitter,
        notifier: Arc<dyn Notifier>,
        page: Arc<dyn Page>,
    ) -> Self {
        let (state, _) = watch::channel(FlowState::Idle);
        Self {
            guard,
            submitter,
            notifier,
            page,
            state,
        }
    }

    pub fn state(&self) -> FlowState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.state.subscribe()
    }

    fn transition(&self, next: FlowState) {
        let prev = self.state.send_replace(next);
        tracing::debug!(from = ?prev, to = ?next, "Submit state changed");
    }

    /// Handle one submit event. There is no way to cancel an attempt once
    /// a request is in flight.
    pub async fn on_submit(&self, form: &FormData) -> SubmitOutcome {
        let attempt = uuid::Uuid::new_v4();
        let span = tracing::info_span!("submit", %attempt, action = %self.submitter.action());
        self.run(form).instrument(span).await
    }

    async fn run(&self, form: &FormData) -> SubmitOutcome {
        self.transition(FlowState::Checking);

        let number = match self.guard.check(form, self.notifier.as_ref()).await {
            GuardDecision::Proceed(number) => number,
            GuardDecision::Rejected(rejection) => {
                self.transition(FlowState::Idle);
                return SubmitOutcome::Rejected(rejection);
            }
        };

        self.transition(FlowState::Submitting);
        tracing::info!(invoice_number = %number, fields = form.len(), "Submitting purchase form");

        match self
            .submitter
            .submit(form, self.notifier.as_ref(), self.page.as_ref())
            .await
        {
            SubmitResult::Saved { receipt, reloaded } => {
                self.transition(FlowState::IdleWithReload);
                SubmitOutcome::Saved { receipt, reloaded }
            }
            SubmitResult::Failed(failure) => {
                self.transition(FlowState::Idle);
                SubmitOutcome::Failed(failure)
            }
        }
    }
}
