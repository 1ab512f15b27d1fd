use crate::{ConfigCommand, SubmitArgs};
use anyhow::{Context, Result};
use config::AppConfig;
use pos_purchase_core::parsing::{parse_field_arg, parse_form};
use pos_purchase_core::validation::FormSchema;
use pos_purchase_core::{Alert, FormData, InvoiceNumber};
use purchase_api::PurchaseApi;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use submission::{
    ApiPage, BodyEncoding, FormSubmitter, Notifier, SubmissionGuard, SubmitHandler,
    SubmitOutcome,
};

/// Alerts go to the terminal; errors on stderr so stdout stays clean.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&self, alert: &Alert) {
        if alert.is_error() {
            eprintln!("{alert}");
        } else {
            println!("{alert}");
        }
    }
}

/// Either the per-user config or an explicit file given on the command line.
pub struct ConfigSource {
    path: Option<PathBuf>,
}

impl ConfigSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<AppConfig> {
        match &self.path {
            Some(path) => config::load_path(path),
            None => config::load(),
        }
    }

    pub fn store(&self, cfg: &AppConfig) -> Result<()> {
        match &self.path {
            Some(path) => config::store_path(path, cfg),
            None => config::store(cfg),
        }
    }

    pub fn path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => config::default_path(),
        }
    }
}

/// Read the form file (if any) and apply `name=value` overrides on top.
pub fn read_form(path: Option<&Path>, fields: &[String]) -> Result<FormData> {
    let mut form = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read form file {}", path.display()))?;
            parse_form(&content)
                .with_context(|| format!("Failed to parse form file {}", path.display()))?
        }
        None => FormData::new(),
    };

    for field in fields {
        let (name, value) = parse_field_arg(field)?;
        form.set(name, value);
    }
    if form.is_empty() {
        tracing::warn!("Form has no fields; the invoice number check will refuse it");
    }
    Ok(form)
}

pub fn body_encoding(cfg: &AppConfig) -> Result<BodyEncoding> {
    if !cfg.form.coerce_types {
        return Ok(BodyEncoding::Verbatim);
    }
    let schema = FormSchema::from_names(
        cfg.form
            .schema
            .iter()
            .map(|(field, kind)| (field.as_str(), kind.as_str())),
    )
    .map_err(|errs| anyhow::anyhow!("invalid form schema: {}", errs.join("; ")))?;
    Ok(BodyEncoding::Typed(schema))
}

pub fn build_handler(
    cfg: &AppConfig,
    api: Arc<dyn PurchaseApi>,
    action: Option<&str>,
) -> Result<SubmitHandler> {
    let guard = SubmissionGuard::new(Arc::clone(&api), cfg.form.invoice_field.clone())
        .report_check_failures(cfg.alerts.report_check_failures);
    let submitter = FormSubmitter::new(
        Arc::clone(&api),
        action.unwrap_or(&cfg.backend.form_action),
    )
    .with_encoding(body_encoding(cfg)?);
    let page = ApiPage::new(api, cfg.backend.page_path.clone());

    Ok(SubmitHandler::new(
        guard,
        submitter,
        Arc::new(TerminalNotifier),
        Arc::new(page),
    ))
}

pub async fn submit(cfg: &AppConfig, api: Arc<dyn PurchaseApi>, args: &SubmitArgs) -> Result<bool> {
    let form = read_form(args.form.as_deref(), &args.fields)?;
    let handler = build_handler(cfg, api, args.action.as_deref())?;

    let outcome = handler.on_submit(&form).await;
    match &outcome {
        SubmitOutcome::Saved { reloaded: false, .. } => {
            eprintln!("Halaman gagal dimuat ulang; data sudah tersimpan.");
        }
        SubmitOutcome::Rejected(rejection) => {
            tracing::debug!(?rejection, "Submission rejected");
        }
        _ => {}
    }
    Ok(outcome.is_saved())
}

pub async fn check(api: Arc<dyn PurchaseApi>, raw: &str) -> Result<bool> {
    let notifier = TerminalNotifier;
    let Ok(number) = InvoiceNumber::parse(raw) else {
        notifier.alert(&Alert::InvoiceNumberRequired);
        return Ok(false);
    };

    let check = api
        .check_invoice_number(&number)
        .await
        .with_context(|| format!("Failed to check invoice number {number}"))?;

    if check.is_taken() {
        notifier.alert(&Alert::InvoiceNumberTaken);
        Ok(false)
    } else {
        println!(
            "{}",
            check.message.as_deref().unwrap_or("Nomor faktur tersedia.")
        );
        Ok(true)
    }
}

pub fn configure(source: &ConfigSource, cmd: ConfigCommand) -> Result<bool> {
    match cmd {
        ConfigCommand::Show => {
            let cfg = source.load()?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        ConfigCommand::Path => {
            println!("{}", source.path()?.display());
        }
        ConfigCommand::SetBaseUrl { url } => {
            let mut cfg = source.load()?;
            cfg.backend.base_url = url;
            source.store(&cfg)?;
            tracing::info!(base_url = %cfg.backend.base_url, "Settings updated");
        }
        ConfigCommand::SetSession { cookie } => {
            config::store_secret(config::SESSION_SECRET_KEY, cookie.trim())
                .context("Failed to store session cookie")?;
            tracing::info!("Session cookie stored");
        }
        ConfigCommand::ClearSession => {
            config::delete_secret(config::SESSION_SECRET_KEY)
                .context("Failed to delete session cookie")?;
            tracing::info!("Session cookie removed");
        }
    }
    Ok(true)
}
