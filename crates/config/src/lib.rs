use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "pos-purchase";
const KEYCHAIN_SERVICE: &str = "pos.purchase.credentials";

pub const SESSION_SECRET_KEY: &str = "session_cookie";
pub const SESSION_ENV_VAR: &str = "POS_SESSION_COOKIE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_kind")]
    pub kind: String, // "http" | "mock"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_check_path")]
    pub check_path: String,
    /// Where the form is posted to.
    #[serde(default = "default_purchase_path")]
    pub form_action: String,
    /// Page fetched again after a successful save.
    #[serde(default = "default_purchase_path")]
    pub page_path: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            base_url: default_base_url(),
            check_path: default_check_path(),
            form_action: default_purchase_path(),
            page_path: default_purchase_path(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default = "default_invoice_field")]
    pub invoice_field: String,
    /// Send schema fields as typed JSON instead of plain text.
    #[serde(default)]
    pub coerce_types: bool,
    /// field name -> text | integer | decimal | date | boolean
    #[serde(default = "default_schema")]
    pub schema: BTreeMap<String, String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            invoice_field: default_invoice_field(),
            coerce_types: false,
            schema: default_schema(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AlertConfig {
    /// Alert when the invoice number lookup itself fails instead of
    /// silently blocking the submission.
    #[serde(default)]
    pub report_check_failures: bool,
}

fn default_backend_kind() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_check_path() -> String {
    "/api/check_invoice_number".to_string()
}

fn default_purchase_path() -> String {
    "/pembelian".to_string()
}

fn default_invoice_field() -> String {
    "no_faktur".to_string()
}

fn default_schema() -> BTreeMap<String, String> {
    [
        ("tanggal_faktur", "date"),
        ("no_faktur", "text"),
        ("supplier", "integer"),
        ("jenis_pembayaran", "text"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn load() -> Result<AppConfig> {
    let cfg: AppConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn store(cfg: &AppConfig) -> Result<()> {
    confy::store(APP_NAME, None, cfg).context("Failed to store app config")?;
    Ok(())
}

/// Load from an explicit file; a missing file is created with defaults.
pub fn load_path(path: &Path) -> Result<AppConfig> {
    let cfg: AppConfig = confy::load_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok(cfg)
}

pub fn store_path(path: &Path, cfg: &AppConfig) -> Result<()> {
    confy::store_path(path, cfg)
        .with_context(|| format!("Failed to store config to {}", path.display()))?;
    Ok(())
}

pub fn default_path() -> Result<PathBuf> {
    confy::get_configuration_file_path(APP_NAME, None).context("Failed to locate app config")
}

/// Store a secret in the OS keychain
pub fn store_secret(key: &str, value: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

/// Retrieve a secret from the OS keychain
pub fn get_secret(key: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    let password = entry.get_password()?;
    Ok(password)
}

/// Delete a secret from the OS keychain
pub fn delete_secret(key: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.delete_password()?;
    Ok(())
}

/// Session cookie for the backend: environment first, then keychain.
pub fn session_cookie() -> Option<String> {
    pick_session(std::env::var(SESSION_ENV_VAR).ok(), || {
        get_secret(SESSION_SECRET_KEY).ok()
    })
}

/// Blank values count as unset; the keychain is only read when the
/// environment gives nothing.
fn pick_session(env: Option<String>, keychain: impl FnOnce() -> Option<String>) -> Option<String> {
    env.filter(|v| !v.trim().is_empty())
        .or_else(keychain)
        .filter(|v| !v.trim().is_empty())
}
