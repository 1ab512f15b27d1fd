mod commands;

use clap::{Args, Parser, Subcommand};
use commands::ConfigSource;
use config::AppConfig;
use purchase_api::{
    http::{HttpOptions, HttpPurchaseApi, Session},
    mock::MockPurchaseApi,
    PurchaseApi,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "pos-purchase", version, about = "Submit purchase invoices to the POS backend")]
struct Cli {
    /// Use this config file instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check the invoice number and submit the purchase form
    Submit(SubmitArgs),
    /// Ask the backend whether an invoice number is already used
    Check { invoice_number: String },
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Form file: flat JSON object or `name=value` lines
    #[arg(long)]
    pub form: Option<PathBuf>,

    /// Add or override a field, e.g. `--field no_faktur=INV-001`
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Post to this URL instead of the configured form action
    #[arg(long)]
    pub action: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    Show,
    Path,
    SetBaseUrl { url: String },
    /// Store the backend session cookie in the OS keychain
    SetSession { cookie: String },
    ClearSession,
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn create_purchase_api(cfg: &AppConfig) -> anyhow::Result<Arc<dyn PurchaseApi>> {
    match cfg.backend.kind.as_str() {
        "http" => {
            let session = match config::session_cookie() {
                Some(cookie) => {
                    tracing::info!("Using stored backend session");
                    Session::Cookie(cookie)
                }
                None => Session::Anonymous,
            };
            let options = HttpOptions {
                check_path: cfg.backend.check_path.clone(),
                timeout: cfg.backend.request_timeout_secs.map(Duration::from_secs),
            };
            tracing::info!(base_url = %cfg.backend.base_url, "Using HTTP purchase backend");
            Ok(HttpPurchaseApi::new(&cfg.backend.base_url, session, options)?)
        }
        "mock" => {
            tracing::info!("Using mock purchase backend");
            Ok(MockPurchaseApi::builder()
                .with_invoice_field(&cfg.form.invoice_field)
                .shared())
        }
        other => anyhow::bail!("unknown backend kind `{other}` (expected `http` or `mock`)"),
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let source = ConfigSource::new(cli.config);

    match cli.command {
        Command::Submit(args) => {
            let cfg = source.load()?;
            let api = create_purchase_api(&cfg)?;
            commands::submit(&cfg, api, &args).await
        }
        Command::Check { invoice_number } => {
            let cfg = source.load()?;
            let api = create_purchase_api(&cfg)?;
            commands::check(api, &invoice_number).await
        }
        Command::Config(cmd) => commands::configure(&source, cmd),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
