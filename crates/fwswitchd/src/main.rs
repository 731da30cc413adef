//! fwswitchd entry point.
//!
//! Loads the firewall rules and controller configuration, then drives the
//! controller from a JSON-lines event stream (a file or stdin) until the
//! stream ends or the process is interrupted.

use anyhow::Context;
use clap::Parser;
use fwswitchd::{drive, Controller, ControllerConfig, FirewallSwitch, Policy};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Firewall learning switch controller
#[derive(Parser, Debug)]
#[command(name = "fwswitchd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Firewall rule file, one rule per line
    #[arg(short = 'r', long)]
    rules: PathBuf,

    /// Controller configuration (TOML); defaults apply when absent
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// JSON-lines switch event file; reads stdin when omitted
    #[arg(short = 'e', long)]
    events: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("--- Starting fwswitchd ---");

    match run(args).await {
        Ok(()) => {
            info!("fwswitchd exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("fwswitchd failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ControllerConfig::load_or_default(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ControllerConfig::default(),
    };
    config.validate().context("validating config")?;

    let policy = Policy::from_file(&args.rules)
        .with_context(|| format!("loading rules {}", args.rules.display()))?;
    config
        .validate_for_policy(&policy)
        .context("validating config against policy")?;
    info!(rules = policy.len(), "Loaded firewall policy");

    let app = Arc::new(FirewallSwitch::new(policy, &config));
    let controller = Arc::new(Controller::new(app.clone()));

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.events {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening event file {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let summary = drive(controller, reader, shutdown_signal())
        .await
        .context("replaying events")?;
    info!(
        dispatched = summary.dispatched,
        skipped = summary.skipped,
        "Event stream finished"
    );

    let stats = serde_json::to_string(&app.stats().snapshot()).context("encoding stats")?;
    info!(%stats, "Final controller statistics");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
