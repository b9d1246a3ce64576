//! # Results Monitor
//!
//! Watches the configured results page until it goes live, then looks up
//! every identifier in the identifier file and forwards found results to
//! the configured webhook.
//!
//! Stops early on Ctrl-C (or SIGTERM on Unix) after sending a final
//! "monitoring stopped" notification.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use results_monitor::config::ConfigManager;
use results_monitor::http::{HttpPageClient, PageClient};
use results_monitor::identifiers::{FileIdentifierSource, IdentifierSource};
use results_monitor::logging::init_structured_logging;
use results_monitor::monitor::{ResultsMonitor, RunOutcome};
use results_monitor::notify::{LogNotifier, Notifier, WebhookNotifier};

#[derive(Parser)]
#[command(name = "results-monitor")]
#[command(about = "Watch a results page and forward published results to a webhook")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (default: $RESULTS_MONITOR_CONFIG or config/results-monitor.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Identifier list, overriding `dispatch.identifier_file`
    #[arg(short, long)]
    identifiers: Option<PathBuf>,

    /// Print the effective configuration (secrets masked) and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let manager = ConfigManager::load_from(cli.config).context("failed to load configuration")?;
    if cli.check_config {
        println!("{}", serde_json::to_string_pretty(&manager.debug_config())?);
        return Ok(());
    }

    let config = manager.config();
    init_structured_logging(&config.logging.directory);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = ?manager.config_path(),
        "Starting results monitor"
    );

    let client: Arc<dyn PageClient> =
        Arc::new(HttpPageClient::new(&config.target).context("failed to build page client")?);

    let notifier: Arc<dyn Notifier> = if config.notifier.dry_run {
        warn!("Dry run enabled, notifications are written to the log only");
        Arc::new(LogNotifier)
    } else {
        let http = reqwest::Client::builder()
            .timeout(config.target.request_timeout())
            .build()
            .context("failed to build webhook client")?;
        Arc::new(WebhookNotifier::new(http, &config.notifier).context("invalid webhook settings")?)
    };

    let identifier_file = cli
        .identifiers
        .unwrap_or_else(|| config.dispatch.identifier_file.clone());
    let source: Arc<dyn IdentifierSource> = Arc::new(FileIdentifierSource::new(identifier_file));

    let shutdown = CancellationToken::new();
    tokio::spawn(forward_shutdown_signal(shutdown.clone()));

    let monitor = ResultsMonitor::from_config(config, client, notifier, source, shutdown);
    match monitor.run().await {
        RunOutcome::Completed(Some(report)) => info!(
            total = report.total,
            successful = report.successful,
            success_rate = %report.success_rate_display(),
            "Results monitor finished"
        ),
        RunOutcome::Completed(None) => info!("Results monitor finished without dispatching"),
        RunOutcome::Stopped => info!("Results monitor stopped"),
    }

    Ok(())
}

/// Cancel `token` on the first Ctrl-C or SIGTERM
async fn forward_shutdown_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Could not install SIGTERM handler");
                if signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
                return;
            }
        };
        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Ctrl-C handler failed");
                    return;
                }
            }
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler failed");
            return;
        }
    }

    info!("Shutdown signal received");
    token.cancel();
}
