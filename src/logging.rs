//! # Structured Logging Module
//!
//! Environment-aware structured logging that writes human-readable output to
//! the console and JSON lines to a log file.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with console and JSON file output
///
/// Safe to call more than once; only the first call installs a subscriber.
/// `RUST_LOG` overrides the environment-derived level.
pub fn init_structured_logging(log_dir: &Path) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");

        let file_layer = match std::fs::create_dir_all(log_dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::never(log_dir, &log_filename);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                Some((
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_ansi(false)
                        .json()
                        .with_filter(build_filter(&log_level)),
                    guard,
                ))
            }
            Err(e) => {
                eprintln!("Failed to create log directory {}: {e}", log_dir.display());
                None
            }
        };

        let (file_layer, guard) = match file_layer {
            Some((layer, guard)) => (Some(layer), Some(guard)),
            None => (None, None),
        };

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_filter(build_filter(&log_level)),
            )
            .with(file_layer);

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing");
        }

        let log_path: PathBuf = log_dir.join(&log_filename);
        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_path.display(),
            "Structured logging initialized"
        );

        // The writer flushes on drop; keep it alive for the process lifetime
        if let Some(guard) = guard {
            std::mem::forget(guard);
        }
    });
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("RESULTS_MONITOR_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log a notification that the sink refused or could not deliver
pub fn log_delivery_failure(kind: &str, subject: Option<&str>, error: &str) {
    tracing::error!(
        kind = %kind,
        subject = subject,
        error = %error,
        timestamp = %Utc::now().to_rfc3339(),
        "Notification delivery failed"
    );
}
