//! Configuration Loader
//!
//! Layered configuration loading:
//! 0. `.env` file if present (via dotenvy)
//! 1. built-in defaults
//! 2. optional TOML file (`RESULTS_MONITOR_CONFIG` or `config/results-monitor.toml`)
//! 3. `RESULTS_MONITOR__SECTION__KEY` environment variables
//!
//! The webhook URL additionally honours the conventional `DISCORD_WEBHOOK`
//! and `DISCORD_WEBHOOK_URL` variables.

use super::error::ConfigResult;
use super::MonitorConfig;
use crate::constants::system;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const WEBHOOK_FALLBACK_VARS: &[&str] = &["DISCORD_WEBHOOK", "DISCORD_WEBHOOK_URL"];

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: MonitorConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from the process environment
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from(None)
    }

    /// Like [`ConfigManager::load`], with an explicit file taking priority
    /// over `RESULTS_MONITOR_CONFIG`
    pub fn load_from(explicit: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => debug!(error = %e, "Ignoring unreadable .env file"),
        }

        let path = explicit.unwrap_or_else(|| {
            std::env::var(system::CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(system::DEFAULT_CONFIG_PATH))
        });

        Self::load_with_env(Some(&path), None)
    }

    /// Load configuration from an explicit file, optionally replacing the
    /// process environment with `env` (used by tests to avoid global state)
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let mut builder = Config::builder();

        let config_path = path.filter(|p| p.is_file()).map(Path::to_path_buf);
        if let Some(ref file) = config_path {
            debug!(path = %file.display(), "Reading configuration file");
            builder = builder.add_source(File::from(file.as_path()).format(FileFormat::Toml));
        }

        let fallback_webhook = Self::fallback_webhook(env.as_ref());

        let environment = Environment::with_prefix(system::ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(env);
        builder = builder.add_source(environment);

        let mut config: MonitorConfig = builder.build()?.try_deserialize()?;

        if config.notifier.webhook_url.is_none() {
            config.notifier.webhook_url = fallback_webhook;
        }

        config.validate()?;

        debug!(
            "Configuration loaded: {}",
            serde_json::to_string_pretty(&Self::sanitize_config_for_logging(&config))
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );

        info!(
            target_url = %config.target.url,
            poll_interval_secs = config.watch.poll_interval_secs,
            batch_size = config.dispatch.batch_size,
            max_concurrency = config.dispatch.max_concurrency,
            max_attempts = config.retry.max_attempts,
            dry_run = config.notifier.dry_run,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            config_path,
        }))
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The file the configuration was read from, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Configuration as JSON with secrets masked
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    fn fallback_webhook(env: Option<&HashMap<String, String>>) -> Option<String> {
        WEBHOOK_FALLBACK_VARS
            .iter()
            .find_map(|name| match env {
                Some(map) => map.get(*name).cloned(),
                None => std::env::var(name).ok(),
            })
            .filter(|url| !url.trim().is_empty())
    }

    fn sanitize_config_for_logging(config: &MonitorConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);
        let sensitive_patterns = ["webhook", "token", "secret", "password"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        if let serde_json::Value::String(s) = val {
                            // Keep the scheme and host readable
                            let visible: String = s.chars().take(12).collect();
                            *val = serde_json::Value::String(format!("[MASKED: {visible}***]"));
                        }
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}
