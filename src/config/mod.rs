//! # Monitor Configuration
//!
//! Typed configuration for every tunable the monitor accepts. Nothing in the
//! watcher, dispatcher or notification sinks hardcodes a timing constant;
//! they all read from these sections.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use results_monitor::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let batch_size = manager.config().dispatch.batch_size;
//! let interval = manager.config().watch.poll_interval();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{defaults, NotifyCategory};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Monitored page and per-identifier lookup endpoint
    pub target: TargetConfig,

    /// Poll loop timing
    pub watch: WatchConfig,

    /// Batch engine sizing
    pub dispatch: DispatchConfig,

    /// Per-identifier retry policy
    pub retry: RetryConfig,

    /// Notification throttle windows
    pub throttle: ThrottleConfig,

    /// Outbound notification sink
    pub notifier: NotifierConfig,

    /// Identifier shape rules
    pub identifiers: IdentifierConfig,

    /// Log file location
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    pub url: String,
    /// Lookup URL with an `{id}` placeholder
    pub lookup_url_template: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: defaults::TARGET_URL.to_string(),
            lookup_url_template: defaults::LOOKUP_URL_TEMPLATE.to_string(),
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            user_agent: format!("results-monitor/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TargetConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the lookup URL for one identifier
    pub fn lookup_url(&self, identifier: &str) -> String {
        expand_lookup_template(&self.lookup_url_template, identifier)
    }
}

/// Substitute `identifier` for every `{id}` in `template`
pub fn expand_lookup_template(template: &str, identifier: &str) -> String {
    template.replace(defaults::IDENTIFIER_PLACEHOLDER, identifier)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_secs: u64,
    /// Zero disables the heartbeat
    pub heartbeat_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
            heartbeat_interval_secs: defaults::HEARTBEAT_INTERVAL_SECS,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_interval_secs > 0)
            .then(|| Duration::from_secs(self.heartbeat_interval_secs))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub batch_pause_ms: u64,
    pub identifier_file: PathBuf,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            max_concurrency: defaults::MAX_CONCURRENCY,
            batch_pause_ms: defaults::BATCH_PAUSE_MS,
            identifier_file: PathBuf::from(defaults::IDENTIFIER_FILE),
        }
    }
}

impl DispatchConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
        }
    }
}

/// Throttle windows; per-category values fall back to `default_window_secs`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub default_window_secs: u64,
    pub not_yet_live_secs: Option<u64>,
    pub degraded_secs: Option<u64>,
    pub unreachable_secs: Option<u64>,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            default_window_secs: defaults::THROTTLE_WINDOW_SECS,
            not_yet_live_secs: None,
            degraded_secs: None,
            unreachable_secs: None,
        }
    }
}

impl ThrottleConfig {
    /// Window for a category. Heartbeat cadence lives in `WatchConfig`.
    pub fn window_for(&self, category: NotifyCategory) -> Duration {
        let secs = match category {
            NotifyCategory::NotYetLive => self.not_yet_live_secs,
            NotifyCategory::Degraded => self.degraded_secs,
            NotifyCategory::Unreachable => self.unreachable_secs,
            NotifyCategory::Heartbeat => None,
        };
        Duration::from_secs(secs.unwrap_or(self.default_window_secs))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub webhook_url: Option<String>,
    pub username: String,
    pub avatar_url: String,
    pub message_delay_ms: u64,
    pub max_content_len: usize,
    /// Log notifications instead of delivering them
    pub dry_run: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: defaults::NOTIFIER_USERNAME.to_string(),
            avatar_url: defaults::NOTIFIER_AVATAR_URL.to_string(),
            message_delay_ms: defaults::MESSAGE_DELAY_MS,
            max_content_len: defaults::MAX_CONTENT_LEN,
            dry_run: false,
        }
    }
}

impl NotifierConfig {
    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentifierConfig {
    pub length: usize,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            length: defaults::IDENTIFIER_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("log"),
        }
    }
}

impl MonitorConfig {
    /// Reject configurations the monitor cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.target.url.trim().is_empty() {
            return Err(ConfigurationError::missing_field("target.url"));
        }
        if !self
            .target
            .lookup_url_template
            .contains(defaults::IDENTIFIER_PLACEHOLDER)
        {
            return Err(ConfigurationError::invalid_value(
                "target.lookup_url_template",
                &self.target.lookup_url_template,
                "template must contain the {id} placeholder",
            ));
        }
        if self.target.request_timeout_secs == 0 {
            return Err(ConfigurationError::invalid_value(
                "target.request_timeout_secs",
                "0",
                "timeout must be positive",
            ));
        }
        if self.watch.poll_interval_secs == 0 {
            return Err(ConfigurationError::invalid_value(
                "watch.poll_interval_secs",
                "0",
                "poll interval must be positive",
            ));
        }
        if self.dispatch.batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "dispatch.batch_size",
                "0",
                "batch size must be positive",
            ));
        }
        if self.dispatch.max_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "dispatch.max_concurrency",
                "0",
                "concurrency ceiling must be positive",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                "0",
                "at least one attempt is required",
            ));
        }
        if self.identifiers.length == 0 {
            return Err(ConfigurationError::invalid_value(
                "identifiers.length",
                "0",
                "identifier length must be positive",
            ));
        }
        let has_webhook = self
            .notifier
            .webhook_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if !has_webhook && !self.notifier.dry_run {
            return Err(ConfigurationError::missing_field("notifier.webhook_url"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.notifier.webhook_url = Some("https://hooks.example.test/abc".to_string());
        config
    }

    #[test]
    fn test_defaults_validate_with_webhook() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_webhook_rejected_unless_dry_run() {
        let mut config = MonitorConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingField(field)) if field == "notifier.webhook_url"
        ));

        config.notifier.dry_run = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let mut config = valid_config();
        config.target.lookup_url_template = "https://example.test/result".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { field, .. }) if field == "target.lookup_url_template"
        ));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let mut config = valid_config();
        config.dispatch.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.dispatch.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lookup_url_substitution() {
        let target = TargetConfig {
            lookup_url_template: "https://example.test/r?RegNo={id}&Sem=I".to_string(),
            ..TargetConfig::default()
        };
        assert_eq!(
            target.lookup_url("12345678901"),
            "https://example.test/r?RegNo=12345678901&Sem=I"
        );
    }

    #[test]
    fn test_throttle_window_overrides() {
        let throttle = ThrottleConfig {
            default_window_secs: 3600,
            degraded_secs: Some(600),
            ..ThrottleConfig::default()
        };
        assert_eq!(
            throttle.window_for(NotifyCategory::Degraded),
            Duration::from_secs(600)
        );
        assert_eq!(
            throttle.window_for(NotifyCategory::Unreachable),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_heartbeat_disabled_by_zero() {
        let watch = WatchConfig {
            heartbeat_interval_secs: 0,
            ..WatchConfig::default()
        };
        assert!(watch.heartbeat_interval().is_none());
    }
}
