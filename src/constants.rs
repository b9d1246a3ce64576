//! # System Constants
//!
//! Page markers, default endpoints and notification categories that define
//! the operational boundaries of the results monitor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text markers used to classify upstream HTML
pub mod markers {
    /// Present only on a published result document
    pub const RESULT_MARKERS: &[&str] = &["Student Name:", "Registration No:"];

    /// Boilerplate served while the upstream is overloaded or erroring
    pub const DOWN_MARKERS: &[&str] = &[
        "HTTP Error 503",
        "Service Unavailable",
        "Server Error in '/' Application",
        "Internal Server Error",
    ];

    /// Authoritative "no such identifier" answer from the lookup endpoint
    pub const INVALID_IDENTIFIER_MARKER: &str = "Invalid Registration Number";
}

/// Built-in defaults used when no configuration overrides them
pub mod defaults {
    pub const TARGET_URL: &str = "https://results.beup.ac.in/BTech1stSem2024_B2024Results.aspx";
    pub const LOOKUP_URL_TEMPLATE: &str =
        "https://results.beup.ac.in/ResultsBTech1stSem2024_B2024Pub.aspx?Sem=I&RegNo={id}";
    pub const IDENTIFIER_FILE: &str = "registration_numbers.txt";
    pub const IDENTIFIER_PLACEHOLDER: &str = "{id}";
    pub const IDENTIFIER_LENGTH: usize = 11;

    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
    pub const POLL_INTERVAL_SECS: u64 = 1;
    pub const HEARTBEAT_INTERVAL_SECS: u64 = 3600;

    pub const BATCH_SIZE: usize = 20;
    pub const MAX_CONCURRENCY: usize = 10;
    pub const BATCH_PAUSE_MS: u64 = 1000;

    pub const RETRY_MAX_ATTEMPTS: u32 = 3;
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
    pub const RETRY_MAX_DELAY_MS: u64 = 60_000;

    pub const THROTTLE_WINDOW_SECS: u64 = 3600;

    pub const NOTIFIER_USERNAME: &str = "Result Monitor Bot";
    pub const NOTIFIER_AVATAR_URL: &str = "https://cdn.discordapp.com/embed/avatars/0.png";
    pub const MESSAGE_DELAY_MS: u64 = 1000;
    pub const MAX_CONTENT_LEN: usize = 2000;
}

/// Process-wide identifiers
pub mod system {
    pub const SERVICE_NAME: &str = "results-monitor";
    pub const ENV_PREFIX: &str = "RESULTS_MONITOR";
    pub const CONFIG_PATH_ENV: &str = "RESULTS_MONITOR_CONFIG";
    pub const DEFAULT_CONFIG_PATH: &str = "config/results-monitor.toml";
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

/// Notification categories subject to throttling
///
/// Each category keeps an independent window and first-observation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyCategory {
    NotYetLive,
    Degraded,
    Unreachable,
    Heartbeat,
}

impl NotifyCategory {
    pub const ALL: [NotifyCategory; 4] = [
        NotifyCategory::NotYetLive,
        NotifyCategory::Degraded,
        NotifyCategory::Unreachable,
        NotifyCategory::Heartbeat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyCategory::NotYetLive => "not_yet_live",
            NotifyCategory::Degraded => "degraded",
            NotifyCategory::Unreachable => "unreachable",
            NotifyCategory::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for NotifyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
