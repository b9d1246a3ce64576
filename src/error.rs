//! # Error Types
//!
//! Error taxonomy for the monitor. Per-identifier failures never escape the
//! dispatcher; only configuration and identifier-source problems surface as
//! run-level errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigurationError;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Transport-level failure while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("connection failed: {url} - {reason}")]
    Connect { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Classify a reqwest error into the most specific variant
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            Self::Connect {
                url: url.to_string(),
                reason: error.to_string(),
            }
        } else {
            Self::Http(error)
        }
    }

    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "Timeout",
            FetchError::Connect { .. } => "ConnectError",
            FetchError::Http(_) => "HttpError",
            FetchError::Body(_) => "BodyError",
        }
    }
}

/// Failure reported by a notification sink
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification rejected: {status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("notification transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

impl NotifyError {
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }
}

/// Failure reading the identifier list
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("identifier file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("identifier file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Umbrella error for run-level failures
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Identifier source error: {0}")]
    Source(#[from] SourceError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("No valid identifiers to process")]
    NoValidIdentifiers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kinds() {
        let timeout = FetchError::Timeout {
            url: "https://example.test".to_string(),
        };
        assert_eq!(timeout.kind(), "Timeout");
        assert!(timeout.to_string().contains("https://example.test"));

        let body = FetchError::Body("truncated".to_string());
        assert_eq!(body.kind(), "BodyError");
    }

    #[test]
    fn test_source_error_display() {
        let err = SourceError::NotFound(PathBuf::from("registration_numbers.txt"));
        assert_eq!(
            err.to_string(),
            "identifier file not found: registration_numbers.txt"
        );
    }

    #[test]
    fn test_monitor_error_from_source() {
        let err: MonitorError = SourceError::NotFound(PathBuf::from("ids.txt")).into();
        assert!(matches!(err, MonitorError::Source(_)));
    }
}
