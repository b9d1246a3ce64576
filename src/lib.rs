#![allow(clippy::doc_markdown)] // Allow technical terms like reqwest, tokio in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Results Monitor
//!
//! Watches an exam-results page until it is published, then looks up every
//! registration number in a list and forwards each found result to a chat
//! webhook.
//!
//! ## Architecture
//!
//! ```text
//! Watcher ──(live)──▶ IdentifierSource ──▶ Dispatcher ──▶ Notifier
//!    │                                         │
//!    └── Throttle (per-category windows)       └── RetryPolicy + Semaphore(C)
//! ```
//!
//! - The **watcher** polls the target on a fixed interval. Non-live states
//!   are reported through a per-category throttle; the first live probe
//!   hands off to the dispatcher exactly once.
//! - The **dispatcher** validates identifiers, processes them in ordered
//!   batches with bounded concurrency, retries transient failures with
//!   exponential backoff and reports one outcome per identifier.
//! - Every outbound side effect goes through the [`notify::Notifier`] trait;
//!   every page fetch goes through [`http::PageClient`].
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (defaults, TOML, environment)
//! - [`watcher`] - Poll/detect loop with cancellable suspension
//! - [`dispatcher`] - Batch lookup engine
//! - [`throttle`] - Pure notification throttle policy
//! - [`backoff`] - Retry schedule
//! - [`classify`] - Response classification
//! - [`notify`] - Notification sinks (webhook, log, recorder)
//! - [`monitor`] - End-to-end pipeline for one run
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use results_monitor::config::ConfigManager;
//! use results_monitor::http::HttpPageClient;
//! use results_monitor::identifiers::FileIdentifierSource;
//! use results_monitor::monitor::ResultsMonitor;
//! use results_monitor::notify::LogNotifier;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//!
//! let monitor = ResultsMonitor::from_config(
//!     config,
//!     Arc::new(HttpPageClient::new(&config.target)?),
//!     Arc::new(LogNotifier),
//!     Arc::new(FileIdentifierSource::new(&config.dispatch.identifier_file)),
//!     CancellationToken::new(),
//! );
//! let outcome = monitor.run().await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! No test needs the network: pages come from scripted `PageClient` fakes
//! and notifications are captured by [`notify::RecordingNotifier`].
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```

pub mod backoff;
pub mod classify;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod logging;
pub mod messages;
pub mod monitor;
pub mod notify;
pub mod report;
pub mod throttle;
pub mod types;
pub mod watcher;

pub use backoff::RetryPolicy;
pub use classify::{classify_lookup, classify_probe, LookupVerdict, PageResponse};
pub use config::{ConfigManager, ConfigurationError, MonitorConfig};
pub use constants::NotifyCategory;
pub use dispatcher::{Dispatcher, DispatcherSettings};
pub use error::{FetchError, MonitorError, NotifyError, Result, SourceError};
pub use identifiers::{Identifier, IdentifierRules, IdentifierSource};
pub use monitor::{ResultsMonitor, RunOutcome};
pub use notify::{Notifier, RichMessage, Severity};
pub use report::BatchReport;
pub use throttle::{Throttle, ThrottleClock, ThrottleDecision, ThrottlePolicy};
pub use types::{FetchFailure, FetchOutcome, OutcomeKind, PollState};
pub use watcher::{LiveHandler, WatchOutcome, Watcher, WatcherSettings};
