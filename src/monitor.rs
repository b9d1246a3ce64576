//! # Results Monitor Pipeline
//!
//! Wires the watcher to the dispatcher for one run:
//!
//! 1. announce that monitoring started
//! 2. poll the target until it goes live or shutdown is requested
//! 3. on live, load the identifier list and dispatch it
//! 4. always finish with a "complete" or "stopped" notification
//!
//! Run-level problems (unreadable identifier source, nothing valid to look
//! up) are reported once through the sink and end the run normally.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::MonitorConfig;
use crate::dispatcher::{Dispatcher, DispatcherSettings};
use crate::error::MonitorError;
use crate::http::PageClient;
use crate::identifiers::IdentifierSource;
use crate::messages;
use crate::notify::{deliver_rich, deliver_text, Notifier};
use crate::report::BatchReport;
use crate::watcher::{LiveHandler, WatchOutcome, Watcher, WatcherSettings};

/// How a monitor run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Target went live; `None` when the identifier stage ended early
    Completed(Option<BatchReport>),
    /// Shutdown arrived before the target went live
    Stopped,
}

/// Loads identifiers and dispatches them once the target is live
struct DispatchOnLive<'a> {
    source: &'a dyn IdentifierSource,
    dispatcher: Dispatcher,
    notifier: &'a dyn Notifier,
}

#[async_trait]
impl LiveHandler for DispatchOnLive<'_> {
    type Output = Option<BatchReport>;

    async fn on_live(&self) -> Option<BatchReport> {
        let identifiers = match self.source.load().await {
            Ok(identifiers) => identifiers,
            Err(e) => {
                error!(source = %self.source.describe(), error = %e, "Failed to load identifiers");
                deliver_text(self.notifier, &messages::identifier_source_failed(&e)).await;
                return None;
            }
        };

        info!(
            source = %self.source.describe(),
            count = identifiers.len(),
            "Loaded identifiers"
        );

        match self.dispatcher.run(identifiers).await {
            Ok(report) => Some(report),
            Err(MonitorError::NoValidIdentifiers) => None,
            Err(e) => {
                error!(error = %e, "Dispatch run failed");
                None
            }
        }
    }
}

/// One end-to-end monitoring run
pub struct ResultsMonitor {
    client: Arc<dyn PageClient>,
    notifier: Arc<dyn Notifier>,
    source: Arc<dyn IdentifierSource>,
    watch: WatcherSettings,
    dispatch: DispatcherSettings,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for ResultsMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultsMonitor")
            .field("watch", &self.watch)
            .field("dispatch", &self.dispatch)
            .field("source", &self.source.describe())
            .finish()
    }
}

impl ResultsMonitor {
    pub fn new(
        client: Arc<dyn PageClient>,
        notifier: Arc<dyn Notifier>,
        source: Arc<dyn IdentifierSource>,
        watch: WatcherSettings,
        dispatch: DispatcherSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            client,
            notifier,
            source,
            watch,
            dispatch,
            shutdown,
        }
    }

    pub fn from_config(
        config: &MonitorConfig,
        client: Arc<dyn PageClient>,
        notifier: Arc<dyn Notifier>,
        source: Arc<dyn IdentifierSource>,
        shutdown: CancellationToken,
    ) -> Self {
        Self::new(
            client,
            notifier,
            source,
            WatcherSettings::from_config(config),
            DispatcherSettings::from_config(config),
            shutdown,
        )
    }

    /// Token that stops the watch loop when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(&self) -> RunOutcome {
        let notifier = self.notifier.as_ref();
        deliver_rich(
            notifier,
            &messages::monitoring_started(&self.watch.target_url, self.watch.poll_interval),
        )
        .await;

        let handler = DispatchOnLive {
            source: self.source.as_ref(),
            dispatcher: Dispatcher::new(
                Arc::clone(&self.client),
                Arc::clone(&self.notifier),
                self.dispatch.clone(),
            ),
            notifier,
        };
        let mut watcher = Watcher::new(
            Arc::clone(&self.client),
            Arc::clone(&self.notifier),
            self.watch.clone(),
            self.shutdown.clone(),
        );

        match watcher.run(&handler).await {
            WatchOutcome::Live(report) => {
                info!(
                    polls = watcher.polls(),
                    delivered = report.as_ref().map(|r| r.successful),
                    "Monitoring complete"
                );
                deliver_text(notifier, &messages::monitoring_complete(report.as_ref())).await;
                RunOutcome::Completed(report)
            }
            WatchOutcome::Cancelled => {
                warn!(polls = watcher.polls(), "Monitoring stopped before results went live");
                deliver_text(notifier, &messages::monitoring_stopped()).await;
                RunOutcome::Stopped
            }
        }
    }
}
