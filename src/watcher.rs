//! # Target Watcher
//!
//! Polls the results page on a fixed interval until it is classified live,
//! then hands control to a [`LiveHandler`] exactly once and stops.
//!
//! Non-live states are reported through the throttle so a long outage yields
//! one notification per window rather than one per poll. The sleep between
//! polls races the shutdown token, so a stop request is honoured within one
//! interval at most.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classify::classify_probe;
use crate::config::MonitorConfig;
use crate::constants::NotifyCategory;
use crate::http::PageClient;
use crate::messages;
use crate::notify::{deliver_rich, deliver_text, Notifier};
use crate::throttle::{Throttle, ThrottlePolicy};
use crate::types::PollState;

/// Work to run once the target goes live
#[async_trait]
pub trait LiveHandler: Send + Sync {
    type Output: Send;

    async fn on_live(&self) -> Self::Output;
}

/// How a watch loop ended
#[derive(Debug)]
pub enum WatchOutcome<T> {
    /// Target went live and the handler ran
    Live(T),
    /// Shutdown was requested before the target went live
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct WatcherSettings {
    pub target_url: String,
    pub poll_interval: Duration,
    pub heartbeat: bool,
    pub throttle: ThrottlePolicy,
}

impl WatcherSettings {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            target_url: config.target.url.clone(),
            poll_interval: config.watch.poll_interval(),
            heartbeat: config.watch.heartbeat_interval().is_some(),
            throttle: ThrottlePolicy::from_config(&config.throttle, &config.watch),
        }
    }
}

/// Poll loop state, owned by one run
pub struct Watcher {
    client: Arc<dyn PageClient>,
    notifier: Arc<dyn Notifier>,
    target_url: String,
    poll_interval: Duration,
    heartbeat: bool,
    throttle: Throttle,
    shutdown: CancellationToken,
    polls: u64,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("target_url", &self.target_url)
            .field("poll_interval", &self.poll_interval)
            .field("heartbeat", &self.heartbeat)
            .field("polls", &self.polls)
            .finish()
    }
}

impl Watcher {
    pub fn new(
        client: Arc<dyn PageClient>,
        notifier: Arc<dyn Notifier>,
        settings: WatcherSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            client,
            notifier,
            target_url: settings.target_url,
            poll_interval: settings.poll_interval,
            heartbeat: settings.heartbeat,
            throttle: Throttle::new(settings.throttle),
            shutdown,
            polls: 0,
        }
    }

    /// Number of probes issued so far
    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Fetch the target once and classify it
    pub async fn probe(&self) -> PollState {
        match self.client.get(&self.target_url).await {
            Ok(response) => classify_probe(&response),
            Err(e) => PollState::Unreachable(e),
        }
    }

    /// Poll until live or cancelled
    pub async fn run<H>(&mut self, handler: &H) -> WatchOutcome<H::Output>
    where
        H: LiveHandler,
    {
        let started = Instant::now();
        if self.heartbeat {
            self.throttle.seed(NotifyCategory::Heartbeat, started);
        }

        info!(
            target_url = %self.target_url,
            poll_interval_secs = self.poll_interval.as_secs(),
            "Watching target"
        );

        let mut last_label: Option<&'static str> = None;

        loop {
            if self.shutdown.is_cancelled() {
                info!(polls = self.polls, "Watcher stopped before next probe");
                return WatchOutcome::Cancelled;
            }

            let state = self.probe().await;
            self.polls += 1;
            debug!(poll = self.polls, state = state.label(), "Probe complete");

            if last_label != Some(state.label()) {
                info!(
                    from = last_label.unwrap_or("none"),
                    to = state.label(),
                    "Target state changed"
                );
                last_label = Some(state.label());
            }

            let message = match &state {
                PollState::Live => {
                    deliver_rich(self.notifier.as_ref(), &messages::results_live()).await;
                    let output = handler.on_live().await;
                    return WatchOutcome::Live(output);
                }
                PollState::NotYet => messages::not_yet_live(),
                PollState::Degraded => messages::degraded(),
                PollState::Unreachable(e) => {
                    warn!(error = %e, kind = e.kind(), "Target unreachable");
                    messages::unreachable(e)
                }
            };
            if let Some(category) = state.category() {
                self.emit_throttled(category, &message).await;
            }

            if self.heartbeat {
                let uptime = Instant::now().saturating_duration_since(started);
                self.emit_throttled(NotifyCategory::Heartbeat, &messages::heartbeat(uptime))
                    .await;
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!(polls = self.polls, "Shutdown requested, watcher exiting");
                    return WatchOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Send `message` if the category's window allows it
    ///
    /// The clock advances on every attempt, even when the sink fails.
    async fn emit_throttled(&mut self, category: NotifyCategory, message: &str) -> bool {
        let decision = self.throttle.decide(category, Instant::now());
        if !decision.should_emit {
            debug!(category = %category, "Notification suppressed by throttle");
            return false;
        }
        let delivered = deliver_text(self.notifier.as_ref(), message).await;
        self.throttle.commit(decision);
        delivered
    }
}
