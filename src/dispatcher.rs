//! # Batch Fetch Dispatcher
//!
//! Resolves every identifier in a list against the per-identifier lookup
//! endpoint and forwards found documents to the notification sink.
//!
//! ## Flow
//!
//! ```text
//! identifiers ──▶ shape check ──▶ chunks of B ──▶ [Semaphore(C)] ──▶ fetch + retry
//!                     │                                                  │
//!                     ▼                                                  ▼
//!              "invalid format"                             classify ──▶ notify
//! ```
//!
//! Chunks run strictly in order; inside a chunk lookups run concurrently
//! with at most `C` in flight. A permit is held for one identifier's whole
//! fetch, retries included, and released before its notifications are sent.
//! No single identifier's failure stops the run.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backoff::RetryPolicy;
use crate::classify::{classify_lookup, LookupVerdict};
use crate::config::{expand_lookup_template, MonitorConfig};
use crate::error::{MonitorError, Result};
use crate::http::PageClient;
use crate::identifiers::{dedupe_preserving_order, Identifier, IdentifierRules};
use crate::messages;
use crate::notify::{deliver_rich, deliver_text, Notifier};
use crate::report::BatchReport;
use crate::types::{FetchFailure, FetchOutcome, OutcomeKind};

/// Sizing and endpoint settings for a dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub batch_pause: Duration,
    pub lookup_url_template: String,
    pub rules: IdentifierRules,
    pub retry: RetryPolicy,
}

impl DispatcherSettings {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            batch_size: config.dispatch.batch_size,
            max_concurrency: config.dispatch.max_concurrency,
            batch_pause: config.dispatch.batch_pause(),
            lookup_url_template: config.target.lookup_url_template.clone(),
            rules: IdentifierRules::new(config.identifiers.length),
            retry: RetryPolicy::from_config(&config.retry),
        }
    }

    fn lookup_url(&self, identifier: &Identifier) -> String {
        expand_lookup_template(&self.lookup_url_template, identifier.as_str())
    }
}

/// Batch engine bound to one page client and one notification sink
pub struct Dispatcher {
    client: Arc<dyn PageClient>,
    notifier: Arc<dyn Notifier>,
    settings: DispatcherSettings,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("settings", &self.settings)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn PageClient>,
        notifier: Arc<dyn Notifier>,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            client,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Process the whole list and report the tally
    ///
    /// Returns `MonitorError::NoValidIdentifiers` after notifying when the
    /// list is empty or nothing in it passes the shape check.
    pub async fn run(&self, identifiers: Vec<String>) -> Result<BatchReport> {
        let run_id = Uuid::new_v4();
        // Dedupe on the trimmed form so " 1234" and "1234" are one entry
        let identifiers =
            dedupe_preserving_order(identifiers.into_iter().map(|raw| raw.trim().to_string()));
        let mut report = BatchReport::new();

        if identifiers.is_empty() {
            warn!(run_id = %run_id, "Identifier list is empty");
            deliver_text(self.notifier.as_ref(), &messages::no_identifiers()).await;
            return Err(MonitorError::NoValidIdentifiers);
        }

        let batch_size = self.settings.batch_size.max(1);
        info!(
            run_id = %run_id,
            total = identifiers.len(),
            batch_size = batch_size,
            max_concurrency = self.settings.max_concurrency,
            "Dispatch run starting"
        );
        deliver_rich(
            self.notifier.as_ref(),
            &messages::processing_started(identifiers.len(), batch_size),
        )
        .await;

        let mut valid = Vec::with_capacity(identifiers.len());
        for raw in &identifiers {
            match self.settings.rules.validate(raw) {
                Some(identifier) => valid.push(identifier),
                None => {
                    info!(run_id = %run_id, identifier = %raw, "Rejected malformed identifier");
                    deliver_text(self.notifier.as_ref(), &messages::invalid_format(raw)).await;
                    report.record(OutcomeKind::Invalid, false);
                }
            }
        }

        if valid.is_empty() {
            warn!(run_id = %run_id, "No identifier passed the shape check");
            deliver_text(self.notifier.as_ref(), &messages::no_valid_identifiers()).await;
            return Err(MonitorError::NoValidIdentifiers);
        }

        let gate = Semaphore::new(self.settings.max_concurrency.max(1));
        let total_batches = valid.len().div_ceil(batch_size);

        for (index, chunk) in valid.chunks(batch_size).enumerate() {
            let batch_number = index + 1;
            debug!(
                run_id = %run_id,
                batch = batch_number,
                total_batches = total_batches,
                size = chunk.len(),
                "Processing batch"
            );

            let outcomes = join_all(
                chunk
                    .iter()
                    .map(|identifier| self.process_identifier(identifier, &gate)),
            )
            .await;

            for (kind, delivered) in outcomes {
                report.record(kind, delivered);
            }
            report.record_batch();

            info!(
                run_id = %run_id,
                batch = batch_number,
                total_batches = total_batches,
                size = chunk.len(),
                successful = report.successful,
                "Batch complete"
            );
            deliver_text(
                self.notifier.as_ref(),
                &messages::batch_progress(batch_number, total_batches, chunk.len()),
            )
            .await;

            if batch_number < total_batches && !self.settings.batch_pause.is_zero() {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
        }

        info!(
            run_id = %run_id,
            total = report.total,
            successful = report.successful,
            not_found = report.not_found,
            invalid = report.invalid,
            unavailable = report.unavailable,
            success_rate = %report.success_rate_display(),
            "Dispatch run complete"
        );
        deliver_rich(self.notifier.as_ref(), &messages::summary(&report)).await;

        Ok(report)
    }

    /// Fetch under the gate, then apply side effects with the permit released
    async fn process_identifier(
        &self,
        identifier: &Identifier,
        gate: &Semaphore,
    ) -> (OutcomeKind, bool) {
        // `run` never closes its gate; a closed gate still yields an outcome
        // so every identifier is reported exactly once.
        let outcome = match gate.acquire().await {
            Ok(_permit) => self.fetch_with_retry(identifier).await,
            Err(_) => {
                error!(identifier = %identifier, "Concurrency gate closed");
                FetchOutcome::Unavailable(FetchFailure::GateClosed)
            }
        };

        let kind = outcome.kind();
        let delivered = self.apply_outcome(identifier, outcome).await;
        (kind, delivered)
    }

    /// Look one identifier up, retrying transient failures with backoff
    pub async fn fetch_with_retry(&self, identifier: &Identifier) -> FetchOutcome {
        let url = self.settings.lookup_url(identifier);
        let retry = &self.settings.retry;
        let mut attempt = 0;

        loop {
            let failure = match self.client.get(&url).await {
                Ok(response) => match classify_lookup(&response) {
                    LookupVerdict::Found => return FetchOutcome::Found(response.body),
                    LookupVerdict::NotFound => return FetchOutcome::NotFound,
                    LookupVerdict::Invalid => return FetchOutcome::Invalid,
                    LookupVerdict::Transient => {
                        warn!(
                            identifier = %identifier,
                            attempt = attempt + 1,
                            max_attempts = retry.max_attempts(),
                            status = response.status,
                            "Upstream overloaded"
                        );
                        FetchFailure::Overloaded {
                            status: response.status,
                        }
                    }
                },
                Err(e) => {
                    warn!(
                        identifier = %identifier,
                        attempt = attempt + 1,
                        max_attempts = retry.max_attempts(),
                        error = %e,
                        "Lookup request failed"
                    );
                    FetchFailure::Transport(e)
                }
            };

            match retry.next_delay(attempt) {
                Some(delay) => {
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return FetchOutcome::Unavailable(failure),
            }
        }
    }

    /// Send the notifications for one outcome. Returns whether a found
    /// document was delivered.
    async fn apply_outcome(&self, identifier: &Identifier, outcome: FetchOutcome) -> bool {
        let notifier = self.notifier.as_ref();
        let id = identifier.as_str();

        match outcome {
            FetchOutcome::Found(document) => {
                info!(identifier = %id, bytes = document.len(), "Result found");
                deliver_rich(notifier, &messages::result_found(id)).await;

                let attachment = messages::result_attachment(id, &document);
                match notifier.notify_attachment(&attachment).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!(identifier = %id, error = %e, "Result file delivery failed");
                        deliver_text(notifier, &messages::file_delivery_failed(id)).await;
                        false
                    }
                }
            }
            FetchOutcome::Invalid => {
                info!(identifier = %id, "Upstream rejected identifier");
                deliver_text(notifier, &messages::invalid_format(id)).await;
                false
            }
            FetchOutcome::NotFound => {
                debug!(identifier = %id, "No result published");
                deliver_text(notifier, &messages::no_result(id)).await;
                false
            }
            // Same wording as NotFound; the distinction stays internal
            FetchOutcome::Unavailable(failure) => {
                warn!(identifier = %id, last_error = %failure, "Lookup retries exhausted");
                deliver_text(notifier, &messages::no_result(id)).await;
                false
            }
        }
    }
}
