//! Aggregate counts for one dispatcher run.

use serde::{Deserialize, Serialize};

use crate::types::OutcomeKind;

/// Tally built up as identifiers resolve
///
/// An identifier counts as successful only when it was found and its
/// document was delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub found: usize,
    pub not_found: usize,
    pub invalid: usize,
    pub unavailable: usize,
    pub delivery_failures: usize,
    pub batches: usize,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one resolved identifier
    pub fn record(&mut self, kind: OutcomeKind, delivered: bool) {
        self.total += 1;
        match kind {
            OutcomeKind::Found => {
                self.found += 1;
                if delivered {
                    self.successful += 1;
                } else {
                    self.delivery_failures += 1;
                }
            }
            OutcomeKind::NotFound => self.not_found += 1,
            OutcomeKind::Invalid => self.invalid += 1,
            OutcomeKind::Unavailable => self.unavailable += 1,
        }
    }

    pub fn record_batch(&mut self) {
        self.batches += 1;
    }

    pub fn failed(&self) -> usize {
        self.total - self.successful
    }

    /// Percentage of identifiers delivered, 0 for an empty run
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }

    /// Success rate with one decimal place, e.g. `"66.7%"`
    pub fn success_rate_display(&self) -> String {
        format!("{:.1}%", self.success_rate())
    }
}
