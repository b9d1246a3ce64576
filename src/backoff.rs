//! # Retry Backoff
//!
//! Exponential backoff for transient lookup failures. Attempt `n` (zero-based)
//! that fails transiently is followed by a `base * 2^n` pause, capped at
//! `max_delay`. No pause follows the final attempt, so `R` attempts sleep
//! `2^0, 2^1, ..., 2^(R-2)` base units in total.

use std::time::Duration;

use crate::config::RetryConfig;

/// Attempt ceiling and delay schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after a transient failure on zero-based `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // 2^31 base units is far beyond any sane cap
        let factor = 1u32 << attempt.min(31);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Pause to take before the next attempt, or `None` once exhausted
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (attempt + 1 < self.max_attempts).then(|| self.delay_for(attempt))
    }

    /// Every pause a fully transient lookup goes through
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts)
            .filter_map(|attempt| self.next_delay(attempt))
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
