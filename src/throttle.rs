//! # Notification Throttling
//!
//! Keeps repeated status notifications from flooding the sink. The policy is
//! a pure function of `(category, now, clock)`; the caller owns the clock and
//! commits the returned copy once it has attempted the emission.
//!
//! A category notifies on its first observation, then at most once per
//! window. Categories never share state.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{ThrottleConfig, WatchConfig};
use crate::constants::NotifyCategory;

/// Last emission time per category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThrottleClock {
    last_emitted: HashMap<NotifyCategory, Instant>,
}

impl ThrottleClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_emitted(&self, category: NotifyCategory) -> Option<Instant> {
        self.last_emitted.get(&category).copied()
    }

    /// Copy of this clock with `category` stamped at `at`
    pub fn recorded(&self, category: NotifyCategory, at: Instant) -> Self {
        let mut next = self.clone();
        next.last_emitted.insert(category, at);
        next
    }
}

/// Result of evaluating the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleDecision {
    pub should_emit: bool,
    /// Clock to commit after the emission attempt
    pub clock: ThrottleClock,
}

/// Per-category windows
#[derive(Debug, Clone)]
pub struct ThrottlePolicy {
    windows: HashMap<NotifyCategory, Duration>,
    default_window: Duration,
}

impl ThrottlePolicy {
    pub fn new(default_window: Duration) -> Self {
        Self {
            windows: HashMap::new(),
            default_window,
        }
    }

    pub fn with_window(mut self, category: NotifyCategory, window: Duration) -> Self {
        self.windows.insert(category, window);
        self
    }

    pub fn from_config(throttle: &ThrottleConfig, watch: &WatchConfig) -> Self {
        let mut policy = Self::new(Duration::from_secs(throttle.default_window_secs));
        for category in [
            NotifyCategory::NotYetLive,
            NotifyCategory::Degraded,
            NotifyCategory::Unreachable,
        ] {
            policy = policy.with_window(category, throttle.window_for(category));
        }
        if let Some(interval) = watch.heartbeat_interval() {
            policy = policy.with_window(NotifyCategory::Heartbeat, interval);
        }
        policy
    }

    pub fn window(&self, category: NotifyCategory) -> Duration {
        self.windows
            .get(&category)
            .copied()
            .unwrap_or(self.default_window)
    }

    /// Decide whether `category` may notify at `now`
    pub fn evaluate(
        &self,
        category: NotifyCategory,
        now: Instant,
        clock: &ThrottleClock,
    ) -> ThrottleDecision {
        let should_emit = match clock.last_emitted(category) {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.window(category),
        };

        let clock = if should_emit {
            clock.recorded(category, now)
        } else {
            clock.clone()
        };

        ThrottleDecision { should_emit, clock }
    }
}

/// Policy plus the clock it governs, owned by one watcher
#[derive(Debug, Clone)]
pub struct Throttle {
    policy: ThrottlePolicy,
    clock: ThrottleClock,
}

impl Throttle {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            clock: ThrottleClock::new(),
        }
    }

    pub fn decide(&self, category: NotifyCategory, now: Instant) -> ThrottleDecision {
        self.policy.evaluate(category, now, &self.clock)
    }

    /// Adopt the clock from a decision whose emission was attempted
    pub fn commit(&mut self, decision: ThrottleDecision) {
        self.clock = decision.clock;
    }

    /// Treat `category` as already emitted at `at`
    ///
    /// Used to delay the first heartbeat by a full interval.
    pub fn seed(&mut self, category: NotifyCategory, at: Instant) {
        self.clock = self.clock.recorded(category, at);
    }

    pub fn clock(&self) -> &ThrottleClock {
        &self.clock
    }

    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_first_observation_always_emits() {
        let policy = ThrottlePolicy::new(HOUR);
        let decision = policy.evaluate(NotifyCategory::Degraded, Instant::now(), &ThrottleClock::new());
        assert!(decision.should_emit);
        assert!(decision.clock.last_emitted(NotifyCategory::Degraded).is_some());
    }

    #[test]
    fn test_repeat_within_window_is_suppressed() {
        let policy = ThrottlePolicy::new(HOUR);
        let start = Instant::now();
        let first = policy.evaluate(NotifyCategory::Degraded, start, &ThrottleClock::new());

        let second = policy.evaluate(
            NotifyCategory::Degraded,
            start + Duration::from_secs(1),
            &first.clock,
        );
        assert!(!second.should_emit);
        assert_eq!(second.clock, first.clock);

        let third = policy.evaluate(NotifyCategory::Degraded, start + HOUR, &first.clock);
        assert!(third.should_emit);
    }

    #[test]
    fn test_categories_are_independent() {
        let policy = ThrottlePolicy::new(HOUR);
        let start = Instant::now();
        let degraded = policy.evaluate(NotifyCategory::Degraded, start, &ThrottleClock::new());

        let unreachable = policy.evaluate(
            NotifyCategory::Unreachable,
            start + Duration::from_secs(1),
            &degraded.clock,
        );
        assert!(unreachable.should_emit);

        // Observing unreachable does not reset degraded
        let degraded_again = policy.evaluate(
            NotifyCategory::Degraded,
            start + Duration::from_secs(2),
            &unreachable.clock,
        );
        assert!(!degraded_again.should_emit);
    }

    #[test]
    fn test_per_category_windows() {
        let policy = ThrottlePolicy::new(HOUR)
            .with_window(NotifyCategory::NotYetLive, Duration::from_secs(60));
        assert_eq!(policy.window(NotifyCategory::NotYetLive), Duration::from_secs(60));
        assert_eq!(policy.window(NotifyCategory::Degraded), HOUR);
    }

    #[test]
    fn test_seeded_category_waits_a_full_window() {
        let start = Instant::now();
        let mut throttle = Throttle::new(
            ThrottlePolicy::new(HOUR).with_window(NotifyCategory::Heartbeat, Duration::from_secs(600)),
        );
        throttle.seed(NotifyCategory::Heartbeat, start);

        assert!(!throttle.decide(NotifyCategory::Heartbeat, start + Duration::from_secs(599)).should_emit);
        let decision = throttle.decide(NotifyCategory::Heartbeat, start + Duration::from_secs(600));
        assert!(decision.should_emit);
        throttle.commit(decision);
        assert_eq!(
            throttle.clock().last_emitted(NotifyCategory::Heartbeat),
            Some(start + Duration::from_secs(600))
        );
    }

    proptest! {
        /// Two observations closer than the window produce at most one notification
        #[test]
        fn observations_inside_window_emit_at_most_once(
            window_secs in 1u64..10_000,
            first_offset in 0u64..10_000,
            gap_fraction in 0.0f64..1.0,
        ) {
            let window = Duration::from_secs(window_secs);
            let policy = ThrottlePolicy::new(window);
            let base = Instant::now();
            let t1 = base + Duration::from_secs(first_offset);
            let gap = Duration::from_secs_f64(window_secs as f64 * gap_fraction);
            prop_assume!(gap < window);
            let t2 = t1 + gap;

            // Prior emission somewhere in the past, or none at all
            let seeded = ThrottleClock::new().recorded(NotifyCategory::Degraded, base);
            for clock in [ThrottleClock::new(), seeded] {
                let d1 = policy.evaluate(NotifyCategory::Degraded, t1, &clock);
                let d2 = policy.evaluate(NotifyCategory::Degraded, t2, &d1.clock);
                prop_assert!(!(d1.should_emit && d2.should_emit));
            }
        }

        /// First observation of a category notifies regardless of elapsed time
        #[test]
        fn first_observation_always_notifies(window_secs in 0u64..1_000_000, offset in 0u64..1_000_000) {
            let policy = ThrottlePolicy::new(Duration::from_secs(window_secs));
            let now = Instant::now() + Duration::from_secs(offset);
            let other = ThrottleClock::new().recorded(NotifyCategory::Unreachable, now);
            prop_assert!(policy.evaluate(NotifyCategory::Degraded, now, &other).should_emit);
        }
    }
}
