//! Core state and outcome types shared by the watcher and dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::NotifyCategory;
use crate::error::FetchError;

/// Classification of the most recent probe of the target page
#[derive(Debug)]
pub enum PollState {
    /// Results are published
    Live,
    /// Page reachable, results not yet published
    NotYet,
    /// Upstream served overload or server-error boilerplate
    Degraded,
    /// Transport failure; body never classified
    Unreachable(FetchError),
}

impl PollState {
    /// Throttle category for non-live states
    pub fn category(&self) -> Option<NotifyCategory> {
        match self {
            PollState::Live => None,
            PollState::NotYet => Some(NotifyCategory::NotYetLive),
            PollState::Degraded => Some(NotifyCategory::Degraded),
            PollState::Unreachable(_) => Some(NotifyCategory::Unreachable),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, PollState::Live)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PollState::Live => "live",
            PollState::NotYet => "not_yet",
            PollState::Degraded => "degraded",
            PollState::Unreachable(_) => "unreachable",
        }
    }
}

/// Terminal result of looking up one identifier
#[derive(Debug)]
pub enum FetchOutcome {
    Found(String),
    NotFound,
    Invalid,
    Unavailable(FetchFailure),
}

impl FetchOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            FetchOutcome::Found(_) => OutcomeKind::Found,
            FetchOutcome::NotFound => OutcomeKind::NotFound,
            FetchOutcome::Invalid => OutcomeKind::Invalid,
            FetchOutcome::Unavailable(_) => OutcomeKind::Unavailable,
        }
    }
}

/// Last transient failure seen before retries ran out
#[derive(Debug)]
pub enum FetchFailure {
    /// Upstream kept answering with overload markers
    Overloaded { status: u16 },
    Transport(FetchError),
    /// Concurrency gate shut before a permit was granted
    GateClosed,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Overloaded { status } => write!(f, "upstream overloaded (HTTP {status})"),
            FetchFailure::Transport(e) => write!(f, "{e}"),
            FetchFailure::GateClosed => write!(f, "concurrency gate closed"),
        }
    }
}

/// Outcome category without payload, used for tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Found,
    NotFound,
    Invalid,
    Unavailable,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Found => write!(f, "found"),
            OutcomeKind::NotFound => write!(f, "not_found"),
            OutcomeKind::Invalid => write!(f, "invalid"),
            OutcomeKind::Unavailable => write!(f, "unavailable"),
        }
    }
}
