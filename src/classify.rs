//! # Page Classification
//!
//! Pure functions of `(status, body)`. A fixed response always yields the
//! same classification no matter how often it is evaluated.
//!
//! Lookup precedence is fixed: overload markers first, then the explicit
//! invalid-identifier marker, then the result-shape check.

use crate::constants::markers;
use crate::types::PollState;

/// Response as seen by the classifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Verdict on a single lookup attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupVerdict {
    /// Body is a result document
    Found,
    /// Upstream answered authoritatively that nothing exists
    NotFound,
    /// Upstream rejected the identifier
    Invalid,
    /// Overloaded or erroring; worth retrying
    Transient,
}

/// Body carries the fields only a published result page has
pub fn is_result_document(body: &str) -> bool {
    markers::RESULT_MARKERS.iter().any(|m| body.contains(m))
}

/// Body is overload or server-error boilerplate
pub fn is_down_page(body: &str) -> bool {
    markers::DOWN_MARKERS.iter().any(|m| body.contains(m))
}

fn is_server_trouble(status: u16) -> bool {
    status >= 500 || status == 429
}

/// Classify one probe of the target page
pub fn classify_probe(response: &PageResponse) -> PollState {
    if response.is_success() && is_result_document(&response.body) {
        PollState::Live
    } else if is_down_page(&response.body) || is_server_trouble(response.status) {
        PollState::Degraded
    } else {
        PollState::NotYet
    }
}

/// Classify one attempt against the per-identifier endpoint
pub fn classify_lookup(response: &PageResponse) -> LookupVerdict {
    if is_down_page(&response.body) || is_server_trouble(response.status) {
        LookupVerdict::Transient
    } else if response.body.contains(markers::INVALID_IDENTIFIER_MARKER) {
        LookupVerdict::Invalid
    } else if response.is_success() && is_result_document(&response.body) {
        LookupVerdict::Found
    } else {
        LookupVerdict::NotFound
    }
}
