//! Shared fakes for integration tests.
//!
//! `FakeSite` stands in for both the results page and the per-identifier
//! lookup endpoint. `http_server` is a loopback server for the few tests
//! that exercise the real HTTP client and webhook.

#![allow(dead_code)]

pub mod http_server;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use results_monitor::classify::PageResponse;
use results_monitor::error::FetchError;
use results_monitor::http::PageClient;

pub const TARGET_URL: &str = "https://results.test/";
pub const LOOKUP_TEMPLATE: &str = "https://results.test/lookup?rn={id}";
const LOOKUP_PREFIX: &str = "https://results.test/lookup?rn=";

/// One scripted reply; `Transport` becomes a connect error
#[derive(Debug, Clone)]
pub enum Reply {
    Page(u16, &'static str),
    Transport,
}

impl Reply {
    pub fn result() -> Self {
        Reply::Page(200, "<td>Student Name:</td><td>A. Kumar</td>")
    }

    pub fn no_result() -> Self {
        Reply::Page(200, "<p>No record found</p>")
    }

    pub fn invalid() -> Self {
        Reply::Page(200, "Invalid Registration Number")
    }

    pub fn overloaded() -> Self {
        Reply::Page(503, "HTTP Error 503. The service is unavailable.")
    }

    pub fn coming_soon() -> Self {
        Reply::Page(200, "<h2>Results will be announced soon</h2>")
    }

    fn into_result(self, url: &str) -> Result<PageResponse, FetchError> {
        match self {
            Reply::Page(status, body) => Ok(PageResponse::new(status, body)),
            Reply::Transport => Err(FetchError::Connect {
                url: url.to_string(),
                reason: "connection reset by peer".to_string(),
            }),
        }
    }
}

/// Scripted replies; the last entry of each queue repeats forever
pub struct FakeSite {
    probe: Mutex<VecDeque<Reply>>,
    lookups: Mutex<HashMap<String, VecDeque<Reply>>>,
    default_lookup: Reply,
    latency: Duration,
    probe_calls: AtomicUsize,
    lookup_calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSite {
    pub fn new() -> Self {
        Self {
            probe: Mutex::new(VecDeque::from([Reply::Page(200, "Registration No: live")])),
            lookups: Mutex::new(HashMap::new()),
            default_lookup: Reply::result(),
            latency: Duration::ZERO,
            probe_calls: AtomicUsize::new(0),
            lookup_calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_probe(self, replies: Vec<Reply>) -> Self {
        *self.probe.lock() = replies.into();
        self
    }

    pub fn with_lookup(self, identifier: &str, replies: Vec<Reply>) -> Self {
        self.lookups
            .lock()
            .insert(identifier.to_string(), replies.into());
        self
    }

    pub fn with_default_lookup(mut self, reply: Reply) -> Self {
        self.default_lookup = reply;
        self
    }

    /// Simulated time each lookup spends in flight
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> Vec<String> {
        self.lookup_calls.lock().clone()
    }

    pub fn lookup_calls_for(&self, identifier: &str) -> usize {
        self.lookup_calls
            .lock()
            .iter()
            .filter(|id| id.as_str() == identifier)
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(queue: &mut VecDeque<Reply>) -> Option<Reply> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Default for FakeSite {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageClient for FakeSite {
    async fn get(&self, url: &str) -> Result<PageResponse, FetchError> {
        let Some(identifier) = url.strip_prefix(LOOKUP_PREFIX) else {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            let reply = Self::next_reply(&mut self.probe.lock()).unwrap_or_else(Reply::coming_soon);
            return reply.into_result(url);
        };

        self.lookup_calls.lock().push(identifier.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self
            .lookups
            .lock()
            .get_mut(identifier)
            .and_then(Self::next_reply)
            .unwrap_or_else(|| self.default_lookup.clone());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.into_result(url)
    }
}

/// `count` distinct well-formed identifiers
pub fn identifiers(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{:011}", 20_000_000_000u64 + i as u64)).collect()
}
