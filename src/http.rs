//! # HTTP Page Client
//!
//! The watcher and dispatcher only see [`PageClient`]. The production
//! implementation owns one `reqwest::Client` for the whole run so every
//! probe and lookup reuses the same connection pool.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::classify::PageResponse;
use crate::config::TargetConfig;
use crate::error::FetchError;

/// Issues bounded-timeout GET requests and returns status plus body text
#[async_trait]
pub trait PageClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<PageResponse, FetchError>;
}

/// `PageClient` backed by a long-lived reqwest connection pool
#[derive(Clone)]
pub struct HttpPageClient {
    client: Client,
    timeout: Duration,
}

impl std::fmt::Debug for HttpPageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpPageClient {
    pub fn new(config: &TargetConfig) -> Result<Self, FetchError> {
        let timeout = config.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        info!(
            timeout_secs = timeout.as_secs(),
            user_agent = %config.user_agent,
            "Created page client"
        );

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageClient for HttpPageClient {
    async fn get(&self, url: &str) -> Result<PageResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        debug!(url = %url, status = status, bytes = body.len(), "Fetched page");
        Ok(PageResponse { status, body })
    }
}
