//! Source page fetching.
//!
//! The pipeline only needs "give me the HTML at this URL"; [`PageFetcher`] is
//! that seam. [`ReqwestFetcher`] is the production implementation, and
//! [`StaticFetcher`] serves canned pages for tests and offline previews.
//!
//! No retry is performed: a failed fetch is reported once and the refresh
//! that asked for it yields no items.

use crate::error::TransportError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches raw page text.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// HTTP fetcher backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a fetcher with a request timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for ReqwestFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        debug!(bytes = body.len(), "Fetched source page");
        Ok(body)
    }
}

/// Serves fixed pages keyed by URL; unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: Mutex<HashMap<String, String>>,
    hits: Mutex<HashMap<String, usize>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the page served for `url`.
    pub fn insert(&self, url: impl Into<String>, html: impl Into<String>) {
        self.pages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.into(), html.into());
    }

    /// Stop serving `url`.
    pub fn remove(&self, url: &str) {
        self.pages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(url);
    }

    /// How many times `url` has been requested.
    pub fn hits(&self, url: &str) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        *self
            .hits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(url.to_string())
            .or_insert(0) += 1;
        self.pages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
            .ok_or(TransportError::Status(404))
    }
}
