//! HTTP fetch utilities shared by all source adapters.
//!
//! One client, one request, one outcome: there are no retries here. A
//! failed fetch is permanent for the run and the caller decides how far
//! the damage spreads (drop a field, drop a detail page, or return an
//! empty table).

use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info_span;

pub const CRATE_NAME: &str = "munibid-storage";

/// Fixed delays between successive requests within one adapter, so the
/// two-step listing/detail crawl behaves as a well-mannered client.
#[derive(Debug, Clone, Copy)]
pub struct Politeness {
    /// Pause before each detail-page request.
    pub detail_delay: Duration,
    /// Pause before each additional listing page. Listing pages are
    /// cheaper for the source to serve, so this one is shorter.
    pub page_delay: Duration,
}

impl Default for Politeness {
    fn default() -> Self {
        Self {
            detail_delay: Duration::from_millis(1500),
            page_delay: Duration::from_millis(750),
        }
    }
}

impl Politeness {
    pub async fn before_detail(&self) {
        tokio::time::sleep(self.detail_delay).await;
    }

    pub async fn before_page(&self) {
        tokio::time::sleep(self.page_delay).await;
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;
        Ok(Self { client })
    }

    /// Fetch a page as text. Non-2xx statuses are errors.
    pub async fn get_text(&self, source_id: &str, url: &str) -> Result<String, FetchError> {
        let span = info_span!("http_fetch", source_id, url);
        let _guard = span.enter();
        let response = self.client.get(url).send().await?;
        let response = Self::require_success(response)?;
        Ok(response.text().await?)
    }

    /// Fetch a binary document (a linked spreadsheet, for instance).
    pub async fn get_bytes(&self, source_id: &str, url: &str) -> Result<Vec<u8>, FetchError> {
        let span = info_span!("http_fetch", source_id, url);
        let _guard = span.enter();
        let response = self.client.get(url).send().await?;
        let response = Self::require_success(response)?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch and deserialize a JSON endpoint, with extra request headers
    /// for sources that gate on browser-looking clients.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        source_id: &str,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let span = info_span!("http_fetch", source_id, url);
        let _guard = span.enter();
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await?;
        let response = Self::require_success(response)?;
        Ok(response.json().await?)
    }

    fn require_success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        let status: StatusCode = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }
}
