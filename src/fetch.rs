//! Remote payload fetching

use async_trait::async_trait;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{Error, Result};

/// Body and declared type of a fetched resource
#[derive(Clone, Debug)]
pub struct FetchedPayload {
    /// Response body
    pub bytes: Vec<u8>,
    /// `Content-Type` header value, empty when absent
    pub content_type: String,
}

/// Source of remote payloads
///
/// The crawler only ever needs "GET this URL"; tests substitute their own
/// implementation or point [`HttpFetcher`] at a mock server.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, failing on transport errors and non-success statuses
    async fn fetch(&self, url: &str) -> Result<FetchedPayload>;
}

/// [`Fetcher`] backed by a `reqwest` client with a fixed timeout
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPayload> {
        tracing::debug!(url, "Fetching artifact");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Fetch {
                    url: url.to_string(),
                    reason: format!("timed out after {} seconds", self.timeout.as_secs()),
                }
            } else if e.is_connect() {
                Error::Fetch {
                    url: url.to_string(),
                    reason: format!("connection failed: {}", e),
                }
            } else {
                Error::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response.bytes().await.map_err(|e| Error::Fetch {
            url: url.to_string(),
            reason: format!("failed to read response body: {}", e),
        })?;

        tracing::debug!(url, size = bytes.len(), %content_type, "Fetched artifact");

        Ok(FetchedPayload {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
