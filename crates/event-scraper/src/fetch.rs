//! Static (non-JS) page fetch over plain HTTP.
//!
//! One GET with a bounded timeout, following up to five redirects. Transport
//! errors, timeouts and non-2xx statuses are failures; there are no retries
//! at this layer.

use std::time::Duration;

use crate::config::ScraperConfig;
use crate::error::{FetchStage, ScrapeError, ScrapeResult};

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct StaticPage {
    /// Final URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

/// HTTP client for the static stage. Cheap to clone; clones share a
/// connection pool.
#[derive(Clone)]
pub struct StaticFetcher {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
}

impl StaticFetcher {
    pub fn new(config: &ScraperConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.static_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_default();

        Self {
            client,
            user_agent: config.user_agent.clone(),
            timeout: config.static_timeout,
        }
    }

    /// GET `url` within the configured timeout.
    pub async fn fetch(&self, url: &str) -> ScrapeResult<StaticPage> {
        let timeout_ms = self.timeout.as_millis() as u64;
        match tokio::time::timeout(self.timeout, self.fetch_inner(url)).await {
            Ok(Err(ScrapeError::Http(e))) if e.is_timeout() => Err(ScrapeError::Timeout {
                stage: FetchStage::Static,
                timeout_ms,
            }),
            Ok(result) => result,
            Err(_) => Err(ScrapeError::Timeout {
                stage: FetchStage::Static,
                timeout_ms,
            }),
        }
    }

    async fn fetch_inner(&self, url: &str) -> ScrapeResult<StaticPage> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;

        Ok(StaticPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}
