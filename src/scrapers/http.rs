use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::scrapers::error::ScrapeError;
use crate::scrapers::traits::Fetch;
use crate::scrapers::types::ScraperConfig;

const BACKOFF_BASE: Duration = Duration::from_millis(250);

/// HTTP-backed fetcher used for real runs
pub struct HttpFetcher {
    client: Client,
    retries: u32,
}

impl HttpFetcher {
    /// Build a fetcher from the run configuration
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            retries: config.retries,
        })
    }

    fn retryable(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    /// GET the url, retrying transient failures with exponential backoff.
    /// Network errors and 5xx/429 responses are retried; other client
    /// errors are returned immediately.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let mut last_reason = String::new();

        for attempt in 0..=self.retries {
            if attempt > 0 {
                let backoff = BACKOFF_BASE * 2u32.pow(attempt - 1);
                debug!(
                    "Retrying {url} in {backoff:?} (attempt {attempt}/{})",
                    self.retries
                );
                tokio::time::sleep(backoff).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|e| ScrapeError::Fetch {
                            url: url.to_string(),
                            reason: e.to_string(),
                        });
                    }
                    last_reason = format!("HTTP {status}");
                    if !Self::retryable(status) {
                        break;
                    }
                    warn!("{url} returned {status}");
                }
                Err(e) => {
                    last_reason = e.to_string();
                    warn!("Request to {url} failed: {e}");
                }
            }
        }

        Err(ScrapeError::Fetch {
            url: url.to_string(),
            reason: last_reason,
        })
    }
}
