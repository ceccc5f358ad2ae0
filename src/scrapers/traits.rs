use async_trait::async_trait;

use crate::scrapers::error::ScrapeError;

/// Boundary between the scrape pipeline and the network.
/// The pipeline only ever sees raw HTML bodies through this trait, which
/// keeps pagination and extraction runnable against in-memory fixtures.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the raw HTML body behind a url
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}
