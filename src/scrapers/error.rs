use thiserror::Error;

use crate::models::ScrapeReport;

/// Everything that can go wrong while scraping
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The search parameters cannot be rendered into a valid search url
    #[error("invalid search query: {0}")]
    InvalidQuery(String),

    /// Network failure or non-success HTTP status, after retries
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// An element the extraction depends on is absent from the document
    #[error("missing {element} on {url}")]
    Parse { url: String, element: &'static str },

    /// A "next page" link pointed back at a page already walked
    #[error("pagination cycle: {0} already visited")]
    Cycle(String),
}

/// A fatal failure, carrying whatever the run had collected before dying
/// so the caller can report progress and optionally keep partial output.
#[derive(Debug)]
pub struct ScrapeFailure {
    pub error: ScrapeError,
    pub partial: ScrapeReport,
}
