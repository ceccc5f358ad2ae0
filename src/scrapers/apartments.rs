use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::models::{ScrapeReport, Unit};
use crate::scrapers::error::{ScrapeError, ScrapeFailure};
use crate::scrapers::traits::Fetch;
use crate::scrapers::types::ScraperConfig;

/// Listings failing back-to-back before the run is declared dead
const MAX_CONSECUTIVE_FAILURES: usize = 5;

/// One fetched search-results page. The body stays raw HTML; parsed
/// documents are not Send and never cross an await point.
struct ResultsPage {
    url: String,
    html: String,
}

/// Scraper for apartments.com search results and listing pages
pub struct ApartmentsScraper<F> {
    fetcher: Arc<F>,
    config: ScraperConfig,
}

impl<F: Fetch + 'static> ApartmentsScraper<F> {
    pub fn new(fetcher: F, config: ScraperConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            config,
        }
    }

    /// Run the whole pipeline for a search url: walk the paginated
    /// results, pull every listing url, scrape each listing's
    /// availability table and normalize the rows.
    ///
    /// Failures on a single listing are skipped; failures while walking
    /// the results pages (and too many listing failures in a row) kill
    /// the run.
    pub async fn scrape(&self, search_url: &str) -> Result<ScrapeReport, ScrapeFailure> {
        let mut report = ScrapeReport::default();

        let pages = match self.collect_result_pages(search_url).await {
            Ok(pages) => pages,
            Err(error) => {
                return Err(ScrapeFailure {
                    error,
                    partial: report,
                })
            }
        };
        report.pages_visited = pages.len();

        let listings = listing_urls(&pages);
        info!(
            "Found {} listings across {} result pages",
            listings.len(),
            pages.len()
        );

        if let Err(error) = self.scrape_listings(&listings, &mut report).await {
            return Err(ScrapeFailure {
                error,
                partial: report,
            });
        }

        Ok(report)
    }

    /// Walk the paginated results starting from the search url, following
    /// "next" links until a page has none. The walk fails on a link that
    /// points back at a page already visited.
    async fn collect_result_pages(
        &self,
        search_url: &str,
    ) -> Result<Vec<ResultsPage>, ScrapeError> {
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut url = search_url.to_string();

        loop {
            visited.insert(url.clone());
            debug!("Fetching results page: {url}");
            let html = self.fetcher.fetch(&url).await?;
            let next = next_page_url(&Html::parse_document(&html));
            pages.push(ResultsPage {
                url: url.clone(),
                html,
            });

            match next {
                Some(next_url) => {
                    if visited.contains(&next_url) {
                        return Err(ScrapeError::Cycle(next_url));
                    }
                    tokio::time::sleep(self.config.delay).await;
                    url = next_url;
                }
                None => break,
            }
        }

        Ok(pages)
    }

    /// Scrape every listing with a bounded number of in-flight fetches,
    /// collecting units in listing order. Single failures are skipped;
    /// MAX_CONSECUTIVE_FAILURES in a row aborts with the last error.
    async fn scrape_listings(
        &self,
        listings: &[String],
        report: &mut ScrapeReport,
    ) -> Result<(), ScrapeError> {
        let mut consecutive_failures = 0;

        for batch in listings.chunks(self.config.concurrency.max(1)) {
            let mut tasks: JoinSet<(usize, Result<Vec<Unit>, ScrapeError>)> = JoinSet::new();

            for (i, url) in batch.iter().enumerate() {
                let fetcher = Arc::clone(&self.fetcher);
                let url = url.clone();
                tasks.spawn(async move {
                    let result = match fetcher.fetch(&url).await {
                        Ok(html) => parse_listing(&html, &url),
                        Err(e) => Err(e),
                    };
                    (i, result)
                });
            }

            let mut results = Vec::with_capacity(batch.len());
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(pair) => results.push(pair),
                    Err(e) => {
                        warn!("Listing task died: {e}");
                        report.listings_skipped += 1;
                    }
                }
            }
            results.sort_by_key(|(i, _)| *i);

            for (i, result) in results {
                match result {
                    Ok(units) => {
                        consecutive_failures = 0;
                        report.listings_processed += 1;
                        debug!("Scraped {} units from {}", units.len(), batch[i]);
                        report.units.extend(units.into_iter().map(Unit::normalize));
                    }
                    Err(e) => {
                        warn!("Skipping listing {}: {e}", batch[i]);
                        report.listings_skipped += 1;
                        consecutive_failures += 1;
                        if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                            return Err(e);
                        }
                    }
                }
            }

            tokio::time::sleep(self.config.delay).await;
        }

        Ok(())
    }
}

fn sel(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector")
}

/// Element text with fragments trimmed and joined by single spaces
fn joined_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Next-page link of a results page. None when the paging container is
/// absent (single page of results) or carries no further link (last page).
fn next_page_url(doc: &Html) -> Option<String> {
    doc.select(&sel("div.paging")).next()?;
    let href = doc.select(&sel("a.next")).next()?.value().attr("href")?;
    Some(href.to_string())
}

/// Detail-page urls of every listing on the collected result pages,
/// in page order. Entries without the title anchor are skipped.
fn listing_urls(pages: &[ResultsPage]) -> Vec<String> {
    let entry = sel("div.propertyInfo");
    let title = sel("a.placardTitle.js-placardTitle");

    let mut urls = Vec::new();
    for page in pages {
        let doc = Html::parse_document(&page.html);
        for div in doc.select(&entry) {
            match div
                .select(&title)
                .next()
                .and_then(|a| a.value().attr("href"))
            {
                Some(href) => urls.push(href.to_string()),
                None => debug!("Skipping entry without a title anchor on {}", page.url),
            }
        }
    }
    urls
}

/// Extract the address and availability rows from a listing page.
/// A listing without an availability section yields no units; a listing
/// without an address element is a parse failure.
fn parse_listing(html: &str, url: &str) -> Result<Vec<Unit>, ScrapeError> {
    let doc = Html::parse_document(html);

    let address = doc
        .select(&sel("div.propertyAddress"))
        .next()
        .map(|el| joined_text(&el))
        .ok_or_else(|| ScrapeError::Parse {
            url: url.to_string(),
            element: "div.propertyAddress",
        })?;

    let Some(section) = doc.select(&sel("section.availabilitySection")).next() else {
        debug!("No availability section on {url}");
        return Ok(Vec::new());
    };

    let mut units = Vec::new();
    for row in section.select(&sel("tr.rentalGridRow")) {
        let mut cells = HashMap::new();
        for cell in row.select(&sel("td")) {
            let Some(class) = cell
                .value()
                .attr("class")
                .and_then(|c| c.split_whitespace().next())
            else {
                continue;
            };
            cells.insert(class.to_string(), joined_text(&cell));
        }
        units.push(Unit::from_cells(cells, &address, url));
    }
    Ok(units)
}
