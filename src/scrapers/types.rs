use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scrapers::error::ScrapeError;

const DOMAIN: &str = "https://www.apartments.com/";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Search parameters for an apartments.com query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// City to search in
    pub city: String,
    /// State the city is located in
    pub state: String,
    /// Zip code to narrow down specific areas of a city
    pub zip_code: String,
    /// Number of bedrooms, or the literal "studios"
    pub beds: Option<String>,
    /// Number of bathrooms
    pub baths: Option<String>,
    /// Minimum rent in dollars
    pub min_price: Option<String>,
    /// Maximum rent in dollars
    pub max_price: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            city: "los angeles".to_string(),
            state: "ca".to_string(),
            zip_code: "90034".to_string(),
            beds: Some("2".to_string()),
            baths: Some("2".to_string()),
            min_price: None,
            max_price: Some("2500".to_string()),
        }
    }
}

impl SearchQuery {
    /// Combine the query with the apartments.com domain to obtain the
    /// search url for listings matching the given parameters.
    ///
    /// The location and price segments are slash-terminated; the rooms
    /// segment ends in a dash and runs straight into the price segment:
    /// `https://www.apartments.com/los-angeles-ca-90034/2-bedrooms-2-bathrooms-under-2500/`
    pub fn search_url(&self) -> Result<String, ScrapeError> {
        let location = format!(
            "{}-{}-{}/",
            self.city.replace(' ', "-"),
            self.state,
            self.zip_code
        );

        let price = match (&self.min_price, &self.max_price) {
            (Some(min), Some(max)) => format!("{min}-to-{max}/"),
            (Some(min), None) => format!("over-{min}/"),
            (None, Some(max)) => format!("under-{max}/"),
            (None, None) => {
                return Err(ScrapeError::InvalidQuery(
                    "at least one of min/max price is required".to_string(),
                ))
            }
        };

        // "studios" takes the place of "<n>-bedrooms"
        let rooms = match (&self.beds, &self.baths) {
            (Some(beds), Some(baths)) if beds == "studios" => {
                format!("{beds}-{baths}-bathrooms-")
            }
            (Some(beds), Some(baths)) => format!("{beds}-bedrooms-{baths}-bathrooms-"),
            (Some(beds), None) if beds == "studios" => format!("{beds}-"),
            (Some(beds), None) => format!("{beds}-bedrooms-"),
            (None, Some(baths)) => format!("{baths}-bathrooms-"),
            (None, None) => String::new(),
        };

        Ok(format!("{DOMAIN}{location}{rooms}{price}"))
    }
}

/// Knobs for a scrape run, passed explicitly into every stage
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries per request on transient failures
    pub retries: u32,
    /// Polite delay between successive requests to the host
    pub delay: Duration,
    /// Cap on concurrent listing fetches
    pub concurrency: usize,
    /// User agent presented to the site
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 3,
            delay: Duration::from_millis(500),
            concurrency: 4,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> SearchQuery {
        SearchQuery::default()
    }

    #[test]
    fn builds_canonical_search_url() {
        assert_eq!(
            query().search_url().unwrap(),
            "https://www.apartments.com/los-angeles-ca-90034/2-bedrooms-2-bathrooms-under-2500/"
        );
    }

    #[test]
    fn city_spaces_become_hyphens() {
        let mut q = query();
        q.city = "new york".to_string();
        q.state = "ny".to_string();
        q.zip_code = "10001".to_string();
        assert!(q
            .search_url()
            .unwrap()
            .starts_with("https://www.apartments.com/new-york-ny-10001/"));
    }

    #[test]
    fn max_only_renders_under_never_over() {
        let url = query().search_url().unwrap();
        assert!(url.ends_with("under-2500/"));
        assert!(!url.contains("over-"));
    }

    #[test]
    fn min_only_renders_over_never_under() {
        let mut q = query();
        q.min_price = Some("1500".to_string());
        q.max_price = None;
        let url = q.search_url().unwrap();
        assert!(url.ends_with("over-1500/"));
        assert!(!url.contains("under-"));
    }

    #[test]
    fn both_bounds_render_a_range() {
        let mut q = query();
        q.min_price = Some("1500".to_string());
        let url = q.search_url().unwrap();
        assert!(url.ends_with("1500-to-2500/"));
    }

    #[test]
    fn studios_omit_the_bedrooms_suffix() {
        let mut q = query();
        q.beds = Some("studios".to_string());
        let url = q.search_url().unwrap();
        assert!(url.contains("/studios-2-bathrooms-"));
        assert!(!url.contains("-bedrooms-"));
    }

    #[test]
    fn beds_alone_renders_only_bedrooms() {
        let mut q = query();
        q.baths = None;
        assert!(q.search_url().unwrap().contains("/2-bedrooms-under-2500/"));
    }

    #[test]
    fn baths_alone_renders_only_bathrooms() {
        let mut q = query();
        q.beds = None;
        assert!(q.search_url().unwrap().contains("/2-bathrooms-under-2500/"));
    }

    #[test]
    fn no_rooms_renders_no_segment() {
        let mut q = query();
        q.beds = None;
        q.baths = None;
        assert_eq!(
            q.search_url().unwrap(),
            "https://www.apartments.com/los-angeles-ca-90034/under-2500/"
        );
    }

    #[test]
    fn missing_both_prices_is_invalid() {
        let mut q = query();
        q.max_price = None;
        assert!(matches!(
            q.search_url(),
            Err(ScrapeError::InvalidQuery(_))
        ));
    }
}
