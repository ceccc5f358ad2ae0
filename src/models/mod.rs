use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One rentable unit, scraped from a single row of a listing's
/// availability table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub beds: String,
    pub baths: String,
    pub sqft: String,
    pub rent: String,
    #[serde(rename = "leaseLength")]
    pub lease_length: String,
    pub address: String,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

impl Unit {
    /// Build a unit from a table row's cell map (first CSS class of each
    /// cell -> its text). Unknown cell classes are dropped, missing ones
    /// come out empty.
    pub fn from_cells(mut cells: HashMap<String, String>, address: &str, url: &str) -> Self {
        let mut take = |key: &str| cells.remove(key).unwrap_or_default();
        Self {
            beds: take("beds"),
            baths: take("baths"),
            sqft: take("sqft"),
            rent: take("rent"),
            lease_length: take("leaseLength"),
            address: address.to_string(),
            url: url.to_string(),
            scraped_at: Utc::now(),
        }
    }

    /// Cut the beds/baths text down to its leading character, so
    /// "2 Beds" reads as "2". Idempotent.
    pub fn normalize(mut self) -> Self {
        self.beds = leading_char(&self.beds);
        self.baths = leading_char(&self.baths);
        self
    }
}

fn leading_char(text: &str) -> String {
    text.chars().take(1).collect()
}

/// Counters and collected units for one scrape run
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub units: Vec<Unit>,
    pub pages_visited: usize,
    pub listings_processed: usize,
    pub listings_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_cells_fills_known_columns() {
        let unit = Unit::from_cells(
            cells(&[
                ("beds", "2 Beds"),
                ("baths", "2 Baths"),
                ("sqft", "900 Sq Ft"),
                ("rent", "$2,000"),
                ("leaseLength", "12 Months"),
            ]),
            "3500 Overland Ave Los Angeles CA 90034",
            "https://www.apartments.com/example/",
        );

        assert_eq!(unit.beds, "2 Beds");
        assert_eq!(unit.baths, "2 Baths");
        assert_eq!(unit.sqft, "900 Sq Ft");
        assert_eq!(unit.rent, "$2,000");
        assert_eq!(unit.lease_length, "12 Months");
        assert_eq!(unit.address, "3500 Overland Ave Los Angeles CA 90034");
        assert_eq!(unit.url, "https://www.apartments.com/example/");
    }

    #[test]
    fn from_cells_drops_unknown_and_defaults_missing() {
        let unit = Unit::from_cells(
            cells(&[("beds", "1 Bed"), ("deposit", "$500")]),
            "addr",
            "url",
        );

        assert_eq!(unit.beds, "1 Bed");
        assert_eq!(unit.baths, "");
        assert_eq!(unit.rent, "");
    }

    #[test]
    fn normalize_truncates_to_leading_character() {
        let unit = Unit::from_cells(
            cells(&[("beds", "2 Beds"), ("baths", "2 Baths")]),
            "addr",
            "url",
        )
        .normalize();

        assert_eq!(unit.beds, "2");
        assert_eq!(unit.baths, "2");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = Unit::from_cells(
            cells(&[("beds", "3 Beds"), ("baths", "2 Baths")]),
            "addr",
            "url",
        )
        .normalize();
        let twice = once.clone().normalize();

        assert_eq!(once.beds, twice.beds);
        assert_eq!(once.baths, twice.baths);
    }

    #[test]
    fn normalize_leaves_empty_fields_empty() {
        let unit = Unit::from_cells(HashMap::new(), "addr", "url").normalize();

        assert_eq!(unit.beds, "");
        assert_eq!(unit.baths, "");
    }
}
