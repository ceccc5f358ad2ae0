use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::Unit;

/// CSV column order, fixed regardless of what a record carries
const COLUMNS: [&str; 7] = [
    "beds",
    "baths",
    "sqft",
    "rent",
    "leaseLength",
    "address",
    "url",
];

/// Write units as CSV to `path`, replacing any previous run's output
pub fn write_csv(path: &Path, units: &[Unit]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv_to(file, units)
}

fn write_csv_to<W: Write>(writer: W, units: &[Unit]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(COLUMNS)?;
    for unit in units {
        csv.write_record([
            &unit.beds,
            &unit.baths,
            &unit.sqft,
            &unit.rent,
            &unit.lease_length,
            &unit.address,
            &unit.url,
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Dump the full records, scrape timestamps included, as pretty JSON
pub async fn write_json(path: &Path, units: &[Unit]) -> Result<()> {
    let json = serde_json::to_string_pretty(units)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn unit(pairs: &[(&str, &str)]) -> Unit {
        let cells: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Unit::from_cells(cells, "3500 Overland Ave", "https://www.apartments.com/example/")
    }

    fn csv_text(units: &[Unit]) -> String {
        let mut buf = Vec::new();
        write_csv_to(&mut buf, units).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_row_has_the_fixed_column_order() {
        let text = csv_text(&[]);
        assert_eq!(text, "beds,baths,sqft,rent,leaseLength,address,url\n");
    }

    #[test]
    fn rows_follow_the_header_order() {
        let row = unit(&[
            ("beds", "2 Beds"),
            ("baths", "2 Baths"),
            ("sqft", "900 Sq Ft"),
            ("rent", "$2000"),
            ("leaseLength", "12 Months"),
        ])
        .normalize();

        let text = csv_text(&[row]);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("beds,baths,sqft,rent,leaseLength,address,url"));
        assert_eq!(
            lines.next(),
            Some("2,2,900 Sq Ft,$2000,12 Months,3500 Overland Ave,https://www.apartments.com/example/")
        );
    }

    #[test]
    fn missing_fields_render_as_empty_cells() {
        let row = unit(&[("beds", "1 Bed")]).normalize();

        let text = csv_text(&[row]);
        assert!(text.ends_with("1,,,,,3500 Overland Ave,https://www.apartments.com/example/\n"));
    }
}
