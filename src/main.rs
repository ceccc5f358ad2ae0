mod models;
mod output;
mod scrapers;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, error, info, Level};

use scrapers::{ApartmentsScraper, HttpFetcher, ScraperConfig, SearchQuery};

/// Apartment hunter, curates a list of apartment listings from
/// apartments.com
#[derive(Debug, Parser)]
#[command(name = "apt-hunter", version, about)]
struct Cli {
    /// City to search in
    #[arg(long, default_value = "los angeles")]
    city: String,

    /// State the city is located in
    #[arg(long, default_value = "ca")]
    state: String,

    /// Zip code to help narrow down specific areas of a city
    #[arg(long, default_value = "90034")]
    zip_code: String,

    /// Number of bedrooms, or "studios"
    #[arg(long, default_value = "2")]
    beds: Option<String>,

    /// Number of bathrooms
    #[arg(long, default_value = "2")]
    baths: Option<String>,

    /// Minimum rent in dollars
    #[arg(long)]
    min_price: Option<String>,

    /// Maximum rent in dollars
    #[arg(long, default_value = "2500")]
    max_price: Option<String>,

    /// Output CSV path, overwritten each run
    #[arg(short, long, default_value = "apartments.csv")]
    output: PathBuf,

    /// Also dump the full records as pretty JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Keep whatever was collected if the run dies partway
    #[arg(long)]
    keep_partial: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Retries per request on transient failures
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Concurrent listing fetches
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Delay between requests in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Enables debugging output and extra verbosity
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let query = SearchQuery {
        city: cli.city,
        state: cli.state,
        zip_code: cli.zip_code,
        beds: cli.beds,
        baths: cli.baths,
        min_price: cli.min_price,
        max_price: cli.max_price,
    };
    let config = ScraperConfig {
        timeout: Duration::from_secs(cli.timeout),
        retries: cli.retries,
        delay: Duration::from_millis(cli.delay_ms),
        concurrency: cli.concurrency,
        ..ScraperConfig::default()
    };

    let search_url = query.search_url()?;

    info!("🏠 Apartment Hunter - apartments.com scraper");
    info!(
        "Searching {} {} {} ...",
        query.city, query.state, query.zip_code
    );
    debug!("Search url: {search_url}");

    let fetcher = HttpFetcher::new(&config)?;
    let scraper = ApartmentsScraper::new(fetcher, config);

    let report = match scraper.scrape(&search_url).await {
        Ok(report) => report,
        Err(failure) => {
            error!(
                "Scrape failed after {} listings ({} skipped): {}",
                failure.partial.listings_processed,
                failure.partial.listings_skipped,
                failure.error
            );
            if cli.keep_partial && !failure.partial.units.is_empty() {
                output::write_csv(&cli.output, &failure.partial.units)?;
                info!(
                    "💾 Saved {} partially collected units to {}",
                    failure.partial.units.len(),
                    cli.output.display()
                );
            }
            return Err(failure.error.into());
        }
    };

    info!(
        "✅ Scraped {} units from {} listings across {} result pages ({} listings skipped)",
        report.units.len(),
        report.listings_processed,
        report.pages_visited,
        report.listings_skipped
    );

    output::write_csv(&cli.output, &report.units)?;
    info!(
        "💾 Saved {} units to {}",
        report.units.len(),
        cli.output.display()
    );

    if let Some(json_path) = &cli.json {
        output::write_json(json_path, &report.units).await?;
        info!("💾 Saved JSON dump to {}", json_path.display());
    }

    Ok(())
}
