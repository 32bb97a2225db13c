//! CLI entry point: scrape the IMDb keyword-search table
//!
//! Wires the generic traversal engine to the IMDb detail-mode keyword search
//! layout: one schema, click-based pagination, and the position-specific
//! normalization rules for the year and Director/Stars columns.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gridscrape::driver::CdpDriver;
use gridscrape::{
    Config, FieldRule, Normalizer, OutputFormat, PaginationConfig, TableSchema, TableScraper,
    open_session,
};

#[derive(Parser, Debug)]
#[command(name = "gridscrape", version, about = "Scrape the IMDb keyword search table into CSV or JSON")]
struct Args {
    /// Title type to search for
    #[arg(long, default_value = "movie")]
    keywords: String,

    /// Number of rows to scrape (0 = until pagination is exhausted)
    #[arg(long, default_value_t = 50)]
    rows: usize,

    /// Output file path, format selected by extension (.csv or .json)
    #[arg(long, default_value = "output.csv")]
    output: PathBuf,

    /// Page-load wait budget in seconds
    #[arg(long, default_value_t = 30)]
    wait: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!(error = ?e, "scrape run failed");
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    // Fail on a bad output path before a browser ever launches.
    OutputFormat::from_path(&args.output)?;

    let config = gridscrape::load_yaml_config().unwrap_or_else(|e| {
        warn!(error = %e, "invalid config.yaml, using defaults");
        Config::default()
    });

    let url = format!(
        "https://www.imdb.com/search/keyword/?ref_=kw_ref_typ&sort=moviemeter,asc&mode=detail&page=1&title_type={}",
        args.keywords.trim()
    );

    let mut schema = TableSchema::new("div.lister-item.mode-detail");
    schema
        .add_column_spec("h3.lister-item-header a", "Title::text")?
        .add_column_spec("span.lister-item-year", "Release Year::text")?
        .add_column_spec("div.ratings-imdb-rating strong", "IMDb Rating::text")?
        .add_column_spec("p:nth-of-type(3)", "Director(s)::text")?
        .add_column_spec("p:nth-of-type(3)", "Cast::text")?
        .add_column_spec("p:nth-of-type(2)", "Plot Summary::text")?;
    let pagination = PaginationConfig::next_control("a.lister-page-next.next-page")?;

    let (session, page) = open_session(&url, &config.browser)
        .await
        .context("failed to open browser session")?;

    let driver = Arc::new(CdpDriver::new(page));
    let scraper = TableScraper::new(driver, schema, pagination);
    let mut result = scraper
        .scrape(args.rows, Duration::from_secs(args.wait))
        .await
        .context("table traversal failed")?;

    // Release year carries parentheses; the two p:nth-of-type(3) columns
    // alternate between "Director: ..." and "Stars: ..." prefixed text.
    Normalizer::new()
        .rule(1, FieldRule::DigitsOnly)
        .rule(
            3,
            FieldRule::LabeledValue {
                keep: "Director".to_string(),
                reject: "Stars".to_string(),
            },
        )
        .rule(
            4,
            FieldRule::LabeledValue {
                keep: "Stars".to_string(),
                reject: "Director".to_string(),
            },
        )
        .apply(&mut result);

    result
        .write_to(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        records = result.records().len(),
        output = %args.output.display(),
        "scrape finished"
    );

    session.shutdown().await;
    Ok(())
}
