//! # fundai CLI
//!
//! Runs the listing pipeline for one (home type, area) pair, either stage by
//! stage or all at once:
//!
//! - `scrape-house-urls`: discover listing URLs and store the new ones
//! - `scrape-house-pages`: render the pages of stored URLs that have none yet
//! - `parse-house-pages`: extract structured listings from stored pages
//! - `run`: all three in order
//! - `init-db`: create the store's tables
//!
//! Configuration comes from the environment (and `.env`); see `fundai::config`.

mod telemetry;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fundai::config::{Config, SiteTemplate};
use fundai::crawler::{CrawlerConfig, Filter, SpiderFetcher};
use fundai::extract::{ExtractorConfig, SchemaExtractor};
use fundai::model::ratelimited_completion::RateLimitedCompletionModel;
use fundai::model::Client;
use fundai::pipeline::{Pipeline, RunReport};
use fundai::store::{Database, Table};
use rig::providers::gemini;
use tracing::{info, instrument};

type GeminiModel = RateLimitedCompletionModel<gemini::completion::CompletionModel>;

#[derive(Parser)]
#[command(author, version, about = "Scrape funda listings, extract their attributes with an LLM and store them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Also write logs to daily files in this directory
    #[arg(long, global = true, env = "FUNDAI_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover listing URLs on the search results and store the new ones
    ScrapeHouseUrls(FilterArgs),

    /// Render and store the pages of listings that have no page yet
    ScrapeHousePages(FilterArgs),

    /// Extract structured listings from stored pages
    ParseHousePages(FilterArgs),

    /// Create the database tables
    InitDb,

    /// Discover, render and extract in one go
    Run(FilterArgs),
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Listing category, e.g. koop or huur
    #[arg(default_value = "koop")]
    home_type: String,

    /// Area slug, e.g. rotterdam
    #[arg(default_value = "rotterdam")]
    area: String,

    /// Site layout revision (funda-2023, funda-2024)
    #[arg(short, long, default_value = "funda-2023")]
    template: SiteTemplate,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl FilterArgs {
    fn filter(&self) -> Filter {
        Filter::new(&self.home_type, &self.area)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before parsing: clap and the log filter read `.env` values too
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _otel = telemetry::init_tracing_subscriber(cli.log_dir.clone())?;

    // Configuration problems stop the process before any stage runs
    let config = Config::from_env()?;

    match cli.command {
        Commands::ScrapeHouseUrls(args) => {
            let pipeline = build_pipeline(&config, &args, false).await?;
            let report = pipeline.scrape_urls(&args.filter()).await?;
            print_report(&report, args.json)?;
        }
        Commands::ScrapeHousePages(args) => {
            let pipeline = build_pipeline(&config, &args, false).await?;
            let report = pipeline.scrape_pages(&args.filter()).await?;
            print_report(&report, args.json)?;
        }
        Commands::ParseHousePages(args) => {
            let pipeline = build_pipeline(&config, &args, true).await?;
            let report = pipeline.parse_pages(&args.filter()).await?;
            print_report(&report, args.json)?;
        }
        Commands::Run(args) => {
            let pipeline = build_pipeline(&config, &args, true).await?;
            let report = pipeline.run(&args.filter()).await?;
            print_report(&report, args.json)?;
        }
        Commands::InitDb => {
            init_db_command(&config).await?;
        }
    }

    Ok(())
}

#[instrument(skip(config))]
async fn build_pipeline(
    config: &Config,
    args: &FilterArgs,
    with_extractor: bool,
) -> anyhow::Result<Pipeline<SpiderFetcher, GeminiModel>> {
    let db = Database::from_config(&config.database).await?;

    let crawler_config = CrawlerConfig::builder()
        .concurrency(config.fetch_concurrency)
        .site_template(args.template)
        .build();
    let fetcher = SpiderFetcher::new(crawler_config.clone());

    let pipeline = Pipeline::new(db, fetcher, crawler_config).with_progress(true);
    if !with_extractor {
        return Ok(pipeline);
    }

    // Only the extraction stages need an API key
    let client = Client::new_gemini_from_config(&config.model)?;
    info!("Extracting with {}", config.model.model);
    let extractor = SchemaExtractor::new(client.completion().clone(), ExtractorConfig::default());

    Ok(pipeline.with_extractor(extractor, args.template.slice_markers()))
}

async fn init_db_command(config: &Config) -> anyhow::Result<()> {
    let db = Database::from_config(&config.database).await?;
    db.initialize_schema().await?;

    for table in Table::ALL {
        println!("{:<24} {:>8} rows", table.name(), db.count_rows(table).await?);
    }
    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}
