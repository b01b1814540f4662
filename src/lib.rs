//! # fundai - Real-estate listings, scraped and structured
//!
//! This crate collects listings from funda.nl for one (home type, area) pair,
//! extracts their attributes with a language model and stores everything in
//! libsql for a dashboard to read.
//!
//! ## Features
//!
//! - Discovery of every listing URL across paginated search results
//! - Headless-browser rendering of listing pages through `spider`
//! - Site-layout revisions selecting the page markers used for slicing
//! - Rate-limited Gemini completions with resubmission on unreadable output
//! - Coercion of free-text values into typed, nullable attributes
//! - Append-only, URL-unique storage so every stage resumes where it stopped
//!
//! ## Example
//!
//! ```rust,no_run
//! use fundai::config::{Config, SiteTemplate};
//! use fundai::crawler::{CrawlerConfig, Filter, SpiderFetcher};
//! use fundai::extract::{ExtractorConfig, SchemaExtractor};
//! use fundai::model::Client;
//! use fundai::pipeline::Pipeline;
//! use fundai::store::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     dotenvy::dotenv().ok();
//!     let config = Config::from_env()?;
//!     let db = Database::from_config(&config.database).await?;
//!
//!     let crawler = CrawlerConfig::builder()
//!         .site_template(SiteTemplate::Funda2023)
//!         .build();
//!     let client = Client::new_gemini_from_config(&config.model)?;
//!     let extractor = SchemaExtractor::new(client.completion().clone(), ExtractorConfig::default());
//!
//!     let pipeline = Pipeline::new(db, SpiderFetcher::new(crawler.clone()), crawler)
//!         .with_extractor(extractor, SiteTemplate::Funda2023.slice_markers());
//!
//!     let report = pipeline.run(&Filter::new("koop", "rotterdam")).await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod store;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
