//! # Listing Crawler Module
//!
//! This module discovers listing URLs on paginated search results and renders
//! listing pages. It is the first half of the pipeline: everything it produces
//! is raw text, handed to the store and later to the extractor.
//!
//! ## Key Components
//!
//! - `Filter`: the (home type, area) pair a run is scoped to
//! - `PageFetcher`: renders a batch of URLs, isolating failures per URL
//! - `SpiderFetcher`: headless-browser implementation backed by `spider`
//! - `extract_links` / `get_max_page`: parsing of rendered search pages
//! - `discover_all_urls`: walks every search results page for a filter
//!
//! ## Failure model
//!
//! A page that cannot be rendered never aborts its batch. It comes back as a
//! `FetchedPage` holding a `FetchError`, whose text form is an `Error: ...`
//! marker that yields no links and no page numbers downstream.

mod config;
mod error;
mod frontier;
mod links;
mod spider_integration;

#[cfg(test)]
pub(crate) mod fake;

pub use config::{CrawlerConfig, CrawlerConfigBuilder, DEFAULT_SEARCH_URL_TEMPLATE, DEFAULT_USER_AGENT};
pub use error::{CrawlError, FetchError};
pub use frontier::discover_all_urls;
pub use links::{extract_links, get_max_page};
pub use spider_integration::SpiderFetcher;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

/// The (home type, area) pair scoping a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    /// Listing category in the URL path, e.g. `koop` or `huur`
    pub home_type: String,

    /// Area slug in the URL path, e.g. `rotterdam`
    pub area: String,
}

impl Filter {
    pub fn new(home_type: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            home_type: home_type.into(),
            area: area.into(),
        }
    }

    /// `{home_type}/{area}`, the segment every matching listing URL contains
    pub fn path_segment(&self) -> String {
        format!("{}/{}", self.home_type, self.area)
    }

    /// SQL `LIKE` pattern selecting this filter's URLs
    pub fn like_pattern(&self) -> String {
        format!("%/{}/{}/%", self.home_type, self.area)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new("koop", "rotterdam")
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.home_type, self.area)
    }
}

/// Outcome of rendering a single URL
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Rendered page text (Markdown)
    Rendered(String),

    /// Rendering failed after all retries
    Failed(FetchError),
}

/// A rendered (or failed) page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,

    /// Rendered text or the failure
    pub content: PageContent,
}

impl FetchedPage {
    pub fn rendered(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: PageContent::Rendered(text.into()),
        }
    }

    pub fn failed(url: impl Into<String>, error: FetchError) -> Self {
        Self {
            url: url.into(),
            content: PageContent::Failed(error),
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self.content, PageContent::Rendered(_))
    }

    /// Page text, or an `Error: ...` marker for failed pages
    pub fn text(&self) -> String {
        match &self.content {
            PageContent::Rendered(text) => text.clone(),
            PageContent::Failed(e) => format!("Error: {}", e),
        }
    }
}

/// Renders batches of URLs
///
/// Implementations return exactly one `FetchedPage` per requested URL, in any
/// order, and never fail the batch because of a single page.
pub trait PageFetcher: Send + Sync {
    fn fetch_all(&self, urls: &[String]) -> impl Future<Output = Vec<FetchedPage>> + Send;
}
