//! Error types for the crawler module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The search page has no readable pagination control
    #[error("No pagination found between '{previous}' and '{next}'")]
    NoPaginationFound {
        /// Expected "previous page" label
        previous: String,
        /// Expected "next page" label
        next: String,
    },

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        CrateError::Crawl(err.to_string())
    }
}

/// Failure to render one page. Contained per URL, never propagated.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The browser or network layer failed
    #[error("render failed: {0}")]
    Render(String),

    /// The server answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// The crawl finished without producing the page
    #[error("no content received")]
    EmptyPage,

    /// Could not attach to the crawl's page stream
    #[error("failed to subscribe to crawl results")]
    Subscribe,
}
