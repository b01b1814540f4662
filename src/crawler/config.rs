//! # Crawler Configuration Module
//!
//! Settings for rendering pages and walking search results: browser identity,
//! fan-out, timeouts, per-page retries, the search URL template and the
//! pagination markers of the active site template. Built through
//! `CrawlerConfigBuilder`.

use std::time::Duration;

use url::Url;

use crate::config::{PaginationMarkers, SiteTemplate};
use crate::crawler::error::CrawlError;
use crate::crawler::Filter;
use crate::retry::RetryPolicy;

/// Desktop Chrome identity; listing sites block obvious bot agents
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/86.0.4240.183 Safari/537.36";

/// Search results URL with `{home_type}`, `{area}` and `{page}` placeholders
pub const DEFAULT_SEARCH_URL_TEMPLATE: &str =
    "https://www.funda.nl/zoeken/{home_type}?selected_area=%5B%22{area}%22%5D&search_result={page}";

/// Default cap on search results pages per filter
pub const DEFAULT_MAX_SEARCH_PAGES: u32 = 1000;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// User agent to use for requests
    pub user_agent: String,

    /// Maximum number of pages rendered at the same time
    pub concurrency: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Whether to respect robots.txt
    pub respect_robots_txt: bool,

    /// Retries for a single page render
    pub retry: RetryPolicy,

    /// Search results URL template
    pub search_url_template: String,

    /// Labels around the pagination control
    pub pagination: PaginationMarkers,

    /// Upper bound on the search results pages walked for one filter
    pub max_search_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: 4,
            request_timeout_secs: 60,
            respect_robots_txt: false,
            retry: RetryPolicy::new(2),
            search_url_template: DEFAULT_SEARCH_URL_TEMPLATE.to_string(),
            pagination: SiteTemplate::default().pagination_markers(),
            max_search_pages: DEFAULT_MAX_SEARCH_PAGES,
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set how many pages may render concurrently
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-request timeout in seconds
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Set whether to respect robots.txt
    pub fn respect_robots_txt(mut self, respect_robots_txt: bool) -> Self {
        self.config.respect_robots_txt = respect_robots_txt;
        self
    }

    /// Set the retry policy for a single page render
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the search results URL template
    pub fn search_url_template(mut self, template: impl Into<String>) -> Self {
        self.config.search_url_template = template.into();
        self
    }

    /// Use the pagination markers of a site template revision
    pub fn site_template(mut self, template: SiteTemplate) -> Self {
        self.config.pagination = template.pagination_markers();
        self
    }

    /// Set the pagination markers explicitly
    pub fn pagination(mut self, pagination: PaginationMarkers) -> Self {
        self.config.pagination = pagination;
        self
    }

    /// Cap the number of search results pages walked
    pub fn max_search_pages(mut self, max_search_pages: u32) -> Self {
        self.config.max_search_pages = max_search_pages.max(1);
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// URL of one search results page for a filter (pages start at 1)
    pub fn search_page_url(&self, filter: &Filter, page: u32) -> Result<String, CrawlError> {
        let raw = self
            .search_url_template
            .replace("{home_type}", &filter.home_type)
            .replace("{area}", &filter.area)
            .replace("{page}", &page.to_string());
        Ok(Url::parse(&raw)?.to_string())
    }
}
