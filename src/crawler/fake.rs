//! In-memory page fetcher for tests

use std::collections::HashMap;
use std::sync::Mutex;

use crate::crawler::{FetchError, FetchedPage, PageFetcher};

/// Serves canned pages and records every requested URL
///
/// Unknown URLs come back as failed pages. Results are returned in reverse
/// request order to exercise order independence.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.pages.insert(url.into(), content.into());
        self
    }

    /// Every URL requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl PageFetcher for FakeFetcher {
    async fn fetch_all(&self, urls: &[String]) -> Vec<FetchedPage> {
        self.requests.lock().unwrap().extend(urls.iter().cloned());
        urls.iter()
            .rev()
            .map(|url| match self.pages.get(url) {
                Some(content) => FetchedPage::rendered(url, content),
                None => FetchedPage::failed(url, FetchError::Status(404)),
            })
            .collect()
    }
}
