//! Discovery of every listing URL across paginated search results

use std::collections::BTreeSet;

use tracing::{info, instrument, warn};

use crate::crawler::error::CrawlError;
use crate::crawler::links::{extract_links, get_max_page};
use crate::crawler::{CrawlerConfig, Filter, PageFetcher};

/// Collect the listing URLs of all search results pages for a filter
///
/// Page 1 is fetched first to read the pagination bound, then pages
/// `2..=max` are fetched as one batch and page 1's content is reused. Pages
/// that fail to render contribute nothing. A first page without pagination is
/// treated as the only page.
#[instrument(skip(fetcher, config), fields(filter = %filter))]
pub async fn discover_all_urls<F: PageFetcher>(
    fetcher: &F,
    config: &CrawlerConfig,
    filter: &Filter,
) -> Result<BTreeSet<String>, CrawlError> {
    let first_url = config.search_page_url(filter, 1)?;
    let first_text = fetcher
        .fetch_all(std::slice::from_ref(&first_url))
        .await
        .into_iter()
        .next()
        .map(|page| page.text())
        .unwrap_or_default();

    let mut max_pages = match get_max_page(&first_text, &config.pagination) {
        Ok(max) => max.max(1),
        Err(e) => {
            warn!("{} on {}; treating it as the only page", e, first_url);
            1
        }
    };
    if max_pages > config.max_search_pages {
        warn!(
            "Pagination on {} advertises {} pages, only walking the first {}",
            first_url, max_pages, config.max_search_pages
        );
        max_pages = config.max_search_pages;
    }
    info!(
        "Finished with main search page, will now fetch {} remaining search pages",
        max_pages - 1
    );

    let remaining = (2..=max_pages)
        .map(|page| config.search_page_url(filter, page))
        .collect::<Result<Vec<_>, _>>()?;

    let mut urls = extract_links(&first_text, filter);
    if !remaining.is_empty() {
        for page in fetcher.fetch_all(&remaining).await {
            urls.extend(extract_links(&page.text(), filter));
        }
    }

    info!("{} listing links found on /{}", urls.len(), filter);
    Ok(urls)
}
