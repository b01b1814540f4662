//! Page rendering through the spider crawler
//!
//! Each URL gets its own single-page `Website`. With the `chrome` feature the
//! crawl renders through a headless browser that spider launches for that
//! crawl and tears down when it ends, whether the page loaded or not.

use futures::stream::{self, StreamExt};
use spider::page::Page;
use spider::website::Website;
use spider_utils::spider_transformations::transformation::content::{
    transform_content, ReturnFormat, TransformConfig,
};
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::crawler::error::FetchError;
use crate::crawler::{CrawlerConfig, FetchedPage, PageFetcher};
use crate::retry::retry;

/// Headless-browser page fetcher
#[derive(Debug, Clone, Default)]
pub struct SpiderFetcher {
    config: CrawlerConfig,
}

impl SpiderFetcher {
    pub fn new(config: CrawlerConfig) -> Self {
        Self { config }
    }

    /// Render a single URL to Markdown
    #[instrument(skip(self))]
    async fn render(&self, url: &str) -> Result<String, FetchError> {
        let mut website = Website::new(url);
        website
            .configuration
            .with_respect_robots_txt(self.config.respect_robots_txt)
            .with_user_agent(Some(&self.config.user_agent))
            .with_request_timeout(Some(self.config.request_timeout()))
            .with_limit(1);

        #[cfg(feature = "chrome")]
        website
            .configuration
            .with_wait_for_idle_network(Some(spider::configuration::WaitForIdleNetwork::new(
                Some(self.config.request_timeout()),
            )));

        let mut rx = website.subscribe(4).ok_or(FetchError::Subscribe)?;
        let handle = tokio::spawn(
            async move {
                let mut rendered = None;
                while let Ok(page) = rx.recv().await {
                    debug!("Received page: {}", page.get_url());
                    // The limit is one page, but keep draining so the
                    // sender never blocks.
                    if rendered.is_none() {
                        rendered = Some(page_to_markdown(&page));
                    }
                }
                rendered
            }
            .instrument(info_span!("receive_page", url = %url)),
        );

        website.crawl().await;
        website.unsubscribe();

        let rendered = handle
            .await
            .map_err(|e| FetchError::Render(format!("Task join error: {}", e)))?;
        rendered.unwrap_or(Err(FetchError::EmptyPage))
    }
}

fn page_to_markdown(page: &Page) -> Result<String, FetchError> {
    if !page.status_code.is_success() {
        return Err(FetchError::Status(page.status_code.as_u16()));
    }

    // Navigation must survive: the pagination control lives there.
    let transform_config = TransformConfig {
        return_format: ReturnFormat::Markdown,
        readability: false,
        main_content: false,
        ..Default::default()
    };

    let markdown = transform_content(page, &transform_config, &None, &None, &None);
    if markdown.trim().is_empty() {
        return Err(FetchError::EmptyPage);
    }
    Ok(markdown)
}

impl PageFetcher for SpiderFetcher {
    async fn fetch_all(&self, urls: &[String]) -> Vec<FetchedPage> {
        info!(
            "Rendering {} pages with concurrency {}",
            urls.len(),
            self.config.concurrency
        );

        let pages: Vec<FetchedPage> = stream::iter(urls.iter().cloned())
            .map(|url| async move {
                match retry(&self.config.retry, |_| self.render(&url)).await {
                    Ok(markdown) => FetchedPage::rendered(url, markdown),
                    Err(e) => {
                        warn!("Giving up on {}: {}", url, e);
                        FetchedPage::failed(url, e.last_error)
                    }
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let failed = pages.iter().filter(|p| !p.is_rendered()).count();
        info!("Rendered {} pages, {} failed", pages.len() - failed, failed);
        pages
    }
}

#[cfg(test)]
mod tests {
    use spider::page::build;
    use spider::reqwest::StatusCode;
    use spider::utils::PageResponse;

    use super::*;
    use crate::crawler::links::extract_links;
    use crate::crawler::Filter;

    const URL: &str = "https://www.funda.nl/zoeken/koop?search_result=1";

    fn page(status_code: StatusCode, html: Option<&str>) -> Page {
        build(
            URL,
            PageResponse {
                content: html.map(|html| Box::new(html.as_bytes().to_vec())),
                status_code,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_error_status_is_a_failed_render() {
        let page = page(StatusCode::NOT_FOUND, Some("<html><body>Niet gevonden</body></html>"));

        assert!(matches!(page_to_markdown(&page), Err(FetchError::Status(404))));
    }

    #[test]
    fn test_blank_body_is_a_failed_render() {
        let page = page(StatusCode::OK, None);

        assert!(matches!(page_to_markdown(&page), Err(FetchError::EmptyPage)));
    }

    #[test]
    fn test_rendered_links_survive_markdown() {
        let html = r#"<html><body>
            <nav><a href="https://www.funda.nl/">Home</a></nav>
            <main>
              <a href="https://www.funda.nl/koop/rotterdam/appartement-43494363-nobelstraat-37-c/">Nobelstraat 37 C</a>
            </main>
            </body></html>"#;
        let page = page(StatusCode::OK, Some(html));

        let markdown = page_to_markdown(&page).unwrap();
        let links = extract_links(&markdown, &Filter::new("koop", "rotterdam"));

        assert_eq!(
            links.into_iter().collect::<Vec<_>>(),
            vec!["https://www.funda.nl/koop/rotterdam/appartement-43494363-nobelstraat-37-c/"]
        );
    }
}
