//! # Pipeline Orchestration
//!
//! Runs the three stages for one filter: discover listing URLs, render the
//! listing pages, extract a structured record per page. Each stage works only
//! on what the store does not have yet, so a run can be interrupted and
//! restarted at any point without redoing or duplicating work.

use std::fmt;
use std::ops::AddAssign;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::SliceMarkers;
use crate::crawler::{discover_all_urls, CrawlerConfig, Filter, PageContent, PageFetcher};
use crate::error::{Error, Result};
use crate::extract::{slice_listing, SchemaExtractor};
use crate::model::CompletionProvider;
use crate::store::{Database, RawPage};

/// Pages rendered and stored per batch
pub const DEFAULT_PAGE_BATCH_SIZE: usize = 50;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovering,
    PersistingUrls,
    FetchingPages,
    PersistingPages,
    ExtractingSchemas,
    PersistingSchemas,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discovering => "discovering",
            Stage::PersistingUrls => "persisting_urls",
            Stage::FetchingPages => "fetching_pages",
            Stage::PersistingPages => "persisting_pages",
            Stage::ExtractingSchemas => "extracting_schemas",
            Stage::PersistingSchemas => "persisting_schemas",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a run (or a single stage) did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub urls_discovered: usize,
    pub urls_stored: u64,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub pages_stored: u64,
    pub listings_extracted: usize,
    pub listings_failed: usize,
    pub listings_stored: u64,
}

impl AddAssign for RunReport {
    fn add_assign(&mut self, other: Self) {
        self.urls_discovered += other.urls_discovered;
        self.urls_stored += other.urls_stored;
        self.pages_fetched += other.pages_fetched;
        self.pages_failed += other.pages_failed;
        self.pages_stored += other.pages_stored;
        self.listings_extracted += other.listings_extracted;
        self.listings_failed += other.listings_failed;
        self.listings_stored += other.listings_stored;
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "urls: {} discovered, {} new | pages: {} fetched, {} failed, {} stored | listings: {} extracted, {} failed, {} stored",
            self.urls_discovered,
            self.urls_stored,
            self.pages_fetched,
            self.pages_failed,
            self.pages_stored,
            self.listings_extracted,
            self.listings_failed,
            self.listings_stored,
        )
    }
}

struct Extraction<P> {
    extractor: SchemaExtractor<P>,
    markers: SliceMarkers,
}

/// Staged crawl-and-extract pipeline over a listing store
pub struct Pipeline<F, P> {
    db: Database,
    fetcher: F,
    crawler: CrawlerConfig,
    extraction: Option<Extraction<P>>,
    batch_size: usize,
    progress: bool,
}

impl<F: PageFetcher, P: CompletionProvider> Pipeline<F, P> {
    /// A pipeline that can discover and fetch; add an extractor to parse
    pub fn new(db: Database, fetcher: F, crawler: CrawlerConfig) -> Self {
        Self {
            db,
            fetcher,
            crawler,
            extraction: None,
            batch_size: DEFAULT_PAGE_BATCH_SIZE,
            progress: false,
        }
    }

    pub fn with_extractor(mut self, extractor: SchemaExtractor<P>, markers: SliceMarkers) -> Self {
        self.extraction = Some(Extraction { extractor, markers });
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Show a progress bar while extracting
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn enter(&self, stage: Stage, filter: &Filter) {
        info!(stage = %stage, "Entering stage {} for /{}", stage, filter);
    }

    /// Discover listing URLs and store the ones not seen before
    #[instrument(skip(self), fields(filter = %filter))]
    pub async fn scrape_urls(&self, filter: &Filter) -> Result<RunReport> {
        self.enter(Stage::Discovering, filter);
        let discovered = discover_all_urls(&self.fetcher, &self.crawler, filter).await?;
        let known = self.db.listing_urls(filter).await?;
        let new_urls: Vec<String> = discovered.difference(&known).cloned().collect();
        info!(
            "{} listing URLs discovered, {} not seen before",
            discovered.len(),
            new_urls.len()
        );

        self.enter(Stage::PersistingUrls, filter);
        let urls_stored = self.db.insert_listing_urls(&new_urls).await?;

        Ok(RunReport {
            urls_discovered: discovered.len(),
            urls_stored,
            ..Default::default()
        })
    }

    /// Render and store the pages of listing URLs that have no page yet.
    ///
    /// Pages that fail to render are skipped and picked up again next run.
    #[instrument(skip(self), fields(filter = %filter))]
    pub async fn scrape_pages(&self, filter: &Filter) -> Result<RunReport> {
        let pending = self.db.urls_without_page(filter).await?;
        let mut report = RunReport::default();
        if pending.is_empty() {
            info!("No listing pages left to fetch for /{}", filter);
            return Ok(report);
        }
        info!("{} listing pages to fetch", pending.len());

        for batch in pending.chunks(self.batch_size) {
            self.enter(Stage::FetchingPages, filter);
            let fetched = self.fetcher.fetch_all(batch).await;
            report.pages_fetched += fetched.len();

            let mut pages = Vec::with_capacity(fetched.len());
            for page in fetched {
                match page.content {
                    PageContent::Rendered(text) => pages.push(RawPage::new(page.url, text)),
                    PageContent::Failed(e) => {
                        warn!("Not storing {}: {}", page.url, e);
                        report.pages_failed += 1;
                    }
                }
            }

            self.enter(Stage::PersistingPages, filter);
            report.pages_stored += self.db.insert_raw_pages(&pages).await?;
        }

        Ok(report)
    }

    /// Extract and store a listing for every stored page without one.
    ///
    /// A page whose extraction fails on every attempt is logged and left for
    /// the next run.
    #[instrument(skip(self), fields(filter = %filter))]
    pub async fn parse_pages(&self, filter: &Filter) -> Result<RunReport> {
        let Extraction { extractor, markers } = self
            .extraction
            .as_ref()
            .ok_or_else(|| Error::Extract("pipeline has no extractor configured".to_string()))?;

        self.enter(Stage::ExtractingSchemas, filter);
        let pending = self.db.pages_without_listing(filter).await?;
        let mut report = RunReport::default();
        if pending.is_empty() {
            info!("No stored pages left to parse for /{}", filter);
            return Ok(report);
        }
        info!("{} stored pages to parse", pending.len());

        let progress = self.progress_bar(pending.len());
        let mut results = stream::iter(&pending)
            .map(|page| async move {
                let sliced = slice_listing(&page.content, &page.url, markers);
                extractor.extract_structured(&sliced, &page.url).await
            })
            .buffer_unordered(extractor.config().concurrency.max(1));

        self.enter(Stage::PersistingSchemas, filter);
        while let Some(result) = results.next().await {
            progress.inc(1);
            match result {
                Ok(extracted) => {
                    report.listings_extracted += 1;
                    if self.db.insert_listing(&extracted).await? {
                        report.listings_stored += 1;
                    }
                }
                Err(e) => {
                    warn!("Skipping listing: {}", e);
                    report.listings_failed += 1;
                }
            }
        }
        progress.finish_and_clear();

        Ok(report)
    }

    /// All three stages in order
    pub async fn run(&self, filter: &Filter) -> Result<RunReport> {
        let mut report = self.scrape_urls(filter).await?;
        report += self.scrape_pages(filter).await?;
        report += self.parse_pages(filter).await?;

        self.enter(Stage::Done, filter);
        info!("Run for /{} finished: {}", filter, report);
        Ok(report)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
        {
            progress_bar.set_style(style.progress_chars("##-"));
        }
        progress_bar.set_message("Extracting listings...");
        progress_bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteTemplate;
    use crate::crawler::fake::FakeFetcher;
    use crate::extract::ExtractorConfig;
    use crate::model::mock_model::MockCompletionModel;
    use crate::retry::RetryPolicy;
    use crate::store::Table;

    use tempfile::tempdir;

    const HOUSE_A: &str = "https://www.funda.nl/koop/rotterdam/huis-43500001-bergweg-12/";
    const HOUSE_B: &str = "https://www.funda.nl/koop/rotterdam/appartement-43500002-nobelstraat-37-c/";
    const HOUSE_C: &str = "https://www.funda.nl/koop/rotterdam/appartement-43500003-zwart-janstraat-8/";

    const LISTING_JSON: &str = r#"{"address": "Bergweg 12", "city": "Rotterdam", "asking_price": "€ 425.000 k.k."}"#;

    fn listing_page(address: &str) -> String {
        format!("Menu\nBewaren\n# {address}\nVraagprijs € 425.000 k.k.\n##  Populariteit\nFooter")
    }

    fn search_page(links: &[&str], pagination: &str) -> String {
        let links: Vec<String> = links
            .iter()
            .map(|url| format!("* [Listing]({url})"))
            .collect();
        format!("# Koophuizen in Rotterdam\n{}\n{}", links.join("\n"), pagination)
    }

    fn crawler_config() -> CrawlerConfig {
        CrawlerConfig::builder()
            .retry(RetryPolicy::new(1).without_delay())
            .site_template(SiteTemplate::Funda2023)
            .build()
    }

    fn extractor(provider: MockCompletionModel) -> SchemaExtractor<MockCompletionModel> {
        let config = ExtractorConfig::builder()
            .instruction("Extract the listing.")
            .retry(RetryPolicy::new(2).without_delay())
            .build();
        SchemaExtractor::new(provider, config)
    }

    /// Two search pages listing three houses, plus the three listing pages
    fn site() -> FakeFetcher {
        let config = crawler_config();
        let filter = Filter::default();
        let pagination = "* Vorige\n* 1\n* 2\n* Volgende";
        FakeFetcher::new()
            .with_page(
                config.search_page_url(&filter, 1).unwrap(),
                search_page(&[HOUSE_A, HOUSE_B], pagination),
            )
            .with_page(
                config.search_page_url(&filter, 2).unwrap(),
                search_page(&[HOUSE_C], pagination),
            )
            .with_page(HOUSE_A, listing_page("Bergweg 12"))
            .with_page(HOUSE_B, listing_page("Nobelstraat 37 C"))
            .with_page(HOUSE_C, listing_page("Zwart Janstraat 8"))
    }

    async fn setup_test_db() -> (Database, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let db = Database::new_from_path(&db_path).await.unwrap();
        (db, temp_dir)
    }

    fn pipeline(
        db: Database,
        fetcher: FakeFetcher,
        provider: MockCompletionModel,
    ) -> Pipeline<FakeFetcher, MockCompletionModel> {
        Pipeline::new(db, fetcher, crawler_config())
            .with_extractor(extractor(provider), SiteTemplate::Funda2023.slice_markers())
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Discovering.to_string(), "discovering");
        assert_eq!(Stage::PersistingSchemas.to_string(), "persisting_schemas");
        assert_eq!(Stage::Done.to_string(), "done");
    }

    #[tokio::test]
    async fn test_fetch_stage_only_fetches_missing_pages() {
        let (db, _temp_dir) = setup_test_db().await;
        let urls: Vec<String> = [HOUSE_A, HOUSE_B, HOUSE_C].iter().map(|u| u.to_string()).collect();
        db.insert_listing_urls(&urls).await.unwrap();
        db.insert_raw_pages(&[
            RawPage::new(HOUSE_A, listing_page("Bergweg 12")),
            RawPage::new(HOUSE_B, listing_page("Nobelstraat 37 C")),
        ])
        .await
        .unwrap();

        let pipeline = pipeline(db, site(), MockCompletionModel::always(LISTING_JSON));
        let report = pipeline.scrape_pages(&Filter::default()).await.unwrap();

        assert_eq!(pipeline.fetcher.requests(), vec![HOUSE_C.to_string()]);
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.pages_stored, 1);
        assert_eq!(pipeline.database().count_rows(Table::RawPages).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_renders_are_not_stored() {
        let (db, _temp_dir) = setup_test_db().await;
        let urls = vec![HOUSE_A.to_string(), "https://www.funda.nl/koop/rotterdam/huis-1-gone/".to_string()];
        db.insert_listing_urls(&urls).await.unwrap();

        let pipeline = pipeline(db, site(), MockCompletionModel::always(LISTING_JSON));
        let report = pipeline.scrape_pages(&Filter::default()).await.unwrap();

        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.pages_stored, 1);
        let missing = pipeline.database().urls_without_page(&Filter::default()).await.unwrap();
        assert_eq!(missing, vec!["https://www.funda.nl/koop/rotterdam/huis-1-gone/".to_string()]);
    }

    #[tokio::test]
    async fn test_run_twice_stores_everything_once() {
        let (db, _temp_dir) = setup_test_db().await;
        let provider = MockCompletionModel::always(LISTING_JSON);
        let pipeline = pipeline(db, site(), provider.clone());
        let filter = Filter::default();

        let first = pipeline.run(&filter).await.unwrap();
        assert_eq!(first.urls_discovered, 3);
        assert_eq!(first.urls_stored, 3);
        assert_eq!(first.pages_stored, 3);
        assert_eq!(first.listings_stored, 3);
        assert_eq!(provider.calls(), 3);

        let second = pipeline.run(&filter).await.unwrap();
        assert_eq!(second.urls_discovered, 3);
        assert_eq!(second.urls_stored, 0);
        assert_eq!(second.pages_fetched, 0);
        assert_eq!(second.listings_extracted, 0);
        assert_eq!(provider.calls(), 3);

        for table in Table::ALL {
            assert_eq!(pipeline.database().count_rows(table).await.unwrap(), 3, "{}", table.name());
        }
    }

    #[tokio::test]
    async fn test_extraction_failure_is_skipped() {
        let (db, _temp_dir) = setup_test_db().await;
        let urls = vec![HOUSE_A.to_string(), HOUSE_B.to_string()];
        db.insert_listing_urls(&urls).await.unwrap();
        db.insert_raw_pages(&[
            RawPage::new(HOUSE_A, listing_page("Bergweg 12")),
            RawPage::new(HOUSE_B, listing_page("Nobelstraat 37 C")),
        ])
        .await
        .unwrap();

        let provider = MockCompletionModel::from_fn(|text| {
            if text.contains("Bergweg") {
                Ok(LISTING_JSON.to_string())
            } else {
                Ok("No listing here.".to_string())
            }
        });
        let pipeline = pipeline(db, FakeFetcher::new(), provider.clone());
        let report = pipeline.parse_pages(&Filter::default()).await.unwrap();

        assert_eq!(report.listings_extracted, 1);
        assert_eq!(report.listings_failed, 1);
        assert_eq!(report.listings_stored, 1);
        // One call for the good page, two attempts for the bad one
        assert_eq!(provider.calls(), 3);

        let pending = pipeline.database().pages_without_listing(&Filter::default()).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, HOUSE_B);
    }

    #[tokio::test]
    async fn test_slices_before_extracting() {
        let (db, _temp_dir) = setup_test_db().await;
        db.insert_listing_urls(&[HOUSE_A.to_string()]).await.unwrap();
        db.insert_raw_pages(&[RawPage::new(HOUSE_A, listing_page("Bergweg 12"))])
            .await
            .unwrap();

        let provider = MockCompletionModel::from_fn(|text| {
            assert_eq!(text, "Bewaren# Bergweg 12Vraagprijs € 425.000 k.k.");
            Ok(LISTING_JSON.to_string())
        });
        let pipeline = pipeline(db, FakeFetcher::new(), provider);

        let report = pipeline.parse_pages(&Filter::default()).await.unwrap();
        assert_eq!(report.listings_stored, 1);
    }

    #[tokio::test]
    async fn test_parse_requires_extractor() {
        let (db, _temp_dir) = setup_test_db().await;
        let pipeline: Pipeline<FakeFetcher, MockCompletionModel> =
            Pipeline::new(db, FakeFetcher::new(), crawler_config());

        assert!(pipeline.parse_pages(&Filter::default()).await.is_err());
    }
}
