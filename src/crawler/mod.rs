//! Crawler loop orchestration (spec §4.I): wires the Frontier, collaborators, Duplicate
//! Detector, Content Extractor, Text Processor, Inverted Index and PageRank into one
//! `run(seeds)` pass, the way the reference crate's own `crawl_website` drives its lower
//! level scraping primitives.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;

use crate::collaborators::{BlobStore, HttpFetcher, RobotsOracle, SharedCache};
use crate::core::config::Settings;
use crate::dedup::DuplicateDetector;
use crate::extract;
use crate::frontier::Frontier;
use crate::index::InvertedIndex;
use crate::ranking::pagerank::PageRank;
use crate::text::TextProcessor;

const SEED_PRIORITY: u8 = 1;
const DISCOVERED_PRIORITY: u8 = 2;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CrawlSummary {
    pub pages_fetched: usize,
    pub pages_rejected_duplicate_url: usize,
    pub pages_rejected_duplicate_content: usize,
    pub errors: usize,
}

pub struct CrawlerLoop {
    settings: Settings,
    frontier: Frontier,
    dedup: DuplicateDetector,
    index: Arc<InvertedIndex>,
    pagerank: Arc<PageRank>,
    fetcher: Arc<dyn HttpFetcher>,
    robots: Arc<dyn RobotsOracle>,
    text_processor: TextProcessor,
    accepted: AtomicUsize,
}

impl CrawlerLoop {
    pub fn new(
        settings: Settings,
        cache: Arc<dyn SharedCache>,
        fetcher: Arc<dyn HttpFetcher>,
        robots: Arc<dyn RobotsOracle>,
        index: Arc<InvertedIndex>,
        pagerank: Arc<PageRank>,
    ) -> Self {
        let frontier = Frontier::new(settings.crawl_delay, cache.clone());
        let dedup = DuplicateDetector::new(cache, settings.near_duplicate_threshold);
        let text_processor = TextProcessor::new(&settings);
        Self {
            settings,
            frontier,
            dedup,
            index,
            pagerank,
            fetcher,
            robots,
            text_processor,
            accepted: AtomicUsize::new(0),
        }
    }

    /// Drives the crawl: pops from the frontier respecting politeness, fetches, checks
    /// robots and dedup, extracts and indexes, then feeds discovered links back in
    /// (spec §4.I). Ends when the frontier is drained or `MAX_PAGES_PER_DOMAIN` pages have
    /// been accepted, whichever comes first.
    pub async fn run(&self, seeds: &[String]) -> CrawlSummary {
        for seed in seeds {
            self.frontier.add(seed, SEED_PRIORITY).await;
        }

        let summary = tokio::sync::Mutex::new(CrawlSummary::default());
        let semaphore = Semaphore::new(self.settings.max_crawl_threads);

        stream::unfold((), |_| async {
            if self.accepted.load(Ordering::Relaxed) >= self.settings.max_pages_per_domain {
                return None;
            }
            self.frontier.next().await.map(|url| (url, ()))
        })
        .for_each_concurrent(self.settings.max_crawl_threads, |url| async {
            let _permit = semaphore.acquire().await.expect("semaphore open");
            self.process_one(url, &summary).await;
        })
        .await;

        summary.into_inner()
    }

    async fn process_one(&self, url: String, summary: &tokio::sync::Mutex<CrawlSummary>) {
        if !self.robots.can_fetch(&self.settings.user_agent, &url).await {
            tracing::info!(%url, "robots disallow, skipping");
            return;
        }
        if let Some(delay) = self.robots.crawl_delay(&url).await {
            if let Ok(parsed) = url::Url::parse(&url) {
                if let Some(host) = parsed.host_str() {
                    self.frontier.set_host_delay(host, delay).await;
                }
            }
        }

        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(%url, error = %e, "fetch failed, dropping url from this pass");
                summary.lock().await.errors += 1;
                return;
            }
        };

        match self.dedup.is_duplicate_url(&page.final_url).await {
            Ok(true) => {
                summary.lock().await.pages_rejected_duplicate_url += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(%url, error = %e, "dedup url check failed, treating as new");
            }
        }

        let content = extract::extract(&page.body, &page.final_url);

        if self.dedup.is_duplicate_content(&content.body_text) {
            summary.lock().await.pages_rejected_duplicate_content += 1;
            return;
        }

        let token_streams = self.text_processor.features(&content);
        let doc_length: usize = token_streams.values().map(Vec::len).sum();
        let zone_weights = crate::text::term_weights(&token_streams);
        let mut flattened = Vec::with_capacity(doc_length);
        for zone in crate::core::types::Zone::ALL {
            if let Some(tokens) = token_streams.get(&zone) {
                flattened.extend(tokens.iter().cloned());
            }
        }
        self.index.add_weighted(&page.final_url, &flattened, &zone_weights);

        for link in &content.links {
            self.pagerank.add_link(&page.final_url, &link.url);
            self.frontier.add(&link.url, DISCOVERED_PRIORITY).await;
        }

        let _ = doc_length;
        self.accepted.fetch_add(1, Ordering::Relaxed);
        summary.lock().await.pages_fetched += 1;
    }

    pub async fn persist(&self, blob_store: &dyn BlobStore) -> crate::core::error::CoreResult<()> {
        blob_store.put("index.bin", self.index.serialize()?).await?;
        blob_store.put("pagerank.bin", self.pagerank.serialize()?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{FakeFetcher, FakeSharedCache, NoRobots};
    use std::collections::HashMap;

    #[tokio::test]
    async fn crawl_loop_drains_frontier_and_indexes_linked_pages() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://example.test/a".to_string(),
            r#"<html><body><h1>Page A</h1><a href="https://example.test/b">B</a></body></html>"#
                .to_string(),
        );
        pages.insert(
            "https://example.test/b".to_string(),
            r#"<html><body><h1>Page B</h1></body></html>"#.to_string(),
        );

        let mut settings = Settings::default();
        settings.crawl_delay = std::time::Duration::from_millis(0);

        let index = Arc::new(InvertedIndex::new());
        let pagerank = Arc::new(PageRank::new());
        let loop_ = CrawlerLoop::new(
            settings,
            Arc::new(FakeSharedCache::default()),
            Arc::new(FakeFetcher::new(pages)),
            Arc::new(NoRobots),
            index.clone(),
            pagerank.clone(),
        );

        let summary = loop_.run(&["https://example.test/a".to_string()]).await;
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(summary.errors, 0);
        assert!(index.total_docs() >= 2);
        assert_eq!(pagerank.stats().total_edges, 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_counted_not_fatal() {
        let mut settings = Settings::default();
        settings.crawl_delay = std::time::Duration::from_millis(0);

        let index = Arc::new(InvertedIndex::new());
        let pagerank = Arc::new(PageRank::new());
        let loop_ = CrawlerLoop::new(
            settings,
            Arc::new(FakeSharedCache::default()),
            Arc::new(FakeFetcher::new(HashMap::new())),
            Arc::new(NoRobots),
            index,
            pagerank,
        );

        let summary = loop_.run(&["https://example.test/missing".to_string()]).await;
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.pages_fetched, 0);
    }
}
