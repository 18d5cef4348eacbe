use std::sync::Arc;

use search_core::collaborators::{BlobStore, FsBlobStore, NoRobots, ReqwestFetcher};
use search_core::core::config::Settings;
use search_core::index::InvertedIndex;
use search_core::query::QueryParser;
use search_core::ranking::{PageRank, Ranker};
use search_core::text::TextProcessor;
use search_core::{CoreError, CrawlerLoop, SharedCache};
use tracing::{info, warn};

const INDEX_BLOB_KEY: &str = "index.bin";
const PAGERANK_BLOB_KEY: &str = "pagerank.bin";

/// Loads a prior run's index blob if present. A corrupt blob is a fatal invariant break
/// (spec §7): this binary is the one place that exits non-zero on it, matching the teacher
/// crate's own startup checklist failures, rather than the library silently recovering.
async fn load_index(store: &FsBlobStore) -> anyhow::Result<InvertedIndex> {
    match store.get(INDEX_BLOB_KEY).await? {
        Some(bytes) => match InvertedIndex::deserialize(&bytes) {
            Ok(index) => Ok(index),
            Err(CoreError::Serialisation(msg)) => {
                eprintln!("fatal: corrupt index blob at {INDEX_BLOB_KEY}: {msg}");
                std::process::exit(2);
            }
            Err(e) => Err(e.into()),
        },
        None => Ok(InvertedIndex::new()),
    }
}

async fn load_pagerank(store: &FsBlobStore) -> anyhow::Result<PageRank> {
    match store.get(PAGERANK_BLOB_KEY).await? {
        Some(bytes) => match PageRank::deserialize(&bytes) {
            Ok(pagerank) => Ok(pagerank),
            Err(CoreError::Serialisation(msg)) => {
                eprintln!("fatal: corrupt pagerank blob at {PAGERANK_BLOB_KEY}: {msg}");
                std::process::exit(2);
            }
            Err(e) => Err(e.into()),
        },
        None => Ok(PageRank::new()),
    }
}

struct NullCache;

#[async_trait::async_trait]
impl SharedCache for NullCache {
    async fn insert(&self, _set_name: &str, _member: &str) -> search_core::CoreResult<bool> {
        Ok(false)
    }

    async fn contains(&self, _set_name: &str, _member: &str) -> search_core::CoreResult<bool> {
        Ok(false)
    }

    async fn remove(&self, _set_name: &str, _member: &str) -> search_core::CoreResult<()> {
        Ok(())
    }
}

fn parse_args() -> (Vec<String>, String) {
    let mut args = std::env::args().skip(1).peekable();
    let mut seeds = Vec::new();
    let mut query = "search engine".to_string();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--query" => {
                if let Some(v) = args.next() {
                    query = v;
                }
            }
            url if url.starts_with("http") => seeds.push(url.to_string()),
            _ => {}
        }
    }
    if seeds.is_empty() {
        seeds.push("https://example.com".to_string());
    }
    (seeds, query)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let settings = Settings::from_env();
    let (seeds, query) = parse_args();
    info!(?seeds, %query, "starting demo crawl");

    let data_dir = std::env::var("SEARCH_CORE_DATA_DIR").unwrap_or_else(|_| "./search-core-data".to_string());
    let blob_store = FsBlobStore::new(data_dir);

    let fetcher = Arc::new(ReqwestFetcher::new(&settings.user_agent, settings.request_timeout)?);
    let robots = Arc::new(NoRobots);
    let cache = Arc::new(NullCache);
    let index = Arc::new(load_index(&blob_store).await?);
    let pagerank = Arc::new(load_pagerank(&blob_store).await?);

    let crawler = CrawlerLoop::new(
        settings.clone(),
        cache,
        fetcher,
        robots,
        index.clone(),
        pagerank.clone(),
    );

    let summary = crawler.run(&seeds).await;
    info!(
        pages_fetched = summary.pages_fetched,
        errors = summary.errors,
        duplicate_urls = summary.pages_rejected_duplicate_url,
        duplicate_content = summary.pages_rejected_duplicate_content,
        "crawl finished"
    );
    if summary.pages_fetched == 0 {
        warn!("no pages were indexed, query results will be empty");
    }

    pagerank.recompute();
    if let Err(e) = crawler.persist(&blob_store).await {
        warn!(error = %e, "failed to persist index/pagerank blobs");
    }

    let text_processor = TextProcessor::new(&settings);
    let parser = QueryParser::new(&text_processor);
    let plan = parser.parse(&query);

    // Scoring is synchronous and non-suspending (spec §5); QUERY_TIMEOUT is enforced at this
    // orchestration layer by running it on a blocking thread under a timeout, the way the
    // teacher crate wraps its own external calls rather than hand-rolling a deadline.
    let index_for_query = index.clone();
    let pagerank_for_query = pagerank.clone();
    let weights = settings.ranking_weights;
    let top_n = settings.default_results_count;
    let plan_for_query = plan.clone();
    let scoring = tokio::task::spawn_blocking(move || {
        let ranker = Ranker::new(&index_for_query, &pagerank_for_query, weights);
        ranker.rank(&plan_for_query, top_n)
    });
    let results = match tokio::time::timeout(settings.query_timeout, scoring).await {
        Ok(Ok(results)) => results,
        Ok(Err(e)) => {
            warn!(error = %e, "ranking task panicked");
            Vec::new()
        }
        Err(_) => {
            warn!(timeout = ?settings.query_timeout, "query scoring timed out");
            Vec::new()
        }
    };

    println!("query: {query}");
    println!("query_type: {:?}, intent: {:?}", plan.query_type, plan.intent);
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>2}. {} (score={:.4}, tfidf={:.4}, pagerank={:.4})",
            rank + 1,
            result.doc_id,
            result.final_score,
            result.tfidf_norm,
            result.pagerank_norm,
        );
    }

    Ok(())
}
