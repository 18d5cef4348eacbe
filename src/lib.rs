pub mod collaborators;
pub mod core;
pub mod crawler;
pub mod dedup;
pub mod extract;
pub mod frontier;
pub mod index;
pub mod query;
pub mod ranking;
pub mod text;

pub use collaborators::{BlobStore, FetchedPage, HttpFetcher, RobotsOracle, SharedCache};
pub use core::{CoreError, CoreResult, Settings};
pub use crawler::{CrawlSummary, CrawlerLoop};
pub use dedup::DuplicateDetector;
pub use frontier::Frontier;
pub use index::InvertedIndex;
pub use query::{QueryParser, QueryPlan};
pub use ranking::{Ranker, TfIdfScorer};
pub use text::TextProcessor;
