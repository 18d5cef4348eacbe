pub mod combine;
pub mod pagerank;
pub mod tfidf;

pub use combine::{ExternalSignals, RankedResult, Ranker};
pub use pagerank::{PageRank, PageRankStats};
pub use tfidf::{TfIdfScorer, TfMethod};
