//! TF-IDF Scorer (spec §4.F).

use std::collections::HashSet;

use crate::index::InvertedIndex;

/// Term-frequency weighting variants (spec §4.F).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TfMethod {
    Raw,
    LogNormalized,
    DoubleNormalized,
}

pub struct TfIdfScorer<'a> {
    index: &'a InvertedIndex,
    tf_method: TfMethod,
}

impl<'a> TfIdfScorer<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self {
            index,
            tf_method: TfMethod::LogNormalized,
        }
    }

    pub fn with_method(index: &'a InvertedIndex, tf_method: TfMethod) -> Self {
        Self { index, tf_method }
    }

    fn term_frequency_score(&self, term_freq: usize, doc_length: usize) -> f64 {
        match self.tf_method {
            TfMethod::Raw => term_freq as f64,
            TfMethod::LogNormalized => {
                if term_freq > 0 {
                    1.0 + (term_freq as f64).ln()
                } else {
                    0.0
                }
            }
            TfMethod::DoubleNormalized => {
                if doc_length > 0 {
                    0.5 + 0.5 * term_freq as f64 / doc_length as f64
                } else {
                    0.0
                }
            }
        }
    }

    /// `idf = ln(total_docs / doc_freq)`; 0 for a term absent from the index.
    pub fn idf(&self, term: &str) -> f64 {
        let doc_freq = self.index.document_frequency(term);
        if doc_freq == 0 {
            return 0.0;
        }
        (self.index.total_docs() as f64 / doc_freq as f64).ln()
    }

    pub fn tfidf(&self, term: &str, doc_id: &str) -> f64 {
        let tf = self.index.term_frequency(term, doc_id);
        if tf == 0 {
            return 0.0;
        }
        let doc_length = self.index.document_length(doc_id);
        self.term_frequency_score(tf, doc_length) * self.idf(term) * self.zone_weight_factor(term, doc_id, tf)
    }

    /// Average per-occurrence zone weight for `term` in `doc_id` (spec §4.A): 1.0 when the
    /// document was indexed without zone information, since `zone_weight` then equals `tf`.
    fn zone_weight_factor(&self, term: &str, doc_id: &str, tf: usize) -> f64 {
        if tf == 0 {
            return 1.0;
        }
        self.index.zone_weight(term, doc_id) / tf as f64
    }

    /// Mean TF-IDF across `query_terms` for one document, normalised by query length
    /// (spec §4.F).
    pub fn score_document(&self, query_terms: &[String], doc_id: &str) -> f64 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let total: f64 = query_terms.iter().map(|term| self.tfidf(term, doc_id)).sum();
        total / query_terms.len() as f64
    }

    /// Scores every candidate document, dropping zero scores, sorted descending, ties broken
    /// by ascending `doc_id` (spec §4.F "Output").
    pub fn score_documents(&self, query_terms: &[String], candidate_docs: &[String]) -> Vec<(String, f64)> {
        let mut scored: Vec<(String, f64)> = candidate_docs
            .iter()
            .map(|doc_id| (doc_id.clone(), self.score_document(query_terms, doc_id)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored
    }

    /// Every document containing at least one of `query_terms` (spec §4.F), in ascending
    /// `doc_id` order for deterministic downstream iteration.
    pub fn candidate_documents(&self, query_terms: &[String]) -> Vec<String> {
        let mut candidates: HashSet<String> = HashSet::new();
        for (_, postings) in self.index.search(query_terms) {
            for posting in postings {
                candidates.insert(posting.doc_id);
            }
        }
        let mut candidates: Vec<String> = candidates.into_iter().collect();
        candidates.sort();
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_index() -> InvertedIndex {
        let index = InvertedIndex::new();
        index.add(
            "doc1",
            &["rust".into(), "search".into(), "engine".into(), "rust".into()],
        );
        index.add("doc2", &["python".into(), "search".into(), "tool".into()]);
        index
    }

    #[test]
    fn idf_is_zero_for_unknown_term() {
        let index = build_index();
        let scorer = TfIdfScorer::new(&index);
        assert_eq!(scorer.idf("nonexistent"), 0.0);
    }

    #[test]
    fn tfidf_favours_document_with_more_term_occurrences() {
        let index = build_index();
        let scorer = TfIdfScorer::new(&index);
        let rust_score = scorer.tfidf("rust", "doc1");
        assert!(rust_score > 0.0);
        assert_eq!(scorer.tfidf("rust", "doc2"), 0.0);
    }

    #[test]
    fn score_document_normalizes_by_query_length() {
        let index = build_index();
        let scorer = TfIdfScorer::new(&index);
        let score = scorer.score_document(&["rust".to_string(), "search".to_string()], "doc1");
        assert!(score > 0.0);
        assert_eq!(scorer.score_document(&[], "doc1"), 0.0);
    }

    #[test]
    fn candidate_documents_includes_any_matching_term() {
        let index = build_index();
        let scorer = TfIdfScorer::new(&index);
        let mut candidates = scorer.candidate_documents(&["search".to_string()]);
        candidates.sort();
        assert_eq!(candidates, vec!["doc1".to_string(), "doc2".to_string()]);
    }

    #[test]
    fn tied_scores_break_ascending_by_doc_id() {
        let index = InvertedIndex::new();
        index.add("zebra", &["rust".into()]);
        index.add("apple", &["rust".into()]);
        let scorer = TfIdfScorer::new(&index);
        let scored = scorer.score_documents(
            &["rust".to_string()],
            &["zebra".to_string(), "apple".to_string()],
        );
        assert_eq!(scored[0].0, "apple");
        assert_eq!(scored[1].0, "zebra");
    }

    #[test]
    fn zone_weighted_occurrence_outscores_plain_occurrence() {
        let index = InvertedIndex::new();
        let mut title_weight = std::collections::HashMap::new();
        title_weight.insert("rust".to_string(), 3.0);
        index.add_weighted("titled", &["rust".into()], &title_weight);
        index.add("plain", &["rust".into()]);

        let scorer = TfIdfScorer::new(&index);
        assert!(scorer.tfidf("rust", "titled") > scorer.tfidf("rust", "plain"));
    }

    #[test]
    fn score_documents_sorts_descending_and_drops_zeros() {
        let index = build_index();
        let scorer = TfIdfScorer::new(&index);
        let scored = scorer.score_documents(
            &["rust".to_string()],
            &["doc1".to_string(), "doc2".to_string()],
        );
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].0, "doc1");
    }
}
