//! Weighted final-score composition (spec §6 "Search API surface").

use crate::core::config::RankingWeights;
use crate::index::InvertedIndex;
use crate::query::QueryPlan;
use crate::ranking::pagerank::PageRank;
use crate::ranking::tfidf::TfIdfScorer;

/// Per-document signal inputs a collaborator may supply beyond TF-IDF/PageRank; all
/// default to 0.0 so the core is usable standalone (spec §9).
#[derive(Clone, Copy, Debug, Default)]
pub struct ExternalSignals {
    pub freshness: f64,
    pub user_signals: f64,
    pub technical_seo: f64,
}

/// A single scored candidate, exposing every named sub-score for debuggability
/// (spec §9 Open Question resolution).
#[derive(Clone, Debug, PartialEq)]
pub struct RankedResult {
    pub doc_id: String,
    pub final_score: f64,
    pub tfidf_raw: f64,
    pub tfidf_norm: f64,
    pub pagerank_raw: f64,
    pub pagerank_norm: f64,
    pub freshness: f64,
    pub user_signals: f64,
    pub technical_seo: f64,
}

pub struct Ranker<'a> {
    index: &'a InvertedIndex,
    pagerank: &'a PageRank,
    weights: RankingWeights,
}

impl<'a> Ranker<'a> {
    pub fn new(index: &'a InvertedIndex, pagerank: &'a PageRank, weights: RankingWeights) -> Self {
        Self {
            index,
            pagerank,
            weights,
        }
    }

    /// Ranks candidates for `plan`, combining TF-IDF and PageRank (both min-max scaled to
    /// `[0,1]` over the candidate set) with any externally supplied signals, returning the
    /// top `top_n` by `final_score` (spec §6).
    pub fn rank(&self, plan: &QueryPlan, top_n: usize) -> Vec<RankedResult> {
        self.rank_with_signals(plan, top_n, |_| ExternalSignals::default())
    }

    pub fn rank_with_signals(
        &self,
        plan: &QueryPlan,
        top_n: usize,
        signals_for: impl Fn(&str) -> ExternalSignals,
    ) -> Vec<RankedResult> {
        if plan.processed_terms.is_empty() {
            return Vec::new();
        }

        let scorer = TfIdfScorer::new(self.index);
        let candidates = scorer.candidate_documents(&plan.processed_terms);
        if candidates.is_empty() {
            return Vec::new();
        }

        let tfidf_raw: Vec<(String, f64)> = candidates
            .iter()
            .map(|doc_id| (doc_id.clone(), scorer.score_document(&plan.processed_terms, doc_id)))
            .collect();
        let pagerank_raw: Vec<(String, f64)> = candidates
            .iter()
            .map(|doc_id| (doc_id.clone(), self.pagerank.score(doc_id)))
            .collect();

        let tfidf_range = min_max(tfidf_raw.iter().map(|(_, v)| *v));
        let pagerank_range = min_max(pagerank_raw.iter().map(|(_, v)| *v));

        let mut results: Vec<RankedResult> = candidates
            .into_iter()
            .enumerate()
            .map(|(i, doc_id)| {
                let tfidf_raw_v = tfidf_raw[i].1;
                let pagerank_raw_v = pagerank_raw[i].1;
                let tfidf_norm = normalize(tfidf_raw_v, tfidf_range);
                let pagerank_norm = normalize(pagerank_raw_v, pagerank_range);
                let signals = signals_for(&doc_id);

                let final_score = self.weights.content_relevance * tfidf_norm
                    + self.weights.pagerank * pagerank_norm
                    + self.weights.freshness * signals.freshness
                    + self.weights.user_signals * signals.user_signals
                    + self.weights.technical_seo * signals.technical_seo;

                RankedResult {
                    doc_id,
                    final_score,
                    tfidf_raw: tfidf_raw_v,
                    tfidf_norm,
                    pagerank_raw: pagerank_raw_v,
                    pagerank_norm,
                    freshness: signals.freshness,
                    user_signals: signals.user_signals,
                    technical_seo: signals.technical_seo,
                }
            })
            .collect();

        results.sort_by(|a, b| b.final_score.total_cmp(&a.final_score).then_with(|| a.doc_id.cmp(&b.doc_id)));
        results.truncate(top_n);
        results
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}

fn normalize(value: f64, (min, max): (f64, f64)) -> f64 {
    if !min.is_finite() || !max.is_finite() || (max - min).abs() < f64::EPSILON {
        return if max > 0.0 { 1.0 } else { 0.0 };
    }
    (value - min) / (max - min)
}
