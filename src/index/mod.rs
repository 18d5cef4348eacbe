//! Inverted Index (spec §4.E): postings, document frequencies, document lengths.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::core::error::{CoreError, CoreResult};

const BLOB_VERSION: u32 = 1;

/// A single `(doc_id, term_frequency, positions)` entry in a term's posting list.
/// `zone_weight` is the spec §4.A zone-weighted sum for this term in this document; it
/// equals `term_frequency` (a no-op multiplier) unless the document was indexed with
/// [`InvertedIndex::add_weighted`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: String,
    pub term_frequency: usize,
    pub positions: Vec<usize>,
    pub zone_weight: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct IndexState {
    postings: HashMap<String, Vec<Posting>>,
    document_freq: HashMap<String, usize>,
    doc_lengths: HashMap<String, usize>,
    total_docs: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexStats {
    pub total_documents: usize,
    pub unique_terms: usize,
    pub total_postings: usize,
    pub average_doc_length: f64,
}

/// Term-document postings, guarded by a `std::sync::RwLock` since nothing here suspends
/// (spec §5). `add` calls are serialised by the write lock; readers see a consistent
/// snapshot, never a partial update.
pub struct InvertedIndex {
    state: RwLock<IndexState>,
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
        }
    }

    /// Adds a document's already-tokenised terms to the index, with every posting's
    /// `zone_weight` equal to its plain `term_frequency` (spec §4.A zone weights are a no-op
    /// unless the caller has zone information — see [`Self::add_weighted`]).
    pub fn add(&self, doc_id: &str, tokens: &[String]) {
        self.add_weighted(doc_id, tokens, &HashMap::new());
    }

    /// Adds a document's already-tokenised terms to the index, recording each term's
    /// spec §4.A zone-weighted sum alongside its plain term frequency. A term absent from
    /// `zone_weights` falls back to its term frequency (no zone boost). A `doc_id` already
    /// present is a silent no-op (spec §7) — in debug builds this also asserts the invariant
    /// that `doc_lengths` and `postings` agree on membership.
    pub fn add_weighted(&self, doc_id: &str, tokens: &[String], zone_weights: &HashMap<String, f64>) {
        let mut state = self.state.write().expect("index lock poisoned");
        if state.doc_lengths.contains_key(doc_id) {
            return;
        }
        debug_assert!(
            !state.postings.values().any(|list| list.iter().any(|p| p.doc_id == doc_id)),
            "doc_id {doc_id} present in postings but not doc_lengths"
        );

        // Defensive floor matching the Text Processor's own `min_term_length` contract: this
        // is a backstop against a caller bypassing that filter, not a second real filter.
        let mut term_positions: HashMap<&str, Vec<usize>> = HashMap::new();
        for (position, token) in tokens.iter().enumerate() {
            if token.len() < 2 {
                continue;
            }
            term_positions.entry(token.as_str()).or_default().push(position);
        }

        for (term, positions) in &term_positions {
            let zone_weight = zone_weights.get(*term).copied().unwrap_or(positions.len() as f64);
            let posting = Posting {
                doc_id: doc_id.to_string(),
                term_frequency: positions.len(),
                positions: positions.clone(),
                zone_weight,
            };
            state.postings.entry(term.to_string()).or_default().push(posting);
            *state.document_freq.entry(term.to_string()).or_insert(0) += 1;
        }

        state.doc_lengths.insert(doc_id.to_string(), tokens.len());
        state.total_docs += 1;
    }

    /// Posting lists for each of `terms`, in the same order; a term absent from the index
    /// maps to an empty list (spec §4.E).
    pub fn search(&self, terms: &[String]) -> Vec<(String, Vec<Posting>)> {
        let state = self.state.read().expect("index lock poisoned");
        terms
            .iter()
            .map(|term| (term.clone(), state.postings.get(term).cloned().unwrap_or_default()))
            .collect()
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.state
            .read()
            .expect("index lock poisoned")
            .document_freq
            .get(term)
            .copied()
            .unwrap_or(0)
    }

    pub fn term_frequency(&self, term: &str, doc_id: &str) -> usize {
        self.state
            .read()
            .expect("index lock poisoned")
            .postings
            .get(term)
            .and_then(|postings| postings.iter().find(|p| p.doc_id == doc_id))
            .map(|p| p.term_frequency)
            .unwrap_or(0)
    }

    /// The zone-weighted sum stored for `term` in `doc_id` (spec §4.A), or `0.0` if the term
    /// isn't present in that document.
    pub fn zone_weight(&self, term: &str, doc_id: &str) -> f64 {
        self.state
            .read()
            .expect("index lock poisoned")
            .postings
            .get(term)
            .and_then(|postings| postings.iter().find(|p| p.doc_id == doc_id))
            .map(|p| p.zone_weight)
            .unwrap_or(0.0)
    }

    pub fn document_length(&self, doc_id: &str) -> usize {
        self.state
            .read()
            .expect("index lock poisoned")
            .doc_lengths
            .get(doc_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_docs(&self) -> usize {
        self.state.read().expect("index lock poisoned").total_docs
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.read().expect("index lock poisoned");
        let total_postings = state.postings.values().map(Vec::len).sum();
        let average_doc_length = if state.doc_lengths.is_empty() {
            0.0
        } else {
            state.doc_lengths.values().sum::<usize>() as f64 / state.doc_lengths.len() as f64
        };
        IndexStats {
            total_documents: state.total_docs,
            unique_terms: state.postings.len(),
            total_postings,
            average_doc_length,
        }
    }

    /// Encodes the index as a fixed-width version header followed by a `bincode` body
    /// (spec §4.E "Persistence").
    pub fn serialize(&self) -> CoreResult<Vec<u8>> {
        let state = self.state.read().expect("index lock poisoned");
        let body = bincode::serialize(&*state).map_err(|e| CoreError::Serialisation(e.to_string()))?;
        let mut blob = BLOB_VERSION.to_le_bytes().to_vec();
        blob.extend(body);
        Ok(blob)
    }

    /// Decodes a blob produced by [`Self::serialize`]. A version mismatch or corrupt body
    /// is a `CoreError::Serialisation`, not a panic (spec §4.E, §7.5).
    pub fn deserialize(blob: &[u8]) -> CoreResult<Self> {
        if blob.len() < 4 {
            return Err(CoreError::Serialisation("blob too short for version header".into()));
        }
        let version = u32::from_le_bytes(blob[0..4].try_into().expect("checked length"));
        if version != BLOB_VERSION {
            return Err(CoreError::Serialisation(format!(
                "unsupported index blob version {version}, expected {BLOB_VERSION}"
            )));
        }
        let state: IndexState =
            bincode::deserialize(&blob[4..]).map_err(|e| CoreError::Serialisation(e.to_string()))?;
        Ok(Self {
            state: RwLock::new(state),
        })
    }
}
