use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::config::RecrawlPriority;

/// A zone of a page's extracted text, each carrying its own ranking weight (spec §4.A).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Title,
    Headings,
    Meta,
    Body,
    Links,
}

impl Zone {
    pub const ALL: [Zone; 5] = [Zone::Title, Zone::Headings, Zone::Meta, Zone::Body, Zone::Links];

    /// Ranking-assist weight for this zone (spec §4.A).
    pub fn weight(self) -> f64 {
        match self {
            Zone::Title => 3.0,
            Zone::Headings => 2.0,
            Zone::Meta => 1.5,
            Zone::Body => 1.0,
            Zone::Links => 0.8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub anchor_text: String,
    pub title: String,
}

/// The Content Extractor's output contract (spec §4.B).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentRecord {
    pub title: String,
    pub meta_description: String,
    pub headings: Vec<Heading>,
    pub body_text: String,
    pub links_text: String,
    pub images: Vec<Image>,
    pub links: Vec<Link>,
    pub word_count: usize,
    pub language: String,
}

/// Per-zone normalised token streams, as produced by the Text Processor (spec §4.A) from a
/// [`ContentRecord`]. Position within a stream is its 0-based index.
pub type TokenStreams = HashMap<Zone, Vec<String>>;

/// A crawled, extracted, and tokenised page (spec §3 "Document"). Created on successful
/// crawl+extract, replaced wholesale (never edited in place) on re-crawl.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub canonical_url: String,
    pub fetched_at: DateTime<Utc>,
    pub language: String,
    pub content: ContentRecord,
    pub token_streams: TokenStreams,
    pub doc_length: usize,
    pub recrawl_attempts: u32,
    pub recrawl_priority: RecrawlPriority,
}

impl Document {
    /// Flattened token stream across all zones, in zone-declaration order, for indexing.
    /// This is the stream whose length becomes `doc_length` in the Inverted Index (spec §3).
    pub fn flattened_tokens(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.doc_length);
        for zone in Zone::ALL {
            if let Some(tokens) = self.token_streams.get(&zone) {
                out.extend(tokens.iter().cloned());
            }
        }
        out
    }
}
