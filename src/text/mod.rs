//! Text Processor (spec §4.A): cleans, tokenises, stems and zone-weights page text.

mod stopwords;

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use crate::core::config::Settings;
use crate::core::types::{ContentRecord, TokenStreams, Zone};

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("static pattern"))
}

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("static pattern")
    })
}

fn whitespace_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

/// Cleans, tokenises and stems raw page text into normalised terms, using the same settings
/// (`min_term_length`, `max_term_length`) and stop-word policy everywhere in the crate.
pub struct TextProcessor {
    stemmer: Stemmer,
    min_term_length: usize,
    max_term_length: usize,
}

impl TextProcessor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            min_term_length: settings.min_term_length,
            max_term_length: settings.max_term_length,
        }
    }

    /// Full pipeline: lowercase, strip URLs/emails, tokenise on whitespace/punctuation, drop
    /// stop words and out-of-range tokens, stem what remains.
    pub fn process(&self, text: &str) -> Vec<String> {
        let cleaned = self.clean(text);
        self.tokenize(&cleaned)
            .into_iter()
            .filter_map(|tok| self.process_token(&tok))
            .collect()
    }

    fn clean(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let no_urls = url_pattern().replace_all(&lowered, " ");
        let no_emails = email_pattern().replace_all(&no_urls, " ");
        whitespace_pattern()
            .replace_all(&no_emails, " ")
            .trim()
            .to_string()
    }

    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn process_token(&self, token: &str) -> Option<String> {
        if token.len() < self.min_term_length || token.len() > self.max_term_length {
            return None;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if stopwords::is_stop_word(token) {
            return None;
        }
        Some(self.stemmer.stem(token).into_owned())
    }

    /// Processes each zone of a [`ContentRecord`] independently, producing the per-zone
    /// token streams a [`crate::core::types::Document`] carries (spec §4.A "features").
    pub fn features(&self, content: &ContentRecord) -> TokenStreams {
        let mut streams = TokenStreams::new();
        streams.insert(Zone::Title, self.process(&content.title));
        let headings_text = content
            .headings
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        streams.insert(Zone::Headings, self.process(&headings_text));
        streams.insert(Zone::Meta, self.process(&content.meta_description));
        streams.insert(Zone::Body, self.process(&content.body_text));
        streams.insert(Zone::Links, self.process(&content.links_text));
        streams
    }
}

/// Flat `term -> weight` map for ranking assistance (spec §4.A "zone weights"): sum over
/// zones of (zone weight × count of term in that zone).
pub fn term_weights(streams: &TokenStreams) -> HashMap<String, f64> {
    let mut weights: HashMap<String, f64> = HashMap::new();
    for zone in Zone::ALL {
        if let Some(tokens) = streams.get(&zone) {
            let zone_weight = zone.weight();
            for token in tokens {
                *weights.entry(token.clone()).or_insert(0.0) += zone_weight;
            }
        }
    }
    weights
}
