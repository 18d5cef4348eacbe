//! Query Parser (spec §4.H): phrase/operator/filter extraction, query classification, and
//! auxiliary query-assist operations.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::text::TextProcessor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryType {
    Boolean,
    Phrase,
    Filtered,
    Question,
    Simple,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Navigational,
    Transactional,
    Informational,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryPlan {
    pub original_query: String,
    pub processed_terms: Vec<String>,
    pub phrases: Vec<Vec<String>>,
    pub operators: Vec<String>,
    pub filters: HashMap<String, String>,
    pub query_type: QueryType,
    pub intent: Intent,
}

fn phrase_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]*)""#).expect("static pattern"))
}

fn operator_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(AND|OR|NOT)\b").expect("static pattern"))
}

fn site_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)site:(\S+)").expect("static pattern"))
}

fn filetype_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)filetype:(\S+)").expect("static pattern"))
}

const DATE_PATTERNS: &[(&str, &str)] = &[
    (r"(?i)\b(today|yesterday)\b", "last_day"),
    (r"(?i)\blast week\b", "last_week"),
    (r"(?i)\blast month\b", "last_month"),
    (r"(?i)\blast year\b", "last_year"),
];

const NAVIGATIONAL_PATTERNS: &[&str] = &[
    r"(?i)\b(facebook|twitter|instagram|youtube|amazon|google)\b",
    r"(?i)\b(login|sign in|homepage|official site)\b",
];

const TRANSACTIONAL_PATTERNS: &[&str] = &[
    r"(?i)\b(buy|purchase|order|price|cost|cheap|discount|deal)\b",
    r"(?i)\b(download|install|get|free)\b",
];

const WH_PREFIXES: &[&str] = &["what", "how", "when", "where", "why", "who"];

const SYNONYMS: &[(&str, &[&str])] = &[
    ("car", &["vehicle", "automobile", "auto"]),
    ("house", &["home", "residence", "property"]),
    ("job", &["work", "employment", "career"]),
    ("phone", &["mobile", "smartphone", "cell"]),
];

const SPELLING_CORRECTIONS: &[(&str, &str)] = &[
    ("teh", "the"),
    ("adn", "and"),
    ("recieve", "receive"),
    ("seperate", "separate"),
    ("definately", "definitely"),
];

const POPULAR_QUERIES: &[&str] = &[
    "python programming",
    "machine learning",
    "web development",
    "data science",
    "artificial intelligence",
    "software engineering",
];

pub struct QueryParser<'a> {
    text_processor: &'a TextProcessor,
}

impl<'a> QueryParser<'a> {
    pub fn new(text_processor: &'a TextProcessor) -> Self {
        Self { text_processor }
    }

    pub fn parse(&self, raw_query: &str) -> QueryPlan {
        let query_type = detect_query_type(raw_query);
        let intent = detect_intent(raw_query);
        let filters = extract_filters(raw_query);

        let (phrase_texts, residue) = extract_phrases(raw_query);
        let (operators, residue) = extract_operators(&residue);

        let phrases = phrase_texts
            .iter()
            .map(|p| self.text_processor.process(p))
            .collect();
        let processed_terms = self.text_processor.process(&residue);

        QueryPlan {
            original_query: raw_query.to_string(),
            processed_terms,
            phrases,
            operators,
            filters,
            query_type,
            intent,
        }
    }

    /// Appends a static synonym table's entries for each processed term (spec §4.H).
    pub fn expand(&self, plan: &QueryPlan) -> Vec<String> {
        let mut expanded = plan.processed_terms.clone();
        for term in &plan.processed_terms {
            if let Some((_, syns)) = SYNONYMS.iter().find(|(t, _)| *t == term) {
                expanded.extend(syns.iter().map(|s| s.to_string()));
            }
        }
        expanded
    }
}

/// Rewrites a fixed list of common misspellings, word-bounded and case-insensitive.
pub fn correct_spelling(query: &str) -> String {
    let mut corrected = query.to_string();
    for (mistake, correction) in SPELLING_CORRECTIONS {
        let pattern = Regex::new(&format!(r"(?i)\b{mistake}\b")).expect("valid pattern");
        corrected = pattern.replace_all(&corrected, *correction).into_owned();
    }
    corrected
}

/// Up to 5 suggestions from a static popular-queries list, matched by lowercase prefix.
pub fn suggest(prefix: &str) -> Vec<String> {
    let prefix_lower = prefix.to_lowercase();
    POPULAR_QUERIES
        .iter()
        .filter(|q| q.starts_with(&prefix_lower))
        .take(5)
        .map(|s| s.to_string())
        .collect()
}

fn extract_phrases(query: &str) -> (Vec<String>, String) {
    let mut phrases = Vec::new();
    let mut residue = query.to_string();
    for caps in phrase_pattern().captures_iter(query) {
        let phrase = caps[1].trim().to_string();
        if !phrase.is_empty() {
            phrases.push(phrase);
        }
        residue = residue.replace(&caps[0], " ");
    }
    (phrases, residue.trim().to_string())
}

fn extract_operators(query: &str) -> (Vec<String>, String) {
    let mut operators = Vec::new();
    let mut residue = query.to_string();
    for caps in operator_pattern().captures_iter(query) {
        operators.push(caps[1].to_uppercase());
        residue = residue.replace(&caps[0], " ");
    }
    (operators, residue.trim().to_string())
}

fn extract_filters(query: &str) -> HashMap<String, String> {
    let mut filters = HashMap::new();
    if let Some(caps) = site_pattern().captures(query) {
        filters.insert("site".to_string(), caps[1].to_string());
    }
    if let Some(caps) = filetype_pattern().captures(query) {
        filters.insert("filetype".to_string(), caps[1].to_string());
    }
    for (pattern, period) in DATE_PATTERNS {
        if Regex::new(pattern).expect("valid pattern").is_match(query) {
            filters.insert("date".to_string(), period.to_string());
            break;
        }
    }
    filters
}

fn detect_query_type(query: &str) -> QueryType {
    let lower = query.to_lowercase();
    if ["and", "or", "not"].iter().any(|op| lower.contains(op)) {
        QueryType::Boolean
    } else if query.contains('"') {
        QueryType::Phrase
    } else if lower.starts_with("site:") || lower.contains("filetype:") {
        QueryType::Filtered
    } else if query.ends_with('?') || WH_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        QueryType::Question
    } else {
        QueryType::Simple
    }
}

fn detect_intent(query: &str) -> Intent {
    let lower = query.to_lowercase();
    if NAVIGATIONAL_PATTERNS
        .iter()
        .any(|p| Regex::new(p).expect("valid pattern").is_match(&lower))
    {
        return Intent::Navigational;
    }
    if TRANSACTIONAL_PATTERNS
        .iter()
        .any(|p| Regex::new(p).expect("valid pattern").is_match(&lower))
    {
        return Intent::Transactional;
    }
    Intent::Informational
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;

    fn parser_with<'a>(tp: &'a TextProcessor) -> QueryParser<'a> {
        QueryParser::new(tp)
    }

    #[test]
    fn detects_boolean_query_type() {
        let tp = TextProcessor::new(&Settings::default());
        let plan = parser_with(&tp).parse("rust AND search");
        assert_eq!(plan.query_type, QueryType::Boolean);
        assert_eq!(plan.operators, vec!["AND".to_string()]);
    }

    #[test]
    fn extracts_phrase_and_type() {
        let tp = TextProcessor::new(&Settings::default());
        let plan = parser_with(&tp).parse(r#""rust search engine""#);
        assert_eq!(plan.query_type, QueryType::Phrase);
        assert_eq!(plan.phrases.len(), 1);
    }

    #[test]
    fn extracts_site_and_filetype_filters() {
        let tp = TextProcessor::new(&Settings::default());
        let plan = parser_with(&tp).parse("site:example.com filetype:pdf rust");
        assert_eq!(plan.filters.get("site"), Some(&"example.com".to_string()));
        assert_eq!(plan.filters.get("filetype"), Some(&"pdf".to_string()));
        assert_eq!(plan.query_type, QueryType::Filtered);
    }

    #[test]
    fn detects_question_type_and_informational_intent() {
        let tp = TextProcessor::new(&Settings::default());
        let plan = parser_with(&tp).parse("how do search engines work?");
        assert_eq!(plan.query_type, QueryType::Question);
        assert_eq!(plan.intent, Intent::Informational);
    }

    #[test]
    fn detects_transactional_intent() {
        let tp = TextProcessor::new(&Settings::default());
        let plan = parser_with(&tp).parse("buy cheap laptop");
        assert_eq!(plan.intent, Intent::Transactional);
    }

    #[test]
    fn extracts_date_filter() {
        let tp = TextProcessor::new(&Settings::default());
        let plan = parser_with(&tp).parse("news from last week");
        assert_eq!(plan.filters.get("date"), Some(&"last_week".to_string()));
    }

    #[test]
    fn expand_appends_synonyms() {
        let tp = TextProcessor::new(&Settings::default());
        let plan = parser_with(&tp).parse("car insurance");
        let expanded = parser_with(&tp).expand(&plan);
        assert!(expanded.iter().any(|t| t == "vehicl" || t == "vehicle"));
    }

    #[test]
    fn correct_spelling_fixes_common_mistakes() {
        assert_eq!(correct_spelling("I recieve teh package"), "I receive the package");
    }

    #[test]
    fn suggest_returns_prefix_matches_capped_at_five() {
        let results = suggest("p");
        assert!(results.contains(&"python programming".to_string()));
        assert!(results.len() <= 5);
    }
}
