use search_core::core::config::Settings;
use search_core::core::error::CoreError;
use search_core::index::InvertedIndex;
use search_core::query::QueryParser;
use search_core::ranking::{TfIdfScorer, TfMethod};
use search_core::text::TextProcessor;

fn tokens(words: &[&str]) -> Vec<String> {
    words.iter().map(|s| s.to_string()).collect()
}

#[test]
fn tfidf_scenario_matches_documented_example() {
    let index = InvertedIndex::new();
    index.add("A", &tokens(&["cat", "sat", "mat"]));
    index.add("B", &tokens(&["cat", "cat", "hat"]));

    assert_eq!(index.document_frequency("cat"), 2);
    assert_eq!(index.document_frequency("mat"), 1);
    assert_eq!(index.total_docs(), 2);

    let scorer = TfIdfScorer::with_method(&index, TfMethod::LogNormalized);

    assert_eq!(scorer.score_document(&tokens(&["cat"]), "A"), 0.0);
    assert_eq!(scorer.score_document(&tokens(&["cat"]), "B"), 0.0);

    let score_a = scorer.score_document(&tokens(&["mat"]), "A");
    let score_b = scorer.score_document(&tokens(&["mat"]), "B");
    assert!((score_a - 2f64.ln()).abs() < 1e-9, "score_a={score_a}");
    assert_eq!(score_b, 0.0);

    let candidates = scorer.candidate_documents(&tokens(&["mat"]));
    let ranked = scorer.score_documents(&tokens(&["mat"]), &candidates);
    assert_eq!(ranked, vec![("A".to_string(), score_a)]);
}

#[test]
fn content_fingerprint_threshold_scenario() {
    use search_core::dedup::{fingerprint, jaccard};

    let base: Vec<&str> = vec![
        "rust", "is", "a", "systems", "programming", "language", "focused", "on", "safety",
        "speed", "and", "concurrency", "it", "prevents", "data", "races", "through", "its",
        "ownership", "model",
    ];

    let mut one_word_changed = base.clone();
    one_word_changed[19] = "design";
    let near_dup_text = one_word_changed.join(" ");
    let base_text = base.join(" ");

    let near_similarity = jaccard(&fingerprint(&base_text), &fingerprint(&near_dup_text));
    assert!(near_similarity > 0.85, "near_similarity={near_similarity}");

    let mut five_words_changed = base.clone();
    for idx in [1, 4, 8, 12, 16] {
        five_words_changed[idx] = "xyzzy";
    }
    let distinct_text = five_words_changed.join(" ");
    let distinct_similarity = jaccard(&fingerprint(&base_text), &fingerprint(&distinct_text));
    assert!(distinct_similarity <= 0.85, "distinct_similarity={distinct_similarity}");
}

#[test]
fn query_parsing_full_example() {
    let settings = Settings::default();
    let text_processor = TextProcessor::new(&settings);
    let parser = QueryParser::new(&text_processor);

    let plan = parser.parse(r#"What is the "best laptop" site:bestbuy.com under $1000"#);

    assert_eq!(plan.phrases, vec![tokens(&["best", "laptop"])]);
    assert_eq!(plan.filters.get("site"), Some(&"bestbuy.com".to_string()));
    // Quotes take priority over the wh-prefix in query-type classification, matching both
    // the stated extraction order and the original parser's own priority chain.
    assert_eq!(plan.query_type, search_core::query::QueryType::Phrase);
    assert_eq!(plan.intent, search_core::query::Intent::Informational);
}

#[test]
fn settings_env_var_overrides_default() {
    std::env::set_var("MAX_CRAWL_THREADS", "42");
    let settings = Settings::from_env();
    assert_eq!(settings.max_crawl_threads, 42);
    std::env::remove_var("MAX_CRAWL_THREADS");
}

#[test]
fn settings_falls_back_on_unparsable_env_var() {
    std::env::set_var("MAX_PAGES_PER_DOMAIN", "not-a-number");
    let settings = Settings::from_env();
    assert_eq!(settings.max_pages_per_domain, 10_000);
    std::env::remove_var("MAX_PAGES_PER_DOMAIN");
}

#[test]
fn core_error_taxonomy_variants_carry_a_message() {
    let errors = vec![
        CoreError::InvalidUrl("not a url".to_string()),
        CoreError::EmptyQuery,
        CoreError::CollaboratorTransient("timeout".to_string()),
        CoreError::CollaboratorPermanent("404".to_string()),
        CoreError::Serialisation("bad version".to_string()),
    ];
    for error in errors {
        assert!(!error.to_string().is_empty());
    }
}
