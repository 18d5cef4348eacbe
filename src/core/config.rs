use std::time::Duration;

/// Re-crawl cadence bucket, attached to a [`crate::core::types::Document`] and read by an
/// external scheduler; this crate does not itself decide when to re-crawl.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum RecrawlPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl RecrawlPriority {
    pub fn interval(self, settings: &Settings) -> Duration {
        match self {
            RecrawlPriority::High => settings.high_priority_interval,
            RecrawlPriority::Medium => settings.medium_priority_interval,
            RecrawlPriority::Low => settings.low_priority_interval,
        }
    }
}

/// The five weights the Search API surface (spec §6) composes `final_score` from.
/// Must sum to 1.0; [`RankingWeights::resolve`] normalises if an env override breaks that.
#[derive(Clone, Copy, Debug)]
pub struct RankingWeights {
    pub content_relevance: f64,
    pub pagerank: f64,
    pub freshness: f64,
    pub user_signals: f64,
    pub technical_seo: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            content_relevance: 0.4,
            pagerank: 0.25,
            freshness: 0.15,
            user_signals: 0.1,
            technical_seo: 0.1,
        }
    }
}

impl RankingWeights {
    fn resolve() -> Self {
        let mut w = Self {
            content_relevance: env_f64("CONTENT_RELEVANCE_WEIGHT", 0.4),
            pagerank: env_f64("PAGERANK_WEIGHT", 0.25),
            freshness: env_f64("FRESHNESS_WEIGHT", 0.15),
            user_signals: env_f64("USER_SIGNALS_WEIGHT", 0.1),
            technical_seo: env_f64("TECHNICAL_SEO_WEIGHT", 0.1),
        };
        let sum = w.content_relevance + w.pagerank + w.freshness + w.user_signals + w.technical_seo;
        if sum > 0.0 && (sum - 1.0).abs() > 1e-9 {
            tracing::warn!(sum, "ranking weights do not sum to 1.0, normalising");
            w.content_relevance /= sum;
            w.pagerank /= sum;
            w.freshness /= sum;
            w.user_signals /= sum;
            w.technical_seo /= sum;
        }
        w
    }
}

/// Every tunable named in spec §6, resolved once at process start: explicit value (if the
/// caller built one) falls back to an environment variable, which falls back to the
/// documented default. Mirrors the teacher crate's `ShadowConfig` resolution shape, but as a
/// single plain struct rather than an `Option`-field-per-key file format, since nothing here
/// needs a config *file*.
#[derive(Clone, Debug)]
pub struct Settings {
    pub crawl_delay: Duration,
    pub max_pages_per_domain: usize,
    pub user_agent: String,
    pub max_crawl_threads: usize,
    pub request_timeout: Duration,
    pub robots_timeout: Duration,
    pub index_batch_size: usize,
    pub min_term_length: usize,
    pub max_term_length: usize,
    pub max_results_per_page: usize,
    pub query_timeout: Duration,
    pub default_results_count: usize,
    pub ranking_weights: RankingWeights,
    pub high_priority_interval: Duration,
    pub medium_priority_interval: Duration,
    pub low_priority_interval: Duration,
    pub deletion_grace_period: Duration,
    pub recrawl_attempts: u32,
    pub near_duplicate_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            crawl_delay: Duration::from_secs_f64(env_f64("CRAWL_DELAY", 1.0)),
            max_pages_per_domain: env_usize("MAX_PAGES_PER_DOMAIN", 10_000),
            user_agent: std::env::var("USER_AGENT").unwrap_or_else(|_| "CustomSearchBot/1.0".to_string()),
            max_crawl_threads: env_usize("MAX_CRAWL_THREADS", 10),
            request_timeout: Duration::from_secs(env_u64("REQUEST_TIMEOUT", 30)),
            robots_timeout: Duration::from_secs(10),
            index_batch_size: env_usize("INDEX_BATCH_SIZE", 1000),
            min_term_length: env_usize("MIN_TERM_LENGTH", 2),
            max_term_length: env_usize("MAX_TERM_LENGTH", 100),
            max_results_per_page: env_usize("MAX_RESULTS_PER_PAGE", 10),
            query_timeout: Duration::from_secs_f64(env_f64("QUERY_TIMEOUT", 5.0)),
            default_results_count: env_usize("DEFAULT_RESULTS_COUNT", 20),
            ranking_weights: RankingWeights::resolve(),
            high_priority_interval: Duration::from_secs(60 * 60),
            medium_priority_interval: Duration::from_secs(60 * 60 * 24),
            low_priority_interval: Duration::from_secs(60 * 60 * 24 * 7),
            deletion_grace_period: Duration::from_secs(60 * 60 * 24 * 14),
            recrawl_attempts: env_u64("RECRAWL_ATTEMPTS", 3) as u32,
            near_duplicate_threshold: env_f64("NEAR_DUPLICATE_THRESHOLD", 0.85),
        }
    }
}

impl Settings {
    /// Load from the environment, falling back to defaults. Never fails — an unparsable
    /// env value is logged and the default is used, matching the teacher crate's
    /// `ShadowConfig::resolve_*` helpers.
    pub fn from_env() -> Self {
        Self::default()
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    match std::env::var(key) {
        Ok(v) => v.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %v, "unparsable float env var, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(v) => v.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %v, "unparsable integer env var, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env_u64(key, default as u64) as usize
}
