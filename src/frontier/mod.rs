//! URL Frontier (spec §4.D): priority queue with per-host politeness.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;
use url::Url;

use crate::collaborators::SharedCache;
use crate::dedup::canonicalize;

const CRAWLED_SET_NAME: &str = "frontier_urls";

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    priority: u8,
    seq: u64,
    url: String,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.priority, self.seq, &self.url).cmp(&(other.priority, other.seq, &other.url))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

struct State {
    heap: BinaryHeap<Reverse<Entry>>,
    last_access: HashMap<String, Instant>,
    host_delay: HashMap<String, Duration>,
    crawled: HashSet<String>,
    next_seq: u64,
}

/// Priority queue of candidate URLs, ordered `(priority asc, enqueue_time asc, url asc)`,
/// gated by a per-host politeness delay (spec §4.D). Crosses suspension points in the
/// crawler loop, so its internal state lives behind a `tokio::sync::Mutex`.
pub struct Frontier {
    state: tokio::sync::Mutex<State>,
    default_delay: Duration,
    cache: Arc<dyn SharedCache>,
}

impl Frontier {
    pub fn new(default_delay: Duration, cache: Arc<dyn SharedCache>) -> Self {
        Self {
            state: tokio::sync::Mutex::new(State {
                heap: BinaryHeap::new(),
                last_access: HashMap::new(),
                host_delay: HashMap::new(),
                crawled: HashSet::new(),
                next_seq: 0,
            }),
            default_delay,
            cache,
        }
    }

    /// Write-through add to the crawled set: local set first, shared cache as backup so the
    /// set survives a process restart (spec §4.D). A cache error degrades to local-only with
    /// a warning, never fatal (spec §7).
    async fn mark_crawled(&self, state: &mut State, canonical: &str) {
        state.crawled.insert(canonical.to_string());
        if let Err(e) = self.cache.insert(CRAWLED_SET_NAME, canonical).await {
            warn!(error = %e, url = canonical, "shared cache unavailable, frontier degraded to local-only");
        }
    }

    /// True if `canonical` is already known crawled: local set first (fast path), shared
    /// cache otherwise so a restarted process doesn't re-enqueue it. A cache error degrades
    /// to local-only with a warning (spec §4.D "Failure").
    async fn is_crawled(&self, state: &State, canonical: &str) -> bool {
        if state.crawled.contains(canonical) {
            return true;
        }
        match self.cache.contains(CRAWLED_SET_NAME, canonical).await {
            Ok(seen) => seen,
            Err(e) => {
                warn!(error = %e, url = canonical, "shared cache unavailable, frontier degraded to local-only");
                false
            }
        }
    }

    /// Inserts `url` at `priority` if it hasn't already been crawled. Returns whether it was
    /// accepted. The URL is canonicalised first; every URL stored here is canonical (spec §3).
    pub async fn add(&self, url: &str, priority: u8) -> bool {
        let Some(canonical) = canonicalize(url) else {
            return false;
        };
        let mut state = self.state.lock().await;
        if self.is_crawled(&state, &canonical).await {
            return false;
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Reverse(Entry {
            priority,
            seq,
            url: canonical,
        }));
        true
    }

    /// Records a host-specific crawl delay reported by the robots collaborator, overriding
    /// the global default for that host (spec §4.D).
    pub async fn set_host_delay(&self, host: &str, delay: Duration) {
        self.state.lock().await.host_delay.insert(host.to_string(), delay);
    }

    /// Returns the next URL whose host is past its politeness delay, or `None` if the ready
    /// frontier is exhausted for now (spec §4.D).
    pub async fn next(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        let attempts = state.heap.len();
        let mut deferred = Vec::new();

        for _ in 0..attempts {
            let Reverse(entry) = state.heap.pop()?;
            let host = host_of(&entry.url);
            let delay = state
                .host_delay
                .get(&host)
                .copied()
                .unwrap_or(self.default_delay);
            let now = Instant::now();
            let ready = state
                .last_access
                .get(&host)
                .map_or(true, |&last| now.duration_since(last) >= delay);

            if ready {
                state.last_access.insert(host, now);
                self.mark_crawled(&mut state, &entry.url).await;
                for d in deferred {
                    state.heap.push(Reverse(d));
                }
                return Some(entry.url);
            }
            deferred.push(entry);
        }

        for d in deferred {
            state.heap.push(Reverse(d));
        }
        None
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.heap.is_empty()
    }

    pub async fn size(&self) -> usize {
        self.state.lock().await.heap.len()
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::FakeSharedCache;
    use crate::core::error::{CoreError, CoreResult};
    use async_trait::async_trait;

    fn frontier(delay: Duration) -> Frontier {
        Frontier::new(delay, Arc::new(FakeSharedCache::default()))
    }

    /// Always-failing [`SharedCache`], standing in for a cache outage.
    #[derive(Default)]
    struct UnavailableCache;

    #[async_trait]
    impl SharedCache for UnavailableCache {
        async fn insert(&self, _set_name: &str, _member: &str) -> CoreResult<bool> {
            Err(CoreError::CollaboratorTransient("cache unreachable".into()))
        }

        async fn contains(&self, _set_name: &str, _member: &str) -> CoreResult<bool> {
            Err(CoreError::CollaboratorTransient("cache unreachable".into()))
        }

        async fn remove(&self, _set_name: &str, _member: &str) -> CoreResult<()> {
            Err(CoreError::CollaboratorTransient("cache unreachable".into()))
        }
    }

    #[tokio::test]
    async fn add_rejects_already_crawled_urls() {
        let frontier = frontier(Duration::from_millis(0));
        assert!(frontier.add("https://example.com/a", 1).await);
        frontier.next().await;
        assert!(!frontier.add("https://example.com/a", 1).await);
    }

    #[tokio::test]
    async fn next_respects_priority_order() {
        let frontier = frontier(Duration::from_millis(0));
        frontier.add("https://example.com/low", 2).await;
        frontier.add("https://example.com/high", 1).await;
        assert_eq!(frontier.next().await, Some("https://example.com/high".to_string()));
        assert_eq!(frontier.next().await, Some("https://example.com/low".to_string()));
    }

    #[tokio::test]
    async fn next_defers_until_politeness_delay_elapses() {
        let frontier = frontier(Duration::from_secs(3600));
        frontier.add("https://example.com/a", 1).await;
        frontier.add("https://other.com/b", 1).await;
        let first = frontier.next().await.unwrap();
        assert!(first.contains("example.com") || first.contains("other.com"));
        let second = frontier.next().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(frontier.next().await, None);
    }

    #[tokio::test]
    async fn size_and_empty_report_queue_depth() {
        let frontier = frontier(Duration::from_millis(0));
        assert!(frontier.is_empty().await);
        frontier.add("https://example.com/a", 1).await;
        assert_eq!(frontier.size().await, 1);
        assert!(!frontier.is_empty().await);
    }

    #[tokio::test]
    async fn crawled_set_survives_via_shared_cache_after_local_state_is_dropped() {
        let cache = Arc::new(FakeSharedCache::default());
        let first_run = Frontier::new(Duration::from_millis(0), cache.clone());
        assert!(first_run.add("https://example.com/a", 1).await);
        first_run.next().await;

        let second_run = Frontier::new(Duration::from_millis(0), cache);
        assert!(!second_run.add("https://example.com/a", 1).await);
    }

    #[tokio::test]
    async fn cache_outage_degrades_frontier_to_local_only() {
        let frontier = Frontier::new(Duration::from_millis(0), Arc::new(UnavailableCache));
        assert!(frontier.add("https://example.com/a", 1).await);
        assert_eq!(frontier.next().await, Some("https://example.com/a".to_string()));
        assert!(!frontier.add("https://example.com/a", 1).await);
    }
}
