//! Duplicate Detector (spec §4.C): URL-level exact dedup plus content-level near-dup
//! detection via 5-word shingle fingerprints.

mod shingles;
mod url_canon;

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::collaborators::SharedCache;
use crate::core::error::{CoreError, CoreResult};
use shingles::Fingerprint;

pub use shingles::{fingerprint, jaccard};
pub use url_canon::canonicalize;

const URL_SET_NAME: &str = "seen_urls";

pub struct DuplicateDetector {
    cache: Arc<dyn SharedCache>,
    local_urls: tokio::sync::Mutex<std::collections::HashSet<String>>,
    fingerprints: std::sync::Mutex<Vec<Fingerprint>>,
    near_duplicate_threshold: f64,
}

impl DuplicateDetector {
    pub fn new(cache: Arc<dyn SharedCache>, near_duplicate_threshold: f64) -> Self {
        Self {
            cache,
            local_urls: tokio::sync::Mutex::new(std::collections::HashSet::new()),
            fingerprints: std::sync::Mutex::new(Vec::new()),
            near_duplicate_threshold,
        }
    }

    /// Checks the shared cache first, then the local set; inserts into both on miss.
    /// Idempotent and monotonic for the lifetime of the process (spec §4.C). A shared-cache
    /// failure degrades to local-only dedup with a warning rather than bubbling up (spec §4.D
    /// "Failure", §7): a locally-seen URL must still be reported as a duplicate during a
    /// cache blip.
    pub async fn is_duplicate_url(&self, url: &str) -> CoreResult<bool> {
        let canonical = canonicalize(url).ok_or_else(|| CoreError::InvalidUrl(url.to_string()))?;
        let hash = hash_string(&canonical);

        match self.cache.contains(URL_SET_NAME, &hash).await {
            Ok(true) => return Ok(true),
            Ok(false) => {
                let mut local = self.local_urls.lock().await;
                if local.contains(&hash) {
                    return Ok(true);
                }
                local.insert(hash.clone());
            }
            Err(e) => {
                warn!(error = %e, %url, "shared cache unavailable, duplicate detector degraded to local-only");
                let mut local = self.local_urls.lock().await;
                if local.contains(&hash) {
                    return Ok(true);
                }
                local.insert(hash.clone());
                return Ok(false);
            }
        }

        if let Err(e) = self.cache.insert(URL_SET_NAME, &hash).await {
            warn!(error = %e, %url, "shared cache unavailable, duplicate detector degraded to local-only");
        }
        Ok(false)
    }

    /// Fingerprints `clean_text` and compares it against every retained fingerprint by
    /// Jaccard similarity; reports duplicate if any exceeds the threshold, otherwise retains
    /// the new fingerprint (spec §4.C). Non-suspending: held under a plain `std::sync::Mutex`.
    pub fn is_duplicate_content(&self, clean_text: &str) -> bool {
        let new_fp = fingerprint(clean_text);
        let mut seen = self.fingerprints.lock().expect("fingerprint lock poisoned");
        for existing in seen.iter() {
            if jaccard(&new_fp, existing) > self.near_duplicate_threshold {
                return true;
            }
        }
        seen.push(new_fp);
        false
    }

    pub fn clear_local_cache(&mut self) {
        self.fingerprints.lock().expect("fingerprint lock poisoned").clear();
        self.local_urls.get_mut().clear();
    }
}

fn hash_string(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::FakeSharedCache;
    use async_trait::async_trait;

    fn detector() -> DuplicateDetector {
        DuplicateDetector::new(Arc::new(FakeSharedCache::default()), 0.85)
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
    async fn url_dedup_is_idempotent() {
        let d = detector();
        assert!(!d.is_duplicate_url("https://example.com/page").await.unwrap());
        assert!(d.is_duplicate_url("https://example.com/page").await.unwrap());
    }

    #[tokio::test]
    async fn cache_outage_degrades_to_local_only_dedup() {
        let d = DuplicateDetector::new(Arc::new(UnavailableCache), 0.85);
        assert!(!d.is_duplicate_url("https://example.com/page").await.unwrap());
        assert!(d.is_duplicate_url("https://example.com/page").await.unwrap());
    }

    #[tokio::test]
    async fn url_dedup_ignores_tracking_params() {
        let d = detector();
        assert!(!d.is_duplicate_url("https://example.com/page?utm_source=x").await.unwrap());
        assert!(d.is_duplicate_url("https://example.com/page").await.unwrap());
    }

    #[test]
    fn content_dedup_flags_near_identical_text() {
        let d = detector();
        let text = "the quick brown fox jumps over the lazy dog again and again";
        assert!(!d.is_duplicate_content(text));
        assert!(d.is_duplicate_content(text));
    }

    #[test]
    fn content_dedup_keeps_distinct_text() {
        let d = detector();
        assert!(!d.is_duplicate_content("alpha beta gamma delta epsilon zeta"));
        assert!(!d.is_duplicate_content("completely unrelated sentence about rust programming"));
    }
}
