//! Collaborator seams (spec §6): the core depends on these traits, never on a concrete
//! network/cache/disk implementation, so it can be exercised without any of them.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::error::{CoreError, CoreResult};

/// A fetched HTTP response body, as much as the core needs to know about it.
#[derive(Clone, Debug)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
    pub final_url: String,
}

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> CoreResult<FetchedPage>;
}

#[async_trait]
pub trait RobotsOracle: Send + Sync {
    /// Whether `user_agent` may fetch `url`. Any failure to obtain/parse `robots.txt`
    /// defaults to `true` (spec §7 "conservative convenience choice").
    async fn can_fetch(&self, user_agent: &str, url: &str) -> bool;

    /// Host-specific crawl delay reported by `robots.txt`, if any.
    async fn crawl_delay(&self, url: &str) -> Option<Duration>;
}

/// Set-membership collaborator standing in for a shared/networked cache (spec §6:
/// `sadd`/`srem`/`sismember`/`delete` keyed by string).
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Inserts `member` into `set_name`; returns whether it was already present.
    async fn insert(&self, set_name: &str, member: &str) -> CoreResult<bool>;
    async fn contains(&self, set_name: &str, member: &str) -> CoreResult<bool>;
    /// Removes `member` from `set_name`; a no-op if it wasn't present.
    async fn remove(&self, set_name: &str, member: &str) -> CoreResult<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> CoreResult<()>;
    async fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>>;
}

/// `reqwest`-backed production [`HttpFetcher`].
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> CoreResult<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::CollaboratorTransient(e.to_string()))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::CollaboratorTransient(e.to_string()))?;
        Ok(FetchedPage {
            status,
            body,
            final_url,
        })
    }
}

/// Fetches and parses `/robots.txt` per host, caching the parsed rule set for the process
/// lifetime. Any fetch/parse failure defaults to "allowed" (spec §7).
pub struct ReqwestRobotsOracle {
    client: reqwest::Client,
    cache: Mutex<std::collections::HashMap<String, Arc<RobotsRules>>>,
}

#[derive(Debug, Default)]
struct RobotsRules {
    disallow: Vec<String>,
    crawl_delay: Option<Duration>,
}

impl ReqwestRobotsOracle {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            cache: Mutex::new(std::collections::HashMap::new()),
        })
    }

    async fn rules_for(&self, url: &str) -> Arc<RobotsRules> {
        let host = match url::Url::parse(url).ok().and_then(|u| u.host_str().map(String::from)) {
            Some(h) => h,
            None => return Arc::new(RobotsRules::default()),
        };
        {
            let cache = self.cache.lock().await;
            if let Some(rules) = cache.get(&host) {
                return rules.clone();
            }
        }
        let robots_url = format!("https://{host}/robots.txt");
        let rules = match self.client.get(&robots_url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => Arc::new(parse_robots_txt(&body)),
                Err(_) => Arc::new(RobotsRules::default()),
            },
            _ => Arc::new(RobotsRules::default()),
        };
        self.cache.lock().await.insert(host, rules.clone());
        rules
    }
}

fn parse_robots_txt(body: &str) -> RobotsRules {
    let mut disallow = Vec::new();
    let mut crawl_delay = None;
    let mut applies = false;
    for line in body.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        match key.as_str() {
            "user-agent" => applies = value == "*",
            "disallow" if applies && !value.is_empty() => disallow.push(value.to_string()),
            "crawl-delay" if applies => {
                if let Ok(secs) = value.parse::<f64>() {
                    crawl_delay = Some(Duration::from_secs_f64(secs));
                }
            }
            _ => {}
        }
    }
    RobotsRules {
        disallow,
        crawl_delay,
    }
}

#[async_trait]
impl RobotsOracle for ReqwestRobotsOracle {
    async fn can_fetch(&self, _user_agent: &str, url: &str) -> bool {
        let rules = self.rules_for(url).await;
        let path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        !rules.disallow.iter().any(|prefix| path.starts_with(prefix))
    }

    async fn crawl_delay(&self, url: &str) -> Option<Duration> {
        self.rules_for(url).await.crawl_delay
    }
}

/// Always-allow oracle, for standalone/test use where no network access is available.
pub struct NoRobots;

#[async_trait]
impl RobotsOracle for NoRobots {
    async fn can_fetch(&self, _user_agent: &str, _url: &str) -> bool {
        true
    }

    async fn crawl_delay(&self, _url: &str) -> Option<Duration> {
        None
    }
}

/// `moka`-backed in-process [`SharedCache`], standing in for a networked cache (spec §6).
pub struct MokaSharedCache {
    cache: moka::future::Cache<String, ()>,
}

impl MokaSharedCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: moka::future::Cache::new(max_capacity),
        }
    }

    fn key(set_name: &str, member: &str) -> String {
        format!("{set_name}\u{0}{member}")
    }
}

#[async_trait]
impl SharedCache for MokaSharedCache {
    async fn insert(&self, set_name: &str, member: &str) -> CoreResult<bool> {
        let key = Self::key(set_name, member);
        let already = self.cache.get(&key).await.is_some();
        self.cache.insert(key, ()).await;
        Ok(already)
    }

    async fn contains(&self, set_name: &str, member: &str) -> CoreResult<bool> {
        Ok(self.cache.get(&Self::key(set_name, member)).await.is_some())
    }

    async fn remove(&self, set_name: &str, member: &str) -> CoreResult<()> {
        self.cache.invalidate(&Self::key(set_name, member)).await;
        Ok(())
    }
}

/// Plain filesystem [`BlobStore`]: `key` becomes a file name under `root`.
pub struct FsBlobStore {
    root: std::path::PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> CoreResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CoreError::Serialisation(e.to_string()))?;
        tokio::fs::write(self.path_for(key), bytes)
            .await
            .map_err(|e| CoreError::Serialisation(e.to_string()))
    }

    async fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::Serialisation(e.to_string())),
        }
    }
}

/// In-memory fake [`SharedCache`], for tests.
#[derive(Default)]
pub struct FakeSharedCache {
    sets: Mutex<std::collections::HashMap<String, HashSet<String>>>,
}

#[async_trait]
impl SharedCache for FakeSharedCache {
    async fn insert(&self, set_name: &str, member: &str) -> CoreResult<bool> {
        let mut sets = self.sets.lock().await;
        let set = sets.entry(set_name.to_string()).or_default();
        Ok(!set.insert(member.to_string()))
    }

    async fn contains(&self, set_name: &str, member: &str) -> CoreResult<bool> {
        let sets = self.sets.lock().await;
        Ok(sets.get(set_name).is_some_and(|s| s.contains(member)))
    }

    async fn remove(&self, set_name: &str, member: &str) -> CoreResult<()> {
        let mut sets = self.sets.lock().await;
        if let Some(set) = sets.get_mut(set_name) {
            set.remove(member);
        }
        Ok(())
    }
}

/// In-memory fake [`HttpFetcher`], for tests: serves canned pages keyed by URL.
#[derive(Default)]
pub struct FakeFetcher {
    pages: std::collections::HashMap<String, String>,
}

impl FakeFetcher {
    pub fn new(pages: std::collections::HashMap<String, String>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl HttpFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> CoreResult<FetchedPage> {
        match self.pages.get(url) {
            Some(body) => Ok(FetchedPage {
                status: 200,
                body: body.clone(),
                final_url: url.to_string(),
            }),
            None => Err(CoreError::CollaboratorPermanent(format!("no fake page for {url}"))),
        }
    }
}

/// In-memory fake [`BlobStore`], for tests.
#[derive(Default)]
pub struct FakeBlobStore {
    blobs: Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> CoreResult<()> {
        self.blobs.lock().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.blobs.lock().await.get(key).cloned())
    }
}
