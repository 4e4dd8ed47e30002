//! Two-level response cache: an in-process L1 with TTL + recency-ordered
//! LRU eviction, and an optional shared L2 behind the [`SharedCache`] trait.
//!
//! Cache faults (L2 unavailable, malformed entry) are never surfaced to the
//! caller: they degrade to a miss and are recorded in [`CacheMetrics`] only.

mod shared;

pub use shared::{HttpSharedCache, NullSharedCache, SharedCache};

use crate::types::SearchResponse;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

#[derive(Clone)]
struct Entry {
    response: SearchResponse,
    created_at_ms: u64,
    ttl_ms: u64,
    size_bytes: usize,
    last_read_ms: Arc<AtomicU64>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Entry {
    fn is_fresh(&self) -> bool {
        now_ms().saturating_sub(self.created_at_ms) < self.ttl_ms
    }
}

pub struct CacheConfig {
    pub l1_max_entries: usize,
    pub l1_default_ttl_ms: u64,
    pub l2_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            l1_max_entries: 10_000,
            l1_default_ttl_ms: 300_000,
            l2_enabled: false,
        }
    }
}

#[derive(Default)]
pub struct CacheMetrics {
    pub l1_hits: AtomicU64,
    pub l1_misses: AtomicU64,
    pub l2_hits: AtomicU64,
    pub l2_misses: AtomicU64,
    pub l2_faults: AtomicU64,
    pub inserts: AtomicU64,
    pub evictions: AtomicU64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let hits = (self.l1_hits.load(Ordering::Relaxed) + self.l2_hits.load(Ordering::Relaxed)) as f64;
        let misses = self.l2_misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total > 0.0 {
            hits / total * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub l1_entries: usize,
    pub l1_hits: u64,
    pub l1_misses: u64,
    pub l2_hits: u64,
    pub l2_misses: u64,
    pub l2_faults: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

/// Outcome of a `get`, distinguishing a fresh hit from the stale-but-present
/// entries the dispatcher's fallback path is permitted to reuse.
pub enum Lookup {
    Fresh(SearchResponse),
    Stale(SearchResponse),
    Miss,
}

pub struct ResponseCache {
    l1: Arc<DashMap<String, Entry>>,
    l2: Arc<dyn SharedCache>,
    config: CacheConfig,
    metrics: Arc<CacheMetrics>,
}

impl ResponseCache {
    pub fn new(config: CacheConfig, l2: Arc<dyn SharedCache>) -> Self {
        ResponseCache {
            l1: Arc::new(DashMap::with_capacity(config.l1_max_entries)),
            l2,
            config,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        self.metrics.clone()
    }

    /// Fresh-only lookup, used by the normal request path (handler §4.7
    /// step 4). Never returns an expired entry.
    pub async fn get(&self, key: &str) -> Option<SearchResponse> {
        if let Some(entry) = self.l1.get(key) {
            if entry.is_fresh() {
                entry.last_read_ms.store(now_ms(), Ordering::Relaxed);
                self.metrics.l1_hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.response.clone());
            }
        }
        // Expired or absent in L1: fall through to L2.
        if self.config.l2_enabled {
            match self.l2.get(key).await {
                Ok(Some(response)) => {
                    self.metrics.l2_hits.fetch_add(1, Ordering::Relaxed);
                    self.insert_l1(key, response.clone(), self.config.l1_default_ttl_ms);
                    return Some(response);
                }
                Ok(None) => {
                    self.metrics.l2_misses.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    warn!(error = %err, "l2 cache fault, treating as miss");
                    self.metrics.l2_faults.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        self.metrics.l1_misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Stale-tolerant lookup used only by the dispatcher's deadline fallback
    /// (tier 1 of the three-tier plan). Returns an L1 entry even past TTL.
    pub fn get_stale(&self, key: &str) -> Lookup {
        match self.l1.get(key) {
            Some(entry) if entry.is_fresh() => Lookup::Fresh(entry.response.clone()),
            Some(entry) => Lookup::Stale(entry.response.clone()),
            None => Lookup::Miss,
        }
    }

    pub async fn set(&self, key: &str, response: SearchResponse, ttl_ms: u64) {
        self.insert_l1(key, response.clone(), ttl_ms);
        self.metrics.inserts.fetch_add(1, Ordering::Relaxed);

        if self.config.l2_enabled {
            let ttl_seconds = (ttl_ms / 1000).max(1);
            if let Err(err) = self.l2.set(key, &response, ttl_seconds).await {
                warn!(error = %err, "l2 cache write failed, continuing with l1 only");
                self.metrics.l2_faults.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn insert_l1(&self, key: &str, response: SearchResponse, ttl_ms: u64) {
        let size_bytes = serde_json::to_vec(&response).map(|v| v.len()).unwrap_or(0);
        self.maybe_evict();
        self.l1.insert(
            key.to_string(),
            Entry {
                response,
                created_at_ms: now_ms(),
                ttl_ms,
                size_bytes,
                last_read_ms: Arc::new(AtomicU64::new(now_ms())),
            },
        );
    }

    /// LRU-by-recency eviction: once at capacity, drop the least-recently-read
    /// entry. A recency counter stands in for a true ordered LRU list, which
    /// is acceptable here since eviction is a capacity safety valve rather
    /// than an ordering contract (see DESIGN.md).
    fn maybe_evict(&self) {
        if self.l1.len() < self.config.l1_max_entries {
            return;
        }
        let victim = self
            .l1
            .iter()
            .map(|e| (e.key().clone(), e.value().last_read_ms.load(Ordering::Relaxed)))
            .min_by_key(|(_, last_read)| *last_read);

        if let Some((key, _)) = victim {
            self.l1.remove(&key);
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key, "evicted l1 cache entry");
        }
    }

    pub async fn delete(&self, key: &str) {
        self.l1.remove(key);
        if self.config.l2_enabled {
            let _ = self.l2.delete(key).await;
        }
    }

    pub fn clear(&self) {
        self.l1.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_entries: self.l1.len(),
            l1_hits: self.metrics.l1_hits.load(Ordering::Relaxed),
            l1_misses: self.metrics.l1_misses.load(Ordering::Relaxed),
            l2_hits: self.metrics.l2_hits.load(Ordering::Relaxed),
            l2_misses: self.metrics.l2_misses.load(Ordering::Relaxed),
            l2_faults: self.metrics.l2_faults.load(Ordering::Relaxed),
            evictions: self.metrics.evictions.load(Ordering::Relaxed),
            hit_rate: self.metrics.hit_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Page, Performance, Total, TotalRelation};

    fn sample_response() -> SearchResponse {
        SearchResponse {
            hits: vec![],
            total: Total {
                value: 0,
                relation: TotalRelation::Eq,
            },
            page: Page {
                size: 10,
                cursor: None,
                has_more: false,
            },
            facets: None,
            performance: Performance {
                took_ms: 1,
                engine: "simple".to_string(),
                cached: false,
                partial: false,
            },
            debug: None,
        }
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = ResponseCache::new(CacheConfig::default(), Arc::new(NullSharedCache));
        assert!(cache.get("search:acme:abc").await.is_none());
        cache.set("search:acme:abc", sample_response(), 60_000).await;
        assert!(cache.get("search:acme:abc").await.is_some());
    }

    #[tokio::test]
    async fn eviction_at_capacity() {
        let mut config = CacheConfig::default();
        config.l1_max_entries = 2;
        let cache = ResponseCache::new(config, Arc::new(NullSharedCache));
        cache.set("a", sample_response(), 60_000).await;
        cache.set("b", sample_response(), 60_000).await;
        cache.set("c", sample_response(), 60_000).await;
        assert_eq!(cache.stats().l1_entries, 2);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test]
    async fn stale_entry_available_to_fallback_but_not_normal_get() {
        let cache = ResponseCache::new(CacheConfig::default(), Arc::new(NullSharedCache));
        cache.set("k", sample_response(), 0).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(cache.get("k").await.is_none());
        match cache.get_stale("k") {
            Lookup::Stale(_) => {}
            _ => panic!("expected stale entry to remain readable by fallback path"),
        }
    }
}
