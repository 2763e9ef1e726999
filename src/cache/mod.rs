// src/cache/mod.rs
// Tenant-prefixed layered cache with TTL + jitter. Generalizes the teacher's
// single-purpose `LlmCache` (cache/mod.rs: TTL, LRU, stats) into four named
// layers sharing one backend trait. All operations degrade to no-op on
// backend errors — the cache is never authoritative.

mod backend;
#[cfg(feature = "redis-cache")]
mod redis_backend;

pub use backend::{CacheBackend, InProcessBackend};
#[cfg(feature = "redis-cache")]
pub use redis_backend::RedisBackend;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::config::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheLayer {
    SearchResponse,
    Embedding,
    RerankScore,
    SpecialtyLookup,
}

impl CacheLayer {
    fn as_str(&self) -> &'static str {
        match self {
            Self::SearchResponse => "search-response",
            Self::Embedding => "embedding",
            Self::RerankScore => "rerank-score",
            Self::SpecialtyLookup => "specialty-lookup",
        }
    }

    /// Volatile layers (query-result-shaped) get TTL jitter; static lookups do not.
    fn is_volatile(&self) -> bool {
        matches!(self, Self::SearchResponse | Self::Embedding)
    }
}

#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
}

pub struct LayeredCache {
    backend: Arc<dyn CacheBackend>,
    prefix: String,
    jitter_pct: f64,
    disabled: bool,
    search_ttl: Duration,
    embedding_ttl: Duration,
    rerank_ttl: Duration,
    specialty_ttl: Duration,
    stats: parking_lot::Mutex<CacheStats>,
}

impl LayeredCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self {
            backend,
            prefix: config.prefix.clone(),
            jitter_pct: config.jitter_pct,
            disabled: config.disabled,
            search_ttl: Duration::from_secs(config.search_ttl_secs.max(0) as u64),
            embedding_ttl: Duration::from_secs(config.embedding_ttl_secs.max(0) as u64),
            rerank_ttl: Duration::from_secs(config.rerank_ttl_secs.max(0) as u64),
            specialty_ttl: Duration::from_secs(config.specialty_ttl_secs.max(0) as u64),
            stats: parking_lot::Mutex::new(CacheStats::default()),
        }
    }

    fn key(&self, layer: CacheLayer, tenant_id: &str, identifier: &str) -> String {
        format!("{}:{}:{}:{}", self.prefix, layer.as_str(), tenant_id, identifier)
    }

    fn ttl_for(&self, layer: CacheLayer) -> Duration {
        match layer {
            CacheLayer::SearchResponse => self.search_ttl,
            CacheLayer::Embedding => self.embedding_ttl,
            CacheLayer::RerankScore => self.rerank_ttl,
            CacheLayer::SpecialtyLookup => self.specialty_ttl,
        }
    }

    fn jittered_ttl(&self, layer: CacheLayer) -> Duration {
        let base = self.ttl_for(layer);
        if !layer.is_volatile() || self.jitter_pct <= 0.0 {
            return base;
        }
        let mut rng = rand::thread_rng();
        let jitter: f64 = rng.gen_range(-self.jitter_pct..=self.jitter_pct);
        let seconds = (base.as_secs_f64() * (1.0 + jitter)).max(1.0);
        Duration::from_secs_f64(seconds)
    }

    pub async fn get(&self, layer: CacheLayer, tenant_id: &str, identifier: &str) -> Option<Vec<u8>> {
        if self.disabled {
            return None;
        }
        let key = self.key(layer, tenant_id, identifier);
        match self.backend.get(&key).await {
            Ok(Some(value)) => {
                self.stats.lock().hits += 1;
                Some(value)
            }
            Ok(None) => {
                self.stats.lock().misses += 1;
                None
            }
            Err(e) => {
                warn!(error = %e, "cache get failed, treating as miss");
                self.stats.lock().misses += 1;
                None
            }
        }
    }

    pub async fn set(&self, layer: CacheLayer, tenant_id: &str, identifier: &str, value: Vec<u8>) {
        if self.disabled {
            return;
        }
        let key = self.key(layer, tenant_id, identifier);
        let ttl = self.jittered_ttl(layer);
        if let Err(e) = self.backend.set(&key, value, ttl).await {
            warn!(error = %e, "cache set failed, ignoring");
            return;
        }
        self.stats.lock().sets += 1;
    }

    pub async fn delete(&self, layer: CacheLayer, tenant_id: &str, identifier: &str) {
        if self.disabled {
            return;
        }
        let key = self.key(layer, tenant_id, identifier);
        if self.backend.delete(&key).await.is_ok() {
            self.stats.lock().deletes += 1;
        }
    }

    /// Bounded pattern scan, used for tenant-layer invalidation.
    pub async fn invalidate_tenant_layer(&self, layer: CacheLayer, tenant_id: &str) {
        if self.disabled {
            return;
        }
        let pattern = format!("{}:{}:{}:*", self.prefix, layer.as_str(), tenant_id);
        match self.backend.scan(&pattern, 1_000).await {
            Ok(keys) => {
                for key in keys {
                    let _ = self.backend.delete(&key).await;
                }
            }
            Err(e) => warn!(error = %e, "cache scan failed during invalidation"),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tenant_scoped_keys_prevent_cross_tenant_hits() {
        let backend = Arc::new(InProcessBackend::new());
        let config = CacheConfig {
            disabled: false,
            redis_url: None,
            prefix: "hh".into(),
            search_ttl_secs: 600,
            embedding_ttl_secs: 3600,
            rerank_ttl_secs: 21_600,
            specialty_ttl_secs: 86_400,
            jitter_pct: 0.0,
        };
        let cache = LayeredCache::new(backend, &config);

        cache.set(CacheLayer::SearchResponse, "tenant-a", "q1", b"result-a".to_vec()).await;

        let hit = cache.get(CacheLayer::SearchResponse, "tenant-a", "q1").await;
        assert_eq!(hit, Some(b"result-a".to_vec()));

        let cross_tenant = cache.get(CacheLayer::SearchResponse, "tenant-b", "q1").await;
        assert_eq!(cross_tenant, None);
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let backend = Arc::new(InProcessBackend::new());
        let config = CacheConfig {
            disabled: true,
            redis_url: None,
            prefix: "hh".into(),
            search_ttl_secs: 600,
            embedding_ttl_secs: 3600,
            rerank_ttl_secs: 21_600,
            specialty_ttl_secs: 86_400,
            jitter_pct: 0.0,
        };
        let cache = LayeredCache::new(backend, &config);
        cache.set(CacheLayer::Embedding, "t1", "k1", b"v".to_vec()).await;
        assert_eq!(cache.get(CacheLayer::Embedding, "t1", "k1").await, None);
    }
}
