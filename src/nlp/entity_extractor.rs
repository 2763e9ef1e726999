// src/nlp/entity_extractor.rs
// Calls an external LLM with a fixed JSON schema to extract role/skills/
// seniority/location/remote/experience_years. Grounded in the teacher's
// `LlmProvider` async trait (llm/provider/mod.rs) and `cache/mod.rs`'s
// SHA-256 cache-key idiom.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::synonym_expander::normalize_pt_terms;
use crate::error::SearchResult;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EntityRecord {
    pub role: Option<String>,
    pub skills: Vec<String>,
    pub seniority: Option<String>,
    pub location: Option<String>,
    pub remote: Option<bool>,
    pub experience_years_min: Option<u32>,
    pub experience_years_max: Option<u32>,
}

impl EntityRecord {
    pub fn is_empty(&self) -> bool {
        self.role.is_none()
            && self.skills.is_empty()
            && self.seniority.is_none()
            && self.location.is_none()
            && self.remote.is_none()
            && self.experience_years_min.is_none()
            && self.experience_years_max.is_none()
    }
}

/// Narrow capability the orchestrator depends on; `LlmEntityExtractor` is the
/// concrete `reqwest`-backed implementation.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract_raw(&self, normalized_query: &str) -> SearchResult<EntityRecord>;
}

struct CacheEntry {
    key: String,
    value: EntityRecord,
    inserted_at: Instant,
}

struct ExtractionCache {
    entries: Vec<CacheEntry>,
    capacity: usize,
    ttl: Duration,
}

impl ExtractionCache {
    fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            ttl,
        }
    }

    fn get(&mut self, key: &str) -> Option<EntityRecord> {
        let now = Instant::now();
        self.entries.retain(|e| now.duration_since(e.inserted_at) < self.ttl);
        self.entries.iter().find(|e| e.key == key).map(|e| e.value.clone())
    }

    fn put(&mut self, key: String, value: EntityRecord) {
        if self.entries.len() >= self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(CacheEntry {
            key,
            value,
            inserted_at: Instant::now(),
        });
    }
}

/// Orchestrates timeout enforcement, SHA-256 caching, Portuguese-term
/// normalization, and the post-extraction hallucination filter around an
/// inner `EntityExtractor`.
pub struct CachedEntityExtractor<X: EntityExtractor> {
    inner: X,
    timeout: Duration,
    cache: Mutex<ExtractionCache>,
}

const CACHE_CAPACITY: usize = 1_000;
const CACHE_TTL: Duration = Duration::from_secs(300);

impl<X: EntityExtractor> CachedEntityExtractor<X> {
    pub fn new(inner: X, timeout_ms: u64) -> Self {
        Self {
            inner,
            timeout: Duration::from_millis(timeout_ms),
            cache: Mutex::new(ExtractionCache::new(CACHE_CAPACITY, CACHE_TTL)),
        }
    }

    /// On timeout, error, or schema-invalid response, returns an empty
    /// entity record rather than failing the caller.
    pub async fn extract(&self, query: &str) -> EntityRecord {
        let cache_key = cache_key_for(query);
        if let Some(cached) = self.cache.lock().get(&cache_key) {
            return cached;
        }

        let normalized = normalize_pt_terms(query);
        let result = tokio::time::timeout(self.timeout, self.inner.extract_raw(&normalized)).await;

        let record = match result {
            Ok(Ok(raw)) => apply_hallucination_filter(raw, query),
            Ok(Err(_)) | Err(_) => EntityRecord::default(),
        };

        self.cache.lock().put(cache_key, record.clone());
        record
    }
}

fn cache_key_for(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.to_lowercase().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Drops any extracted skill or location that does not appear as a
/// substring (case-insensitive) or normalized-token subset of the query.
fn apply_hallucination_filter(mut record: EntityRecord, original_query: &str) -> EntityRecord {
    let haystack = original_query.to_lowercase();
    let tokens: std::collections::HashSet<&str> = haystack.split_whitespace().collect();

    let grounded = |candidate: &str| -> bool {
        let candidate_lower = candidate.to_lowercase();
        if haystack.contains(&candidate_lower) {
            return true;
        }
        candidate_lower
            .split_whitespace()
            .all(|tok| tokens.contains(tok))
    };

    record.skills.retain(|s| grounded(s));
    if let Some(loc) = &record.location {
        if !grounded(loc) {
            record.location = None;
        }
    }

    record
}

/// Reference counts, used only for tests that assert single-flight dedup
/// behavior of the surrounding cache.
#[derive(Default)]
pub struct CallCounter(pub Mutex<HashMap<String, u32>>);

#[cfg(test)]
mod tests {
    use super::*;

    struct StubExtractor;

    #[async_trait]
    impl EntityExtractor for StubExtractor {
        async fn extract_raw(&self, normalized_query: &str) -> SearchResult<EntityRecord> {
            if normalized_query.contains("python") {
                Ok(EntityRecord {
                    role: Some("developer".into()),
                    skills: vec!["Python".into(), "Rust".into()],
                    seniority: Some("senior".into()),
                    location: Some("NYC".into()),
                    remote: None,
                    experience_years_min: Some(5),
                    experience_years_max: None,
                })
            } else {
                Ok(EntityRecord::default())
            }
        }
    }

    struct TimeoutExtractor;

    #[async_trait]
    impl EntityExtractor for TimeoutExtractor {
        async fn extract_raw(&self, _: &str) -> SearchResult<EntityRecord> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(EntityRecord::default())
        }
    }

    #[tokio::test]
    async fn hallucination_filter_drops_skill_not_in_query() {
        let extractor = CachedEntityExtractor::new(StubExtractor, 1_000);
        let result = extractor.extract("senior python developer in NYC").await;
        assert!(result.skills.contains(&"Python".to_string()));
        assert!(!result.skills.contains(&"Rust".to_string()));
    }

    #[tokio::test]
    async fn timeout_returns_empty_record() {
        let extractor = CachedEntityExtractor::new(TimeoutExtractor, 5);
        let result = extractor.extract("anything").await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn repeated_query_hits_cache() {
        let extractor = CachedEntityExtractor::new(StubExtractor, 1_000);
        let first = extractor.extract("senior PYTHON developer in NYC").await;
        let second = extractor.extract("Senior Python Developer In NYC").await;
        assert_eq!(first, second);
    }
}
