// src/cache/backend.rs
// `CacheBackend` trait plus the default in-process implementation.
// Grounded in `backend/src/cache/mod.rs::LlmCache`'s TTL-map shape.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
    /// Bounded pattern scan; `*` suffix wildcard only (sufficient for the
    /// tenant-layer invalidation use case).
    async fn scan(&self, pattern: &str, limit: usize) -> anyhow::Result<Vec<String>>;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InProcessBackend {
    entries: parking_lot::Mutex<HashMap<String, Entry>>,
}

impl InProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InProcessBackend {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> anyhow::Result<()> {
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn scan(&self, pattern: &str, limit: usize) -> anyhow::Result<Vec<String>> {
        let prefix = pattern.trim_end_matches('*');
        let entries = self.entries.lock();
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let backend = InProcessBackend::new();
        backend.set("k", b"v".to_vec(), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn scan_respects_prefix_and_limit() {
        let backend = InProcessBackend::new();
        for i in 0..5 {
            backend
                .set(&format!("hh:search-response:t1:{i}"), b"v".to_vec(), Duration::from_secs(60))
                .await
                .unwrap();
        }
        let keys = backend.scan("hh:search-response:t1:*", 3).await.unwrap();
        assert_eq!(keys.len(), 3);
    }
}
