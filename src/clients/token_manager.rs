// src/clients/token_manager.rs
// Process-wide cached ID-token per audience. Grounded in the teacher's
// `Arc<RwLock<...>>`-guarded shared state idiom (backend/src/state.rs).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// In production this would mint tokens from a workload-identity provider;
/// the spec treats auth issuance as an external collaborator, so this
/// manager only owns the cache-until-expiry behavior around a pluggable
/// minting function.
pub struct TokenManager<F: Fn(&str) -> String + Send + Sync> {
    cache: RwLock<HashMap<String, CachedToken>>,
    mint: F,
    ttl: Duration,
}

impl<F: Fn(&str) -> String + Send + Sync> TokenManager<F> {
    pub fn new(mint: F, ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            mint,
            ttl,
        }
    }

    pub fn token_for(&self, audience: &str) -> String {
        if let Some(cached) = self.cache.read().get(audience) {
            if cached.expires_at > Instant::now() {
                return cached.token.clone();
            }
        }

        let token = (self.mint)(audience);
        self.cache.write().insert(
            audience.to_string(),
            CachedToken {
                token: token.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn caches_token_until_expiry() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let manager = TokenManager::new(
            move |aud| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                format!("token-for-{aud}")
            },
            Duration::from_secs(60),
        );

        let first = manager.token_for("rerank-service");
        let second = manager.token_for("rerank-service");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_audiences_mint_distinct_tokens() {
        let manager = TokenManager::new(|aud| format!("token-for-{aud}"), Duration::from_secs(60));
        assert_ne!(manager.token_for("a"), manager.token_for("b"));
    }
}
