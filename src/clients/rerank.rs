// src/clients/rerank.rs
// External reranker HTTP client: ID-token auth, retries, circuit breaker.
// Grounded in the teacher's HTTP provider client shape plus
// `utils/rate_limiter.rs`'s governor-wrapper-style backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::circuit_breaker::CircuitBreaker;
use super::token_manager::TokenManager;
use crate::config::RerankClientConfig;
use crate::error::{SearchError, SearchResult};

#[derive(Debug, Serialize)]
pub struct RerankCandidate {
    pub candidate_id: String,
    pub summary: String,
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    job_description: &'a str,
    candidates: &'a [RerankCandidate],
}

#[derive(Debug, Deserialize)]
pub struct RerankedCandidate {
    pub candidate_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    ranked: Vec<RerankedCandidate>,
}

pub type Minter = Box<dyn Fn(&str) -> String + Send + Sync>;

pub struct RerankClient {
    http: reqwest::Client,
    config: RerankClientConfig,
    breaker: CircuitBreaker,
    token_manager: TokenManager<Minter>,
}

impl RerankClient {
    pub fn new(config: RerankClientConfig, mint_token: Minter) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("rerank http client builds");
        let breaker = CircuitBreaker::new(
            config.circuit_breaker_threshold,
            Duration::from_secs(config.circuit_breaker_cooldown_secs),
        );
        let token_manager = TokenManager::new(mint_token, Duration::from_secs(3_600));
        Self {
            http,
            config,
            breaker,
            token_manager,
        }
    }

    pub fn is_available(&self) -> bool {
        self.config.enabled && !self.breaker.is_open()
    }

    pub async fn rerank(
        &self,
        tenant_id: &str,
        job_description: &str,
        candidates: &[RerankCandidate],
    ) -> SearchResult<Vec<RerankedCandidate>> {
        if !self.is_available() {
            return Err(SearchError::dependency_unready("rerank client unavailable"));
        }

        let request_id = Uuid::new_v4().to_string();
        let token = self.token_manager.token_for(&self.config.audience);
        let mut last_err = None;

        for attempt in 0..=self.config.retries {
            let result = self
                .http
                .post(&self.config.url)
                .bearer_auth(&token)
                .header("X-Tenant-Id", tenant_id)
                .header("X-Request-Id", &request_id)
                .json(&RerankRequest { job_description, candidates })
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let body: RerankResponse = resp.json().await.map_err(SearchError::from)?;
                    self.breaker.record_success();
                    return Ok(body.ranked);
                }
                Ok(resp) => {
                    last_err = Some(SearchError::transient(format!("rerank status {}", resp.status())));
                }
                Err(e) => {
                    last_err = Some(SearchError::from(e));
                }
            }

            if attempt < self.config.retries {
                warn!(attempt, "rerank call failed, retrying");
                tokio::time::sleep(Duration::from_millis(50 * (attempt as u64 + 1))).await;
            }
        }

        self.breaker.record_failure();
        info!("rerank failed after retries, orchestrator will proceed without rerank");
        Err(last_err.unwrap_or_else(|| SearchError::transient("rerank call failed")))
    }
}
