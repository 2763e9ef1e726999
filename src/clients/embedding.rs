// src/clients/embedding.rs
// External embedding HTTP client with retry and no circuit breaker —
// embedding failures with no cached vector are fatal per spec.md §7, so no
// fallback short-circuit is applicable. Grounded in the teacher's HTTP
// provider client shape (llm/provider/openai/mod.rs, llm/embeddings.rs).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::config::EmbeddingClientConfig;
use crate::error::{SearchError, SearchResult};
use crate::nlp::intent_router::Embedder as IntentEmbedder;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

pub struct EmbeddingClient {
    http: reqwest::Client,
    config: EmbeddingClientConfig,
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("embedding http client builds");
        Self { http, config }
    }

    pub async fn embed(&self, tenant_id: &str, text: &str) -> SearchResult<Vec<f32>> {
        let request_id = Uuid::new_v4().to_string();
        let mut last_err = None;

        for attempt in 0..=self.config.retries {
            let result = self
                .http
                .post(&self.config.url)
                .header("X-Tenant-Id", tenant_id)
                .header("X-Request-Id", &request_id)
                .json(&EmbedRequest { text })
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let body: EmbedResponse = resp.json().await.map_err(SearchError::from)?;
                    if body.embedding.is_empty() {
                        return Err(SearchError::Validation(
                            "embedding service returned an empty vector".into(),
                        ));
                    }
                    return Ok(body.embedding);
                }
                Ok(resp) => {
                    last_err = Some(SearchError::transient(format!(
                        "embedding service status {}",
                        resp.status()
                    )));
                }
                Err(e) => {
                    last_err = Some(SearchError::from(e));
                }
            }

            if attempt < self.config.retries {
                warn!(attempt, "embedding call failed, retrying");
                tokio::time::sleep(Duration::from_millis(50 * (attempt as u64 + 1))).await;
            }
        }

        Err(last_err.unwrap_or_else(|| SearchError::transient("embedding call failed")))
    }
}

#[async_trait]
impl IntentEmbedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> SearchResult<Vec<f32>> {
        EmbeddingClient::embed(self, "system", text).await
    }
}
