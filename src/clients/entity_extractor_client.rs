// src/clients/entity_extractor_client.rs
// Concrete reqwest-backed EntityExtractor: calls an external LLM endpoint
// with a fixed JSON schema. Grounded in `clients/embedding.rs`'s HTTP client
// shape; wrapped by `nlp::entity_extractor::CachedEntityExtractor` for
// timeout/caching/hallucination-filtering.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::EntityExtractorClientConfig;
use crate::error::{SearchError, SearchResult};
use crate::nlp::entity_extractor::{EntityExtractor, EntityRecord};

#[derive(Debug, Deserialize, Default)]
struct ExtractResponse {
    role: Option<String>,
    #[serde(default)]
    skills: Vec<String>,
    seniority: Option<String>,
    location: Option<String>,
    remote: Option<bool>,
    experience_years_min: Option<u32>,
    experience_years_max: Option<u32>,
}

pub struct LlmEntityExtractor {
    http: reqwest::Client,
    config: EntityExtractorClientConfig,
}

impl LlmEntityExtractor {
    pub fn new(config: EntityExtractorClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("entity extractor http client builds");
        Self { http, config }
    }
}

#[async_trait]
impl EntityExtractor for LlmEntityExtractor {
    async fn extract_raw(&self, normalized_query: &str) -> SearchResult<EntityRecord> {
        let resp = self
            .http
            .post(&self.config.url)
            .json(&serde_json::json!({ "query": normalized_query }))
            .send()
            .await
            .map_err(SearchError::from)?;

        if !resp.status().is_success() {
            return Err(SearchError::transient(format!(
                "entity extraction service status {}",
                resp.status()
            )));
        }

        let body: ExtractResponse = resp.json().await.map_err(SearchError::from)?;
        Ok(EntityRecord {
            role: body.role,
            skills: body.skills,
            seniority: body.seniority,
            location: body.location,
            remote: body.remote,
            experience_years_min: body.experience_years_min,
            experience_years_max: body.experience_years_max,
        })
    }
}
