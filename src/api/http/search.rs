// src/api/http/search.rs
// POST /v1/search/hybrid and POST /v1/search/candidates. Grounded in the
// teacher's `api/http/auth.rs` handler shape (`State<Arc<AppState>>` +
// `Json<Req> -> Result<Json<Resp>, Error>`), extended with the
// Server-Timing/X-* response headers this surface needs.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::models::{SearchFilters, SearchRequest, SearchResponse};
use crate::orchestrator::SearchOrchestrator;
use crate::state::AppState;

pub async fn search_hybrid(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<impl IntoResponse, SearchError> {
    let response = SearchOrchestrator::new(&state).search(request).await?;
    Ok((timing_headers(&response), Json(response)))
}

/// Simplified wrapper: a flatter request/response shape over the same
/// pipeline, for callers that don't need the full hybrid-search surface.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesRequest {
    pub tenant_id: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub include_metadata: bool,
    #[serde(default)]
    pub filters: SearchFilters,
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub candidate_id: String,
    pub score: f32,
    pub full_name: Option<String>,
    pub title: Option<String>,
    pub match_reasons: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesResponse {
    pub candidates: Vec<CandidateSummary>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<crate::models::ResponseMetadata>,
}

pub async fn search_candidates(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CandidatesRequest>,
) -> Result<impl IntoResponse, SearchError> {
    let request = SearchRequest {
        tenant_id: req.tenant_id,
        query: req.query,
        embedding: None,
        job_description: None,
        jd_hash: None,
        filters: req.filters,
        limit: req.limit,
        offset: 0,
        include_debug: false,
        role_type: None,
        signal_weights: None,
        enable_nlp: true,
        nlp_confidence_threshold: None,
        anonymize: false,
        include_match_rationale: false,
        rationale_limit: None,
    };

    let response = SearchOrchestrator::new(&state).search(request).await?;
    let headers = timing_headers(&response);

    let candidates = response
        .results
        .iter()
        .map(|r| CandidateSummary {
            candidate_id: r.candidate_id.clone(),
            score: r.score,
            full_name: r.full_name.clone(),
            title: r.title.clone(),
            match_reasons: r.match_reasons.clone(),
        })
        .collect();

    let body = CandidatesResponse {
        candidates,
        total: response.total,
        metadata: if req.include_metadata { Some(response.metadata) } else { None },
    };

    Ok((headers, Json(body)))
}

fn timing_headers(response: &SearchResponse) -> HeaderMap {
    let get = |k: &str| response.timings.get(k).copied().unwrap_or(0);
    let total = get("total");

    let mut headers = HeaderMap::new();
    let server_timing = format!(
        "embedding;dur={}, retrieval;dur={}, rerank;dur={}, total;dur={}, cache;desc=\"{}\"",
        get("embedding"),
        get("retrieval"),
        get("rerank"),
        total,
        if response.cache_hit { "hit" } else { "miss" },
    );

    insert(&mut headers, "server-timing", &server_timing);
    insert(&mut headers, "x-response-time", &format!("{total}ms"));
    insert(&mut headers, "x-cache-status", if response.cache_hit { "hit" } else { "miss" });
    if response.timings.contains_key("rerank") {
        insert(&mut headers, "x-rerank-cache", if get("rerank") == 0 { "hit" } else { "miss" });
    }
    headers
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(v) = axum::http::HeaderValue::from_str(value) {
        headers.insert(name, v);
    }
}
