// src/api/http/health.rs
// Liveness/readiness/health endpoints for load balancers and Kubernetes
// probes. Grounded in the teacher's `api/http/health.rs`
// (health_check/readiness_check/liveness_check triad, State<Arc<AppState>>,
// 200-healthy/503-unhealthy mapping), generalized to this service's
// dependency set.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::cache::CacheLayer;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Ok,
    Degraded,
    Disabled,
}

#[derive(Serialize)]
struct DetailedHealth {
    status: &'static str,
    pgvector: ComponentStatus,
    redis: ComponentStatus,
    embeddings: ComponentStatus,
    rerank: ComponentStatus,
    nlp: ComponentStatus,
    trajectory: ComponentStatus,
    metrics: ComponentStatus,
}

/// Liveness: the process is up and able to respond. Never checks dependencies.
///
/// GET /healthz
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "alive"})))
}

/// Readiness: the store connection pool answers and, if auto-migrate is on,
/// schema is present.
///
/// GET /readyz
pub async fn readiness(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store_health = state.store.health().await;
    let ready = store_health.healthy && !store_health.degraded;
    let body = serde_json::json!({
        "status": if ready { "ready" } else { "not_ready" },
        "waitingRequests": store_health.waiting_requests,
    });
    if ready {
        (StatusCode::OK, Json(body))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }
}

/// GET /health - summary view for load balancers.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let detailed = gather(&state).await;
    respond(detailed)
}

/// GET /health/detailed - full per-dependency breakdown.
pub async fn health_detailed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let detailed = gather(&state).await;
    respond(detailed)
}

async fn gather(state: &AppState) -> DetailedHealth {
    let store_health = state.store.health().await;
    let pgvector = if store_health.healthy {
        ComponentStatus::Ok
    } else {
        ComponentStatus::Degraded
    };

    let redis = if state.config.cache.redis_url.is_some() {
        if cache_roundtrip_ok(state).await {
            ComponentStatus::Ok
        } else {
            ComponentStatus::Degraded
        }
    } else {
        ComponentStatus::Disabled
    };

    let embeddings = if state.config.embedding.url.trim().is_empty() {
        ComponentStatus::Degraded
    } else {
        ComponentStatus::Ok
    };

    let rerank = match &state.rerank_client {
        Some(client) if client.is_available() => ComponentStatus::Ok,
        Some(_) => ComponentStatus::Degraded,
        None => ComponentStatus::Disabled,
    };

    let nlp = if state.config.nlp.enabled {
        if state.query_parser.is_initialized() {
            ComponentStatus::Ok
        } else {
            ComponentStatus::Degraded
        }
    } else {
        ComponentStatus::Disabled
    };

    let trajectory = match &state.trajectory_client {
        Some(client) if client.is_available() => ComponentStatus::Ok,
        Some(_) => ComponentStatus::Degraded,
        None => ComponentStatus::Disabled,
    };

    // Metrics recording is in-process and infallible once the exporter is
    // installed at startup; there is nothing external to probe.
    let metrics = ComponentStatus::Ok;

    DetailedHealth {
        status: "pending",
        pgvector,
        redis,
        embeddings,
        rerank,
        nlp,
        trajectory,
        metrics,
    }
}

fn respond(mut detailed: DetailedHealth) -> impl IntoResponse {
    let degraded = detailed.pgvector == ComponentStatus::Degraded
        || detailed.redis == ComponentStatus::Degraded
        || detailed.embeddings == ComponentStatus::Degraded
        || detailed.rerank == ComponentStatus::Degraded
        || detailed.nlp == ComponentStatus::Degraded
        || detailed.trajectory == ComponentStatus::Degraded;

    detailed.status = if degraded { "degraded" } else { "healthy" };

    let status_code = if degraded { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::OK };
    (status_code, Json(detailed))
}

async fn cache_roundtrip_ok(state: &AppState) -> bool {
    let probe_key = "roundtrip";
    state
        .cache
        .set(CacheLayer::SpecialtyLookup, "__health__", probe_key, b"1".to_vec())
        .await;
    state.cache.get(CacheLayer::SpecialtyLookup, "__health__", probe_key).await.is_some()
}
