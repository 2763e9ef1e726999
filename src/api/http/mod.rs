// src/api/http/mod.rs
// Route modules plus the top-level router assembly. Grounded in the
// teacher's `api/http/mod.rs` (thin `pub mod` + `pub use` re-export of each
// route-builder function) and `api/http/auth.rs`'s
// `Router::new().route(...)` construction.

pub mod admin;
pub mod health;
pub mod search;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/search/hybrid", post(search::search_hybrid))
        .route("/v1/search/candidates", post(search::search_candidates))
        .route("/healthz", get(health::liveness))
        .route("/readyz", get(health::readiness))
        .route("/health", get(health::health))
        .route("/health/detailed", get(health::health_detailed))
        .route("/admin/migrate-fts", post(admin::migrate_fts))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
