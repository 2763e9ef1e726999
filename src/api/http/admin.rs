// src/api/http/admin.rs
// POST /admin/migrate-fts - rebuilds the FTS trigger/function and repopulates
// `search_document`. Grounded in the teacher's thin handler-calls-state shape
// (`api/http/auth.rs`), delegating the actual DDL to `StoreAdapter`.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::SearchError;
use crate::state::AppState;

pub async fn migrate_fts(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, SearchError> {
    let rows_updated = state.store.migrate_fts().await?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "rowsUpdated": rows_updated,
    })))
}
