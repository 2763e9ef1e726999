// src/store/mod.rs
// Connection pool to the vector+text store, hybrid-query execution, pool
// warmup, and health. Grounded in `memory/storage/qdrant/multi_store.rs`'s
// pool/client lifecycle + "ensure N exist at startup, tolerate races" idiom,
// applied here to Postgres connection warmup, and
// `memory/storage/sqlite/store.rs`'s sqlx pool + migration-check pattern.

pub mod sql;

use std::time::Duration;

use futures::future::join_all;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::error::{SearchError, SearchResult};
use crate::models::{CandidateRow, Compliance, SearchFilters, TenantId};
use sql::{build_hybrid_query, set_ann_search_list_size_sql, HybridMode, HybridQueryParams};

#[derive(Debug, Clone)]
pub struct StoreHealth {
    pub healthy: bool,
    pub waiting_requests: usize,
    pub degraded: bool,
}

pub struct StoreAdapter {
    pool: PgPool,
    config: StoreConfig,
}

#[derive(Debug, Default)]
pub struct RetrievalDiagnostics {
    pub vector_only: usize,
    pub text_only: usize,
    pub both: usize,
    pub neither: usize,
}

impl StoreAdapter {
    pub async fn connect(config: StoreConfig) -> SearchResult<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min)
            .max_connections(config.pool_max)
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| SearchError::dependency_unready(format!("store connect: {e}")))?;

        let adapter = Self { pool, config };
        adapter.warm_pool().await?;

        if adapter.config.auto_migrate {
            adapter.ensure_schema().await?;
        }

        Ok(adapter)
    }

    /// Warms the pool to `min` connections in parallel at startup, tolerating
    /// a connection that races another warmup attempt rather than failing.
    async fn warm_pool(&self) -> SearchResult<()> {
        let attempts = (0..self.config.pool_min).map(|_| {
            let pool = self.pool.clone();
            async move { pool.acquire().await }
        });

        let results = join_all(attempts).await;
        let failures = results.iter().filter(|r| r.is_err()).count();
        if failures > 0 {
            warn!(failures, "pool warmup had acquisition failures");
        }
        Ok(())
    }

    async fn ensure_schema(&self) -> SearchResult<()> {
        sqlx::query(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            self.config.schema
        ))
        .execute(&self.pool)
        .await
        .map_err(SearchError::from)?;
        info!(schema = %self.config.schema, "verified store schema");
        Ok(())
    }

    /// Exposes a pool clone for callers (e.g. selection-event persistence)
    /// that need direct `sqlx` access outside the hybrid-search path.
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn schema(&self) -> &str {
        &self.config.schema
    }

    /// Rebuilds the FTS trigger/function and repopulates `search_document`
    /// for every existing row, per spec.md's admin migration endpoint.
    pub async fn migrate_fts(&self) -> SearchResult<u64> {
        let schema = &self.config.schema;
        let table = &self.config.profiles_table;

        let function_sql = format!(
            "CREATE OR REPLACE FUNCTION {schema}.{table}_search_document_trigger() RETURNS trigger AS $$
             BEGIN
                 NEW.search_document :=
                     setweight(to_tsvector('portuguese', coalesce(NEW.title, '')), 'A') ||
                     setweight(to_tsvector('portuguese', coalesce(NEW.headline, '')), 'B') ||
                     setweight(to_tsvector('portuguese', coalesce(array_to_string(NEW.skills, ' '), '')), 'B') ||
                     setweight(to_tsvector('portuguese', coalesce(array_to_string(NEW.industries, ' '), '')), 'C');
                 RETURN NEW;
             END
             $$ LANGUAGE plpgsql;"
        );
        sqlx::query(&function_sql).execute(&self.pool).await.map_err(SearchError::from)?;

        let trigger_sql = format!(
            "DROP TRIGGER IF EXISTS {table}_search_document_update ON {schema}.{table};
             CREATE TRIGGER {table}_search_document_update
                 BEFORE INSERT OR UPDATE ON {schema}.{table}
                 FOR EACH ROW EXECUTE FUNCTION {schema}.{table}_search_document_trigger();"
        );
        sqlx::query(&trigger_sql).execute(&self.pool).await.map_err(SearchError::from)?;

        let backfill_sql = format!(
            "UPDATE {schema}.{table} SET
                 search_document =
                     setweight(to_tsvector('portuguese', coalesce(title, '')), 'A') ||
                     setweight(to_tsvector('portuguese', coalesce(headline, '')), 'B') ||
                     setweight(to_tsvector('portuguese', coalesce(array_to_string(skills, ' '), '')), 'B') ||
                     setweight(to_tsvector('portuguese', coalesce(array_to_string(industries, ' '), '')), 'C')"
        );
        let result = sqlx::query(&backfill_sql).execute(&self.pool).await.map_err(SearchError::from)?;

        info!(rows = result.rows_affected(), "rebuilt FTS trigger and repopulated search_document");
        Ok(result.rows_affected())
    }

    pub async fn health(&self) -> StoreHealth {
        let waiting = self.pool.num_idle();
        let healthy = sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok();
        let degraded = waiting > 10;
        StoreHealth {
            healthy,
            waiting_requests: waiting,
            degraded,
        }
    }

    /// Runs the hybrid query, scoping the ANN search-list-size session
    /// parameter to the query's own transaction.
    pub async fn hybrid_search(
        &self,
        mode: HybridMode,
        tenant_id: &TenantId,
        query_embedding: Option<&[f32]>,
        query_text: Option<&str>,
        filters: &SearchFilters,
        limit: u32,
        offset: u32,
        min_similarity: f32,
        vector_weight: f64,
        text_weight: f64,
    ) -> SearchResult<(Vec<CandidateRow>, RetrievalDiagnostics)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SearchError::transient(format!("store begin: {e}")))?;

        sqlx::query(&set_ann_search_list_size_sql(self.config.ann_search_list_size))
            .execute(&mut *tx)
            .await
            .map_err(|e| SearchError::transient(format!("store set ann param: {e}")))?;

        let params = HybridQueryParams {
            tenant_id,
            query_embedding,
            query_text,
            filters,
            limit,
            offset,
            min_similarity,
            per_method_limit: self.config.per_method_limit,
            rrf_k: self.config.rrf_k,
            vector_weight,
            text_weight,
            schema: &self.config.schema,
            embeddings_table: &self.config.embeddings_table,
            profiles_table: &self.config.profiles_table,
        };

        let query_builder = build_hybrid_query(mode, &params);
        let rows = query_builder
            .build()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| SearchError::transient(format!("hybrid query: {e}")))?;

        tx.commit().await.map_err(|e| SearchError::transient(format!("store commit: {e}")))?;

        let mut diagnostics = RetrievalDiagnostics::default();
        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            let vector_score: f32 = row.try_get("vector_score").unwrap_or(0.0);
            let text_score: f32 = row.try_get("text_score").unwrap_or(0.0);
            match (vector_score > 0.0, text_score > 0.0) {
                (true, true) => diagnostics.both += 1,
                (true, false) => diagnostics.vector_only += 1,
                (false, true) => diagnostics.text_only += 1,
                (false, false) => diagnostics.neither += 1,
            }
            candidates.push(row_to_candidate(row, tenant_id, mode, self.config.rrf_k)?);
        }

        if query_text.is_some_and(|t| !t.trim().is_empty()) && diagnostics.text_only + diagnostics.both == 0 {
            warn!("text query present but produced no FTS matches");
        }

        Ok((candidates, diagnostics))
    }
}

fn row_to_candidate(
    row: &sqlx::postgres::PgRow,
    tenant_id: &TenantId,
    mode: HybridMode,
    rrf_k: f64,
) -> SearchResult<CandidateRow> {
    let vector_rank: Option<i64> = row.try_get("vector_rank").ok();
    let text_rank: Option<i64> = row.try_get("text_rank").ok();
    let vector_score: f32 = row.try_get("vector_score").unwrap_or(0.0);
    let text_score: f32 = row.try_get("text_score").unwrap_or(0.0);

    let rrf_score = match mode {
        HybridMode::Rrf => {
            let v = vector_rank.map(|r| 1.0 / (rrf_k + r as f64)).unwrap_or(0.0);
            let t = text_rank.map(|r| 1.0 / (rrf_k + r as f64)).unwrap_or(0.0);
            v + t
        }
        HybridMode::WeightedSum => 0.0,
    };

    Ok(CandidateRow {
        candidate_id: row.try_get("candidate_id").map_err(SearchError::from)?,
        tenant_id: tenant_id.clone(),
        full_name: row.try_get("full_name").unwrap_or_default(),
        title: row.try_get("title").unwrap_or_default(),
        headline: row.try_get("headline").ok(),
        location: row.try_get("location").ok(),
        country: row.try_get("country").ok(),
        industries: row.try_get("industries").unwrap_or_default(),
        skills: row.try_get("skills").unwrap_or_default(),
        years_experience: row.try_get("years_experience").ok(),
        analysis_confidence: row.try_get("analysis_confidence").unwrap_or(0.5),
        profile: row.try_get("profile").unwrap_or(serde_json::Value::Null),
        compliance: Compliance {
            legal_basis: row.try_get("legal_basis").ok(),
            consent_record: row.try_get("consent_record").ok(),
            transfer_mechanism: row.try_get("transfer_mechanism").ok(),
        },
        vector_score,
        text_score,
        vector_rank,
        text_rank,
        rrf_score,
        updated_at: row
            .try_get("updated_at")
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}
