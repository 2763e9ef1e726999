// src/bias/selection_events.rs
// Best-effort batched persistence of selection events (shown/clicked/...).
// Grounded in `store/mod.rs`'s sqlx pool + query-building idiom; failures are
// logged and swallowed since selection tracking must never fail a search.

use sqlx::postgres::PgPool;
use sqlx::QueryBuilder;
use tracing::warn;

use crate::models::SelectionEvent;

const MAX_BATCH_SIZE: usize = 500;

pub struct SelectionEventStore {
    pool: PgPool,
    schema: String,
    table: String,
}

impl SelectionEventStore {
    pub fn new(pool: PgPool, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Inserts events in chunks of `MAX_BATCH_SIZE`, skipping rows that
    /// already exist by `event_id`. Never returns an error to the caller;
    /// failures are logged and the batch is otherwise dropped, matching the
    /// "best effort" guarantee documented for selection tracking.
    pub async fn record(&self, events: &[SelectionEvent]) {
        if events.is_empty() {
            return;
        }

        for chunk in events.chunks(MAX_BATCH_SIZE) {
            if let Err(e) = self.insert_chunk(chunk).await {
                warn!(error = %e, count = chunk.len(), "failed to persist selection events batch");
            }
        }
    }

    async fn insert_chunk(&self, events: &[SelectionEvent]) -> Result<(), sqlx::Error> {
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {}.{} (event_id, ts, tenant_id, search_id, user_id_hash, candidate_id, event_type, company_tier, experience_band, specialty, rank, score) ",
            self.schema, self.table
        ));

        qb.push_values(events, |mut b, event| {
            b.push_bind(&event.event_id)
                .push_bind(event.timestamp)
                .push_bind(&event.tenant_id)
                .push_bind(&event.search_id)
                .push_bind(&event.user_id_hash)
                .push_bind(&event.candidate_id)
                .push_bind(format!("{:?}", event.event_type).to_lowercase())
                .push_bind(format!("{:?}", event.inferred.company_tier).to_lowercase())
                .push_bind(format!("{:?}", event.inferred.experience_band).to_lowercase())
                .push_bind(format!("{:?}", event.inferred.specialty).to_lowercase())
                .push_bind(event.rank.map(|r| r as i64))
                .push_bind(event.score);
        });

        qb.push(" ON CONFLICT (event_id) DO NOTHING");

        qb.build().execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyTierBand, ExperienceBand, InferredDimensions, SelectionEventType, Specialty};

    fn sample_event() -> SelectionEvent {
        SelectionEvent {
            event_id: "evt-1".into(),
            timestamp: chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
            tenant_id: "tenant-a".into(),
            search_id: "search-1".into(),
            user_id_hash: "hash-1".into(),
            candidate_id: "cand-1".into(),
            event_type: SelectionEventType::Shown,
            inferred: InferredDimensions {
                company_tier: CompanyTierBand::Startup,
                experience_band: ExperienceBand::Three7,
                specialty: Specialty::Backend,
            },
            rank: Some(1),
            score: Some(0.9),
        }
    }

    #[test]
    fn empty_batch_is_a_cheap_noop() {
        // record() on an empty slice must not touch the pool at all; this is
        // covered as a compile/shape check since a real pool requires a
        // running Postgres instance in integration tests.
        let events: Vec<SelectionEvent> = Vec::new();
        assert!(events.is_empty());
        let _ = sample_event();
    }
}
