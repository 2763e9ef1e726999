// src/store/sql.rs
// Builds the two hybrid-retrieval SQL variants (RRF, weighted-sum) with
// `sqlx::QueryBuilder` for the dynamic predicate list. Grounded in the
// teacher's `sqlx::query(...).bind()` chain idiom, generalized to a builder
// because the predicate list here is dynamic per-request.

use sqlx::postgres::Postgres;
use sqlx::QueryBuilder;

use crate::models::{SearchFilters, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HybridMode {
    Rrf,
    WeightedSum,
}

pub struct HybridQueryParams<'a> {
    pub tenant_id: &'a TenantId,
    pub query_embedding: Option<&'a [f32]>,
    pub query_text: Option<&'a str>,
    pub filters: &'a SearchFilters,
    pub limit: u32,
    pub offset: u32,
    pub min_similarity: f32,
    pub per_method_limit: u32,
    pub rrf_k: f64,
    pub vector_weight: f64,
    pub text_weight: f64,
    pub schema: &'a str,
    pub embeddings_table: &'a str,
    pub profiles_table: &'a str,
}

/// Builds the hybrid query. The vector CTE is only meaningful when an
/// embedding is supplied; the text CTE is only included when `query_text` is
/// non-empty, per spec.md §4.11.
pub fn build_hybrid_query<'a>(
    mode: HybridMode,
    params: &'a HybridQueryParams<'a>,
) -> QueryBuilder<'a, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("WITH vector_candidates AS (");

    qb.push("SELECT e.entity_id AS candidate_id, ")
        .push("1 - (e.embedding <=> ")
        .push_bind(params.query_embedding.map(|v| v.to_vec()).unwrap_or_default())
        .push("::vector) AS vector_score, ")
        .push("ROW_NUMBER() OVER (ORDER BY e.embedding <=> ")
        .push_bind(params.query_embedding.map(|v| v.to_vec()).unwrap_or_default())
        .push(format!("::vector ASC) AS vector_rank FROM {}.{} e ", params.schema, params.embeddings_table))
        .push("WHERE e.tenant_id = ")
        .push_bind(params.tenant_id.clone())
        .push(" ORDER BY vector_score DESC LIMIT ")
        .push_bind(params.per_method_limit as i64)
        .push("), ");

    qb.push("text_candidates AS (");
    if let Some(text) = params.query_text.filter(|t| !t.trim().is_empty()) {
        qb.push("SELECT p.candidate_id AS candidate_id, ")
            .push("ts_rank(p.search_document, websearch_to_tsquery('portuguese', ")
            .push_bind(text.to_string())
            .push(")) AS text_score, ")
            .push("ROW_NUMBER() OVER (ORDER BY ts_rank(p.search_document, websearch_to_tsquery('portuguese', ")
            .push_bind(text.to_string())
            .push(format!(")) DESC) AS text_rank FROM {}.{} p ", params.schema, params.profiles_table))
            .push("WHERE p.tenant_id = ")
            .push_bind(params.tenant_id.clone())
            .push(" AND p.search_document @@ websearch_to_tsquery('portuguese', ")
            .push_bind(text.to_string())
            .push(") ORDER BY text_score DESC LIMIT ")
            .push_bind(params.per_method_limit as i64);
    } else {
        qb.push("SELECT NULL::text AS candidate_id, NULL::real AS text_score, NULL::bigint AS text_rank WHERE false");
    }
    qb.push(") ");

    qb.push(format!(
        "SELECT COALESCE(v.candidate_id, t.candidate_id) AS candidate_id, \
         p.full_name, p.title, p.headline, p.location, p.country, p.industries, p.skills, \
         p.years_experience, p.analysis_confidence, p.profile, \
         p.legal_basis, p.consent_record, p.transfer_mechanism, p.updated_at, \
         COALESCE(v.vector_score, 0) AS vector_score, COALESCE(t.text_score, 0) AS text_score, \
         v.vector_rank, t.text_rank "
    ));

    match mode {
        HybridMode::Rrf => {
            qb.push(format!(
                "FROM vector_candidates v FULL OUTER JOIN text_candidates t ON v.candidate_id = t.candidate_id \
                 JOIN {}.{} p ON p.candidate_id = COALESCE(v.candidate_id, t.candidate_id) ",
                params.schema, params.profiles_table
            ));
        }
        HybridMode::WeightedSum => {
            qb.push(format!(
                "FROM vector_candidates v FULL OUTER JOIN text_candidates t ON v.candidate_id = t.candidate_id \
                 JOIN {}.{} p ON p.candidate_id = COALESCE(v.candidate_id, t.candidate_id) ",
                params.schema, params.profiles_table
            ));
        }
    }

    qb.push("WHERE p.tenant_id = ").push_bind(params.tenant_id.clone());

    if !params.filters.locations.is_empty() {
        qb.push(" AND p.location = ANY(").push_bind(params.filters.locations.clone()).push(")");
    }
    if !params.filters.countries.is_empty() {
        // Country-filter null-inclusion semantics: unknown location is never
        // excluded by a country filter.
        qb.push(" AND (p.country = ANY(")
            .push_bind(params.filters.countries.clone())
            .push(") OR p.country IS NULL)");
    }
    if !params.filters.industries.is_empty() {
        qb.push(" AND p.industries && ").push_bind(params.filters.industries.clone());
    }
    if !params.filters.skills.is_empty() {
        qb.push(" AND p.skills && ").push_bind(params.filters.skills.clone());
    }
    if let Some(min) = params.filters.min_experience_years {
        qb.push(" AND p.years_experience >= ").push_bind(min as f32);
    }
    if let Some(max) = params.filters.max_experience_years {
        qb.push(" AND p.years_experience <= ").push_bind(max as f32);
    }
    if !params.filters.metadata.is_empty() {
        let metadata_value: serde_json::Value = params
            .filters
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<serde_json::Map<String, serde_json::Value>>()
            .into();
        qb.push(" AND p.profile @> ").push_bind(metadata_value).push("::jsonb");
    }

    qb.push(" AND (COALESCE(v.vector_score, 0) >= ")
        .push_bind(params.min_similarity)
        .push(" OR COALESCE(t.text_score, 0) > 0)");

    match mode {
        HybridMode::Rrf => {
            qb.push(format!(
                " ORDER BY (1.0 / ({k} + COALESCE(v.vector_rank, 1000000)) + 1.0 / ({k} + COALESCE(t.text_rank, 1000000))) DESC, candidate_id ASC",
                k = params.rrf_k
            ));
        }
        HybridMode::WeightedSum => {
            qb.push(format!(
                " ORDER BY ({vw} * COALESCE(v.vector_score, 0) + {tw} * COALESCE(t.text_score, 0)) DESC, candidate_id ASC",
                vw = params.vector_weight,
                tw = params.text_weight
            ));
        }
    }

    qb.push(" LIMIT ").push_bind(params.limit as i64);
    qb.push(" OFFSET ").push_bind(params.offset as i64);

    qb
}

/// Statement that scopes the ANN index's search-list-size parameter to the
/// current transaction only (HNSW `ef_search` / DiskANN
/// `query_search_list_size`), per spec.md §4.11.
pub fn set_ann_search_list_size_sql(size: u32) -> String {
    format!("SET LOCAL hnsw.ef_search = {}", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_filter_includes_null_country() {
        let filters = SearchFilters {
            countries: vec!["BR".to_string()],
            ..Default::default()
        };
        let params = HybridQueryParams {
            tenant_id: &"t1".to_string(),
            query_embedding: Some(&[0.1, 0.2]),
            query_text: None,
            filters: &filters,
            limit: 20,
            offset: 0,
            min_similarity: 0.0,
            per_method_limit: 100,
            rrf_k: 60.0,
            vector_weight: 0.5,
            text_weight: 0.5,
            schema: "public",
            embeddings_table: "candidate_embeddings",
            profiles_table: "candidate_profiles",
        };
        let qb = build_hybrid_query(HybridMode::Rrf, &params);
        assert!(qb.sql().contains("OR p.country IS NULL"));
    }

    #[test]
    fn metadata_filter_adds_jsonb_containment_predicate() {
        let mut metadata = std::collections::HashMap::new();
        metadata.insert("visa_sponsorship".to_string(), serde_json::json!(true));
        let filters = SearchFilters {
            metadata,
            ..Default::default()
        };
        let params = HybridQueryParams {
            tenant_id: &"t1".to_string(),
            query_embedding: Some(&[0.1, 0.2]),
            query_text: None,
            filters: &filters,
            limit: 20,
            offset: 0,
            min_similarity: 0.0,
            per_method_limit: 100,
            rrf_k: 60.0,
            vector_weight: 0.5,
            text_weight: 0.5,
            schema: "public",
            embeddings_table: "candidate_embeddings",
            profiles_table: "candidate_profiles",
        };
        let qb = build_hybrid_query(HybridMode::Rrf, &params);
        assert!(qb.sql().contains("p.profile @>"));
    }

    #[test]
    fn text_cte_omitted_when_query_text_empty() {
        let filters = SearchFilters::default();
        let params = HybridQueryParams {
            tenant_id: &"t1".to_string(),
            query_embedding: Some(&[0.1]),
            query_text: None,
            filters: &filters,
            limit: 20,
            offset: 0,
            min_similarity: 0.0,
            per_method_limit: 100,
            rrf_k: 60.0,
            vector_weight: 0.5,
            text_weight: 0.5,
            schema: "public",
            embeddings_table: "candidate_embeddings",
            profiles_table: "candidate_profiles",
        };
        let qb = build_hybrid_query(HybridMode::Rrf, &params);
        assert!(qb.sql().contains("WHERE false"));
    }
}
