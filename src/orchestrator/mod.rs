// src/orchestrator/mod.rs
// The 15-step hybrid search pipeline tying every other module together.
// Grounded in the teacher's staged `RecallEngine::recall` orchestration
// (memory/features/recall_engine/mod.rs): sequential awaited stages, with a
// documented single concurrent pair, early-return on cache hit, and
// best-effort side effects that never fail the primary response.

use std::collections::HashMap;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::bias::{anonymize, diversity, selection_events::SelectionEventStore};
use crate::cache::CacheLayer;
use crate::clients::rerank::RerankCandidate;
use crate::error::{SearchError, SearchResult};
use crate::models::{
    CandidateRow, Compliance, DiversitySummary, DiversityWarningDto, InferredDimensions,
    ResponseMetadata, ResultItem, SearchRequest, SearchResponse, SelectionEvent, SelectionEventType,
    SignalScores,
};
use crate::perf::Sample;
use crate::scoring::engine::{ScoredResult, ScoringEngine, SearchContext};
use crate::scoring::signals::{CompanyContext, ExperienceEntry};
use crate::scoring::trajectory::{JobTrajectoryContext, TitleEvent};
use crate::scoring::weights::{RoleType, WeightResolver};
use crate::state::AppState;
use crate::store::sql::HybridMode;

const DEFAULT_MIN_SIMILARITY: f32 = 0.0;
const DEFAULT_VECTOR_WEIGHT: f64 = 0.6;
const DEFAULT_TEXT_WEIGHT: f64 = 0.4;
const ECO_BOOST_FACTOR: f32 = 0.02;
const RATIONALE_DEFAULT_LIMIT: u32 = 10;

const BR_INDICATORS: &[&str] = &[
    "são paulo", "sao paulo", "rio de janeiro", "belo horizonte", "brasilia", "brasília",
    "curitiba", "porto alegre", "salvador", "recife", "fortaleza", "brazil", "brasil",
];
const US_INDICATORS: &[&str] = &[
    "new york", "nyc", "san francisco", "los angeles", "chicago", "austin", "seattle",
    "boston", "united states", "usa", "u.s.",
];

pub struct SearchOrchestrator<'a> {
    state: &'a AppState,
}

impl<'a> SearchOrchestrator<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn search(&self, mut request: SearchRequest) -> SearchResult<SearchResponse> {
        let overall_start = Instant::now();
        let mut timings: HashMap<String, u64> = HashMap::new();

        // 1. Validate request; resolve role type and weights.
        if !request.has_search_input() {
            return Err(SearchError::validation(
                "at least one of query, embedding, or jobDescription is required",
            ));
        }
        request.limit = request.limit.clamp(1, 200);
        request.offset = request.offset.clamp(0, 200);

        let role_type = RoleType::from_str_or_default(request.role_type.as_deref().unwrap_or("default"));
        let weights = WeightResolver::resolve(role_type, request.signal_weights.as_ref());

        // 2. Response cache probe.
        let cache_key = response_cache_key(&request);
        if let Some(cached) = self.state.cache.get(CacheLayer::SearchResponse, &request.tenant_id, &cache_key).await
        {
            if let Ok(mut response) = serde_json::from_slice::<SearchResponse>(&cached) {
                response.cache_hit = true;
                timings.insert("total".into(), overall_start.elapsed().as_millis() as u64);
                response.timings = timings;
                self.state.perf.record(Sample {
                    total_ms: response.timings.get("total").copied().unwrap_or(0),
                    embedding_ms: 0,
                    retrieval_ms: 0,
                    rerank_ms: 0,
                    cache_hit: true,
                    rerank_applied: false,
                    stage_breakdown: None,
                });
                return Ok(response);
            }
        }

        // 3. Country auto-detect from job description.
        let mut auto_detected_country = None;
        if request.filters.countries.is_empty() {
            if let Some(jd) = &request.job_description {
                auto_detected_country = detect_country(jd);
                if let Some(country) = &auto_detected_country {
                    request.filters.countries.push(country.clone());
                }
            }
        }

        // 4-5. Obtain query embedding and, concurrently, run the
        // embedding-independent half of NLP parsing (entity extraction +
        // ontology/synonym expansion) — the one documented parallel pair
        // (spec.md §5). Intent classification needs the embedding, so it
        // runs after the join, then combines with the extraction result.
        let embedding_start = Instant::now();
        let original_query = request.query.clone().unwrap_or_default();
        let do_nlp = request.enable_nlp && !original_query.trim().is_empty();

        let query_embedding;
        let mut extracted = None;
        if do_nlp {
            let extraction_fut = async {
                Ok::<_, SearchError>(self.state.query_parser.extract_and_expand(&original_query).await)
            };
            let (embedding, extraction) = tokio::try_join!(self.resolve_embedding(&request), extraction_fut)?;
            query_embedding = embedding;
            extracted = Some(extraction);
        } else {
            query_embedding = self.resolve_embedding(&request).await?;
        }
        let embedding_ms = embedding_start.elapsed().as_millis() as u64;
        timings.insert("embedding".into(), embedding_ms);

        let parsed = if let Some(extraction) = extracted {
            let (classification, intent_ms) = self.state.query_parser.classify(&query_embedding).await;
            Some(self.state.query_parser.combine(classification, intent_ms, extraction))
        } else {
            None
        };

        if let Some(parsed) = &parsed {
            for stage in &["intent", "entities", "ontology_expansion", "synonym_expansion"] {
                if let Some(ms) = parsed.timings.get(*stage) {
                    timings.insert(format!("nlp_{stage}"), *ms);
                }
            }
            if request.filters.skills.is_empty() {
                request.filters.skills = parsed.entities.skills.clone();
                request.filters.skills.extend(parsed.expanded_skills.clone());
            }
            if request.filters.seniority_levels.is_empty() {
                if let Some(seniority) = &parsed.entities.seniority {
                    request.filters.seniority_levels.push(seniority.clone());
                }
                request.filters.seniority_levels.extend(parsed.semantic_expansion.expanded_seniorities.clone());
            }
        }

        // 6. Hybrid retrieval.
        let retrieval_start = Instant::now();
        let mode = if self.state.config.store.rrf_enabled { HybridMode::Rrf } else { HybridMode::WeightedSum };
        let (rows, diagnostics) = self
            .state
            .store
            .hybrid_search(
                mode,
                &request.tenant_id,
                Some(&query_embedding),
                request.query.as_deref(),
                &request.filters,
                request.limit,
                request.offset,
                DEFAULT_MIN_SIMILARITY,
                DEFAULT_VECTOR_WEIGHT,
                DEFAULT_TEXT_WEIGHT,
            )
            .await?;
        timings.insert("retrieval".into(), retrieval_start.elapsed().as_millis() as u64);

        if diagnostics.neither > 0 {
            warn!(neither = diagnostics.neither, "hybrid query returned rows matching neither method");
        }

        // 7-8. Hydrate, score, apply local boosts, sort.
        let ctx = build_search_context(&request, parsed.as_ref().map(|p| p.entities.seniority.clone()).flatten());
        let mut scored: Vec<(CandidateRow, ScoredResult, Vec<String>)> = rows
            .into_iter()
            .map(|row| {
                let mut result = ScoringEngine::score(&row, &weights, Some(&ctx));
                result.final_score = apply_local_boosts(result.final_score, &row, &request);
                let reasons = build_match_reasons(&row, &result, &ctx);
                (row, result, reasons)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.final_score
                .partial_cmp(&a.1.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.candidate_id.cmp(&b.0.candidate_id))
        });

        let dims_by_id: HashMap<String, InferredDimensions> = scored
            .iter()
            .map(|(row, _, _)| (row.candidate_id.clone(), diversity::infer_dimensions(row)))
            .collect();

        let mut results: Vec<ResultItem> = scored
            .into_iter()
            .map(|(row, scored, reasons)| row_to_result_item(row, scored, reasons, role_type, &weights))
            .collect();

        // 9. Optional external rerank over a bounded prefix.
        let rerank_start = Instant::now();
        let mut rerank_applied = false;
        if let Some(rerank_client) = &self.state.rerank_client {
            if rerank_client.is_available() && !results.is_empty() {
                rerank_applied = self.apply_rerank(rerank_client, &request, &mut results).await;
            }
        }
        timings.insert("rerank".into(), rerank_start.elapsed().as_millis() as u64);

        // 10. Optional rationale (bounded, tolerant of failure).
        if request.include_match_rationale {
            let limit = request.rationale_limit.unwrap_or(RATIONALE_DEFAULT_LIMIT) as usize;
            for result in results.iter_mut().take(limit) {
                result.rationale = Some(generic_rationale(result));
            }
        }

        // 11. Anonymize.
        let mut anonymized_at = None;
        if request.anonymize {
            results = results.into_iter().map(|r| anonymize::strip(r, true)).collect();
            anonymized_at = Some(chrono::Utc::now());
        }

        // 12. Slate diversity.
        let dimensions: Vec<InferredDimensions> = results
            .iter()
            .map(|r| dims_by_id.get(&r.candidate_id).cloned().unwrap_or(InferredDimensions {
                company_tier: crate::models::CompanyTierBand::Other,
                experience_band: experience_band_for(r.years_experience),
                specialty: crate::models::Specialty::Other,
            }))
            .collect();
        let diversity_summary = diversity::analyze(&dimensions).map(|report| DiversitySummary {
            diversity_score: report.diversity_score,
            warnings: report
                .warnings
                .into_iter()
                .map(|w| DiversityWarningDto {
                    dimension: w.dimension,
                    dominant_group: w.dominant_group,
                    concentration_pct: w.concentration_pct,
                    severity: format!("{:?}", w.severity).to_lowercase(),
                    suggestion: w.suggestion,
                })
                .collect(),
        });

        // 13. Best-effort "shown" selection events.
        self.emit_shown_events(&request, &results, &dims_by_id).await;

        let total = results.len();
        let metadata = ResponseMetadata {
            parse_method: parsed.as_ref().map(|p| format!("{:?}", p.parse_method).to_lowercase()).unwrap_or_else(|| "keyword_fallback".into()),
            intent: parsed.as_ref().map(|p| format!("{:?}", p.intent).to_lowercase()).unwrap_or_else(|| "keyword_fallback".into()),
            role_type: format!("{:?}", role_type).to_lowercase(),
            anonymized: request.anonymize,
            anonymized_at,
            diversity: diversity_summary,
            auto_detected_country,
        };

        timings.insert("total".into(), overall_start.elapsed().as_millis() as u64);

        let response = SearchResponse {
            results,
            total,
            cache_hit: false,
            request_id: Uuid::new_v4().to_string(),
            timings: timings.clone(),
            metadata,
            debug: if request.include_debug {
                Some(serde_json::json!({ "retrieval_diagnostics": format!("{:?}", diagnostics) }))
            } else {
                None
            },
        };

        // 14. Cache response (skip empty results).
        if !response.results.is_empty() {
            if let Ok(bytes) = serde_json::to_vec(&response) {
                self.state.cache.set(CacheLayer::SearchResponse, &request.tenant_id, &cache_key, bytes).await;
            }
        }

        // 15. Performance sample.
        self.state.perf.record(Sample {
            total_ms: timings.get("total").copied().unwrap_or(0),
            embedding_ms,
            retrieval_ms: timings.get("retrieval").copied().unwrap_or(0),
            rerank_ms: timings.get("rerank").copied().unwrap_or(0),
            cache_hit: false,
            rerank_applied,
            stage_breakdown: Some(timings.clone()),
        });

        Ok(response)
    }

    async fn resolve_embedding(&self, request: &SearchRequest) -> SearchResult<Vec<f32>> {
        if let Some(embedding) = &request.embedding {
            return Ok(embedding.clone());
        }

        let query = request.query.as_deref().or(request.job_description.as_deref()).unwrap_or_default();
        let cache_id = text_hash(query);

        if let Some(cached) = self.state.cache.get(CacheLayer::Embedding, &request.tenant_id, &cache_id).await {
            if let Ok(vector) = serde_json::from_slice::<Vec<f32>>(&cached) {
                return Ok(vector);
            }
        }

        let embedding = self.state.embedding_client.embed(&request.tenant_id, query).await?;
        if let Ok(bytes) = serde_json::to_vec(&embedding) {
            self.state.cache.set(CacheLayer::Embedding, &request.tenant_id, &cache_id, bytes).await;
        }
        Ok(embedding)
    }

    async fn apply_rerank(
        &self,
        rerank_client: &crate::clients::rerank::RerankClient,
        request: &SearchRequest,
        results: &mut Vec<ResultItem>,
    ) -> bool {
        let limit = self.state.config.rerank.candidate_limit.min(results.len());
        let head: Vec<ResultItem> = results.drain(0..limit).collect();

        let candidates: Vec<RerankCandidate> = head
            .iter()
            .map(|r| RerankCandidate {
                candidate_id: r.candidate_id.clone(),
                summary: r.title.clone().or_else(|| r.headline.clone()).unwrap_or_default(),
            })
            .collect();

        let job_description = request.job_description.as_deref().unwrap_or_default();
        let rerank_outcome = rerank_client.rerank(&request.tenant_id, job_description, &candidates).await;

        let mut by_id: HashMap<String, ResultItem> =
            head.into_iter().map(|r| (r.candidate_id.clone(), r)).collect();

        match rerank_outcome {
            Ok(ranked) => {
                let mut reordered = Vec::with_capacity(by_id.len());
                for reranked in &ranked {
                    if let Some(mut item) = by_id.remove(&reranked.candidate_id) {
                        if let Some(reason) = &reranked.reason {
                            item.match_reasons.push(reason.clone());
                        }
                        reordered.push(item);
                    }
                }
                // Unlisted candidates keep prior order after reranked ones.
                reordered.extend(by_id.into_values());
                reordered.extend(results.drain(..));
                *results = reordered;
                true
            }
            Err(e) => {
                warn!(error = %e, "rerank failed, keeping local ranking");
                let mut restored: Vec<ResultItem> = by_id.into_values().collect();
                restored.sort_by(|a, b| {
                    b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
                });
                restored.extend(results.drain(..));
                *results = restored;
                false
            }
        }
    }

    async fn emit_shown_events(
        &self,
        request: &SearchRequest,
        results: &[ResultItem],
        dims_by_id: &HashMap<String, InferredDimensions>,
    ) {
        let search_id = Uuid::new_v4().to_string();
        let events: Vec<SelectionEvent> = results
            .iter()
            .enumerate()
            .map(|(idx, r)| SelectionEvent {
                event_id: format!("{}-{}", search_id, r.candidate_id),
                timestamp: chrono::Utc::now(),
                tenant_id: request.tenant_id.clone(),
                search_id: search_id.clone(),
                user_id_hash: "unknown".into(),
                candidate_id: r.candidate_id.clone(),
                event_type: SelectionEventType::Shown,
                inferred: dims_by_id.get(&r.candidate_id).cloned().unwrap_or(InferredDimensions {
                    company_tier: crate::models::CompanyTierBand::Other,
                    experience_band: experience_band_for(r.years_experience),
                    specialty: crate::models::Specialty::Other,
                }),
                rank: Some(idx as u32 + 1),
                score: Some(r.score),
            })
            .collect();

        let store = SelectionEventStore::new(self.state.store.pool(), self.state.store.schema(), "selection_events");
        store.record(&events).await;
    }
}

fn response_cache_key(request: &SearchRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.query.as_deref().unwrap_or("").as_bytes());
    hasher.update(serde_json::to_vec(&request.filters).unwrap_or_default());
    hasher.update(request.limit.to_le_bytes());
    hasher.update(request.offset.to_le_bytes());
    hasher.update(request.job_description.as_deref().unwrap_or("").as_bytes());
    hasher.update(request.jd_hash.as_deref().unwrap_or("").as_bytes());
    format!("{:x}", hasher.finalize())
}

fn text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.to_lowercase().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn detect_country(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    if BR_INDICATORS.iter().any(|i| lower.contains(i)) {
        return Some("Brazil".to_string());
    }
    if US_INDICATORS.iter().any(|i| lower.contains(i)) {
        return Some("United States".to_string());
    }
    None
}

fn build_search_context(request: &SearchRequest, seniority_hint: Option<String>) -> SearchContext {
    SearchContext {
        required_skills: request.filters.skills.clone(),
        required_seniority: request.filters.seniority_levels.first().cloned().or(seniority_hint),
        candidate_title_sequence: Vec::<TitleEvent>::new(),
        candidate_experience: Vec::<ExperienceEntry>::new(),
        company_context: CompanyContext::default(),
        job_trajectory_context: JobTrajectoryContext::default(),
    }
}

fn apply_local_boosts(base_score: f32, row: &CandidateRow, request: &SearchRequest) -> f32 {
    let mut score = base_score;

    if !request.filters.skills.is_empty() {
        let candidate_lower: Vec<String> = row.skills.iter().map(|s| s.to_lowercase()).collect();
        let extra_matches = request
            .filters
            .skills
            .iter()
            .filter(|s| candidate_lower.contains(&s.to_lowercase()))
            .count();
        score += extra_matches as f32 * ECO_BOOST_FACTOR;
    }

    if !request.filters.locations.is_empty() {
        if let Some(location) = &row.location {
            if request.filters.locations.iter().any(|l| l.eq_ignore_ascii_case(location)) {
                score += 0.05;
            }
        }
    }

    if row.analysis_confidence >= 0.9 {
        score += 0.02;
    }

    crate::vector::clamp_unit(score)
}

fn build_match_reasons(row: &CandidateRow, scored: &ScoredResult, ctx: &SearchContext) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(exact) = scored.signal_scores.skills_exact_match {
        if exact > 0.0 {
            reasons.push(format!("Matches {:.0}% of required skills directly", exact * 100.0));
        }
    }
    if let Some(inferred) = scored.signal_scores.skills_inferred {
        if inferred > 0.0 {
            reasons.push("Has transferable skills for part of the requirement".to_string());
        }
    }
    if let Some(seniority) = scored.signal_scores.seniority_alignment {
        if seniority >= 0.8 {
            reasons.push(format!("Seniority closely aligned as {}", row.title));
        }
    }
    if !ctx.required_skills.is_empty() && reasons.is_empty() {
        reasons.push("Retrieved via hybrid vector and text similarity".to_string());
    }

    reasons
}

fn generic_rationale(result: &ResultItem) -> String {
    format!(
        "Scored {:.2} based on skill match, seniority alignment, and retrieval relevance",
        result.score
    )
}

fn experience_band_for(years: Option<f32>) -> crate::models::ExperienceBand {
    use crate::models::ExperienceBand;
    match years {
        Some(y) if y < 3.0 => ExperienceBand::Zero3,
        Some(y) if y < 7.0 => ExperienceBand::Three7,
        Some(y) if y < 15.0 => ExperienceBand::Seven15,
        Some(_) => ExperienceBand::Fifteen,
        None => ExperienceBand::Zero3,
    }
}

fn row_to_result_item(
    row: CandidateRow,
    scored: ScoredResult,
    match_reasons: Vec<String>,
    role_type: RoleType,
    weights: &crate::scoring::weights::WeightConfig,
) -> ResultItem {
    ResultItem {
        candidate_id: row.candidate_id,
        score: scored.final_score,
        vector_score: row.vector_score,
        text_score: row.text_score,
        rrf_score: if row.rrf_score > 0.0 { Some(row.rrf_score) } else { None },
        confidence: row.analysis_confidence,
        full_name: Some(row.full_name),
        title: Some(row.title),
        headline: row.headline,
        location: row.location,
        country: row.country,
        years_experience: row.years_experience,
        skills: Some(row.skills),
        industries: Some(row.industries),
        education_institutions: row
            .profile
            .get("education_institutions")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|x| x.as_str().map(String::from)).collect()),
        graduation_year: row.profile.get("graduation_year").and_then(|v| v.as_u64()).map(|v| v as u32),
        match_reasons,
        signal_scores: Some(scored.signal_scores),
        weights_applied: Some(weights.clone().into_iter().collect::<HashMap<String, f32>>()),
        ml_trajectory: None,
        role_type: format!("{:?}", role_type).to_lowercase(),
        compliance: row.compliance,
        rationale: None,
        anonymized: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_brazil_from_city_name() {
        assert_eq!(detect_country("Vaga para engenheiro em São Paulo"), Some("Brazil".to_string()));
    }

    #[test]
    fn detects_us_from_city_name() {
        assert_eq!(detect_country("Role based in New York"), Some("United States".to_string()));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(detect_country("Remote role, no location specified"), None);
    }

    #[test]
    fn cache_key_differs_by_tenant_query() {
        let mut req_a = SearchRequest {
            tenant_id: "t1".into(),
            query: Some("python".into()),
            embedding: None,
            job_description: None,
            jd_hash: None,
            filters: Default::default(),
            limit: 20,
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
        let key_a = response_cache_key(&req_a);
        req_a.query = Some("java".into());
        let key_b = response_cache_key(&req_a);
        assert_ne!(key_a, key_b);
    }
}
