// src/models.rs
// Core data model shared across the store, scoring, orchestrator, bias, and
// API modules. Rust representation notes: identifiers are newtype-free
// `String`s (the teacher mixes `String` and `Uuid` per entity; candidate and
// tenant ids here are caller-supplied opaque strings, not generated UUIDs).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type TenantId = String;
pub type CandidateId = String;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub seniority_levels: Vec<String>,
    #[serde(default)]
    pub min_experience_years: Option<u32>,
    #[serde(default)]
    pub max_experience_years: Option<u32>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTypeRequest {
    Executive,
    Manager,
    Ic,
    Default,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub tenant_id: TenantId,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub jd_hash: Option<String>,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub include_debug: bool,
    #[serde(default)]
    pub role_type: Option<String>,
    #[serde(default)]
    pub signal_weights: Option<HashMap<String, f32>>,
    #[serde(default = "default_true")]
    pub enable_nlp: bool,
    #[serde(default)]
    pub nlp_confidence_threshold: Option<f32>,
    #[serde(default)]
    pub anonymize: bool,
    #[serde(default)]
    pub include_match_rationale: bool,
    #[serde(default)]
    pub rationale_limit: Option<u32>,
}

fn default_limit() -> u32 {
    20
}

fn default_true() -> bool {
    true
}

impl SearchRequest {
    /// Invariant: at least one of {query, embedding, jobDescription} is present.
    pub fn has_search_input(&self) -> bool {
        self.query.as_ref().is_some_and(|q| !q.trim().is_empty())
            || self.embedding.is_some()
            || self.job_description.as_ref().is_some_and(|j| !j.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compliance {
    pub legal_basis: Option<String>,
    pub consent_record: Option<String>,
    pub transfer_mechanism: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRow {
    pub candidate_id: CandidateId,
    pub tenant_id: TenantId,
    pub full_name: String,
    pub title: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub industries: Vec<String>,
    pub skills: Vec<String>,
    pub years_experience: Option<f32>,
    pub analysis_confidence: f32,
    pub profile: serde_json::Value,
    pub compliance: Compliance,
    pub vector_score: f32,
    pub text_score: f32,
    pub vector_rank: Option<i64>,
    pub text_rank: Option<i64>,
    pub rrf_score: f64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalScores {
    pub vector_similarity: f32,
    pub level_match: f32,
    pub specialty_match: f32,
    pub tech_stack_match: f32,
    pub function_match: f32,
    pub trajectory_fit: f32,
    /// A proxy signal (spec §4.17); `None` once stripped so it is absent
    /// from the serialized response rather than zeroed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_pedigree: Option<f32>,
    pub skills_exact_match: Option<f32>,
    pub skills_inferred: Option<f32>,
    pub seniority_alignment: Option<f32>,
    pub recency_boost: Option<f32>,
    pub company_relevance: Option<f32>,
    pub skills_match: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlTrajectoryBlock {
    pub direction: String,
    pub velocity: String,
    pub trajectory_type: String,
    pub fit_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub candidate_id: CandidateId,
    pub score: f32,
    pub vector_score: f32,
    pub text_score: f32,
    pub rrf_score: Option<f64>,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub years_experience: Option<f32>,
    pub skills: Option<Vec<String>>,
    pub industries: Option<Vec<String>>,
    /// Proxy field (spec §4.17); stripped to `None` under anonymization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_institutions: Option<Vec<String>>,
    /// Proxy field (spec §4.17); stripped to `None` under anonymization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<u32>,
    pub match_reasons: Vec<String>,
    pub signal_scores: Option<SignalScores>,
    pub weights_applied: Option<HashMap<String, f32>>,
    pub ml_trajectory: Option<MlTrajectoryBlock>,
    pub role_type: String,
    pub compliance: Compliance,
    pub rationale: Option<String>,
    pub anonymized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionEventType {
    Shown,
    Clicked,
    Shortlisted,
    Contacted,
    Interviewed,
    Hired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyTierBand {
    Faang,
    Enterprise,
    Startup,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperienceBand {
    #[serde(rename = "0-3")]
    Zero3,
    #[serde(rename = "3-7")]
    Three7,
    #[serde(rename = "7-15")]
    Seven15,
    #[serde(rename = "15+")]
    Fifteen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Frontend,
    Backend,
    Fullstack,
    Devops,
    Data,
    Ml,
    Mobile,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferredDimensions {
    pub company_tier: CompanyTierBand,
    pub experience_band: ExperienceBand,
    pub specialty: Specialty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversityWarningDto {
    pub dimension: String,
    pub dominant_group: String,
    pub concentration_pct: f64,
    pub severity: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversitySummary {
    pub diversity_score: f64,
    pub warnings: Vec<DiversityWarningDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub parse_method: String,
    pub intent: String,
    pub role_type: String,
    pub anonymized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymized_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diversity: Option<DiversitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_detected_country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<ResultItem>,
    pub total: usize,
    pub cache_hit: bool,
    pub request_id: String,
    pub timings: HashMap<String, u64>,
    pub metadata: ResponseMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEvent {
    pub event_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub tenant_id: TenantId,
    pub search_id: String,
    pub user_id_hash: String,
    pub candidate_id: CandidateId,
    pub event_type: SelectionEventType,
    pub inferred: InferredDimensions,
    pub rank: Option<u32>,
    pub score: Option<f32>,
}
