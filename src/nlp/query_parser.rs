// src/nlp/query_parser.rs
// Orchestrates intent routing, entity extraction, ontology expansion, and
// synonym expansion into a single ParsedQuery, measuring each stage.
// Grounded in the teacher's staged orchestration
// (memory/features/recall_engine/mod.rs::RecallEngine).

use std::collections::HashMap;
use std::time::Instant;

use super::entity_extractor::{CachedEntityExtractor, EntityExtractor, EntityRecord};
use super::intent_router::{Intent, IntentClassification, IntentRouter};
use super::query_expander::QueryExpander;
use super::synonym_expander::{expand_role_synonyms, expand_seniority_synonyms};
use crate::ontology::SkillsOntology;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ParseMethod {
    Nlp,
    KeywordFallback,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SemanticExpansion {
    pub expanded_roles: Vec<String>,
    pub expanded_seniorities: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParsedQuery {
    pub parse_method: ParseMethod,
    pub confidence: f32,
    pub intent: Intent,
    pub entities: EntityRecord,
    pub expanded_skills: Vec<String>,
    pub semantic_expansion: SemanticExpansion,
    pub timings: HashMap<String, u64>,
}

impl ParsedQuery {
    fn fallback(confidence: f32) -> Self {
        Self {
            parse_method: ParseMethod::KeywordFallback,
            confidence,
            intent: Intent::KeywordFallback,
            entities: EntityRecord::default(),
            expanded_skills: Vec::new(),
            semantic_expansion: SemanticExpansion::default(),
            timings: HashMap::new(),
        }
    }
}

pub struct QueryParser<X: EntityExtractor> {
    intent_router: std::sync::Arc<IntentRouter>,
    entity_extractor: CachedEntityExtractor<X>,
    ontology: &'static SkillsOntology,
    expansion_depth: usize,
    expansion_min_confidence: f32,
    expansion_decay: f32,
    expansion_cap: usize,
    intent_confidence_threshold: f32,
}

impl<X: EntityExtractor> QueryParser<X> {
    pub fn new(
        intent_router: std::sync::Arc<IntentRouter>,
        entity_extractor: CachedEntityExtractor<X>,
        ontology: &'static SkillsOntology,
        expansion_depth: usize,
        expansion_min_confidence: f32,
        expansion_decay: f32,
        expansion_cap: usize,
        intent_confidence_threshold: f32,
    ) -> Self {
        Self {
            intent_router,
            entity_extractor,
            ontology,
            expansion_depth,
            expansion_min_confidence,
            expansion_decay,
            expansion_cap,
            intent_confidence_threshold,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.intent_router.is_initialized()
    }

    pub async fn initialize(&self) -> crate::error::SearchResult<()> {
        self.intent_router.initialize().await
    }

    /// The embedding-independent half of parsing: entity extraction plus
    /// ontology/synonym expansion. Has no dependency on the query embedding,
    /// so the orchestrator runs this concurrently with embedding generation
    /// via `tokio::try_join!` rather than awaiting it after the embedding
    /// resolves, per spec.md §5's one documented parallel pair.
    pub async fn extract_and_expand(&self, original_query: &str) -> ExtractionResult {
        let mut timings = HashMap::new();

        let extract_start = Instant::now();
        let entities = self.entity_extractor.extract(original_query).await;
        timings.insert("entities".to_string(), extract_start.elapsed().as_millis() as u64);

        let expand_start = Instant::now();
        let expander = QueryExpander::new(
            self.ontology,
            self.expansion_depth,
            self.expansion_min_confidence,
            self.expansion_decay,
            self.expansion_cap,
        );
        let expanded = expander.expand_skills(&entities.skills);
        timings.insert("ontology_expansion".to_string(), expand_start.elapsed().as_millis() as u64);

        let synonym_start = Instant::now();
        let mut expanded_roles: Vec<String> = Vec::new();
        if let Some(role) = &entities.role {
            expanded_roles = expand_role_synonyms(role).into_iter().collect();
        }
        let mut expanded_seniorities: Vec<String> = Vec::new();
        if let Some(seniority) = &entities.seniority {
            expanded_seniorities = expand_seniority_synonyms(seniority, true).into_iter().collect();
        }
        timings.insert("synonym_expansion".to_string(), synonym_start.elapsed().as_millis() as u64);

        ExtractionResult {
            entities,
            expanded_skills: expanded.into_iter().map(|e| e.skill_name).collect(),
            semantic_expansion: SemanticExpansion {
                expanded_roles,
                expanded_seniorities,
            },
            timings,
        }
    }

    /// The embedding-dependent half: intent classification. Returns the
    /// classification plus its own stage timing so the caller can merge it
    /// into the combined `ParsedQuery` timings after `combine`.
    pub async fn classify(&self, query_embedding: &[f32]) -> (IntentClassification, u64) {
        let classify_start = Instant::now();
        let classification = self.intent_router.classify(query_embedding).await;
        (classification, classify_start.elapsed().as_millis() as u64)
    }

    /// Combines a classification with an (already computed) extraction
    /// result. Falls back to keyword search, discarding the extraction, when
    /// classification confidence is below threshold.
    pub fn combine(
        &self,
        classification: IntentClassification,
        intent_ms: u64,
        extracted: ExtractionResult,
    ) -> ParsedQuery {
        if classification.intent == Intent::KeywordFallback
            || classification.confidence < self.intent_confidence_threshold
        {
            let mut result = ParsedQuery::fallback(classification.confidence.min(0.3));
            result.timings.insert("intent".to_string(), intent_ms);
            return result;
        }

        let mut timings = extracted.timings;
        timings.insert("intent".to_string(), intent_ms);

        ParsedQuery {
            parse_method: ParseMethod::Nlp,
            confidence: classification.confidence,
            intent: classification.intent,
            entities: extracted.entities,
            expanded_skills: extracted.expanded_skills,
            semantic_expansion: extracted.semantic_expansion,
            timings,
        }
    }

    /// Sequential convenience wrapper over `extract_and_expand` +
    /// `classify` + `combine`, for callers that don't need the two halves
    /// run concurrently (e.g. tests exercising the parser in isolation).
    /// `query_embedding` must already be computed by the caller (the search
    /// orchestrator obtains it once, before calling the parser, per
    /// spec.md §4.16 step 4 — the parser never issues its own embedding call).
    pub async fn parse(&self, original_query: &str, query_embedding: &[f32]) -> ParsedQuery {
        let (classification, intent_ms) = self.classify(query_embedding).await;
        let extracted = self.extract_and_expand(original_query).await;
        self.combine(classification, intent_ms, extracted)
    }
}

/// Output of the embedding-independent half of parsing.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub entities: EntityRecord,
    pub expanded_skills: Vec<String>,
    pub semantic_expansion: SemanticExpansion,
    pub timings: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::entity_extractor::EntityExtractor as _;
    use crate::nlp::intent_router::Embedder;
    use crate::ontology::ONTOLOGY;
    use async_trait::async_trait;

    struct StubEmbedder;
    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> crate::error::SearchResult<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct StubExtractor;
    #[async_trait]
    impl EntityExtractor for StubExtractor {
        async fn extract_raw(&self, _q: &str) -> crate::error::SearchResult<EntityRecord> {
            Ok(EntityRecord {
                role: Some("developer".into()),
                skills: vec!["python".into()],
                seniority: Some("senior".into()),
                location: None,
                remote: None,
                experience_years_min: Some(5),
                experience_years_max: None,
            })
        }
    }

    fn make_parser() -> QueryParser<StubExtractor> {
        let router = std::sync::Arc::new(IntentRouter::new(std::sync::Arc::new(StubEmbedder), 0.5));
        let extractor = CachedEntityExtractor::new(StubExtractor, 1_000);
        QueryParser::new(router, extractor, &ONTOLOGY, 1, 0.8, 0.6, 25, 0.5)
    }

    #[tokio::test]
    async fn nlp_path_populates_expansions() {
        let parser = make_parser();
        let parsed = parser.parse("senior python developer", &[1.0, 0.0]).await;
        assert!(matches!(parsed.parse_method, ParseMethod::Nlp));
        assert!(parsed.expanded_skills.iter().any(|s| s == "django"));
        assert!(parsed.semantic_expansion.expanded_seniorities.contains(&"staff".to_string()));
    }

    #[tokio::test]
    async fn low_confidence_embedding_degrades_to_fallback() {
        let parser = make_parser();
        let parsed = parser.parse("asdfasdf", &[0.0, 1.0]).await;
        assert!(matches!(parsed.parse_method, ParseMethod::KeywordFallback));
        assert!(parsed.confidence <= 0.3);
        assert!(parsed.entities.is_empty());
    }

    #[tokio::test]
    async fn split_stages_run_concurrently_and_combine_matches_sequential_parse() {
        let parser = make_parser();
        let (extraction, (classification, intent_ms)) = tokio::join!(
            parser.extract_and_expand("senior python developer"),
            parser.classify(&[1.0, 0.0]),
        );
        let parsed = parser.combine(classification, intent_ms, extraction);
        assert!(matches!(parsed.parse_method, ParseMethod::Nlp));
        assert!(parsed.expanded_skills.iter().any(|s| s == "django"));
        assert!(parsed.semantic_expansion.expanded_seniorities.contains(&"staff".to_string()));
    }

    #[tokio::test]
    async fn combine_discards_extraction_on_fallback() {
        let parser = make_parser();
        let extraction = parser.extract_and_expand("senior python developer").await;
        let (classification, intent_ms) = parser.classify(&[0.0, 1.0]).await;
        let parsed = parser.combine(classification, intent_ms, extraction);
        assert!(matches!(parsed.parse_method, ParseMethod::KeywordFallback));
        assert!(parsed.entities.is_empty());
    }
}
