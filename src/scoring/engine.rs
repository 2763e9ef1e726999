// src/scoring/engine.rs
// Combines base + contextual signals with resolved weights into a final,
// clamped score. Grounded in composite_scorer.rs::score_entries, adapted to
// operate on one row per call since rows need per-row signal context the
// teacher's batched scorer didn't need.

use std::collections::HashMap;

use super::signals::{
    company_relevance, exact_skill_match, inferred_skill_match, recency_boost,
    seniority_alignment, seniority_term_to_level, CompanyContext, ExperienceEntry, NEUTRAL,
};
use super::trajectory::{classify_trajectory, trajectory_fit, JobTrajectoryContext, TitleEvent};
use super::weights::WeightConfig;
use crate::models::{CandidateRow, SignalScores};
use crate::vector::clamp_unit;

const ANALYSIS_CONFIDENCE_FLOOR: f32 = 0.6;
const CONFIDENCE_PENALTY_FACTOR: f32 = 0.9;
const SKILL_COVERAGE_BONUS_FACTOR: f32 = 0.1;

/// Per-request context needed to compute the six contextual signals; absent
/// when the request supplies no structured filters (vector-only similarity
/// search), in which case only base/profile signals are used.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    pub required_skills: Vec<String>,
    pub required_seniority: Option<String>,
    pub candidate_title_sequence: Vec<TitleEvent>,
    pub candidate_experience: Vec<ExperienceEntry>,
    pub company_context: CompanyContext,
    pub job_trajectory_context: JobTrajectoryContext,
}

#[derive(Debug, Clone)]
pub struct ScoredResult {
    pub final_score: f32,
    pub signal_scores: SignalScores,
}

pub struct ScoringEngine;

impl ScoringEngine {
    pub fn score(row: &CandidateRow, weights: &WeightConfig, ctx: Option<&SearchContext>) -> ScoredResult {
        let mut signals = base_signals(row);

        if let Some(ctx) = ctx {
            apply_contextual_signals(&mut signals, row, ctx);
        }

        let signal_map = signal_map(&signals);
        let weighted_score: f32 = weights
            .iter()
            .filter_map(|(name, weight)| signal_map.get(name.as_str()).map(|value| value * weight))
            .sum();

        let mut final_score = weighted_score;

        if let Some(ctx) = ctx {
            if !ctx.required_skills.is_empty() {
                let candidate_lower: Vec<String> = row.skills.iter().map(|s| s.to_lowercase()).collect();
                let matched = ctx
                    .required_skills
                    .iter()
                    .filter(|s| candidate_lower.contains(&s.to_lowercase()))
                    .count();
                let coverage = matched as f32 / ctx.required_skills.len() as f32;
                final_score += coverage * SKILL_COVERAGE_BONUS_FACTOR;
            }
        }

        if row.analysis_confidence < ANALYSIS_CONFIDENCE_FLOOR {
            final_score *= CONFIDENCE_PENALTY_FACTOR;
        }

        ScoredResult {
            final_score: clamp_unit(final_score),
            signal_scores: signals,
        }
    }
}

fn base_signals(row: &CandidateRow) -> SignalScores {
    let vector_similarity = if row.vector_score > 1.0 {
        clamp_unit(row.vector_score / 100.0)
    } else {
        clamp_unit(row.vector_score)
    };

    let profile = &row.profile;
    let metadata_f32 = |key: &str| -> f32 {
        profile
            .get(key)
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(NEUTRAL)
    };

    SignalScores {
        vector_similarity,
        level_match: metadata_f32("level_match"),
        specialty_match: metadata_f32("specialty_match"),
        tech_stack_match: metadata_f32("tech_stack_match"),
        function_match: metadata_f32("function_match"),
        trajectory_fit: metadata_f32("trajectory_fit"),
        company_pedigree: Some(metadata_f32("company_pedigree")),
        skills_exact_match: None,
        skills_inferred: None,
        seniority_alignment: None,
        recency_boost: None,
        company_relevance: None,
        skills_match: None,
    }
}

fn apply_contextual_signals(signals: &mut SignalScores, row: &CandidateRow, ctx: &SearchContext) {
    signals.skills_exact_match = Some(exact_skill_match(&ctx.required_skills, &row.skills));
    signals.skills_inferred = Some(inferred_skill_match(&ctx.required_skills, &row.skills));
    signals.recency_boost = Some(recency_boost(&ctx.required_skills, &ctx.candidate_experience));
    signals.company_relevance = Some(company_relevance(&ctx.company_context));

    if let Some(required) = &ctx.required_seniority {
        let required_level = seniority_term_to_level(required);
        let candidate_level = super::signals::normalize_title_to_level(&row.title);
        if required_level >= 0 && candidate_level >= 0 {
            signals.seniority_alignment = Some(seniority_alignment(
                required_level,
                candidate_level,
                ctx.company_context.candidate_tier,
            ));
        }
    }

    // Trajectory fit overrides the metadata value when the title sequence has >=2 entries.
    if ctx.candidate_title_sequence.len() >= 2 {
        let trajectory = classify_trajectory(&ctx.candidate_title_sequence);
        signals.trajectory_fit = trajectory_fit(trajectory.as_ref(), &ctx.job_trajectory_context);
    }
}

fn signal_map(signals: &SignalScores) -> HashMap<&'static str, f32> {
    let mut map = HashMap::new();
    map.insert("vector_similarity", signals.vector_similarity);
    map.insert("level_match", signals.level_match);
    map.insert("specialty_match", signals.specialty_match);
    map.insert("tech_stack_match", signals.tech_stack_match);
    map.insert("function_match", signals.function_match);
    map.insert("trajectory_fit", signals.trajectory_fit);
    if let Some(v) = signals.company_pedigree {
        map.insert("company_pedigree", v);
    }
    if let Some(v) = signals.skills_exact_match {
        map.insert("exact_skill_match", v);
    }
    if let Some(v) = signals.skills_inferred {
        map.insert("inferred_skill_match", v);
    }
    if let Some(v) = signals.seniority_alignment {
        map.insert("seniority_alignment", v);
    }
    if let Some(v) = signals.recency_boost {
        map.insert("recency_boost", v);
    }
    if let Some(v) = signals.company_relevance {
        map.insert("company_relevance", v);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Compliance;
    use crate::scoring::weights::{RoleType, WeightResolver};
    use chrono::Utc;

    fn sample_row() -> CandidateRow {
        CandidateRow {
            candidate_id: "c1".into(),
            tenant_id: "t1".into(),
            full_name: "Jane Doe".into(),
            title: "Senior Software Engineer".into(),
            headline: None,
            location: None,
            country: None,
            industries: vec![],
            skills: vec!["python".into(), "django".into()],
            years_experience: Some(6.0),
            analysis_confidence: 0.9,
            profile: serde_json::json!({}),
            compliance: Compliance::default(),
            vector_score: 0.8,
            text_score: 0.0,
            vector_rank: Some(1),
            text_rank: None,
            rrf_score: 0.0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn score_is_always_in_unit_range() {
        let row = sample_row();
        let weights = WeightResolver::resolve(RoleType::Default, None);
        let result = ScoringEngine::score(&row, &weights, None);
        assert!(result.final_score >= 0.0 && result.final_score <= 1.0);
    }

    #[test]
    fn vector_score_above_one_is_rescaled() {
        let mut row = sample_row();
        row.vector_score = 85.0;
        let weights = WeightResolver::resolve(RoleType::Default, None);
        let result = ScoringEngine::score(&row, &weights, None);
        assert!((result.signal_scores.vector_similarity - 0.85).abs() < 1e-6);
    }

    #[test]
    fn low_confidence_applies_penalty() {
        let mut row = sample_row();
        row.analysis_confidence = 0.4;
        let weights = WeightResolver::resolve(RoleType::Default, None);
        let with_penalty = ScoringEngine::score(&row, &weights, None).final_score;
        row.analysis_confidence = 0.9;
        let without_penalty = ScoringEngine::score(&row, &weights, None).final_score;
        assert!(with_penalty <= without_penalty);
    }

    #[test]
    fn context_signals_populate_when_provided() {
        let row = sample_row();
        let ctx = SearchContext {
            required_skills: vec!["python".into()],
            ..Default::default()
        };
        let weights = WeightResolver::resolve(RoleType::Default, None);
        let result = ScoringEngine::score(&row, &weights, Some(&ctx));
        assert!(result.signal_scores.skills_exact_match.is_some());
    }
}
