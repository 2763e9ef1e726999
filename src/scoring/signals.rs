// src/scoring/signals.rs
// Pure per-candidate signal calculators, each returning a value in [0,1].
// Grounded in the teacher's calculate_recency_score/calculate_similarity_score
// grouping (memory/features/recall_engine/scoring/composite_scorer.rs).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::nlp::synonym_expander::expand_seniority_synonyms;
use crate::ontology::ONTOLOGY;
use crate::vector::clamp_unit;

/// Canonicalizes a skill name through the ontology's alias index when known,
/// falling back to a lowercased literal for skills outside the ontology.
fn canonical_skill(name: &str) -> String {
    ONTOLOGY
        .resolve_skill(name)
        .map(|s| s.id.clone())
        .unwrap_or_else(|| name.trim().to_lowercase())
}

/// Neutral default returned when required context is missing.
pub const NEUTRAL: f32 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct ExperienceEntry {
    pub skill: String,
    pub is_current: bool,
    pub years_since: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyTier {
    Faang,
    Unicorn,
    Startup,
    Other,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyContext {
    pub target_company: Option<String>,
    pub candidate_company: Option<String>,
    pub candidate_tier: Option<CompanyTier>,
    pub target_industries: Vec<String>,
    pub candidate_industries: Vec<String>,
}

/// Exact skill match: fraction of required skills the candidate holds,
/// honoring alias equivalence. 0 when the candidate has no skills at all.
pub fn exact_skill_match(required: &[String], candidate_skills: &[String]) -> f32 {
    if candidate_skills.is_empty() {
        return 0.0;
    }
    if required.is_empty() {
        return NEUTRAL;
    }

    let candidate_canonical: Vec<String> = candidate_skills.iter().map(|s| canonical_skill(s)).collect();
    let matched = required
        .iter()
        .filter(|req| {
            let req_canonical = canonical_skill(req);
            candidate_canonical.iter().any(|c| *c == req_canonical)
        })
        .count();

    clamp_unit(matched as f32 / required.len() as f32)
}

/// Directional transfer-score rule table. Written literally per rule; an
/// asymmetric pair (e.g. Vue->React listed without assuming React->Vue
/// carries the same score) is intentional — see DESIGN.md Open Questions.
const TRANSFER_RULES: &[(&str, &str, f32)] = &[
    ("vue", "react", 0.75),
    ("react", "vue", 0.75),
    ("java", "kotlin", 0.90),
    ("kotlin", "java", 0.85),
    ("typescript", "javascript", 0.95),
    ("javascript", "typescript", 0.80),
    ("python", "go", 0.60),
    ("go", "python", 0.55),
    ("aws", "gcp", 0.70),
    ("gcp", "aws", 0.70),
    ("aws", "azure", 0.65),
    ("azure", "aws", 0.65),
    ("mysql", "postgresql", 0.85),
    ("postgresql", "mysql", 0.85),
    ("angular", "react", 0.70),
    ("react", "angular", 0.65),
    ("tensorflow", "pytorch", 0.80),
    ("pytorch", "tensorflow", 0.80),
];

fn transfer_score(required_skill: &str, candidate_skills: &[String]) -> Option<f32> {
    let required_lower = required_skill.to_lowercase();
    for candidate in candidate_skills {
        let candidate_lower = candidate.to_lowercase();
        if let Some((_, _, score)) = TRANSFER_RULES
            .iter()
            .find(|(from, to, _)| *from == required_lower && *to == candidate_lower)
        {
            return Some(*score);
        }
    }
    None
}

/// Inferred skill match: for required skills not exactly matched, look up
/// the first matching transfer rule. Score = mean(matched transfer scores) x
/// (matches / required).
pub fn inferred_skill_match(required: &[String], candidate_skills: &[String]) -> f32 {
    if required.is_empty() || candidate_skills.is_empty() {
        return NEUTRAL;
    }

    let candidate_lower: Vec<String> = candidate_skills.iter().map(|s| s.to_lowercase()).collect();
    let unmatched: Vec<&String> = required
        .iter()
        .filter(|req| !candidate_lower.contains(&req.to_lowercase()))
        .collect();

    if unmatched.is_empty() {
        return NEUTRAL;
    }

    let mut transfer_scores = Vec::new();
    for req in &unmatched {
        if let Some(score) = transfer_score(req, candidate_skills) {
            transfer_scores.push(score);
        }
    }

    if transfer_scores.is_empty() {
        return 0.0;
    }

    let mean: f32 = transfer_scores.iter().sum::<f32>() / transfer_scores.len() as f32;
    let match_fraction = transfer_scores.len() as f32 / required.len() as f32;
    clamp_unit(mean * match_fraction)
}

/// Seniority alignment via distance in an extended hierarchy (technical
/// track 0-6, management track 7-13). Company tier shifts the candidate's
/// effective level by +1 (FAANG), 0 (unicorn), -1 (startup).
pub fn seniority_alignment(
    required_level_idx: i32,
    candidate_level_idx: i32,
    candidate_tier: Option<CompanyTier>,
) -> f32 {
    let tier_shift = match candidate_tier {
        Some(CompanyTier::Faang) => 1,
        Some(CompanyTier::Unicorn) => 0,
        Some(CompanyTier::Startup) => -1,
        Some(CompanyTier::Other) | None => 0,
    };
    let effective_candidate = candidate_level_idx + tier_shift;
    let distance = (required_level_idx - effective_candidate).abs();

    match distance {
        0 => 1.0,
        1 => 0.8,
        2 => 0.6,
        3 => 0.4,
        _ => 0.2,
    }
}

/// Recency boost: for each required skill, find the most recent experience
/// entry using it; current use scores 1.0, otherwise decay by 0.16/year with
/// a floor of 0.1. Averages across required skills; missing data scores 0.3.
pub fn recency_boost(required: &[String], experience: &[ExperienceEntry]) -> f32 {
    if experience.is_empty() {
        return 0.3;
    }
    if required.is_empty() {
        return NEUTRAL;
    }

    let mut scores = Vec::new();
    for skill in required {
        let skill_lower = skill.to_lowercase();
        let most_recent = experience
            .iter()
            .filter(|e| e.skill.to_lowercase() == skill_lower)
            .min_by(|a, b| a.years_since.partial_cmp(&b.years_since).unwrap());

        let score = match most_recent {
            Some(entry) if entry.is_current => 1.0,
            Some(entry) => (1.0 - 0.16 * entry.years_since).max(0.1),
            None => 0.3,
        };
        scores.push(score);
    }

    clamp_unit(scores.iter().sum::<f32>() / scores.len() as f32)
}

/// Average of up to three signals (target-company match, tier score,
/// industry match); each enabled only when its target context is present.
pub fn company_relevance(ctx: &CompanyContext) -> f32 {
    let mut components = Vec::new();

    if let (Some(target), Some(candidate)) = (&ctx.target_company, &ctx.candidate_company) {
        components.push(if target.to_lowercase() == candidate.to_lowercase() {
            1.0
        } else {
            0.0
        });
    }

    if let Some(tier) = ctx.candidate_tier {
        components.push(match tier {
            CompanyTier::Faang => 1.0,
            CompanyTier::Unicorn => 0.8,
            CompanyTier::Startup => 0.6,
            CompanyTier::Other => 0.4,
        });
    }

    if !ctx.target_industries.is_empty() && !ctx.candidate_industries.is_empty() {
        let target_lower: Vec<String> = ctx.target_industries.iter().map(|s| s.to_lowercase()).collect();
        let overlap = ctx
            .candidate_industries
            .iter()
            .any(|i| target_lower.contains(&i.to_lowercase()));
        components.push(if overlap { 1.0 } else { 0.0 });
    }

    if components.is_empty() {
        return NEUTRAL;
    }

    clamp_unit(components.iter().sum::<f32>() / components.len() as f32)
}

/// Normalized title-level lookup table. Unknown titles map to -1 and are
/// excluded from level-distance computations by callers.
static TITLE_PATTERNS: Lazy<Vec<(Regex, i32)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)\bintern\b").unwrap(), 0),
        (Regex::new(r"(?i)\bjunior\b|\bjr\b").unwrap(), 1),
        (Regex::new(r"(?i)\bassociate\b").unwrap(), 2),
        (Regex::new(r"(?i)\bsenior\b|\bsr\b").unwrap(), 3),
        (Regex::new(r"(?i)\bstaff\b").unwrap(), 4),
        (Regex::new(r"(?i)\bprincipal\b").unwrap(), 5),
        (Regex::new(r"(?i)\blead\b").unwrap(), 6),
        (Regex::new(r"(?i)\bmanager\b").unwrap(), 7),
        (Regex::new(r"(?i)\bsenior manager\b").unwrap(), 8),
        (Regex::new(r"(?i)\bdirector\b").unwrap(), 9),
        (Regex::new(r"(?i)\bsenior director\b").unwrap(), 10),
        (Regex::new(r"(?i)\bvp\b|\bvice president\b").unwrap(), 11),
        (Regex::new(r"(?i)\bsvp\b").unwrap(), 12),
        (Regex::new(r"(?i)\bcto\b|\bceo\b|\bcio\b|\bc-level\b").unwrap(), 13),
    ]
});

pub fn normalize_title_to_level(title: &str) -> i32 {
    TITLE_PATTERNS
        .iter()
        .rev()
        .find(|(pattern, _)| pattern.is_match(title))
        .map(|(_, level)| *level)
        .unwrap_or(-1)
}

/// Maps a required-seniority term to its index on the extended hierarchy,
/// reusing the seniority synonym table's canonical ordering.
pub fn seniority_term_to_level(term: &str) -> i32 {
    let resolved = expand_seniority_synonyms(term, false);
    let mut levels: HashMap<&str, i32> = HashMap::new();
    levels.insert("intern", 0);
    levels.insert("junior", 1);
    levels.insert("mid", 2);
    levels.insert("senior", 3);
    levels.insert("staff", 4);
    levels.insert("principal", 5);
    levels.insert("lead", 6);
    levels.insert("manager", 7);
    levels.insert("director", 9);
    levels.insert("vp", 11);
    levels.insert("c-level", 13);

    resolved
        .iter()
        .find_map(|t| levels.get(t.as_str()).copied())
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_counts_aliases_case_insensitively() {
        let required = vec!["Python".to_string(), "Django".to_string()];
        let candidate = vec!["python".to_string(), "django".to_string()];
        assert_eq!(exact_skill_match(&required, &candidate), 1.0);
    }

    #[test]
    fn exact_match_zero_when_candidate_has_no_skills() {
        assert_eq!(exact_skill_match(&["python".to_string()], &[]), 0.0);
    }

    #[test]
    fn exact_match_honors_ontology_aliases() {
        let required = vec!["javascript".to_string(), "kubernetes".to_string()];
        let candidate = vec!["js".to_string(), "k8s".to_string()];
        assert_eq!(exact_skill_match(&required, &candidate), 1.0);
    }

    #[test]
    fn inferred_match_applies_transfer_rule() {
        let required = vec!["react".to_string()];
        let candidate = vec!["vue".to_string()];
        let score = inferred_skill_match(&required, &candidate);
        assert!((score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn seniority_alignment_perfect_match_is_one() {
        assert_eq!(seniority_alignment(3, 3, None), 1.0);
    }

    #[test]
    fn seniority_alignment_faang_shifts_effective_level() {
        // required=4 (staff), candidate raw level=3 (senior) but FAANG shifts +1 => distance 0
        assert_eq!(seniority_alignment(4, 3, Some(CompanyTier::Faang)), 1.0);
    }

    #[test]
    fn recency_boost_missing_data_is_below_neutral() {
        assert_eq!(recency_boost(&["python".to_string()], &[]), 0.3);
    }

    #[test]
    fn recency_boost_current_use_is_one() {
        let exp = vec![ExperienceEntry {
            skill: "python".into(),
            is_current: true,
            years_since: 0.0,
        }];
        assert_eq!(recency_boost(&["python".to_string()], &exp), 1.0);
    }

    #[test]
    fn company_relevance_neutral_without_context() {
        assert_eq!(company_relevance(&CompanyContext::default()), NEUTRAL);
    }

    #[test]
    fn unknown_title_maps_to_negative_one() {
        assert_eq!(normalize_title_to_level("Chief Vibes Officer"), -1);
    }

    #[test]
    fn known_title_maps_to_expected_level() {
        assert_eq!(normalize_title_to_level("Senior Software Engineer"), 3);
        assert_eq!(normalize_title_to_level("Engineering Manager"), 7);
    }
}
