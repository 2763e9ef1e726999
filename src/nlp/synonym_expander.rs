// src/nlp/synonym_expander.rs
// Hard-coded EN+PT seniority/role synonym maps. Pure, stateless functions,
// grounded in the teacher's `&'static [&'static str]` constant-table idiom
// (llm/router/classifier.rs's FAST_TOOLS tables).

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeniorityLevel {
    Intern,
    Junior,
    Mid,
    Senior,
    Staff,
    Principal,
    Lead,
    Manager,
    Director,
    Vp,
    CLevel,
}

impl SeniorityLevel {
    const ORDER: &'static [SeniorityLevel] = &[
        SeniorityLevel::Intern,
        SeniorityLevel::Junior,
        SeniorityLevel::Mid,
        SeniorityLevel::Senior,
        SeniorityLevel::Staff,
        SeniorityLevel::Principal,
        SeniorityLevel::Lead,
        SeniorityLevel::Manager,
        SeniorityLevel::Director,
        SeniorityLevel::Vp,
        SeniorityLevel::CLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intern => "intern",
            Self::Junior => "junior",
            Self::Mid => "mid",
            Self::Senior => "senior",
            Self::Staff => "staff",
            Self::Principal => "principal",
            Self::Lead => "lead",
            Self::Manager => "manager",
            Self::Director => "director",
            Self::Vp => "vp",
            Self::CLevel => "c-level",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ORDER
            .iter()
            .copied()
            .find(|level| level.as_str() == normalized)
    }

    fn higher_levels(self) -> Vec<SeniorityLevel> {
        Self::ORDER
            .iter()
            .copied()
            .filter(|level| *level > self)
            .collect()
    }
}

/// EN+PT seniority synonym table. Each entry lists near-synonyms that refer
/// to roughly the same level without being a strict hierarchy neighbor.
const SENIORITY_SYNONYMS: &[(SeniorityLevel, &[&str])] = &[
    (SeniorityLevel::Intern, &["estagiario", "estagiaria", "trainee"]),
    (SeniorityLevel::Junior, &["junior", "jr", "pleno junior"]),
    (SeniorityLevel::Mid, &["pleno", "mid-level", "midlevel"]),
    (SeniorityLevel::Senior, &["senior", "sr", "senior-level"]),
    (SeniorityLevel::Staff, &["staff engineer"]),
    (SeniorityLevel::Principal, &["principal engineer", "especialista"]),
    (SeniorityLevel::Lead, &["lead", "tech lead", "lider tecnico"]),
    (SeniorityLevel::Manager, &["manager", "gerente", "engineering manager"]),
    (SeniorityLevel::Director, &["director", "diretor", "diretora"]),
    (SeniorityLevel::Vp, &["vp", "vice president", "vice-presidente"]),
    (SeniorityLevel::CLevel, &["cto", "ceo", "cio", "c-level", "executive"]),
];

/// Role interchangeable-title map, EN+PT. Directional: key role expands to
/// the listed titles (not necessarily symmetric).
const ROLE_SYNONYMS: &[(&str, &[&str])] = &[
    ("developer", &["engineer", "programmer", "desenvolvedor", "desenvolvedora", "software engineer"]),
    ("engineer", &["developer", "engenheiro", "engenheira"]),
    ("data scientist", &["cientista de dados", "ml engineer", "machine learning engineer"]),
    ("designer", &["product designer", "ux designer", "designer de produto"]),
    ("analyst", &["analista", "business analyst"]),
    ("architect", &["solutions architect", "arquiteto", "arquiteta"]),
];

/// Returns the synonym set for a seniority term plus, when
/// `include_higher_levels`, every strictly-higher hierarchy level's canonical
/// name — realizing "Lead engineer matches Senior/Staff/Principal".
pub fn expand_seniority_synonyms(term: &str, include_higher_levels: bool) -> HashSet<String> {
    let mut out = HashSet::new();
    let Some(level) = resolve_seniority(term) else {
        out.insert(term.trim().to_lowercase());
        return out;
    };

    out.insert(level.as_str().to_string());
    for (candidate_level, synonyms) in SENIORITY_SYNONYMS {
        if *candidate_level == level {
            out.extend(synonyms.iter().map(|s| s.to_string()));
        }
    }

    if include_higher_levels {
        for higher in level.higher_levels() {
            out.insert(higher.as_str().to_string());
        }
    }

    out
}

fn resolve_seniority(term: &str) -> Option<SeniorityLevel> {
    let normalized = term.trim().to_lowercase();
    if let Some(level) = SeniorityLevel::from_str_loose(&normalized) {
        return Some(level);
    }
    SENIORITY_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|s| *s == normalized))
        .map(|(level, _)| *level)
}

/// Returns interchangeable role titles for the given role, EN+PT.
pub fn expand_role_synonyms(role: &str) -> HashSet<String> {
    let normalized = role.trim().to_lowercase();
    let mut out = HashSet::new();
    out.insert(normalized.clone());
    if let Some((_, synonyms)) = ROLE_SYNONYMS.iter().find(|(key, _)| *key == normalized) {
        out.extend(synonyms.iter().map(|s| s.to_string()));
    }
    out
}

/// Word-level substitution of known Portuguese seniority/role terms to their
/// canonical English equivalent, run before entity extraction so the LLM
/// prompt is normalized to a single language's terminology.
const PT_TO_EN_TERMS: &[(&str, &str)] = &[
    ("desenvolvedor", "developer"),
    ("desenvolvedora", "developer"),
    ("engenheiro", "engineer"),
    ("engenheira", "engineer"),
    ("gerente", "manager"),
    ("diretor", "director"),
    ("diretora", "director"),
    ("lider tecnico", "tech lead"),
    ("pleno", "mid"),
    ("senior", "senior"),
    ("estagiario", "intern"),
    ("estagiaria", "intern"),
    ("vice-presidente", "vp"),
    ("cientista de dados", "data scientist"),
];

pub fn normalize_pt_terms(text: &str) -> String {
    let mut normalized = text.to_lowercase();
    // Multi-word terms first so they aren't partially shadowed by single-word ones.
    let mut terms: Vec<&(&str, &str)> = PT_TO_EN_TERMS.iter().collect();
    terms.sort_by_key(|(pt, _)| std::cmp::Reverse(pt.len()));
    for (pt, en) in terms {
        normalized = normalized.replace(pt, en);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_expands_to_senior_staff_principal() {
        let expanded = expand_seniority_synonyms("lead", true);
        assert!(expanded.contains("senior"));
        assert!(expanded.contains("staff"));
        assert!(expanded.contains("principal"));
    }

    #[test]
    fn lead_without_higher_levels_excludes_manager() {
        let expanded = expand_seniority_synonyms("lead", false);
        assert!(!expanded.contains("manager"));
        assert!(!expanded.contains("director"));
    }

    #[test]
    fn portuguese_synonym_resolves_to_same_level() {
        let from_pt = expand_seniority_synonyms("gerente", true);
        let from_en = expand_seniority_synonyms("manager", true);
        assert!(from_pt.contains("director"));
        assert_eq!(from_pt.len(), from_en.len());
    }

    #[test]
    fn unknown_term_passes_through_unchanged() {
        let expanded = expand_seniority_synonyms("freelancer", true);
        assert_eq!(expanded, HashSet::from(["freelancer".to_string()]));
    }

    #[test]
    fn developer_role_expands_to_engineer_variants() {
        let expanded = expand_role_synonyms("developer");
        assert!(expanded.contains("engineer"));
        assert!(expanded.contains("desenvolvedor"));
    }

    #[test]
    fn normalizes_portuguese_terms_to_english() {
        let normalized = normalize_pt_terms("desenvolvedora senior em Sao Paulo");
        assert!(normalized.contains("developer"));
        assert!(normalized.contains("senior"));
    }

    #[test]
    fn seniority_ordering_is_total() {
        assert!(SeniorityLevel::Junior < SeniorityLevel::Senior);
        assert!(SeniorityLevel::Senior < SeniorityLevel::Lead);
        assert!(SeniorityLevel::Lead < SeniorityLevel::Manager);
    }
}
