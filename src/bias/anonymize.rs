// src/bias/anonymize.rs
// Field-level redaction for PII and (optionally) proxy fields. Grounded in
// the teacher's precise field-selection transforms (explicit allow-lists
// rather than reflection, same style as its session/result shaping code).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ResultItem;

static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());
/// Heuristic proper-noun matcher: two or more consecutive capitalized words,
/// used to mask likely company/person names out of free-text match reasons.
static PROPER_NOUN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)+)\b").unwrap());

/// Strips always-PII fields, and optionally proxy fields (company pedigree,
/// education institutions, graduation year), from a result. Preserves
/// skills, industries, years of experience, scores, weights, and the ML
/// trajectory block. Generalizes match reasons by masking year numbers and
/// proper-noun pairs.
pub fn strip(mut result: ResultItem, strip_proxy: bool) -> ResultItem {
    result.full_name = None;
    result.title = None;
    result.headline = None;
    result.location = None;
    result.country = None;

    if strip_proxy {
        if let Some(signals) = result.signal_scores.as_mut() {
            signals.company_pedigree = None;
        }
        result.education_institutions = None;
        result.graduation_year = None;
    }

    result.match_reasons = result
        .match_reasons
        .into_iter()
        .map(|reason| generalize_reason(&reason))
        .collect();

    result.anonymized = true;
    result
}

fn generalize_reason(reason: &str) -> String {
    let masked_years = YEAR_PATTERN.replace_all(reason, "[year]");
    PROPER_NOUN_PATTERN.replace_all(&masked_years, "[name]").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Compliance;

    fn sample_result() -> ResultItem {
        ResultItem {
            candidate_id: "c1".into(),
            score: 0.9,
            vector_score: 0.8,
            text_score: 0.1,
            rrf_score: None,
            confidence: 0.9,
            full_name: Some("Jane Doe".into()),
            title: Some("Senior Engineer".into()),
            headline: Some("I build things".into()),
            location: Some("NYC".into()),
            country: Some("US".into()),
            years_experience: Some(6.0),
            skills: Some(vec!["python".into()]),
            industries: Some(vec!["fintech".into()]),
            education_institutions: Some(vec!["State University".into()]),
            graduation_year: Some(2015),
            match_reasons: vec!["Worked at Acme Corp since 2019".into()],
            signal_scores: None,
            weights_applied: None,
            ml_trajectory: None,
            role_type: "default".into(),
            compliance: Compliance::default(),
            rationale: None,
            anonymized: false,
        }
    }

    #[test]
    fn strips_pii_fields() {
        let stripped = strip(sample_result(), false);
        assert!(stripped.full_name.is_none());
        assert!(stripped.title.is_none());
        assert!(stripped.headline.is_none());
        assert!(stripped.location.is_none());
        assert!(stripped.country.is_none());
        assert!(stripped.anonymized);
    }

    #[test]
    fn preserves_non_pii_fields() {
        let stripped = strip(sample_result(), false);
        assert_eq!(stripped.skills, Some(vec!["python".to_string()]));
        assert_eq!(stripped.years_experience, Some(6.0));
    }

    #[test]
    fn match_reasons_mask_years_and_proper_nouns() {
        let stripped = strip(sample_result(), false);
        let reason = &stripped.match_reasons[0];
        assert!(!reason.contains("2019"));
        assert!(!reason.contains("Acme Corp"));
    }

    #[test]
    fn strip_proxy_removes_proxy_fields_entirely() {
        let mut result = sample_result();
        result.signal_scores = Some(crate::models::SignalScores {
            company_pedigree: Some(0.95),
            ..Default::default()
        });
        let stripped = strip(result, true);
        assert!(stripped.signal_scores.unwrap().company_pedigree.is_none());
        assert!(stripped.education_institutions.is_none());
        assert!(stripped.graduation_year.is_none());
    }

    #[test]
    fn strip_proxy_false_preserves_proxy_fields() {
        let mut result = sample_result();
        result.signal_scores = Some(crate::models::SignalScores {
            company_pedigree: Some(0.95),
            ..Default::default()
        });
        let stripped = strip(result, false);
        assert_eq!(stripped.signal_scores.unwrap().company_pedigree, Some(0.95));
        assert!(stripped.education_institutions.is_some());
        assert!(stripped.graduation_year.is_some());
    }
}
