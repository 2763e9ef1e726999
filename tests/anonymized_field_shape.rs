// tests/anonymized_field_shape.rs
// Scenario: `anonymize=true` on a result set. Checks the *serialized* shape,
// not just the struct fields, since the public contract is the JSON the
// caller receives.

use headhunter_search::bias::anonymize;
use headhunter_search::models::{Compliance, ResultItem, SignalScores};

fn candidate(id: &str, reason: &str) -> ResultItem {
    ResultItem {
        candidate_id: id.into(),
        score: 0.87,
        vector_score: 0.8,
        text_score: 0.2,
        rrf_score: Some(0.03),
        confidence: 0.9,
        full_name: Some("Maria Silva".into()),
        title: Some("Staff Engineer".into()),
        headline: Some("Building payments infra".into()),
        location: Some("Sao Paulo".into()),
        country: Some("Brazil".into()),
        years_experience: Some(9.0),
        skills: Some(vec!["python".into(), "kubernetes".into()]),
        industries: Some(vec!["fintech".into()]),
        education_institutions: Some(vec!["State University".into()]),
        graduation_year: Some(2011),
        match_reasons: vec![format!("{reason} since 2015")],
        signal_scores: Some(SignalScores {
            company_pedigree: Some(0.7),
            ..Default::default()
        }),
        weights_applied: None,
        ml_trajectory: None,
        role_type: "default".into(),
        compliance: Compliance::default(),
        rationale: None,
        anonymized: false,
    }
}

const ALLOWED_FIELDS: &[&str] = &[
    "candidateId",
    "score",
    "vectorScore",
    "textScore",
    "rrfScore",
    "confidence",
    "yearsExperience",
    "skills",
    "industries",
    "matchReasons",
    "signalScores",
    "weightsApplied",
    "mlTrajectory",
    "roleType",
    "compliance",
    "rationale",
    "anonymized",
];

#[test]
fn anonymized_results_contain_no_pii_keys_for_a_ten_candidate_slate() {
    for i in 0..10 {
        let stripped = anonymize::strip(candidate(&format!("c{i}"), "Worked at Acme Corp"), true);
        assert!(stripped.full_name.is_none());
        assert!(stripped.title.is_none());
        assert!(stripped.headline.is_none());
        assert!(stripped.location.is_none());
        assert!(stripped.country.is_none());
        assert!(stripped.anonymized);

        for reason in &stripped.match_reasons {
            assert!(!reason.contains("2015"), "year leaked in: {reason}");
            assert!(!reason.contains("Acme Corp"), "proper noun leaked in: {reason}");
        }

        let json = serde_json::to_value(&stripped).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for key in &keys {
            assert!(ALLOWED_FIELDS.contains(key), "unexpected wire field after stripping: {key}");
        }
        for pii_key in ["fullName", "title", "headline", "location", "country"] {
            assert!(!keys.contains(&pii_key), "PII key present in serialized output: {pii_key}");
        }
        assert!(!keys.contains(&"educationInstitutions"), "proxy field leaked: educationInstitutions");
        assert!(!keys.contains(&"graduationYear"), "proxy field leaked: graduationYear");

        let signal_scores = json.get("signalScores").expect("signalScores key present");
        assert!(
            signal_scores.get("companyPedigree").is_none(),
            "proxy field leaked inside signalScores: companyPedigree"
        );
    }
}

#[test]
fn proxy_fields_are_absent_not_zeroed_when_strip_proxy_enabled() {
    let result = candidate("c1", "Worked at Acme Corp");
    let stripped = anonymize::strip(result, true);
    assert!(stripped.signal_scores.as_ref().unwrap().company_pedigree.is_none());
    assert!(stripped.education_institutions.is_none());
    assert!(stripped.graduation_year.is_none());

    let json = serde_json::to_value(&stripped).unwrap();
    assert!(json.get("educationInstitutions").is_none());
    assert!(json.get("graduationYear").is_none());
    assert!(json.get("signalScores").unwrap().get("companyPedigree").is_none());
}
