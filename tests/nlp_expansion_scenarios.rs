// tests/nlp_expansion_scenarios.rs
// End-to-end scenarios over the ontology + synonym expanders (no external
// dependencies needed): "senior python developer in NYC" and
// "Lead engineer, 5+ years" from the public contract's worked examples.

use headhunter_search::nlp::synonym_expander::expand_seniority_synonyms;
use headhunter_search::ontology::ONTOLOGY;

#[test]
fn python_expands_to_its_frameworks_above_threshold() {
    let expanded = ONTOLOGY.expand("python", 1, 0.8);
    let names: Vec<&str> = expanded.iter().map(|s| s.skill_name.as_str()).collect();

    assert!(names.contains(&"django"));
    assert!(names.contains(&"flask"));
    assert!(names.contains(&"fastapi"));
    for skill in &expanded {
        assert!(skill.confidence < 1.0);
        assert!(skill.confidence >= 0.8);
    }
}

#[test]
fn lead_seniority_expands_to_higher_levels() {
    let expanded = expand_seniority_synonyms("lead", true);
    assert!(expanded.contains("senior"));
    assert!(expanded.contains("staff"));
    assert!(expanded.contains("principal"));
}
