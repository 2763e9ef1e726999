// src/nlp/query_expander.rs
// Expands extracted skills via the ontology, applying a decay factor and a
// cap on total expanded skills. Grounded directly on `src/ontology`.

use std::collections::HashMap;

use crate::ontology::SkillsOntology;

#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedSkillRef {
    pub skill_name: String,
    pub confidence: f32,
}

pub struct QueryExpander<'a> {
    ontology: &'a SkillsOntology,
    depth: usize,
    min_confidence: f32,
    decay_factor: f32,
    cap: usize,
}

impl<'a> QueryExpander<'a> {
    pub fn new(
        ontology: &'a SkillsOntology,
        depth: usize,
        min_confidence: f32,
        decay_factor: f32,
        cap: usize,
    ) -> Self {
        Self {
            ontology,
            depth,
            min_confidence,
            decay_factor,
            cap,
        }
    }

    /// Expands each input skill, deduplicating across inputs by keeping the
    /// maximum confidence seen for a given expanded skill name.
    pub fn expand_skills(&self, skills: &[String]) -> Vec<ExpandedSkillRef> {
        let mut best: HashMap<String, f32> = HashMap::new();

        for skill in skills {
            for expanded in self.ontology.expand(skill, self.depth, self.min_confidence) {
                let decayed = expanded.confidence * self.decay_factor;
                best.entry(expanded.skill_name)
                    .and_modify(|existing| {
                        if decayed > *existing {
                            *existing = decayed;
                        }
                    })
                    .or_insert(decayed);
            }
        }

        let mut results: Vec<ExpandedSkillRef> = best
            .into_iter()
            .map(|(skill_name, confidence)| ExpandedSkillRef { skill_name, confidence })
            .collect();
        results.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
        results.truncate(self.cap);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::ONTOLOGY;

    #[test]
    fn expands_and_applies_decay() {
        let expander = QueryExpander::new(&ONTOLOGY, 1, 0.8, 0.6, 25);
        let expanded = expander.expand_skills(&["python".to_string()]);
        assert!(expanded.iter().any(|e| e.skill_name == "django"));
        for e in &expanded {
            assert!(e.confidence < 1.0);
        }
    }

    #[test]
    fn dedups_across_inputs_keeping_max() {
        let expander = QueryExpander::new(&ONTOLOGY, 1, 0.0, 1.0, 25);
        let expanded = expander.expand_skills(&["docker".to_string(), "aws".to_string()]);
        let kubernetes: Vec<_> = expanded
            .iter()
            .filter(|e| e.skill_name == "kubernetes")
            .collect();
        assert_eq!(kubernetes.len(), 1);
    }

    #[test]
    fn cap_bounds_total_expanded_skills() {
        let expander = QueryExpander::new(&ONTOLOGY, 1, 0.0, 1.0, 2);
        let expanded = expander.expand_skills(&["python".to_string()]);
        assert!(expanded.len() <= 2);
    }
}
