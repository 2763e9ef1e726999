// src/scoring/weights.rs
// Role-type weight presets, per-request overrides, and normalization.
// Grounded in the teacher's `RecallConfig::default()` preset-with-override
// idiom (memory/features/recall_engine/mod.rs).

use std::collections::BTreeMap;

use tracing::warn;

pub type WeightConfig = BTreeMap<String, f32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Executive,
    Manager,
    Ic,
    Default,
}

impl RoleType {
    /// Unknown role types fall back to `Default` per the config-drift
    /// error-taxonomy kind.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "executive" => Self::Executive,
            "manager" => Self::Manager,
            "ic" => Self::Ic,
            "default" => Self::Default,
            _ => Self::Default,
        }
    }
}

fn preset(role_type: RoleType) -> WeightConfig {
    let entries: &[(&str, f32)] = match role_type {
        RoleType::Executive => &[
            ("vector_similarity", 0.15),
            ("seniority_alignment", 0.30),
            ("trajectory_fit", 0.25),
            ("company_relevance", 0.20),
            ("exact_skill_match", 0.05),
            ("inferred_skill_match", 0.05),
        ],
        RoleType::Manager => &[
            ("vector_similarity", 0.20),
            ("seniority_alignment", 0.20),
            ("trajectory_fit", 0.20),
            ("company_relevance", 0.10),
            ("exact_skill_match", 0.20),
            ("inferred_skill_match", 0.10),
        ],
        RoleType::Ic => &[
            ("vector_similarity", 0.20),
            ("exact_skill_match", 0.30),
            ("inferred_skill_match", 0.15),
            ("recency_boost", 0.15),
            ("seniority_alignment", 0.10),
            ("trajectory_fit", 0.05),
            ("company_relevance", 0.05),
        ],
        RoleType::Default => &[
            ("vector_similarity", 0.25),
            ("exact_skill_match", 0.25),
            ("inferred_skill_match", 0.15),
            ("seniority_alignment", 0.15),
            ("recency_boost", 0.10),
            ("trajectory_fit", 0.05),
            ("company_relevance", 0.05),
        ],
    };
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

const NORMALIZATION_TOLERANCE: f32 = 0.001;

pub struct WeightResolver;

impl WeightResolver {
    /// 1. Start from the preset for `role_type`. 2. Overlay any per-request
    /// overrides. 3. Normalize: if the sum deviates from 1.0 by more than
    /// `NORMALIZATION_TOLERANCE`, divide each weight by the sum and log.
    pub fn resolve(role_type: RoleType, overrides: Option<&WeightConfig>) -> WeightConfig {
        let mut weights = preset(role_type);

        if let Some(overrides) = overrides {
            for (signal, weight) in overrides {
                weights.insert(signal.clone(), *weight);
            }
        }

        let sum: f32 = weights.values().sum();
        if (sum - 1.0).abs() > NORMALIZATION_TOLERANCE {
            warn!(sum, "weight config did not sum to 1.0, normalizing");
            if sum > 0.0 {
                for weight in weights.values_mut() {
                    *weight /= sum;
                }
            }
        }

        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_sums_to_one() {
        for role in [RoleType::Executive, RoleType::Manager, RoleType::Ic, RoleType::Default] {
            let weights = WeightResolver::resolve(role, None);
            let sum: f32 = weights.values().sum();
            assert!((sum - 1.0).abs() < 1e-6, "role {:?} sum = {}", role, sum);
        }
    }

    #[test]
    fn overrides_are_normalized_after_overlay() {
        let mut overrides = WeightConfig::new();
        overrides.insert("exact_skill_match".to_string(), 0.9);
        let weights = WeightResolver::resolve(RoleType::Default, Some(&overrides));
        let sum: f32 = weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_role_type_falls_back_to_default() {
        assert_eq!(RoleType::from_str_or_default("not-a-role"), RoleType::Default);
    }

    #[test]
    fn arbitrary_weight_config_normalizes() {
        let mut weights = WeightConfig::new();
        weights.insert("a".to_string(), 3.0);
        weights.insert("b".to_string(), 1.0);
        let sum_before: f32 = weights.values().sum();
        assert!((sum_before - 1.0).abs() > NORMALIZATION_TOLERANCE);

        for w in weights.values_mut() {
            *w /= sum_before;
        }
        let sum_after: f32 = weights.values().sum();
        assert!((sum_after - 1.0).abs() < 1e-6);
    }
}
