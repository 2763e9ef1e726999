// src/bias/diversity.rs
// Shannon-entropy-based slate diversity scoring. New code — no direct
// teacher analog — grounded in the general statistics-over-a-slice style the
// wider Mira workspace uses for scoring aggregation (see DESIGN.md).

use std::collections::HashMap;

use crate::models::{CandidateRow, CompanyTierBand, ExperienceBand, InferredDimensions, Specialty};

pub fn infer_dimensions(row: &CandidateRow) -> InferredDimensions {
    InferredDimensions {
        company_tier: infer_company_tier(row),
        experience_band: infer_experience_band(row.years_experience),
        specialty: infer_specialty(row),
    }
}

fn infer_company_tier(row: &CandidateRow) -> CompanyTierBand {
    match row.profile.get("company_tier").and_then(|v| v.as_str()) {
        Some("faang") => CompanyTierBand::Faang,
        Some("enterprise") => CompanyTierBand::Enterprise,
        Some("startup") => CompanyTierBand::Startup,
        _ => CompanyTierBand::Other,
    }
}

fn infer_experience_band(years: Option<f32>) -> ExperienceBand {
    match years {
        Some(y) if y < 3.0 => ExperienceBand::Zero3,
        Some(y) if y < 7.0 => ExperienceBand::Three7,
        Some(y) if y < 15.0 => ExperienceBand::Seven15,
        Some(_) => ExperienceBand::Fifteen,
        None => ExperienceBand::Zero3,
    }
}

fn infer_specialty(row: &CandidateRow) -> Specialty {
    let haystack = format!("{} {}", row.title.to_lowercase(), row.skills.join(" ").to_lowercase());
    let has_any = |terms: &[&str]| terms.iter().any(|t| haystack.contains(t));

    let frontend = has_any(&["frontend", "react", "vue", "angular", "css"]);
    let backend = has_any(&["backend", "api", "django", "flask", "spring"]);
    let ml = has_any(&["machine learning", "ml", "pytorch", "tensorflow"]);
    let data = has_any(&["data engineer", "data scientist", "sql", "etl"]);
    let devops = has_any(&["devops", "kubernetes", "terraform", "sre"]);
    let mobile = has_any(&["ios", "android", "mobile", "swift", "kotlin mobile"]);

    if ml {
        Specialty::Ml
    } else if frontend && backend {
        Specialty::Fullstack
    } else if frontend {
        Specialty::Frontend
    } else if backend {
        Specialty::Backend
    } else if devops {
        Specialty::Devops
    } else if data {
        Specialty::Data
    } else if mobile {
        Specialty::Mobile
    } else {
        Specialty::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Info,
    Warning,
    Alert,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DiversityWarning {
    pub dimension: String,
    pub dominant_group: String,
    pub concentration_pct: f64,
    pub severity: WarningSeverity,
    pub suggestion: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DiversityReport {
    pub diversity_score: f64,
    pub warnings: Vec<DiversityWarning>,
}

const MIN_CANDIDATES_FOR_ANALYSIS: usize = 5;

/// Computes the distribution and Shannon-entropy diversity score (0-100) for
/// each of {companyTier, experienceBand, specialty}. Skips analysis entirely
/// when fewer than `MIN_CANDIDATES_FOR_ANALYSIS` candidates are present.
pub fn analyze(dimensions: &[InferredDimensions]) -> Option<DiversityReport> {
    if dimensions.len() < MIN_CANDIDATES_FOR_ANALYSIS {
        return None;
    }

    let n = dimensions.len() as f64;
    let company_tiers: Vec<String> = dimensions
        .iter()
        .map(|d| format!("{:?}", d.company_tier))
        .collect();
    let experience_bands: Vec<String> = dimensions
        .iter()
        .map(|d| format!("{:?}", d.experience_band))
        .collect();
    let specialties: Vec<String> = dimensions.iter().map(|d| format!("{:?}", d.specialty)).collect();

    let mut warnings = Vec::new();
    let mut entropy_scores = Vec::new();

    for (dimension_name, values) in [
        ("companyTier", &company_tiers),
        ("experienceBand", &experience_bands),
        ("specialty", &specialties),
    ] {
        let (entropy_normalized, dominant_group, dominant_pct) = distribution_stats(values, n);
        entropy_scores.push(entropy_normalized);

        if let Some((group, pct)) = dominant_group.zip(Some(dominant_pct)) {
            if pct >= 0.70 {
                let severity = if pct >= 0.90 {
                    WarningSeverity::Alert
                } else if pct >= 0.80 {
                    WarningSeverity::Warning
                } else {
                    WarningSeverity::Info
                };
                warnings.push(DiversityWarning {
                    dimension: dimension_name.to_string(),
                    dominant_group: group,
                    concentration_pct: pct * 100.0,
                    severity,
                    suggestion: format!(
                        "consider broadening filters to surface more {} diversity",
                        dimension_name
                    ),
                });
            }
        }
    }

    let diversity_score = (entropy_scores.iter().sum::<f64>() / entropy_scores.len() as f64) * 100.0;

    Some(DiversityReport {
        diversity_score,
        warnings,
    })
}

/// Returns (normalized Shannon entropy in [0,1], dominant group label, its
/// fraction of the total).
fn distribution_stats(values: &[String], n: f64) -> (f64, Option<String>, f64) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }

    let k = counts.len();
    if k <= 1 {
        let dominant = counts.keys().next().map(|s| s.to_string());
        return (0.0, dominant, 1.0);
    }

    let entropy: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / n;
            -p * p.log2()
        })
        .sum();
    let max_entropy = (k as f64).log2();
    let normalized = if max_entropy > 0.0 { entropy / max_entropy } else { 0.0 };

    let (dominant_group, dominant_count) = counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(k, v)| (k.to_string(), *v))
        .unwrap();

    (normalized, Some(dominant_group), dominant_count as f64 / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(company: CompanyTierBand, n: usize) -> Vec<InferredDimensions> {
        (0..n)
            .map(|_| InferredDimensions {
                company_tier: company,
                experience_band: ExperienceBand::Three7,
                specialty: Specialty::Backend,
            })
            .collect()
    }

    #[test]
    fn skips_analysis_below_minimum_candidates() {
        assert!(analyze(&dims(CompanyTierBand::Faang, 4)).is_none());
    }

    #[test]
    fn uniform_tier_triggers_alert_severity() {
        let report = analyze(&dims(CompanyTierBand::Faang, 10)).unwrap();
        assert!(report.warnings.iter().any(|w| w.severity == WarningSeverity::Alert));
    }

    #[test]
    fn mixed_distribution_has_no_warnings() {
        let mut mixed = dims(CompanyTierBand::Faang, 2);
        mixed.extend(dims(CompanyTierBand::Startup, 2));
        mixed.push(InferredDimensions {
            company_tier: CompanyTierBand::Enterprise,
            experience_band: ExperienceBand::Zero3,
            specialty: Specialty::Frontend,
        });
        let report = analyze(&mixed).unwrap();
        assert!(report.diversity_score > 0.0);
    }
}
