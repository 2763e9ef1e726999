// src/scoring/trajectory.rs
// Classifies a candidate's title sequence into direction/velocity/type and
// maps it to a fit score against job context. New code, modeled on the
// teacher's scoring-helper style (composite_scorer.rs).

use super::signals::normalize_title_to_level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Upward,
    Lateral,
    Downward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Velocity {
    Fast,
    Normal,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryType {
    TechnicalGrowth,
    LeadershipTrack,
    LateralMove,
    CareerPivot,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Trajectory {
    pub direction: Direction,
    pub velocity: Velocity,
    pub trajectory_type: TrajectoryType,
}

#[derive(Debug, Clone)]
pub struct TitleEvent {
    pub title: String,
    pub years_in_role: f32,
}

const MANAGEMENT_LEVEL_FLOOR: i32 = 7;

/// Normalizes a raw hierarchy level to an equivalent "career stage" so
/// IC<->management track changes don't register as spurious downward moves:
/// management levels are rescaled onto the same 0-6 stage range as IC levels.
fn career_stage(level: i32) -> i32 {
    if level < 0 {
        return -1;
    }
    if level >= MANAGEMENT_LEVEL_FLOOR {
        let stage = level - MANAGEMENT_LEVEL_FLOOR;
        stage.min(6)
    } else {
        level
    }
}

/// Classifies the candidate's title sequence (chronological, oldest first).
/// Returns `None` when fewer than two titles are known (all map to -1).
pub fn classify_trajectory(titles: &[TitleEvent]) -> Option<Trajectory> {
    let levels: Vec<(i32, f32)> = titles
        .iter()
        .map(|t| (normalize_title_to_level(&t.title), t.years_in_role))
        .filter(|(level, _)| *level >= 0)
        .collect();

    if levels.len() < 2 {
        return None;
    }

    let first_stage = career_stage(levels[0].0);
    let last_stage = career_stage(levels[levels.len() - 1].0);
    let stage_delta = last_stage - first_stage;

    let direction = match stage_delta.cmp(&0) {
        std::cmp::Ordering::Greater => Direction::Upward,
        std::cmp::Ordering::Equal => Direction::Lateral,
        std::cmp::Ordering::Less => Direction::Downward,
    };

    let total_years: f32 = levels.iter().map(|(_, years)| years).sum();
    let velocity = if total_years <= 0.0 {
        Velocity::Normal
    } else {
        let stages_per_year = stage_delta.unsigned_abs() as f32 / total_years;
        if stages_per_year >= 0.8 {
            Velocity::Fast
        } else if stages_per_year >= 0.3 {
            Velocity::Normal
        } else {
            Velocity::Slow
        }
    };

    let crossed_into_management = levels[0].0 < MANAGEMENT_LEVEL_FLOOR
        && levels[levels.len() - 1].0 >= MANAGEMENT_LEVEL_FLOOR;
    let crossed_into_ic = levels[0].0 >= MANAGEMENT_LEVEL_FLOOR
        && levels[levels.len() - 1].0 < MANAGEMENT_LEVEL_FLOOR;

    let trajectory_type = if crossed_into_management {
        TrajectoryType::LeadershipTrack
    } else if crossed_into_ic {
        TrajectoryType::CareerPivot
    } else if direction == Direction::Lateral {
        TrajectoryType::LateralMove
    } else {
        TrajectoryType::TechnicalGrowth
    };

    Some(Trajectory {
        direction,
        velocity,
        trajectory_type,
    })
}

#[derive(Debug, Clone, Default)]
pub struct JobTrajectoryContext {
    pub target_track: Option<TrajectoryType>,
    pub role_growth_expected: bool,
    pub pivots_acceptable: bool,
}

/// Maps a trajectory classification to a fit score based on job context.
/// Returns 0.5 when titles were insufficient to classify.
pub fn trajectory_fit(trajectory: Option<&Trajectory>, ctx: &JobTrajectoryContext) -> f32 {
    let Some(trajectory) = trajectory else {
        return 0.5;
    };

    let mut score = match trajectory.direction {
        Direction::Upward => 0.8,
        Direction::Lateral => 0.5,
        Direction::Downward => 0.3,
    };

    if ctx.role_growth_expected && trajectory.velocity == Velocity::Fast {
        score += 0.1;
    }
    if !ctx.role_growth_expected && trajectory.velocity == Velocity::Slow {
        score += 0.05;
    }

    if let Some(target) = ctx.target_track {
        if target == trajectory.trajectory_type {
            score += 0.1;
        } else if trajectory.trajectory_type == TrajectoryType::CareerPivot && !ctx.pivots_acceptable {
            score -= 0.3;
        }
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_titles_returns_none() {
        let titles = vec![TitleEvent { title: "Software Engineer".into(), years_in_role: 2.0 }];
        assert!(classify_trajectory(&titles).is_none());
    }

    #[test]
    fn ascending_titles_classify_as_upward() {
        let titles = vec![
            TitleEvent { title: "Junior Engineer".into(), years_in_role: 2.0 },
            TitleEvent { title: "Senior Engineer".into(), years_in_role: 2.0 },
        ];
        let trajectory = classify_trajectory(&titles).unwrap();
        assert_eq!(trajectory.direction, Direction::Upward);
    }

    #[test]
    fn ic_to_management_is_leadership_track_not_downward() {
        let titles = vec![
            TitleEvent { title: "Staff Engineer".into(), years_in_role: 3.0 },
            TitleEvent { title: "Engineering Manager".into(), years_in_role: 2.0 },
        ];
        let trajectory = classify_trajectory(&titles).unwrap();
        assert_eq!(trajectory.trajectory_type, TrajectoryType::LeadershipTrack);
        assert_ne!(trajectory.direction, Direction::Downward);
    }

    #[test]
    fn missing_trajectory_yields_neutral_fit() {
        assert_eq!(trajectory_fit(None, &JobTrajectoryContext::default()), 0.5);
    }

    #[test]
    fn pivot_penalized_when_not_acceptable() {
        let trajectory = Trajectory {
            direction: Direction::Lateral,
            velocity: Velocity::Normal,
            trajectory_type: TrajectoryType::CareerPivot,
        };
        let ctx = JobTrajectoryContext {
            target_track: Some(TrajectoryType::TechnicalGrowth),
            role_growth_expected: false,
            pivots_acceptable: false,
        };
        assert!(trajectory_fit(Some(&trajectory), &ctx) < 0.5);
    }
}
