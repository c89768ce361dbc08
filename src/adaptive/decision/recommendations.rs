use serde::{Deserialize, Serialize};

use crate::adaptive::decision::DifficultyOutcome;
use crate::adaptive::types::{LearningStyle, PerformanceMetrics};

const LONG_ERROR_RUN: usize = 3;
const LOW_CONSISTENCY: f64 = 0.5;
const RUSHED_TIME_SECONDS: f64 = 10.0;
const RUSHED_ACCURACY: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    PracticeWeakAreas,
    IncreaseChallenge,
    ReduceDifficulty,
    BuildConsistency,
    SlowDown,
    LeverageLearningStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

/// Decision data only; message wording belongs to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: RecommendationPriority,
    pub action: String,
    pub areas: Vec<String>,
}

pub struct RecommendationInput<'a> {
    pub metrics: &'a PerformanceMetrics,
    pub difficulty: &'a DifficultyOutcome,
    pub weaknesses: &'a [String],
    pub strengths: &'a [String],
    pub learning_style: LearningStyle,
}

#[derive(Debug, Default)]
pub struct RecommendationPlanner;

impl RecommendationPlanner {
    pub fn plan(&self, input: &RecommendationInput<'_>) -> Vec<Recommendation> {
        let mut out = Vec::new();
        let metrics = input.metrics;
        let score = input.difficulty.performance_score;

        if !input.weaknesses.is_empty() {
            out.push(recommend(
                RecommendationKind::PracticeWeakAreas,
                RecommendationPriority::High,
                "targeted_practice",
                input.weaknesses.to_vec(),
            ));
        }

        if input.difficulty.new_score > input.difficulty.previous_score {
            out.push(recommend(
                RecommendationKind::IncreaseChallenge,
                RecommendationPriority::Medium,
                "raise_difficulty",
                input.strengths.to_vec(),
            ));
        } else if score < 0.65 && metrics.attempt_count > 0 {
            out.push(recommend(
                RecommendationKind::ReduceDifficulty,
                RecommendationPriority::High,
                "review_fundamentals",
                input.weaknesses.to_vec(),
            ));
        }

        if metrics.attempt_count > 0 && metrics.consistency < LOW_CONSISTENCY {
            out.push(recommend(
                RecommendationKind::BuildConsistency,
                RecommendationPriority::Medium,
                "steady_pacing",
                Vec::new(),
            ));
        }

        let long_error_run = metrics.error_patterns.iter().any(|p| p.length >= LONG_ERROR_RUN);
        let rushed = metrics.attempt_count > 0
            && metrics.average_time_seconds < RUSHED_TIME_SECONDS
            && metrics.accuracy < RUSHED_ACCURACY;
        if long_error_run || rushed {
            out.push(recommend(
                RecommendationKind::SlowDown,
                RecommendationPriority::High,
                "careful_reading",
                Vec::new(),
            ));
        }

        if input.learning_style != LearningStyle::Mixed {
            out.push(recommend(
                RecommendationKind::LeverageLearningStyle,
                RecommendationPriority::Low,
                &format!("prefer_{}_content", input.learning_style.as_str()),
                Vec::new(),
            ));
        }

        // Stable sort keeps insertion order within a priority.
        out.sort_by_key(|r| r.priority);
        out
    }
}

fn recommend(
    kind: RecommendationKind,
    priority: RecommendationPriority,
    action: &str,
    areas: Vec<String>,
) -> Recommendation {
    Recommendation {
        kind,
        priority,
        action: action.to_string(),
        areas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::types::ErrorPattern;

    fn outcome(score: f64, previous: f64, new: f64) -> DifficultyOutcome {
        DifficultyOutcome {
            performance_score: score,
            previous_score: previous,
            new_score: new,
            adjustment: new - previous,
            reason: None,
        }
    }

    fn metrics(accuracy: f64, average_time: f64, consistency: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            attempt_count: 10,
            accuracy,
            average_time_seconds: average_time,
            consistency,
            ..Default::default()
        }
    }

    #[test]
    fn struggling_session_prioritizes_high_items() {
        let mut m = metrics(0.3, 6.0, 0.3);
        m.error_patterns = vec![ErrorPattern { start_index: 2, length: 4 }];
        let weaknesses = vec!["division".to_string()];
        let recs = RecommendationPlanner.plan(&RecommendationInput {
            metrics: &m,
            difficulty: &outcome(0.3, 0.5, 0.47),
            weaknesses: &weaknesses,
            strengths: &[],
            learning_style: LearningStyle::Visual,
        });

        let kinds: Vec<_> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::PracticeWeakAreas,
                RecommendationKind::ReduceDifficulty,
                RecommendationKind::SlowDown,
                RecommendationKind::BuildConsistency,
                RecommendationKind::LeverageLearningStyle,
            ]
        );
        assert_eq!(recs[0].areas, weaknesses);
        assert_eq!(recs[4].action, "prefer_visual_content");
    }

    #[test]
    fn strong_session_suggests_more_challenge() {
        let strengths = vec!["addition".to_string()];
        let recs = RecommendationPlanner.plan(&RecommendationInput {
            metrics: &metrics(1.0, 12.0, 0.9),
            difficulty: &outcome(0.95, 0.5, 0.51),
            weaknesses: &[],
            strengths: &strengths,
            learning_style: LearningStyle::Mixed,
        });
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::IncreaseChallenge);
        assert_eq!(recs[0].areas, strengths);
    }

    #[test]
    fn empty_session_recommends_nothing() {
        let recs = RecommendationPlanner.plan(&RecommendationInput {
            metrics: &PerformanceMetrics::default(),
            difficulty: &outcome(0.0, 0.5, 0.5),
            weaknesses: &[],
            strengths: &[],
            learning_style: LearningStyle::Mixed,
        });
        assert!(recs.is_empty());
    }
}
