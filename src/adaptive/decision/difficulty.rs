use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::round2;
use crate::adaptive::config::{DifficultyParams, ScoringWeights};
use crate::adaptive::types::{
    AdaptiveProfile, AdjustmentReason, DifficultyAdjustmentRecord, PerformanceMetrics,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyOutcome {
    pub performance_score: f64,
    pub previous_score: f64,
    pub new_score: f64,
    pub adjustment: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AdjustmentReason>,
}

impl DifficultyOutcome {
    pub fn changed(&self) -> bool {
        (self.new_score - self.previous_score).abs() > f64::EPSILON
    }
}

pub struct DifficultyAdjuster {
    weights: ScoringWeights,
    params: DifficultyParams,
}

impl DifficultyAdjuster {
    pub fn new(weights: ScoringWeights, params: DifficultyParams) -> Self {
        Self { weights, params }
    }

    pub fn performance_score(&self, metrics: &PerformanceMetrics) -> f64 {
        let speed = if self.weights.speed_ceiling_seconds > 0.0 {
            1.0 - (metrics.average_time_seconds / self.weights.speed_ceiling_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let score = metrics.accuracy * self.weights.accuracy
            + speed * self.weights.speed
            + metrics.consistency * self.weights.consistency
            + metrics.difficulty_handling * self.weights.difficulty_handling;

        score.clamp(0.0, 1.0)
    }

    /// Small steps proportional to how far the score sits outside the
    /// neutral band.
    pub fn adjust(&self, current: f64, metrics: &PerformanceMetrics) -> DifficultyOutcome {
        let performance_score = self.performance_score(metrics);

        let (adjustment, reason) = if performance_score > self.params.raise_threshold {
            (
                (performance_score - self.params.raise_threshold) * self.params.step_scale,
                Some(AdjustmentReason::StrongPerformance),
            )
        } else if performance_score < self.params.lower_threshold {
            (
                (performance_score - self.params.lower_threshold) * self.params.step_scale,
                Some(AdjustmentReason::WeakPerformance),
            )
        } else {
            (0.0, None)
        };

        let (low, high) = self.params.score_bounds();
        let previous_score = current.clamp(low, high);
        let new_score = round2((previous_score + adjustment).clamp(low, high)).clamp(low, high);

        DifficultyOutcome {
            performance_score,
            previous_score,
            new_score,
            adjustment,
            reason,
        }
    }

    pub fn apply(
        &self,
        profile: &mut AdaptiveProfile,
        session_id: &str,
        metrics: &PerformanceMetrics,
        now: DateTime<Utc>,
    ) -> DifficultyOutcome {
        let outcome = self.adjust(profile.difficulty_score, metrics);

        if let (true, Some(reason)) = (outcome.changed(), outcome.reason) {
            profile.adaptation_history.push(DifficultyAdjustmentRecord {
                session_id: session_id.to_string(),
                old_difficulty: outcome.previous_score,
                new_difficulty: outcome.new_score,
                reason,
                timestamp: now,
            });
            tracing::info!(
                student_id = %profile.student_id,
                curriculum = %profile.curriculum,
                old = outcome.previous_score,
                new = outcome.new_score,
                reason = reason.as_str(),
                "difficulty adjusted"
            );
        }
        profile.difficulty_score = outcome.new_score;

        outcome
    }
}

impl Default for DifficultyAdjuster {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), DifficultyParams::default())
    }
}
