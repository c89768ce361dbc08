use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::decision::{
    DifficultyAdjuster, DifficultyOutcome, Recommendation, RecommendationInput, RecommendationPlanner,
};
use crate::adaptive::modeling::{
    classify_areas, compute_metrics, detect_learning_style, AreaClassification, HistoryAggregator,
    StyleDetection,
};
use crate::adaptive::types::{AdaptiveProfile, AttemptRecord, PerformanceMetrics, PerformanceSnapshot, SessionSummary};

/// Everything one batch analysis produced, including the profile it would
/// commit. Nothing here has been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnalysis {
    pub session_id: String,
    pub metrics: PerformanceMetrics,
    pub difficulty: DifficultyOutcome,
    pub areas: AreaClassification,
    pub learning_style: StyleDetection,
    pub recommendations: Vec<Recommendation>,
    pub profile: AdaptiveProfile,
    /// `None` when the profile is left untouched: an empty session, or one
    /// whose snapshot is already in the history.
    pub summary: Option<SessionSummary>,
}

impl SessionAnalysis {
    pub fn profile_changed(&self) -> bool {
        self.summary.is_some()
    }
}

/// Runs the batch pipeline on a copy of `profile`:
/// metrics, history, areas, learning style, difficulty, recommendations.
pub fn analyze_session(
    profile: &AdaptiveProfile,
    session_id: &str,
    attempts: &[AttemptRecord],
    now: DateTime<Utc>,
    config: &AdaptiveConfig,
) -> SessionAnalysis {
    let metrics = compute_metrics(attempts);
    let adjuster = DifficultyAdjuster::new(config.scoring.clone(), config.difficulty.clone());
    let mut updated = profile.clone();

    // A retried session that already reached the history is not applied twice.
    let already_applied = profile
        .performance_history
        .iter()
        .any(|s| s.session_id == session_id);
    if attempts.is_empty() || already_applied {
        tracing::debug!(
            student_id = %profile.student_id,
            session_id,
            already_applied,
            "profile left unchanged"
        );
        let difficulty = adjuster.adjust(profile.difficulty_score, &metrics);
        let difficulty = DifficultyOutcome {
            new_score: difficulty.previous_score,
            adjustment: 0.0,
            reason: None,
            ..difficulty
        };
        return SessionAnalysis {
            session_id: session_id.to_string(),
            metrics,
            difficulty,
            areas: AreaClassification::default(),
            learning_style: detect_learning_style(attempts, &config.learning_style),
            recommendations: Vec::new(),
            profile: updated,
            summary: None,
        };
    }

    HistoryAggregator::new(config.history.clone()).append(
        &mut updated,
        PerformanceSnapshot {
            session_id: session_id.to_string(),
            recorded_at: now,
            metrics: metrics.clone(),
        },
    );

    let areas = classify_areas(attempts, &config.areas);
    updated.strength_areas = areas.strengths.clone();
    updated.weakness_areas = areas.weaknesses.clone();

    let learning_style = detect_learning_style(attempts, &config.learning_style);
    if let Some(style) = learning_style.detected {
        updated.learning_style = style;
    }

    let difficulty = adjuster.apply(&mut updated, session_id, &metrics, now);

    updated.sessions_analyzed += 1;
    updated.updated_at = now;

    let recommendations = RecommendationPlanner.plan(&RecommendationInput {
        metrics: &metrics,
        difficulty: &difficulty,
        weaknesses: &updated.weakness_areas,
        strengths: &updated.strength_areas,
        learning_style: updated.learning_style,
    });

    tracing::debug!(
        student_id = %updated.student_id,
        session_id,
        attempts = metrics.attempt_count,
        accuracy = metrics.accuracy,
        speed_trend = metrics.speed_trend.as_str(),
        performance_score = difficulty.performance_score,
        learning_style = updated.learning_style.as_str(),
        recommendations = recommendations.len(),
        "session analyzed"
    );

    let summary = SessionSummary::from_attempts(session_id, now, &metrics, attempts);

    SessionAnalysis {
        session_id: session_id.to_string(),
        metrics,
        difficulty,
        areas,
        learning_style,
        recommendations,
        profile: updated,
        summary: Some(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::types::{LearningStyle, ProfileKey, SpeedTrend};

    fn attempt(exercise_type: &str, is_correct: bool, time: f64, has_image: bool) -> AttemptRecord {
        AttemptRecord {
            exercise_id: format!("{exercise_type}-{time}"),
            exercise_type: exercise_type.to_string(),
            difficulty: 3,
            is_correct,
            time_spent_seconds: time,
            skipped: false,
            timestamp: Utc::now(),
            has_image,
            has_audio: false,
            is_interactive: false,
        }
    }

    fn profile() -> AdaptiveProfile {
        AdaptiveProfile::new(&ProfileKey::new("s1", "arithmetic"))
    }

    #[test]
    fn empty_session_leaves_profile_untouched() {
        let original = profile();
        let analysis = analyze_session(&original, "empty", &[], Utc::now(), &AdaptiveConfig::default());

        assert_eq!(analysis.metrics.accuracy, 0.0);
        assert_eq!(analysis.metrics.speed_trend, SpeedTrend::InsufficientData);
        assert!(analysis.summary.is_none());
        assert!(!analysis.profile_changed());
        assert!(analysis.recommendations.is_empty());
        assert_eq!(analysis.profile.difficulty_score, original.difficulty_score);
        assert!(analysis.profile.performance_history.is_empty());
        assert_eq!(analysis.profile.sessions_analyzed, 0);
        assert_eq!(analysis.difficulty.new_score, analysis.difficulty.previous_score);
    }

    #[test]
    fn mixed_session_updates_every_profile_facet() {
        let mut attempts = Vec::new();
        for _ in 0..5 {
            attempts.push(attempt("addition", true, 8.0, true));
        }
        for i in 0..5 {
            attempts.push(attempt("subtraction", i == 0, 20.0, false));
        }

        let original = profile();
        let now = Utc::now();
        let analysis = analyze_session(&original, "mixed", &attempts, now, &AdaptiveConfig::default());
        let updated = &analysis.profile;

        assert_eq!(analysis.areas.ranking[0].exercise_type, "addition");
        assert_eq!(updated.strength_areas, vec!["addition".to_string()]);
        assert_eq!(updated.weakness_areas, vec!["subtraction".to_string()]);
        // 5 of 6 correct answers carried an image.
        assert_eq!(updated.learning_style, LearningStyle::Visual);
        assert_eq!(updated.performance_history.len(), 1);
        assert_eq!(updated.sessions_analyzed, 1);
        assert_eq!(updated.updated_at, now);
        assert_eq!(updated.rolling_averages.accuracy, 0.6);

        let summary = analysis.summary.as_ref().unwrap();
        assert_eq!(summary.type_tallies["subtraction"].correct, 1);
        assert_eq!(summary.type_tallies["addition"].total, 5);

        assert!(original.performance_history.is_empty());
        assert_eq!(original.sessions_analyzed, 0);
    }

    #[test]
    fn reapplying_a_recorded_session_is_a_no_op() {
        let attempts: Vec<_> = (0..6).map(|_| attempt("addition", true, 10.0, false)).collect();
        let config = AdaptiveConfig::default();
        let first = analyze_session(&profile(), "repeat", &attempts, Utc::now(), &config);
        let second = analyze_session(&first.profile, "repeat", &attempts, Utc::now(), &config);

        assert!(!second.profile_changed());
        assert_eq!(second.profile.performance_history.len(), 1);
        assert_eq!(second.profile.sessions_analyzed, 1);
        assert_eq!(second.profile.difficulty_score, first.profile.difficulty_score);
        assert_eq!(second.metrics.accuracy, 1.0);
    }

    #[test]
    fn strong_session_raises_difficulty() {
        let attempts: Vec<_> = (0..6).map(|_| attempt("addition", true, 10.0, false)).collect();
        let analysis = analyze_session(&profile(), "strong", &attempts, Utc::now(), &AdaptiveConfig::default());
        assert!(analysis.difficulty.new_score > analysis.difficulty.previous_score);
        assert_eq!(analysis.profile.adaptation_history.len(), 1);
    }
}
