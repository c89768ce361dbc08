use super::round2;
use crate::adaptive::config::PersonalizationParams;
use crate::adaptive::modeling::TrendAnalysis;
use crate::adaptive::types::{
    AdaptiveFeatureFlags, AdaptiveProfile, LearningStyle, LengthPreference, PacePreference,
    SessionConfig, SessionRequest, SessionTrend,
};

const SHORTER_SESSION_FACTOR: f64 = 0.8;
const LONGER_SESSION_FACTOR: f64 = 1.3;
const MORE_TIME_FACTOR: f64 = 1.3;
const LESS_TIME_FACTOR: f64 = 0.8;

/// Signals the personalizer reads from a profile and its recent sessions.
/// `None` means there is no history to judge from yet.
#[derive(Debug, Clone, Copy)]
struct RecentSignals {
    accuracy: Option<f64>,
    average_time_seconds: Option<f64>,
    consistency: Option<f64>,
}

impl RecentSignals {
    fn gather(profile: &AdaptiveProfile, trend: &TrendAnalysis) -> Self {
        let has_history = !profile.performance_history.is_empty();
        let rolling = profile.rolling_averages;
        Self {
            accuracy: trend
                .recent_accuracy
                .or_else(|| has_history.then_some(rolling.accuracy)),
            average_time_seconds: trend
                .recent_average_time_seconds
                .or_else(|| has_history.then_some(rolling.speed)),
            consistency: has_history.then_some(rolling.consistency),
        }
    }
}

pub struct SessionPersonalizer {
    params: PersonalizationParams,
}

impl SessionPersonalizer {
    pub fn new(params: PersonalizationParams) -> Self {
        Self { params }
    }

    pub fn personalize(
        &self,
        profile: &AdaptiveProfile,
        trend: &TrendAnalysis,
        request: &SessionRequest,
    ) -> SessionConfig {
        let signals = RecentSignals::gather(profile, trend);

        let config = SessionConfig {
            curriculum: request.curriculum.clone(),
            target_difficulty: self.target_difficulty(profile, trend.trend, &signals, request.requested_level),
            question_count: self.question_count(&signals, request),
            time_limit_seconds: self.time_limit(profile.learning_style, &signals, request.preferences.pace),
            focus_areas: self.focus_areas(profile, trend, request),
            adaptive_features: AdaptiveFeatureFlags {
                enable_real_time_adjustment: signals
                    .consistency
                    .is_some_and(|c| c > self.params.realtime_consistency_threshold),
                enable_progressive_difficulty: trend.trend == SessionTrend::Improving,
            },
            duration_minutes: request.duration_minutes,
            trend: trend.trend,
        };

        tracing::debug!(
            student_id = %profile.student_id,
            curriculum = %config.curriculum,
            target_difficulty = config.target_difficulty,
            question_count = config.question_count,
            time_limit = config.time_limit_seconds,
            trend = config.trend.as_str(),
            "session personalized"
        );

        config
    }

    fn target_difficulty(
        &self,
        profile: &AdaptiveProfile,
        trend: SessionTrend,
        signals: &RecentSignals,
        requested_level: Option<u8>,
    ) -> f64 {
        let mut target = profile.difficulty_score;

        target += match trend {
            SessionTrend::Improving => self.params.trend_step,
            SessionTrend::Declining => -self.params.trend_step,
            SessionTrend::Stable => 0.0,
        };

        if let Some(accuracy) = signals.accuracy {
            if accuracy > self.params.high_accuracy {
                target += self.params.accuracy_step;
            } else if accuracy < self.params.low_accuracy {
                target -= self.params.accuracy_step;
            }
        }

        if let Some(requested) = requested_level {
            let jump = requested as i32 - profile.current_level() as i32;
            if jump.abs() > 1 {
                target += self.params.level_jump_step * jump.signum() as f64;
            }
        }

        round2(target.clamp(0.1, 1.0)).clamp(0.1, 1.0)
    }

    fn question_count(&self, signals: &RecentSignals, request: &SessionRequest) -> u32 {
        let mut count = request.question_count as f64;

        if let Some(consistency) = signals.consistency {
            if consistency < 0.5 {
                count *= 0.8;
            } else if consistency > 0.8 {
                count *= 1.2;
            }
        }

        if signals
            .average_time_seconds
            .is_some_and(|t| t > self.params.slow_response_seconds)
        {
            count *= 0.9;
        }

        count *= match request.preferences.session_length {
            LengthPreference::Shorter => SHORTER_SESSION_FACTOR,
            LengthPreference::Longer => LONGER_SESSION_FACTOR,
            LengthPreference::Default => 1.0,
        };

        let (low, high) = self.params.question_bounds();
        (count.round() as u32).clamp(low, high)
    }

    fn time_limit(&self, style: LearningStyle, signals: &RecentSignals, pace: PacePreference) -> u32 {
        let style_factor = match style {
            LearningStyle::Visual => 1.1,
            LearningStyle::Kinesthetic => 1.2,
            LearningStyle::Auditory | LearningStyle::Mixed => 1.0,
        };

        let speed_factor = match signals.average_time_seconds {
            Some(t) if t > 45.0 => 1.2,
            Some(t) if t < 20.0 => 0.9,
            _ => 1.0,
        };

        let pace_factor = match pace {
            PacePreference::MoreTime => MORE_TIME_FACTOR,
            PacePreference::LessTime => LESS_TIME_FACTOR,
            PacePreference::Default => 1.0,
        };

        (self.params.base_time_limit_seconds * style_factor * speed_factor * pace_factor)
            .round()
            .max(1.0) as u32
    }

    fn focus_areas(&self, profile: &AdaptiveProfile, trend: &TrendAnalysis, request: &SessionRequest) -> Vec<String> {
        let max = self.params.max_focus_areas;
        let mut areas: Vec<String> = Vec::with_capacity(max);
        let push = |areas: &mut Vec<String>, area: &String| {
            if areas.len() < max && !areas.contains(area) {
                areas.push(area.clone());
            }
        };

        if let Some(weakness) = profile.weakness_areas.first() {
            push(&mut areas, weakness);
        }
        if let Some(strength) = profile.strength_areas.first() {
            push(&mut areas, strength);
        }
        for area in trend
            .struggling_areas
            .iter()
            .filter(|a| !areas.contains(a))
            .take(2)
            .cloned()
            .collect::<Vec<_>>()
        {
            push(&mut areas, &area);
        }
        for area in &request.preferences.focus_areas {
            push(&mut areas, area);
        }

        areas
    }
}

impl Default for SessionPersonalizer {
    fn default() -> Self {
        Self::new(PersonalizationParams::default())
    }
}
