use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub accuracy: f64,
    pub speed: f64,
    pub consistency: f64,
    pub difficulty_handling: f64,
    /// Average time (seconds) at which the speed component reaches zero.
    pub speed_ceiling_seconds: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.4,
            speed: 0.3,
            consistency: 0.2,
            difficulty_handling: 0.1,
            speed_ceiling_seconds: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyParams {
    pub raise_threshold: f64,
    pub lower_threshold: f64,
    pub step_scale: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self {
            raise_threshold: 0.85,
            lower_threshold: 0.65,
            step_scale: 0.1,
            min_score: 0.1,
            max_score: 1.0,
        }
    }
}

impl DifficultyParams {
    /// Score range as `(low, high)`; a swapped pair from a hand-edited config
    /// is put back in order.
    pub fn score_bounds(&self) -> (f64, f64) {
        (self.min_score.min(self.max_score), self.min_score.max(self.max_score))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryParams {
    pub decay: f64,
}

impl Default for HistoryParams {
    fn default() -> Self {
        Self { decay: 0.9 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaParams {
    pub slice_fraction: f64,
}

impl Default for AreaParams {
    fn default() -> Self {
        Self {
            slice_fraction: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningStyleParams {
    pub dominance_threshold: f64,
}

impl Default for LearningStyleParams {
    fn default() -> Self {
        Self {
            dominance_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendParams {
    pub window_size: usize,
    pub min_sessions: usize,
    pub accuracy_delta: f64,
    pub struggling_accuracy: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            window_size: 10,
            min_sessions: 3,
            accuracy_delta: 0.1,
            struggling_accuracy: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizationParams {
    pub trend_step: f64,
    pub accuracy_step: f64,
    pub level_jump_step: f64,
    pub high_accuracy: f64,
    pub low_accuracy: f64,
    pub min_questions: u32,
    pub max_questions: u32,
    pub base_time_limit_seconds: f64,
    pub slow_response_seconds: f64,
    pub max_focus_areas: usize,
    pub max_avoid_types: usize,
    pub realtime_consistency_threshold: f64,
}

impl Default for PersonalizationParams {
    fn default() -> Self {
        Self {
            trend_step: 0.1,
            accuracy_step: 0.05,
            level_jump_step: 0.1,
            high_accuracy: 0.85,
            low_accuracy: 0.65,
            min_questions: 5,
            max_questions: 50,
            base_time_limit_seconds: 60.0,
            slow_response_seconds: 60.0,
            max_focus_areas: 3,
            max_avoid_types: 2,
            realtime_consistency_threshold: 0.6,
        }
    }
}

impl PersonalizationParams {
    pub fn question_bounds(&self) -> (u32, u32) {
        (
            self.min_questions.min(self.max_questions),
            self.min_questions.max(self.max_questions),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealTimeParams {
    pub min_responses: usize,
    pub cooldown_seconds: i64,
    pub max_adaptations: u32,
    pub breakpoint_interval: usize,
    pub too_hard_accuracy: f64,
    pub too_easy_accuracy: f64,
    pub too_slow_factor: f64,
    pub guessing_time_seconds: f64,
    pub guessing_accuracy: f64,
    pub difficulty_step: f64,
    pub extra_time_seconds: i64,
    pub reduced_time_seconds: i64,
    pub min_time_limit_seconds: u32,
}

impl Default for RealTimeParams {
    fn default() -> Self {
        Self {
            min_responses: 3,
            cooldown_seconds: 5 * 60,
            max_adaptations: 3,
            breakpoint_interval: 5,
            too_hard_accuracy: 0.4,
            too_easy_accuracy: 0.9,
            too_slow_factor: 1.5,
            guessing_time_seconds: 10.0,
            guessing_accuracy: 0.7,
            difficulty_step: 0.2,
            extra_time_seconds: 15,
            reduced_time_seconds: 10,
            min_time_limit_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub scoring: ScoringWeights,
    pub difficulty: DifficultyParams,
    pub history: HistoryParams,
    pub areas: AreaParams,
    pub learning_style: LearningStyleParams,
    pub trend: TrendParams,
    pub personalization: PersonalizationParams,
    pub realtime: RealTimeParams,
}

impl AdaptiveConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse::<f64>("ADAPTIVE_HISTORY_DECAY") {
            if val > 0.0 && val <= 1.0 {
                config.history.decay = val;
            }
        }
        if let Some(val) = env_parse::<i64>("ADAPTIVE_REALTIME_COOLDOWN_SECS") {
            config.realtime.cooldown_seconds = val.max(0);
        }
        if let Some(val) = env_parse::<u32>("ADAPTIVE_REALTIME_MAX_ADAPTATIONS") {
            config.realtime.max_adaptations = val;
        }
        if let Some(val) = env_parse::<usize>("ADAPTIVE_TREND_WINDOW") {
            config.trend.window_size = val.max(1);
        }
        if let Some(val) = env_parse::<f64>("ADAPTIVE_BASE_TIME_LIMIT_SECS") {
            if val > 0.0 {
                config.personalization.base_time_limit_seconds = val;
            }
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
