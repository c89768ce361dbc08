use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adaptive::bounded::BoundedLog;

pub const PERFORMANCE_HISTORY_CAPACITY: usize = 20;
pub const ADAPTATION_HISTORY_CAPACITY: usize = 50;
pub const RESPONSE_BUFFER_CAPACITY: usize = 5;

pub const MIN_EXERCISE_DIFFICULTY: u8 = 1;
pub const MAX_EXERCISE_DIFFICULTY: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileKey {
    pub student_id: String,
    pub curriculum: String,
}

impl ProfileKey {
    pub fn new(student_id: impl Into<String>, curriculum: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            curriculum: curriculum.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub exercise_id: String,
    pub exercise_type: String,
    pub difficulty: u8,
    pub is_correct: bool,
    pub time_spent_seconds: f64,
    #[serde(default)]
    pub skipped: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub has_audio: bool,
    #[serde(default)]
    pub is_interactive: bool,
}

impl AttemptRecord {
    pub fn clamped_difficulty(&self) -> u8 {
        self.difficulty
            .clamp(MIN_EXERCISE_DIFFICULTY, MAX_EXERCISE_DIFFICULTY)
    }

    /// Negative or non-finite durations are treated as zero.
    pub fn clamped_time(&self) -> f64 {
        if self.time_spent_seconds.is_finite() {
            self.time_spent_seconds.max(0.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeedTrend {
    Improving,
    Declining,
    Stable,
    #[default]
    InsufficientData,
}

impl SpeedTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
            Self::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPattern {
    pub start_index: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub attempt_count: usize,
    pub accuracy: f64,
    pub average_time_seconds: f64,
    pub consistency: f64,
    pub difficulty_handling: f64,
    pub error_patterns: Vec<ErrorPattern>,
    pub speed_trend: SpeedTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
    #[default]
    Mixed,
}

impl LearningStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditory => "auditory",
            Self::Kinesthetic => "kinesthetic",
            Self::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    pub session_id: String,
    pub recorded_at: DateTime<Utc>,
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RollingAverages {
    pub accuracy: f64,
    /// Decayed average response time in seconds.
    pub speed: f64,
    pub consistency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    StrongPerformance,
    WeakPerformance,
}

impl AdjustmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongPerformance => "strong_performance",
            Self::WeakPerformance => "weak_performance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyAdjustmentRecord {
    pub session_id: String,
    pub old_difficulty: f64,
    pub new_difficulty: f64,
    pub reason: AdjustmentReason,
    pub timestamp: DateTime<Utc>,
}

pub const DEFAULT_DIFFICULTY_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveProfile {
    pub student_id: String,
    pub curriculum: String,
    #[serde(default = "default_difficulty_score")]
    pub difficulty_score: f64,
    #[serde(default)]
    pub learning_style: LearningStyle,
    #[serde(default)]
    pub strength_areas: Vec<String>,
    #[serde(default)]
    pub weakness_areas: Vec<String>,
    #[serde(default)]
    pub performance_history: BoundedLog<PerformanceSnapshot, PERFORMANCE_HISTORY_CAPACITY>,
    #[serde(default)]
    pub rolling_averages: RollingAverages,
    #[serde(default)]
    pub adaptation_history: BoundedLog<DifficultyAdjustmentRecord, ADAPTATION_HISTORY_CAPACITY>,
    #[serde(default)]
    pub sessions_analyzed: u64,
    /// Concurrency token owned by the profile store.
    #[serde(default)]
    pub version: u64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_difficulty_score() -> f64 {
    DEFAULT_DIFFICULTY_SCORE
}

impl AdaptiveProfile {
    pub fn new(key: &ProfileKey) -> Self {
        let now = Utc::now();
        Self {
            student_id: key.student_id.clone(),
            curriculum: key.curriculum.clone(),
            difficulty_score: DEFAULT_DIFFICULTY_SCORE,
            learning_style: LearningStyle::default(),
            strength_areas: Vec::new(),
            weakness_areas: Vec::new(),
            performance_history: BoundedLog::new(),
            rolling_averages: RollingAverages::default(),
            adaptation_history: BoundedLog::new(),
            sessions_analyzed: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> ProfileKey {
        ProfileKey::new(self.student_id.clone(), self.curriculum.clone())
    }

    /// Exercise level (1..=5) the difficulty score currently maps to.
    pub fn current_level(&self) -> u8 {
        let level = (self.difficulty_score.clamp(0.0, 1.0) * 5.0).ceil() as u8;
        level.clamp(MIN_EXERCISE_DIFFICULTY, MAX_EXERCISE_DIFFICULTY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionTrend {
    Improving,
    Declining,
    #[default]
    Stable,
}

impl SessionTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TypeTally {
    pub correct: u32,
    pub total: u32,
}

impl TypeTally {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub completed_at: DateTime<Utc>,
    pub accuracy: f64,
    pub average_time_seconds: f64,
    #[serde(default)]
    pub type_tallies: BTreeMap<String, TypeTally>,
}

impl SessionSummary {
    pub fn from_attempts(
        session_id: &str,
        completed_at: DateTime<Utc>,
        metrics: &PerformanceMetrics,
        attempts: &[AttemptRecord],
    ) -> Self {
        let mut type_tallies: BTreeMap<String, TypeTally> = BTreeMap::new();
        for attempt in attempts {
            let tally = type_tallies.entry(attempt.exercise_type.clone()).or_default();
            tally.total += 1;
            if attempt.is_correct {
                tally.correct += 1;
            }
        }

        Self {
            session_id: session_id.to_string(),
            completed_at,
            accuracy: metrics.accuracy,
            average_time_seconds: metrics.average_time_seconds,
            type_tallies,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LengthPreference {
    #[default]
    Default,
    Shorter,
    Longer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PacePreference {
    #[default]
    Default,
    MoreTime,
    LessTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionPreferences {
    pub session_length: LengthPreference,
    pub pace: PacePreference,
    pub focus_areas: Vec<String>,
    pub preferred_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub curriculum: String,
    #[serde(default)]
    pub requested_level: Option<u8>,
    pub duration_minutes: u32,
    pub question_count: u32,
    #[serde(default)]
    pub preferences: SessionPreferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveFeatureFlags {
    pub enable_real_time_adjustment: bool,
    pub enable_progressive_difficulty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub curriculum: String,
    pub target_difficulty: f64,
    pub question_count: u32,
    pub time_limit_seconds: u32,
    pub focus_areas: Vec<String>,
    pub adaptive_features: AdaptiveFeatureFlags,
    pub duration_minutes: u32,
    pub trend: SessionTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveExercise {
    pub exercise_id: String,
    pub exercise_type: String,
    pub difficulty: u8,
    pub time_limit_seconds: u32,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub has_audio: bool,
    #[serde(default)]
    pub is_interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSample {
    pub exercise_id: String,
    pub is_correct: bool,
    pub time_spent_seconds: f64,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationTrigger {
    TooHard,
    TooEasy,
    TooSlow,
    Guessing,
}

impl AdaptationTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooHard => "too_hard",
            Self::TooEasy => "too_easy",
            Self::TooSlow => "too_slow",
            Self::Guessing => "guessing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationAdjustments {
    pub difficulty_adjustment: f64,
    pub time_adjustment_seconds: i64,
    pub affected_exercises: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationEvent {
    pub id: Uuid,
    pub exercise_index: usize,
    pub triggers: Vec<AdaptationTrigger>,
    pub adjustments: AdaptationAdjustments,
    pub accuracy: f64,
    pub average_time_seconds: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationDecision {
    pub adapted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustments: Option<AdaptationAdjustments>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdaptationDecision {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAdaptationState {
    pub session_id: String,
    /// Per-question limit of the unseen exercises; follows every time adjustment.
    pub time_limit_seconds: u32,
    /// Index of the exercise the next submitted answer belongs to.
    pub current_exercise_index: usize,
    pub recent_responses: BoundedLog<ResponseSample, RESPONSE_BUFFER_CAPACITY>,
    pub adaptation_count: u32,
    pub last_adaptation_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub events: Vec<AdaptationEvent>,
    pub started_at: DateTime<Utc>,
}

impl SessionAdaptationState {
    pub fn new(session_id: impl Into<String>, time_limit_seconds: u32, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            time_limit_seconds,
            current_exercise_index: 0,
            recent_responses: BoundedLog::new(),
            adaptation_count: 0,
            last_adaptation_at: None,
            events: Vec::new(),
            started_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_defaults_are_explicit() {
        let profile = AdaptiveProfile::new(&ProfileKey::new("s1", "arithmetic"));
        assert_eq!(profile.difficulty_score, 0.5);
        assert_eq!(profile.learning_style, LearningStyle::Mixed);
        assert!(profile.performance_history.is_empty());
        assert_eq!(profile.current_level(), 3);
    }

    #[test]
    fn sparse_profile_document_deserializes_with_defaults() {
        let json = r#"{"studentId":"s1","curriculum":"logic"}"#;
        let profile: AdaptiveProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.difficulty_score, DEFAULT_DIFFICULTY_SCORE);
        assert_eq!(profile.learning_style, LearningStyle::Mixed);
        assert!(profile.strength_areas.is_empty());
        assert_eq!(profile.rolling_averages, RollingAverages::default());
    }

    #[test]
    fn current_level_spans_one_to_five() {
        let mut profile = AdaptiveProfile::new(&ProfileKey::new("s1", "arithmetic"));
        profile.difficulty_score = 0.1;
        assert_eq!(profile.current_level(), 1);
        profile.difficulty_score = 1.0;
        assert_eq!(profile.current_level(), 5);
        profile.difficulty_score = 0.61;
        assert_eq!(profile.current_level(), 4);
    }

    #[test]
    fn enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&SpeedTrend::InsufficientData).unwrap(),
            "\"insufficient_data\""
        );
        assert_eq!(serde_json::to_string(&LearningStyle::Kinesthetic).unwrap(), "\"kinesthetic\"");
        let style: LearningStyle = serde_json::from_str("\"visual\"").unwrap();
        assert_eq!(style, LearningStyle::Visual);
    }
}
