use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adaptive::config::PersonalizationParams;
use crate::adaptive::types::{AdaptiveProfile, LearningStyle, LiveExercise, SessionConfig, SessionRequest};

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),
    #[error("no exercises available for curriculum {0}")]
    EmptyCurriculum(String),
}

/// Parameters handed to whatever produces exercise content. The generator
/// itself stays generic; everything learner-specific arrives through here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub curriculum: String,
    pub target_difficulty: f64,
    pub question_count: u32,
    pub time_limit_seconds: u32,
    pub preferred_types: Vec<String>,
    pub avoid_types: Vec<String>,
    pub learning_style: LearningStyle,
    pub focus_areas: Vec<String>,
}

impl GenerationRequest {
    pub fn build(
        profile: &AdaptiveProfile,
        config: &SessionConfig,
        request: &SessionRequest,
        params: &PersonalizationParams,
    ) -> Self {
        let mut preferred_types: Vec<String> = Vec::new();
        for t in profile
            .strength_areas
            .iter()
            .chain(request.preferences.preferred_types.iter())
        {
            if !preferred_types.contains(t) {
                preferred_types.push(t.clone());
            }
        }

        // An explicit user preference overrides avoidance.
        let avoid_types: Vec<String> = profile
            .weakness_areas
            .iter()
            .filter(|t| !request.preferences.preferred_types.contains(t))
            .filter(|t| !config.focus_areas.contains(t))
            .take(params.max_avoid_types)
            .cloned()
            .collect();

        Self {
            curriculum: config.curriculum.clone(),
            target_difficulty: config.target_difficulty,
            question_count: config.question_count,
            time_limit_seconds: config.time_limit_seconds,
            preferred_types,
            avoid_types,
            learning_style: profile.learning_style,
            focus_areas: config.focus_areas.clone(),
        }
    }

    /// Target difficulty expressed on the 1..=5 exercise scale.
    pub fn target_level(&self) -> u8 {
        ((self.target_difficulty.clamp(0.0, 1.0) * 5.0).ceil() as u8).clamp(1, 5)
    }
}

#[async_trait]
pub trait ExerciseGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<LiveExercise>, GeneratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::types::{AdaptiveFeatureFlags, ProfileKey, SessionPreferences, SessionTrend};

    fn config(focus: &[&str]) -> SessionConfig {
        SessionConfig {
            curriculum: "arithmetic".to_string(),
            target_difficulty: 0.62,
            question_count: 12,
            time_limit_seconds: 66,
            focus_areas: focus.iter().map(|s| s.to_string()).collect(),
            adaptive_features: AdaptiveFeatureFlags::default(),
            duration_minutes: 15,
            trend: SessionTrend::Stable,
        }
    }

    #[test]
    fn avoid_types_skip_focus_and_preferred() {
        let mut profile = AdaptiveProfile::new(&ProfileKey::new("s1", "arithmetic"));
        profile.strength_areas = vec!["addition".to_string()];
        profile.weakness_areas = vec![
            "division".to_string(),
            "fractions".to_string(),
            "ratios".to_string(),
            "percentages".to_string(),
        ];
        profile.learning_style = LearningStyle::Visual;

        let request = SessionRequest {
            curriculum: "arithmetic".to_string(),
            requested_level: None,
            duration_minutes: 15,
            question_count: 10,
            preferences: SessionPreferences {
                preferred_types: vec!["fractions".to_string(), "addition".to_string()],
                ..SessionPreferences::default()
            },
        };

        let generation = GenerationRequest::build(
            &profile,
            &config(&["division", "addition"]),
            &request,
            &PersonalizationParams::default(),
        );

        assert_eq!(generation.preferred_types, vec!["addition".to_string(), "fractions".to_string()]);
        assert_eq!(generation.avoid_types, vec!["ratios".to_string(), "percentages".to_string()]);
        assert_eq!(generation.learning_style, LearningStyle::Visual);
        assert_eq!(generation.target_level(), 4);
    }
}
