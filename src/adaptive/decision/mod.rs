pub mod difficulty;
pub mod personalizer;
pub mod realtime;
pub mod recommendations;

pub use difficulty::{DifficultyAdjuster, DifficultyOutcome};
pub use personalizer::SessionPersonalizer;
pub use realtime::RealTimeAdapter;
pub use recommendations::{
    Recommendation, RecommendationInput, RecommendationKind, RecommendationPlanner, RecommendationPriority,
};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
