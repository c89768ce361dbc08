pub mod bounded;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod generator;
pub mod modeling;
pub mod persistence;
pub mod pipeline;
pub mod types;

pub use config::AdaptiveConfig;
pub use engine::{AdaptiveEngine, PreparedSession};
pub use generator::{ExerciseGenerator, GenerationRequest, GeneratorError};
pub use persistence::{InMemoryProfileStore, ProfileStore, StoreError};
pub use pipeline::SessionAnalysis;
pub use error::AdaptiveError;
pub use types::*;
