pub mod adaptive;
pub mod logging;

pub use adaptive::{AdaptiveConfig, AdaptiveEngine, AdaptiveError};
