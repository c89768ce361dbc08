pub mod areas;
pub mod history;
pub mod learning_style;
pub mod metrics;
pub mod trend;

pub use areas::{classify_areas, AreaClassification, AreaScore};
pub use history::HistoryAggregator;
pub use learning_style::{detect_learning_style, StyleDetection, StyleTally};
pub use metrics::compute_metrics;
pub use trend::{TrendAnalysis, TrendAnalyzer};
