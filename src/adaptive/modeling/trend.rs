use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adaptive::config::TrendParams;
use crate::adaptive::types::{SessionSummary, SessionTrend, TypeTally};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub trend: SessionTrend,
    pub sessions_considered: usize,
    pub recent_accuracy: Option<f64>,
    pub recent_average_time_seconds: Option<f64>,
    /// Lowest accuracy first.
    pub struggling_areas: Vec<String>,
}

/// Looks at the most recent completed sessions and compares the accuracy of
/// the older half of the window against the newer half.
pub struct TrendAnalyzer {
    params: TrendParams,
}

impl TrendAnalyzer {
    pub fn new(params: TrendParams) -> Self {
        Self { params }
    }

    pub fn window_size(&self) -> usize {
        self.params.window_size
    }

    pub fn analyze(&self, sessions: &[SessionSummary]) -> TrendAnalysis {
        let mut window: Vec<&SessionSummary> = sessions.iter().collect();
        window.sort_by_key(|s| s.completed_at);
        if window.len() > self.params.window_size {
            let excess = window.len() - self.params.window_size;
            window.drain(..excess);
        }

        if window.is_empty() {
            return TrendAnalysis::default();
        }

        let n = window.len() as f64;
        let recent_accuracy = window.iter().map(|s| s.accuracy).sum::<f64>() / n;
        let recent_average_time = window.iter().map(|s| s.average_time_seconds).sum::<f64>() / n;

        TrendAnalysis {
            trend: self.classify(&window),
            sessions_considered: window.len(),
            recent_accuracy: Some(recent_accuracy),
            recent_average_time_seconds: Some(recent_average_time),
            struggling_areas: self.struggling_areas(&window),
        }
    }

    fn classify(&self, window: &[&SessionSummary]) -> SessionTrend {
        if window.len() < self.params.min_sessions {
            return SessionTrend::Stable;
        }

        let (older, newer) = window.split_at(window.len() / 2);
        let mean = |half: &[&SessionSummary]| {
            half.iter().map(|s| s.accuracy).sum::<f64>() / half.len() as f64
        };
        let delta = mean(newer) - mean(older);

        if delta > self.params.accuracy_delta {
            SessionTrend::Improving
        } else if delta < -self.params.accuracy_delta {
            SessionTrend::Declining
        } else {
            SessionTrend::Stable
        }
    }

    fn struggling_areas(&self, window: &[&SessionSummary]) -> Vec<String> {
        let mut totals: BTreeMap<&str, TypeTally> = BTreeMap::new();
        for session in window {
            for (exercise_type, tally) in &session.type_tallies {
                let entry = totals.entry(exercise_type.as_str()).or_default();
                entry.correct += tally.correct;
                entry.total += tally.total;
            }
        }

        let mut ranked: Vec<(&str, f64)> = totals
            .into_iter()
            .filter(|(_, tally)| tally.total > 0)
            .map(|(t, tally)| (t, tally.accuracy()))
            .filter(|(_, accuracy)| *accuracy < self.params.struggling_accuracy)
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(b.0)));

        ranked.into_iter().map(|(t, _)| t.to_string()).collect()
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(TrendParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn session(day: i64, accuracy: f64, tallies: &[(&str, u32, u32)]) -> SessionSummary {
        SessionSummary {
            session_id: format!("day-{day}"),
            completed_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::days(day),
            accuracy,
            average_time_seconds: 30.0,
            type_tallies: tallies
                .iter()
                .map(|(t, correct, total)| (t.to_string(), TypeTally { correct: *correct, total: *total }))
                .collect(),
        }
    }

    #[test]
    fn too_few_sessions_are_stable() {
        let analysis = TrendAnalyzer::default().analyze(&[session(0, 0.2, &[]), session(1, 0.9, &[])]);
        assert_eq!(analysis.trend, SessionTrend::Stable);
        assert_eq!(analysis.sessions_considered, 2);
    }

    #[test]
    fn rising_accuracy_is_improving_regardless_of_input_order() {
        let sessions = vec![
            session(3, 0.9, &[]),
            session(0, 0.5, &[]),
            session(2, 0.85, &[]),
            session(1, 0.55, &[]),
        ];
        let analysis = TrendAnalyzer::default().analyze(&sessions);
        assert_eq!(analysis.trend, SessionTrend::Improving);
        assert!((analysis.recent_accuracy.unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn falling_accuracy_is_declining() {
        let sessions: Vec<_> = [0.9, 0.9, 0.6, 0.6].iter().enumerate().map(|(i, a)| session(i as i64, *a, &[])).collect();
        assert_eq!(TrendAnalyzer::default().analyze(&sessions).trend, SessionTrend::Declining);
    }

    #[test]
    fn window_keeps_only_most_recent_sessions() {
        let mut sessions: Vec<_> = (0..5).map(|i| session(i, 0.1, &[])).collect();
        sessions.extend((5..15).map(|i| session(i, 0.8, &[])));
        let analysis = TrendAnalyzer::default().analyze(&sessions);
        assert_eq!(analysis.sessions_considered, 10);
        assert_eq!(analysis.trend, SessionTrend::Stable);
        assert!((analysis.recent_accuracy.unwrap() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn struggling_areas_rank_lowest_accuracy_first() {
        let sessions = vec![
            session(0, 0.6, &[("division", 1, 5), ("fractions", 3, 5), ("addition", 5, 5)]),
            session(1, 0.6, &[("division", 2, 5), ("fractions", 3, 5)]),
        ];
        let analysis = TrendAnalyzer::default().analyze(&sessions);
        assert_eq!(analysis.struggling_areas, vec!["division".to_string(), "fractions".to_string()]);
    }

    #[test]
    fn no_sessions_yield_empty_analysis() {
        let analysis = TrendAnalyzer::default().analyze(&[]);
        assert_eq!(analysis, TrendAnalysis::default());
    }
}
