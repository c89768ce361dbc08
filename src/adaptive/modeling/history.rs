use crate::adaptive::config::HistoryParams;
use crate::adaptive::types::{AdaptiveProfile, PerformanceSnapshot, RollingAverages};

/// Maintains the bounded snapshot history and its exponentially decayed
/// averages; the newest snapshot carries weight 1, each older one `decay`
/// times the next.
pub struct HistoryAggregator {
    params: HistoryParams,
}

impl HistoryAggregator {
    pub fn new(params: HistoryParams) -> Self {
        Self { params }
    }

    pub fn append(&self, profile: &mut AdaptiveProfile, snapshot: PerformanceSnapshot) -> RollingAverages {
        if let Some(evicted) = profile.performance_history.push(snapshot) {
            tracing::debug!(
                student_id = %profile.student_id,
                evicted_session = %evicted.session_id,
                "performance history full, evicted oldest snapshot"
            );
        }
        profile.rolling_averages = self.rolling_averages(profile.performance_history.iter());
        profile.rolling_averages
    }

    pub fn rolling_averages<'a, I>(&self, history: I) -> RollingAverages
    where
        I: DoubleEndedIterator<Item = &'a PerformanceSnapshot>,
    {
        let mut weight = 1.0;
        let mut total_weight = 0.0;
        let mut sums = RollingAverages::default();

        for snapshot in history.rev() {
            sums.accuracy += snapshot.metrics.accuracy * weight;
            sums.speed += snapshot.metrics.average_time_seconds * weight;
            sums.consistency += snapshot.metrics.consistency * weight;
            total_weight += weight;
            weight *= self.params.decay;
        }

        if total_weight <= 0.0 {
            return RollingAverages::default();
        }

        RollingAverages {
            accuracy: sums.accuracy / total_weight,
            speed: sums.speed / total_weight,
            consistency: sums.consistency / total_weight,
        }
    }
}

impl Default for HistoryAggregator {
    fn default() -> Self {
        Self::new(HistoryParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::types::{PerformanceMetrics, ProfileKey, PERFORMANCE_HISTORY_CAPACITY};
    use chrono::Utc;

    fn snapshot(session: usize, accuracy: f64) -> PerformanceSnapshot {
        PerformanceSnapshot {
            session_id: format!("session-{session}"),
            recorded_at: Utc::now(),
            metrics: PerformanceMetrics {
                attempt_count: 10,
                accuracy,
                average_time_seconds: 20.0,
                consistency: 0.5,
                ..Default::default()
            },
        }
    }

    #[test]
    fn history_is_bounded_and_keeps_newest() {
        let aggregator = HistoryAggregator::default();
        let mut profile = AdaptiveProfile::new(&ProfileKey::new("s1", "arithmetic"));
        for i in 0..25 {
            aggregator.append(&mut profile, snapshot(i, 0.5));
        }
        assert_eq!(profile.performance_history.len(), PERFORMANCE_HISTORY_CAPACITY);
        assert_eq!(
            profile.performance_history.iter().next().map(|s| s.session_id.as_str()),
            Some("session-5")
        );
        assert_eq!(
            profile.performance_history.iter().next_back().map(|s| s.session_id.as_str()),
            Some("session-24")
        );
    }

    #[test]
    fn recent_sessions_weigh_more() {
        let aggregator = HistoryAggregator::default();

        let mut rising = AdaptiveProfile::new(&ProfileKey::new("s1", "arithmetic"));
        for (i, acc) in [0.5, 0.9, 0.5].iter().enumerate() {
            aggregator.append(&mut rising, snapshot(i, *acc));
        }
        let mut falling = AdaptiveProfile::new(&ProfileKey::new("s2", "arithmetic"));
        for (i, acc) in [0.9, 0.5, 0.5].iter().enumerate() {
            aggregator.append(&mut falling, snapshot(i, *acc));
        }

        assert!((rising.rolling_averages.accuracy - falling.rolling_averages.accuracy).abs() > 1e-6);
        assert!(rising.rolling_averages.accuracy > falling.rolling_averages.accuracy);
    }

    #[test]
    fn weighted_average_matches_decay_formula() {
        let aggregator = HistoryAggregator::default();
        let mut profile = AdaptiveProfile::new(&ProfileKey::new("s1", "arithmetic"));
        aggregator.append(&mut profile, snapshot(0, 0.0));
        let averages = aggregator.append(&mut profile, snapshot(1, 1.0));

        // weights: oldest 0.9, newest 1.0
        assert!((averages.accuracy - 1.0 / 1.9).abs() < 1e-9);
        assert_eq!(averages.speed, 20.0);
        assert_eq!(averages.consistency, 0.5);
    }
}
