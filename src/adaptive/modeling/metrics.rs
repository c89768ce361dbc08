use crate::adaptive::types::{AttemptRecord, ErrorPattern, PerformanceMetrics, SpeedTrend};

const MIN_TREND_ATTEMPTS: usize = 3;
const SPEED_TREND_THRESHOLD: f64 = 0.1;
const MIN_ERROR_RUN: usize = 2;

/// Summarizes one session's attempts, in the order they were answered.
pub fn compute_metrics(attempts: &[AttemptRecord]) -> PerformanceMetrics {
    if attempts.is_empty() {
        return PerformanceMetrics::default();
    }

    let n = attempts.len() as f64;
    let times: Vec<f64> = attempts.iter().map(AttemptRecord::clamped_time).collect();

    let correct = attempts.iter().filter(|a| a.is_correct).count();
    let accuracy = correct as f64 / n;
    let average_time = mean(&times);

    let difficulty_handling = attempts
        .iter()
        .map(|a| {
            if a.is_correct {
                a.clamped_difficulty() as f64
            } else {
                0.0
            }
        })
        .sum::<f64>()
        / n;

    PerformanceMetrics {
        attempt_count: attempts.len(),
        accuracy,
        average_time_seconds: average_time,
        consistency: consistency(&times, average_time),
        difficulty_handling,
        error_patterns: error_patterns(attempts),
        speed_trend: speed_trend(&times),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn consistency(times: &[f64], average_time: f64) -> f64 {
    if average_time <= 0.0 {
        return 0.0;
    }
    let variance =
        times.iter().map(|t| (t - average_time).powi(2)).sum::<f64>() / times.len() as f64;
    (1.0 - variance / average_time.powi(2)).clamp(0.0, 1.0)
}

fn error_patterns(attempts: &[AttemptRecord]) -> Vec<ErrorPattern> {
    let mut patterns = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, attempt) in attempts.iter().enumerate() {
        match (attempt.is_correct, run_start) {
            (false, None) => run_start = Some(i),
            (true, Some(start)) => {
                if i - start >= MIN_ERROR_RUN {
                    patterns.push(ErrorPattern {
                        start_index: start,
                        length: i - start,
                    });
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        let length = attempts.len() - start;
        if length >= MIN_ERROR_RUN {
            patterns.push(ErrorPattern {
                start_index: start,
                length,
            });
        }
    }

    patterns
}

fn speed_trend(times: &[f64]) -> SpeedTrend {
    if times.len() < MIN_TREND_ATTEMPTS {
        return SpeedTrend::InsufficientData;
    }

    let (first, second) = times.split_at(times.len() / 2);
    let first_mean = mean(first);
    if first_mean <= 0.0 {
        return SpeedTrend::Stable;
    }

    // Positive means the second half was answered faster.
    let speedup = (first_mean - mean(second)) / first_mean;
    if speedup > SPEED_TREND_THRESHOLD {
        SpeedTrend::Improving
    } else if speedup < -SPEED_TREND_THRESHOLD {
        SpeedTrend::Declining
    } else {
        SpeedTrend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn attempt(is_correct: bool, time: f64) -> AttemptRecord {
        AttemptRecord {
            exercise_id: "ex".to_string(),
            exercise_type: "addition".to_string(),
            difficulty: 3,
            is_correct,
            time_spent_seconds: time,
            skipped: false,
            timestamp: Utc::now(),
            has_image: false,
            has_audio: false,
            is_interactive: false,
        }
    }

    #[test]
    fn empty_session_yields_zero_metrics() {
        let metrics = compute_metrics(&[]);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.average_time_seconds, 0.0);
        assert_eq!(metrics.consistency, 0.0);
        assert!(!metrics.consistency.is_nan());
        assert!(metrics.error_patterns.is_empty());
        assert_eq!(metrics.speed_trend, SpeedTrend::InsufficientData);
    }

    #[test]
    fn accuracy_and_difficulty_handling() {
        let attempts = vec![attempt(true, 10.0), attempt(false, 10.0), attempt(true, 10.0), attempt(true, 10.0)];
        let metrics = compute_metrics(&attempts);
        assert_eq!(metrics.accuracy, 0.75);
        assert_eq!(metrics.average_time_seconds, 10.0);
        assert_eq!(metrics.consistency, 1.0);
        assert!((metrics.difficulty_handling - 2.25).abs() < 1e-9);
    }

    #[test]
    fn zero_times_guard_consistency() {
        let attempts = vec![attempt(true, 0.0), attempt(true, 0.0), attempt(true, 0.0)];
        let metrics = compute_metrics(&attempts);
        assert_eq!(metrics.consistency, 0.0);
        assert_eq!(metrics.speed_trend, SpeedTrend::Stable);
    }

    #[test]
    fn consistency_is_clamped_to_unit_range() {
        let attempts = vec![attempt(true, 1.0), attempt(true, 1.0), attempt(true, 100.0)];
        let metrics = compute_metrics(&attempts);
        assert!(metrics.consistency >= 0.0 && metrics.consistency <= 1.0);
    }

    #[test]
    fn error_runs_of_two_or_more() {
        let outcomes = [true, false, false, true, false, true, false, false, false];
        let attempts: Vec<_> = outcomes.iter().map(|&c| attempt(c, 5.0)).collect();
        let metrics = compute_metrics(&attempts);
        assert_eq!(
            metrics.error_patterns,
            vec![
                ErrorPattern { start_index: 1, length: 2 },
                ErrorPattern { start_index: 6, length: 3 },
            ]
        );
    }

    #[test]
    fn speed_trend_compares_halves() {
        let faster: Vec<_> = [20.0, 20.0, 10.0, 10.0].iter().map(|&t| attempt(true, t)).collect();
        assert_eq!(compute_metrics(&faster).speed_trend, SpeedTrend::Improving);

        let slower: Vec<_> = [10.0, 10.0, 20.0, 20.0].iter().map(|&t| attempt(true, t)).collect();
        assert_eq!(compute_metrics(&slower).speed_trend, SpeedTrend::Declining);

        let steady: Vec<_> = [10.0, 10.5, 10.0, 10.4].iter().map(|&t| attempt(true, t)).collect();
        assert_eq!(compute_metrics(&steady).speed_trend, SpeedTrend::Stable);

        let short: Vec<_> = [10.0, 1.0].iter().map(|&t| attempt(true, t)).collect();
        assert_eq!(compute_metrics(&short).speed_trend, SpeedTrend::InsufficientData);
    }
}
