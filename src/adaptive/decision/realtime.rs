use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::adaptive::config::RealTimeParams;
use crate::adaptive::types::{
    AdaptationAdjustments, AdaptationDecision, AdaptationEvent, AdaptationTrigger, LiveExercise,
    ResponseSample, SessionAdaptationState, SessionTrend, MAX_EXERCISE_DIFFICULTY,
    MIN_EXERCISE_DIFFICULTY,
};

const BUFFER_TREND_DELTA: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
struct BufferStats {
    accuracy: f64,
    average_time_seconds: f64,
    trend: SessionTrend,
}

/// Mid-session retuning. Each answer first has to clear a frequency gate
/// (enough samples, cooldown, budget, breakpoint) before the buffer is checked
/// for a reason to adapt at all.
pub struct RealTimeAdapter {
    params: RealTimeParams,
}

impl RealTimeAdapter {
    pub fn new(params: RealTimeParams) -> Self {
        Self { params }
    }

    pub fn start(&self, session_id: &str, time_limit_seconds: u32, now: DateTime<Utc>) -> SessionAdaptationState {
        SessionAdaptationState::new(session_id, time_limit_seconds, now)
    }

    pub fn record_answer(
        &self,
        state: &mut SessionAdaptationState,
        response: ResponseSample,
        exercises: &mut [LiveExercise],
        now: DateTime<Utc>,
    ) -> AdaptationDecision {
        let index = state.current_exercise_index;
        state.recent_responses.push(response);
        state.current_exercise_index += 1;

        if !self.passes_gate(state, index, now) {
            return AdaptationDecision::unchanged();
        }

        let stats = buffer_stats(state);
        let triggers = self.triggers(&stats, state.time_limit_seconds);
        if triggers.is_empty() {
            return AdaptationDecision::unchanged();
        }

        let first_unseen = index + 1;
        if first_unseen >= exercises.len() {
            tracing::debug!(
                session_id = %state.session_id,
                exercise_index = index,
                "adaptation triggered with no exercises left"
            );
            return AdaptationDecision::failed("no remaining exercises to adapt");
        }

        let (difficulty_adjustment, time_adjustment_seconds) = self.adjustments_for(&triggers);
        let affected_exercises =
            self.apply(&mut exercises[first_unseen..], difficulty_adjustment, time_adjustment_seconds);

        let adjustments = AdaptationAdjustments {
            difficulty_adjustment,
            time_adjustment_seconds,
            affected_exercises,
        };

        // Later too-slow checks measure against the limit the unseen exercises now carry.
        state.time_limit_seconds = self.shifted_time(state.time_limit_seconds, time_adjustment_seconds);
        state.adaptation_count += 1;
        state.last_adaptation_at = Some(now);
        state.events.push(AdaptationEvent {
            id: Uuid::new_v4(),
            exercise_index: index,
            triggers: triggers.clone(),
            adjustments: adjustments.clone(),
            accuracy: stats.accuracy,
            average_time_seconds: stats.average_time_seconds,
            occurred_at: now,
        });

        let reasoning = reasoning(&triggers, &stats, state.recent_responses.len());
        tracing::info!(
            session_id = %state.session_id,
            exercise_index = index,
            adaptation_count = state.adaptation_count,
            difficulty_adjustment,
            time_adjustment_seconds,
            affected_exercises,
            reasoning = %reasoning,
            "real-time adaptation applied"
        );

        AdaptationDecision {
            adapted: true,
            adjustments: Some(adjustments),
            reasoning: Some(reasoning),
            error: None,
        }
    }

    fn passes_gate(&self, state: &SessionAdaptationState, index: usize, now: DateTime<Utc>) -> bool {
        if state.recent_responses.len() < self.params.min_responses {
            return false;
        }
        if state.adaptation_count >= self.params.max_adaptations {
            return false;
        }
        if let Some(last) = state.last_adaptation_at {
            if now - last < Duration::seconds(self.params.cooldown_seconds) {
                return false;
            }
        }
        let interval = self.params.breakpoint_interval.max(1);
        (index + 1) % interval == 0
    }

    fn triggers(&self, stats: &BufferStats, time_limit_seconds: u32) -> Vec<AdaptationTrigger> {
        let mut triggers = Vec::new();
        if stats.accuracy < self.params.too_hard_accuracy {
            triggers.push(AdaptationTrigger::TooHard);
        }
        if stats.accuracy > self.params.too_easy_accuracy {
            triggers.push(AdaptationTrigger::TooEasy);
        }
        if stats.average_time_seconds > self.params.too_slow_factor * time_limit_seconds as f64 {
            triggers.push(AdaptationTrigger::TooSlow);
        }
        if stats.average_time_seconds < self.params.guessing_time_seconds
            && stats.accuracy < self.params.guessing_accuracy
        {
            triggers.push(AdaptationTrigger::Guessing);
        }
        triggers
    }

    /// First difficulty-bearing and first time-bearing trigger win.
    fn adjustments_for(&self, triggers: &[AdaptationTrigger]) -> (f64, i64) {
        let step = self.params.difficulty_step;
        let difficulty = triggers
            .iter()
            .find_map(|t| match t {
                AdaptationTrigger::TooHard | AdaptationTrigger::Guessing => Some(-step),
                AdaptationTrigger::TooEasy => Some(step),
                AdaptationTrigger::TooSlow => None,
            })
            .unwrap_or(0.0);
        let time = triggers
            .iter()
            .find_map(|t| match t {
                AdaptationTrigger::TooHard | AdaptationTrigger::TooSlow => Some(self.params.extra_time_seconds),
                AdaptationTrigger::TooEasy => Some(-self.params.reduced_time_seconds),
                AdaptationTrigger::Guessing => None,
            })
            .unwrap_or(0);
        (difficulty, time)
    }

    fn apply(&self, exercises: &mut [LiveExercise], difficulty_adjustment: f64, time_adjustment: i64) -> usize {
        let level_shift = (difficulty_adjustment * MAX_EXERCISE_DIFFICULTY as f64).round() as i32;

        for exercise in exercises.iter_mut() {
            let level = (exercise.difficulty as i32 + level_shift)
                .clamp(MIN_EXERCISE_DIFFICULTY as i32, MAX_EXERCISE_DIFFICULTY as i32);
            exercise.difficulty = level as u8;
            exercise.time_limit_seconds = self.shifted_time(exercise.time_limit_seconds, time_adjustment);
        }

        exercises.len()
    }

    fn shifted_time(&self, time_limit_seconds: u32, adjustment: i64) -> u32 {
        let time = (time_limit_seconds as i64 + adjustment).max(self.params.min_time_limit_seconds as i64);
        time.min(u32::MAX as i64) as u32
    }
}

impl Default for RealTimeAdapter {
    fn default() -> Self {
        Self::new(RealTimeParams::default())
    }
}

fn buffer_stats(state: &SessionAdaptationState) -> BufferStats {
    let responses: Vec<&ResponseSample> = state.recent_responses.iter().collect();
    if responses.is_empty() {
        return BufferStats {
            accuracy: 0.0,
            average_time_seconds: 0.0,
            trend: SessionTrend::Stable,
        };
    }

    let accuracy_of = |slice: &[&ResponseSample]| {
        slice.iter().filter(|r| r.is_correct).count() as f64 / slice.len() as f64
    };
    let n = responses.len() as f64;
    let average_time = responses
        .iter()
        .map(|r| r.time_spent_seconds.max(0.0))
        .sum::<f64>()
        / n;

    let (older, newer) = responses.split_at(responses.len() / 2);
    let trend = if older.is_empty() {
        SessionTrend::Stable
    } else {
        let delta = accuracy_of(newer) - accuracy_of(older);
        if delta > BUFFER_TREND_DELTA {
            SessionTrend::Improving
        } else if delta < -BUFFER_TREND_DELTA {
            SessionTrend::Declining
        } else {
            SessionTrend::Stable
        }
    };

    BufferStats {
        accuracy: accuracy_of(&responses),
        average_time_seconds: average_time,
        trend,
    }
}

fn reasoning(triggers: &[AdaptationTrigger], stats: &BufferStats, samples: usize) -> String {
    let names: Vec<&str> = triggers.iter().map(AdaptationTrigger::as_str).collect();
    format!(
        "{} (accuracy {:.2}, avg {:.1}s, trend {}, last {} answers)",
        names.join("+"),
        stats.accuracy,
        stats.average_time_seconds,
        stats.trend.as_str(),
        samples
    )
}
