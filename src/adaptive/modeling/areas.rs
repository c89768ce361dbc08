use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adaptive::config::AreaParams;
use crate::adaptive::types::AttemptRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaScore {
    pub exercise_type: String,
    pub attempts: usize,
    pub accuracy: f64,
    pub average_time_seconds: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaClassification {
    /// Best first.
    pub ranking: Vec<AreaScore>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

pub fn classify_areas(attempts: &[AttemptRecord], params: &AreaParams) -> AreaClassification {
    let mut groups: BTreeMap<&str, (usize, usize, f64)> = BTreeMap::new();
    for attempt in attempts {
        let entry = groups.entry(attempt.exercise_type.as_str()).or_default();
        entry.0 += 1;
        if attempt.is_correct {
            entry.1 += 1;
        }
        entry.2 += attempt.clamped_time();
    }

    let mut ranking: Vec<AreaScore> = groups
        .into_iter()
        .map(|(exercise_type, (total, correct, time))| {
            let accuracy = correct as f64 / total as f64;
            let average_time = time / total as f64;
            // A group answered in zero time scores its plain accuracy.
            let score = if average_time > 0.0 {
                accuracy / average_time
            } else {
                accuracy
            };
            AreaScore {
                exercise_type: exercise_type.to_string(),
                attempts: total,
                accuracy,
                average_time_seconds: average_time,
                score,
            }
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.exercise_type.cmp(&b.exercise_type))
    });

    let slice = slice_len(ranking.len(), params.slice_fraction);
    let strengths: Vec<String> = ranking
        .iter()
        .take(slice)
        .map(|a| a.exercise_type.clone())
        .collect();
    let weaknesses: Vec<String> = ranking
        .iter()
        .rev()
        .take(slice)
        .map(|a| a.exercise_type.clone())
        .filter(|t| !strengths.contains(t))
        .collect();

    AreaClassification {
        ranking,
        strengths,
        weaknesses,
    }
}

fn slice_len(groups: usize, fraction: f64) -> usize {
    if groups == 0 {
        return 0;
    }
    ((groups as f64 * fraction).ceil() as usize).clamp(1, groups)
}
