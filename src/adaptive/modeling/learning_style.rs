use serde::{Deserialize, Serialize};

use crate::adaptive::config::LearningStyleParams;
use crate::adaptive::types::{AttemptRecord, LearningStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleTally {
    pub visual: u32,
    pub auditory: u32,
    pub kinesthetic: u32,
    pub mixed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDetection {
    pub tally: StyleTally,
    pub correct_answers: u32,
    /// Set only when a modality cleared the dominance threshold.
    pub detected: Option<LearningStyle>,
}

/// Counts style flags on correctly answered exercises. A modality only wins
/// when it covers more than `dominance_threshold` of the correct answers.
pub fn detect_learning_style(
    attempts: &[AttemptRecord],
    params: &LearningStyleParams,
) -> StyleDetection {
    let mut tally = StyleTally::default();
    let mut correct_answers = 0u32;

    for attempt in attempts.iter().filter(|a| a.is_correct) {
        correct_answers += 1;
        if attempt.has_image {
            tally.visual += 1;
        }
        if attempt.has_audio {
            tally.auditory += 1;
        }
        if attempt.is_interactive {
            tally.kinesthetic += 1;
        }
        tally.mixed += 1;
    }

    StyleDetection {
        tally,
        correct_answers,
        detected: dominant_style(&tally, correct_answers, params.dominance_threshold),
    }
}

fn dominant_style(tally: &StyleTally, correct_answers: u32, threshold: f64) -> Option<LearningStyle> {
    if correct_answers == 0 {
        return None;
    }

    let modalities = [
        (LearningStyle::Visual, tally.visual),
        (LearningStyle::Auditory, tally.auditory),
        (LearningStyle::Kinesthetic, tally.kinesthetic),
    ];
    let top = modalities.iter().map(|(_, c)| *c).max().unwrap_or(0);
    if top as f64 <= threshold * correct_answers as f64 {
        return None;
    }

    let mut leaders = modalities.iter().filter(|(_, c)| *c == top);
    match (leaders.next(), leaders.next()) {
        (Some((style, _)), None) => Some(*style),
        _ => Some(LearningStyle::Mixed),
    }
}
