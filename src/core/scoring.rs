//! Composite score computation.
//!
//! Each score is a fixed weighted sum of normalized sub-signals, clamped to
//! [0, 100]. The scorer is pure: given an observation and the trailing
//! records it reads from history, it always produces the same record.

use crate::capture::types::EmotionLabel;
use crate::core::ingest::Observation;
use crate::core::record::{AssessmentRecord, Scores};
use statrs::statistics::Statistics;

/// Default number of trailing records used for smoothing.
pub const DEFAULT_RISK_WINDOW: usize = 30;

/// Default fraction of the distance to neutral covered per face-absent record.
pub const DEFAULT_DECAY_FACTOR: f64 = 0.2;

/// Attention below this counts toward the low-attention ratio.
const LOW_ATTENTION_THRESHOLD: f64 = 50.0;

/// Blink rate (per minute) considered optimal for attention.
const OPTIMAL_BLINK_RATE: f64 = 15.0;

/// Blink rates outside this band indicate visual strain.
const NORMAL_BLINK_RANGE: (f64, f64) = (8.0, 25.0);

/// Largest population standard deviation of values in [0, 1].
const MAX_UNIT_STD_DEV: f64 = 0.5;

/// Largest population standard deviation of values in [0, 100].
const MAX_SCORE_STD_DEV: f64 = 50.0;

// Attention weights (renormalized over the factors that are present)
const W_ATTENTION_GAZE: f64 = 0.45;
const W_ATTENTION_STILLNESS: f64 = 0.35;
const W_ATTENTION_BLINK: f64 = 0.20;

// Stress weights
const W_STRESS_LOW_ATTENTION: f64 = 0.40;
const W_STRESS_NEGATIVE_AFFECT: f64 = 0.40;
const W_STRESS_VOLATILITY: f64 = 0.20;

// Engagement weights
const W_ENGAGEMENT_POSITIVE_AFFECT: f64 = 0.70;
const W_ENGAGEMENT_ATTENTION: f64 = 0.30;

// Cognitive load weights
const W_LOAD_STRESS: f64 = 0.50;
const W_LOAD_INATTENTION: f64 = 0.30;
const W_LOAD_GAZE: f64 = 0.20;

// Visual strain weights
const W_STRAIN_GAZE: f64 = 0.60;
const W_STRAIN_BLINK: f64 = 0.40;

// ADHD-risk weights
const W_RISK_VOLATILITY: f64 = 0.50;
const W_RISK_ATTENTION_SPREAD: f64 = 0.50;

/// Normalized sub-signals of one observation, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubSignals {
    pub negative_affect: f64,
    pub positive_affect: f64,
    pub motion_volatility: f64,
    pub low_attention_ratio: f64,
    pub gaze_instability: f64,
    pub blink_abnormal: f64,
    pub attention_spread: f64,
}

/// Deterministic scorer.
#[derive(Debug, Clone)]
pub struct Scorer {
    risk_window: usize,
    decay_factor: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_WINDOW, DEFAULT_DECAY_FACTOR)
    }
}

impl Scorer {
    pub fn new(risk_window: usize, decay_factor: f64) -> Self {
        Self {
            risk_window: risk_window.max(1),
            decay_factor: decay_factor.clamp(0.0, 1.0),
        }
    }

    /// Number of trailing records the scorer wants to see.
    pub fn window_len(&self) -> usize {
        self.risk_window
    }

    /// Score one observation against the trailing `history` (oldest first).
    ///
    /// Only the last `risk_window - 1` face-present records are used, so the
    /// smoothing window including the current frame is `risk_window` long.
    pub fn score(&self, observation: &Observation, history: &[AssessmentRecord]) -> AssessmentRecord {
        if !observation.face_present {
            return self.decay(observation, history.last());
        }

        let window: Vec<&AssessmentRecord> = history
            .iter()
            .rev()
            .filter(|r| r.face_present)
            .take(self.risk_window - 1)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        let attention = compute_attention(observation);

        let mut motions: Vec<f64> = window.iter().map(|r| r.motion).collect();
        motions.push(observation.motion);
        let motion_volatility = (std_dev(&motions) / MAX_UNIT_STD_DEV).clamp(0.0, 1.0);

        let mut attentions: Vec<f64> = window.iter().map(|r| r.scores.attention).collect();
        attentions.push(attention);
        let low_attention_ratio = attentions
            .iter()
            .filter(|&&a| a < LOW_ATTENTION_THRESHOLD)
            .count() as f64
            / attentions.len() as f64;
        let attention_spread = (std_dev(&attentions) / MAX_SCORE_STD_DEV).clamp(0.0, 1.0);

        let signals = SubSignals {
            negative_affect: affect(observation, EmotionLabel::is_negative),
            positive_affect: affect(observation, EmotionLabel::is_positive),
            motion_volatility,
            low_attention_ratio,
            gaze_instability: 1.0 - observation.gaze_stability,
            blink_abnormal: observation
                .blink_rate_per_min
                .map(|rate| {
                    if rate < NORMAL_BLINK_RANGE.0 || rate > NORMAL_BLINK_RANGE.1 {
                        1.0
                    } else {
                        0.0
                    }
                })
                .unwrap_or(0.0),
            attention_spread,
        };

        let scores = combine(&signals, attention, observation.motor_precision);

        AssessmentRecord::from_parts(
            observation.timestamp,
            observation.emotion,
            observation.confidence,
            scores,
            observation.motion,
            true,
        )
    }

    /// Face-absent frame: keep continuity by decaying the previous scores
    /// toward neutral instead of scoring an empty frame.
    fn decay(&self, observation: &Observation, previous: Option<&AssessmentRecord>) -> AssessmentRecord {
        let base = previous.map(|r| r.scores).unwrap_or(Scores::NEUTRAL);
        let scores = base.decay_toward(&Scores::NEUTRAL, self.decay_factor);

        AssessmentRecord::from_parts(
            observation.timestamp,
            EmotionLabel::Unknown,
            0.0,
            scores,
            0.0,
            false,
        )
    }
}

/// Confidence of the observed emotion if it matches `polarity`, else 0.
fn affect(observation: &Observation, polarity: fn(EmotionLabel) -> bool) -> f64 {
    if polarity(observation.emotion) {
        observation.confidence
    } else {
        0.0
    }
}

/// Attention in [0, 100] from gaze, stillness and (optionally) blink rate.
fn compute_attention(observation: &Observation) -> f64 {
    let mut weighted = W_ATTENTION_GAZE * observation.gaze_stability
        + W_ATTENTION_STILLNESS * (1.0 - observation.motion);
    let mut total_weight = W_ATTENTION_GAZE + W_ATTENTION_STILLNESS;

    if let Some(rate) = observation.blink_rate_per_min {
        let optimality = 1.0 - (rate - OPTIMAL_BLINK_RATE).abs() / OPTIMAL_BLINK_RATE;
        weighted += W_ATTENTION_BLINK * optimality.max(0.0);
        total_weight += W_ATTENTION_BLINK;
    }

    (weighted / total_weight * 100.0).clamp(0.0, 100.0)
}

/// Weighted combination of sub-signals into the composite scores.
fn combine(signals: &SubSignals, attention: f64, motor_precision: Option<f64>) -> Scores {
    let attention_unit = attention / 100.0;

    let stress = W_STRESS_LOW_ATTENTION * signals.low_attention_ratio
        + W_STRESS_NEGATIVE_AFFECT * signals.negative_affect
        + W_STRESS_VOLATILITY * signals.motion_volatility;

    let engagement = W_ENGAGEMENT_POSITIVE_AFFECT * signals.positive_affect
        + W_ENGAGEMENT_ATTENTION * attention_unit;

    let cognitive_load = W_LOAD_STRESS * stress
        + W_LOAD_INATTENTION * (1.0 - attention_unit)
        + W_LOAD_GAZE * signals.gaze_instability;

    let visual_strain =
        W_STRAIN_GAZE * signals.gaze_instability + W_STRAIN_BLINK * signals.blink_abnormal;

    let motor = motor_precision.unwrap_or(1.0 - signals.motion_volatility);

    let adhd_risk = W_RISK_VOLATILITY * signals.motion_volatility
        + W_RISK_ATTENTION_SPREAD * signals.attention_spread;

    Scores {
        stress: stress * 100.0,
        attention,
        engagement: engagement * 100.0,
        cognitive_load: cognitive_load * 100.0,
        visual_strain: visual_strain * 100.0,
        motor_precision: motor * 100.0,
        adhd_risk: adhd_risk * 100.0,
    }
    .clamped()
}

/// Compute the population standard deviation of a slice of values.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    values.iter().population_std_dev()
}
