//! Assessment records: the canonical unit stored in history.

use crate::capture::types::EmotionLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Composite score identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreKind {
    Stress,
    Attention,
    Engagement,
    CognitiveLoad,
    VisualStrain,
    MotorPrecision,
    AdhdRisk,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 7] = [
        ScoreKind::Stress,
        ScoreKind::Attention,
        ScoreKind::Engagement,
        ScoreKind::CognitiveLoad,
        ScoreKind::VisualStrain,
        ScoreKind::MotorPrecision,
        ScoreKind::AdhdRisk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreKind::Stress => "stress",
            ScoreKind::Attention => "attention",
            ScoreKind::Engagement => "engagement",
            ScoreKind::CognitiveLoad => "cognitive-load",
            ScoreKind::VisualStrain => "visual-strain",
            ScoreKind::MotorPrecision => "motor-precision",
            ScoreKind::AdhdRisk => "adhd-risk",
        }
    }
}

/// ADHD-risk category derived from the smoothed risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Moderate,
    Elevated,
    High,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Low,
        RiskCategory::Moderate,
        RiskCategory::Elevated,
        RiskCategory::High,
    ];

    /// Cut points on the [0, 100] risk score.
    pub const CUT_POINTS: [f64; 3] = [25.0, 50.0, 75.0];

    pub fn from_score(score: f64) -> Self {
        let [moderate, elevated, high] = Self::CUT_POINTS;
        if score >= high {
            RiskCategory::High
        } else if score >= elevated {
            RiskCategory::Elevated
        } else if score >= moderate {
            RiskCategory::Moderate
        } else {
            RiskCategory::Low
        }
    }
}

/// Clamp a score into [0, 100]. NaN maps to 0, infinities to the bounds.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// The composite scores of one record, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub stress: f64,
    pub attention: f64,
    pub engagement: f64,
    pub cognitive_load: f64,
    pub visual_strain: f64,
    pub motor_precision: f64,
    pub adhd_risk: f64,
}

impl Scores {
    /// Baseline the scores decay toward while no face is visible.
    pub const NEUTRAL: Scores = Scores {
        stress: 25.0,
        attention: 50.0,
        engagement: 50.0,
        cognitive_load: 25.0,
        visual_strain: 25.0,
        motor_precision: 75.0,
        adhd_risk: 25.0,
    };

    /// Copy with every score clamped into [0, 100].
    pub fn clamped(self) -> Self {
        Self {
            stress: clamp_score(self.stress),
            attention: clamp_score(self.attention),
            engagement: clamp_score(self.engagement),
            cognitive_load: clamp_score(self.cognitive_load),
            visual_strain: clamp_score(self.visual_strain),
            motor_precision: clamp_score(self.motor_precision),
            adhd_risk: clamp_score(self.adhd_risk),
        }
    }

    pub fn get(&self, kind: ScoreKind) -> f64 {
        match kind {
            ScoreKind::Stress => self.stress,
            ScoreKind::Attention => self.attention,
            ScoreKind::Engagement => self.engagement,
            ScoreKind::CognitiveLoad => self.cognitive_load,
            ScoreKind::VisualStrain => self.visual_strain,
            ScoreKind::MotorPrecision => self.motor_precision,
            ScoreKind::AdhdRisk => self.adhd_risk,
        }
    }

    /// Move each score `factor` of the way toward `target`.
    pub fn decay_toward(&self, target: &Scores, factor: f64) -> Self {
        let step = |from: f64, to: f64| from + (to - from) * factor;
        Self {
            stress: step(self.stress, target.stress),
            attention: step(self.attention, target.attention),
            engagement: step(self.engagement, target.engagement),
            cognitive_load: step(self.cognitive_load, target.cognitive_load),
            visual_strain: step(self.visual_strain, target.visual_strain),
            motor_precision: step(self.motor_precision, target.motor_precision),
            adhd_risk: step(self.adhd_risk, target.adhd_risk),
        }
        .clamped()
    }
}

/// One scored frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub timestamp: DateTime<Utc>,
    pub emotion: EmotionLabel,
    /// Emotion confidence in [0, 1]
    pub emotion_confidence: f64,
    #[serde(flatten)]
    pub scores: Scores,
    pub adhd_risk_category: RiskCategory,
    /// Normalized motion of the source observation, kept for volatility
    pub motion: f64,
    pub face_present: bool,
}

impl AssessmentRecord {
    /// Build a record, clamping every score. The category is derived from
    /// the clamped ADHD-risk score so the two can never disagree.
    pub(crate) fn from_parts(
        timestamp: DateTime<Utc>,
        emotion: EmotionLabel,
        emotion_confidence: f64,
        scores: Scores,
        motion: f64,
        face_present: bool,
    ) -> Self {
        let scores = scores.clamped();
        Self {
            timestamp,
            emotion,
            emotion_confidence: emotion_confidence.clamp(0.0, 1.0),
            adhd_risk_category: RiskCategory::from_score(scores.adhd_risk),
            scores,
            motion: motion.clamp(0.0, 1.0),
            face_present,
        }
    }

    pub fn score(&self, kind: ScoreKind) -> f64 {
        self.scores.get(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score_edges() {
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(f64::INFINITY), 100.0);
        assert_eq!(clamp_score(f64::NEG_INFINITY), 0.0);
        assert_eq!(clamp_score(42.5), 42.5);
    }

    #[test]
    fn test_risk_category_cut_points() {
        assert_eq!(RiskCategory::from_score(0.0), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(24.9), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(25.0), RiskCategory::Moderate);
        assert_eq!(RiskCategory::from_score(50.0), RiskCategory::Elevated);
        assert_eq!(RiskCategory::from_score(75.0), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(100.0), RiskCategory::High);
    }

    #[test]
    fn test_decay_moves_toward_neutral() {
        let high = Scores {
            stress: 95.0,
            attention: 10.0,
            engagement: 0.0,
            cognitive_load: 90.0,
            visual_strain: 80.0,
            motor_precision: 20.0,
            adhd_risk: 85.0,
        };
        let decayed = high.decay_toward(&Scores::NEUTRAL, 0.2);
        assert!((decayed.stress - 81.0).abs() < 1e-9);
        assert!((decayed.attention - 18.0).abs() < 1e-9);
        assert!(decayed.stress > Scores::NEUTRAL.stress);
    }

    #[test]
    fn test_record_serializes_flat_scores() {
        let record = AssessmentRecord::from_parts(
            Utc::now(),
            EmotionLabel::Sad,
            0.5,
            Scores::NEUTRAL,
            0.3,
            true,
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["stress"], 25.0);
        assert_eq!(value["adhd_risk_category"], "moderate");
        assert_eq!(value["emotion"], "sad");
    }
}
