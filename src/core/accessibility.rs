//! Accessibility-need indicators and the adaptations they suggest.
//!
//! Indicators are levels in [0, 1] derived from the face-present records of
//! a window. Each indicator past its threshold contributes a fixed set of
//! interface adaptations.

use crate::core::record::AssessmentRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Indicator level above which adaptations are suggested.
pub const INDICATOR_THRESHOLD: f64 = 0.5;

/// Stress needs a stronger signal before content is simplified.
pub const STRESS_INDICATOR_THRESHOLD: f64 = 0.6;

// Reading difficulty weights
const W_READING_STRAIN: f64 = 0.6;
const W_READING_INATTENTION: f64 = 0.4;

/// Interface adaptation suggested by an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Adaptation {
    // visual
    HighContrast,
    LargerFont,
    ReducedBrightness,
    AudioDescriptions,
    // motor
    LargerClickTargets,
    ReducedPrecision,
    VoiceControl,
    SimplifiedNavigation,
    // attention
    FewerDistractions,
    ShorterSegments,
    FrequentBreaks,
    ProgressIndicators,
    // stress
    SimplifiedContent,
    CalmingAudio,
    BreakSuggestion,
    ReducedDensity,
    // reading
    DyslexiaFriendlyFont,
    WiderLineSpacing,
    TextToSpeech,
    ReadingGuides,
}

impl Adaptation {
    pub fn as_str(self) -> &'static str {
        match self {
            Adaptation::HighContrast => "high-contrast",
            Adaptation::LargerFont => "larger-font",
            Adaptation::ReducedBrightness => "reduced-brightness",
            Adaptation::AudioDescriptions => "audio-descriptions",
            Adaptation::LargerClickTargets => "larger-click-targets",
            Adaptation::ReducedPrecision => "reduced-precision",
            Adaptation::VoiceControl => "voice-control",
            Adaptation::SimplifiedNavigation => "simplified-navigation",
            Adaptation::FewerDistractions => "fewer-distractions",
            Adaptation::ShorterSegments => "shorter-segments",
            Adaptation::FrequentBreaks => "frequent-breaks",
            Adaptation::ProgressIndicators => "progress-indicators",
            Adaptation::SimplifiedContent => "simplified-content",
            Adaptation::CalmingAudio => "calming-audio",
            Adaptation::BreakSuggestion => "break-suggestion",
            Adaptation::ReducedDensity => "reduced-density",
            Adaptation::DyslexiaFriendlyFont => "dyslexia-friendly-font",
            Adaptation::WiderLineSpacing => "wider-line-spacing",
            Adaptation::TextToSpeech => "text-to-speech",
            Adaptation::ReadingGuides => "reading-guides",
        }
    }
}

impl fmt::Display for Adaptation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const VISUAL_ADAPTATIONS: [Adaptation; 4] = [
    Adaptation::HighContrast,
    Adaptation::LargerFont,
    Adaptation::ReducedBrightness,
    Adaptation::AudioDescriptions,
];

const MOTOR_ADAPTATIONS: [Adaptation; 4] = [
    Adaptation::LargerClickTargets,
    Adaptation::ReducedPrecision,
    Adaptation::VoiceControl,
    Adaptation::SimplifiedNavigation,
];

const ATTENTION_ADAPTATIONS: [Adaptation; 4] = [
    Adaptation::FewerDistractions,
    Adaptation::ShorterSegments,
    Adaptation::FrequentBreaks,
    Adaptation::ProgressIndicators,
];

const STRESS_ADAPTATIONS: [Adaptation; 4] = [
    Adaptation::SimplifiedContent,
    Adaptation::CalmingAudio,
    Adaptation::BreakSuggestion,
    Adaptation::ReducedDensity,
];

const READING_ADAPTATIONS: [Adaptation; 4] = [
    Adaptation::DyslexiaFriendlyFont,
    Adaptation::WiderLineSpacing,
    Adaptation::TextToSpeech,
    Adaptation::ReadingGuides,
];

/// Accessibility-need levels for a window, each in [0, 1].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccessibilityIndicators {
    pub visual_impairment: f64,
    pub motor_impairment: f64,
    pub attention_difficulties: f64,
    /// Confidence-weighted share of negative emotions
    pub cognitive_load_stress: f64,
    pub reading_difficulties: f64,
    /// Suggested adaptations, in declaration order
    pub adaptations: Vec<Adaptation>,
}

impl AccessibilityIndicators {
    pub fn needs_adaptation(&self) -> bool {
        !self.adaptations.is_empty()
    }
}

/// Assess accessibility needs over `records`. Face-absent records carry
/// decayed scores and are ignored; without face-present records every
/// level is 0.
pub fn assess(records: &[AssessmentRecord]) -> AccessibilityIndicators {
    let observed: Vec<&AssessmentRecord> = records.iter().filter(|r| r.face_present).collect();
    if observed.is_empty() {
        return AccessibilityIndicators::default();
    }

    let n = observed.len() as f64;
    let mean = |f: fn(&AssessmentRecord) -> f64| observed.iter().map(|r| f(r)).sum::<f64>() / n;

    let strain = mean(|r: &AssessmentRecord| r.scores.visual_strain) / 100.0;
    let precision = mean(|r: &AssessmentRecord| r.scores.motor_precision) / 100.0;
    let attention = mean(|r: &AssessmentRecord| r.scores.attention) / 100.0;
    let risk = mean(|r: &AssessmentRecord| r.scores.adhd_risk) / 100.0;
    let negative_affect = mean(|r: &AssessmentRecord| {
        if r.emotion.is_negative() {
            r.emotion_confidence
        } else {
            0.0
        }
    });

    let mut indicators = AccessibilityIndicators {
        visual_impairment: unit(strain),
        motor_impairment: unit(1.0 - precision),
        attention_difficulties: unit(risk),
        cognitive_load_stress: unit(negative_affect),
        reading_difficulties: unit(W_READING_STRAIN * strain + W_READING_INATTENTION * (1.0 - attention)),
        adaptations: Vec::new(),
    };

    let levels = [
        (indicators.visual_impairment, INDICATOR_THRESHOLD, VISUAL_ADAPTATIONS),
        (indicators.motor_impairment, INDICATOR_THRESHOLD, MOTOR_ADAPTATIONS),
        (indicators.attention_difficulties, INDICATOR_THRESHOLD, ATTENTION_ADAPTATIONS),
        (indicators.cognitive_load_stress, STRESS_INDICATOR_THRESHOLD, STRESS_ADAPTATIONS),
        (indicators.reading_difficulties, INDICATOR_THRESHOLD, READING_ADAPTATIONS),
    ];
    for (level, threshold, adaptations) in levels {
        if level > threshold {
            indicators.adaptations.extend(adaptations);
        }
    }

    indicators
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::EmotionLabel;
    use crate::core::record::Scores;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn records(emotion: EmotionLabel, scores: Scores, face_present: bool) -> Vec<AssessmentRecord> {
        let base = Utc::now();
        (0..4)
            .map(|i| {
                AssessmentRecord::from_parts(
                    base + Duration::seconds(i),
                    emotion,
                    0.9,
                    scores,
                    0.1,
                    face_present,
                )
            })
            .collect()
    }

    #[test]
    fn test_no_observed_records_needs_nothing() {
        assert_eq!(assess(&[]), AccessibilityIndicators::default());

        let lost = records(EmotionLabel::Unknown, Scores::NEUTRAL, false);
        let indicators = assess(&lost);
        assert_eq!(indicators.visual_impairment, 0.0);
        assert!(!indicators.needs_adaptation());
    }

    #[test]
    fn test_comfortable_session() {
        let scores = Scores {
            attention: 80.0,
            visual_strain: 20.0,
            motor_precision: 90.0,
            adhd_risk: 15.0,
            ..Scores::NEUTRAL
        };
        let indicators = assess(&records(EmotionLabel::Happy, scores, true));
        assert!((indicators.visual_impairment - 0.2).abs() < 1e-9);
        assert!((indicators.motor_impairment - 0.1).abs() < 1e-9);
        assert_eq!(indicators.cognitive_load_stress, 0.0);
        assert!((indicators.reading_difficulties - 0.2).abs() < 1e-9);
        assert!(indicators.adaptations.is_empty());
    }

    #[test]
    fn test_strained_distressed_session() {
        let scores = Scores {
            attention: 20.0,
            visual_strain: 80.0,
            motor_precision: 30.0,
            adhd_risk: 70.0,
            ..Scores::NEUTRAL
        };
        let indicators = assess(&records(EmotionLabel::Angry, scores, true));

        assert!((indicators.cognitive_load_stress - 0.9).abs() < 1e-9);
        assert!((indicators.reading_difficulties - 0.8).abs() < 1e-9);
        assert_eq!(indicators.adaptations.len(), 20);
        assert_eq!(indicators.adaptations[0], Adaptation::HighContrast);
        assert_eq!(indicators.adaptations[19], Adaptation::ReadingGuides);
    }

    #[test]
    fn test_stress_uses_stricter_threshold() {
        let base = Utc::now();
        // 0.8 confidence on two of three records stays under the bar.
        let records: Vec<_> = [EmotionLabel::Sad, EmotionLabel::Fearful, EmotionLabel::Neutral]
            .iter()
            .enumerate()
            .map(|(i, &emotion)| {
                AssessmentRecord::from_parts(
                    base + Duration::seconds(i as i64),
                    emotion,
                    0.8,
                    Scores::NEUTRAL,
                    0.1,
                    true,
                )
            })
            .collect();

        let indicators = assess(&records);
        assert!((indicators.cognitive_load_stress - 1.6 / 3.0).abs() < 1e-9);
        assert!(indicators.cognitive_load_stress > INDICATOR_THRESHOLD);
        assert!(!indicators.adaptations.contains(&Adaptation::CalmingAudio));
    }

    #[test]
    fn test_adaptation_serialization() {
        let json = serde_json::to_string(&Adaptation::DyslexiaFriendlyFont).unwrap();
        assert_eq!(json, "\"dyslexia-friendly-font\"");
        assert_eq!(Adaptation::VoiceControl.to_string(), "voice-control");
    }
}
