//! Raw detector observations.
//!
//! The external detector produces one `RawObservation` per sampled frame. The
//! engine performs no image processing: everything it knows about a frame is
//! in this struct.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Emotion label reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Fearful,
    Disgusted,
    Unknown,
}

impl EmotionLabel {
    /// All labels, in declaration order.
    pub const ALL: [EmotionLabel; 8] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Surprised,
        EmotionLabel::Fearful,
        EmotionLabel::Disgusted,
        EmotionLabel::Unknown,
    ];

    /// Labels that contribute to the stress score.
    pub fn is_negative(self) -> bool {
        matches!(
            self,
            EmotionLabel::Sad | EmotionLabel::Angry | EmotionLabel::Fearful | EmotionLabel::Disgusted
        )
    }

    /// Labels that contribute to the engagement score.
    pub fn is_positive(self) -> bool {
        matches!(self, EmotionLabel::Happy | EmotionLabel::Surprised)
    }

    /// Lenient parse of detector label strings ("fear", "surprise", ...).
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "neutral" => EmotionLabel::Neutral,
            "happy" | "happiness" => EmotionLabel::Happy,
            "sad" | "sadness" => EmotionLabel::Sad,
            "angry" | "anger" => EmotionLabel::Angry,
            "surprise" | "surprised" => EmotionLabel::Surprised,
            "fear" | "fearful" => EmotionLabel::Fearful,
            "disgust" | "disgusted" => EmotionLabel::Disgusted,
            _ => EmotionLabel::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Surprised => "surprised",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Disgusted => "disgusted",
            EmotionLabel::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured observation from the detector.
///
/// Consumed exactly once: the pipeline takes it by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// When the frame was captured (missing timestamps are rejected)
    pub timestamp: Option<DateTime<Utc>>,
    /// Dominant emotion
    pub emotion: EmotionLabel,
    /// Detector confidence in `emotion`, nominally in [0, 1]
    pub emotion_confidence: f64,
    /// Normalized movement energy of head and hands, nominally in [0, 1]
    pub motion_magnitude: f64,
    /// Gaze steadiness in [0, 1], 1 meaning a perfectly steady gaze
    pub gaze_stability: f64,
    /// Set when no face was found in the frame
    #[serde(default)]
    pub face_absent: bool,
    /// Blinks per minute, when the detector tracks eyes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blink_rate_per_min: Option<f64>,
    /// Hand precision estimate in [0, 1], when hands are tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_precision: Option<f64>,
}

impl RawObservation {
    /// Observation with a face present and no optional channels.
    pub fn new(
        timestamp: DateTime<Utc>,
        emotion: EmotionLabel,
        emotion_confidence: f64,
        motion_magnitude: f64,
        gaze_stability: f64,
    ) -> Self {
        Self {
            timestamp: Some(timestamp),
            emotion,
            emotion_confidence,
            motion_magnitude,
            gaze_stability,
            face_absent: false,
            blink_rate_per_min: None,
            motor_precision: None,
        }
    }

    /// Observation for a frame where no face was found.
    pub fn face_lost(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
            emotion: EmotionLabel::Unknown,
            emotion_confidence: 0.0,
            motion_magnitude: 0.0,
            gaze_stability: 0.0,
            face_absent: true,
            blink_rate_per_min: None,
            motor_precision: None,
        }
    }

    pub fn with_blink_rate(mut self, blinks_per_min: f64) -> Self {
        self.blink_rate_per_min = Some(blinks_per_min);
        self
    }

    pub fn with_motor_precision(mut self, precision: f64) -> Self {
        self.motor_precision = Some(precision);
        self
    }
}
