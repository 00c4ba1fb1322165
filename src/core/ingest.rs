//! Validation and normalization of raw observations.
//!
//! The ingestor is the only gate between the detector and the scorer. It
//! rejects observations whose timestamp is missing or goes backwards and
//! clamps every numeric channel into its nominal range.

use crate::capture::types::{EmotionLabel, RawObservation};
use crate::error::MonitorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blink rate assumed when a channel reports a non-finite value.
const DEFAULT_BLINK_RATE: f64 = 15.0;

/// Upper bound on a plausible blink rate (blinks per minute).
const MAX_BLINK_RATE: f64 = 120.0;

/// A validated observation, ready for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub emotion: EmotionLabel,
    /// In [0, 1]
    pub confidence: f64,
    /// In [0, 1]
    pub motion: f64,
    /// In [0, 1]
    pub gaze_stability: f64,
    pub face_present: bool,
    /// In [0, MAX_BLINK_RATE]
    pub blink_rate_per_min: Option<f64>,
    /// In [0, 1]
    pub motor_precision: Option<f64>,
}

/// Clamp into [0, 1]; non-finite values become `fallback`.
fn unit(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Stateful validator tracking the last accepted timestamp.
#[derive(Debug, Clone, Default)]
pub struct SignalIngestor {
    last_accepted: Option<DateTime<Utc>>,
}

impl SignalIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize one observation.
    ///
    /// Equal timestamps are accepted; earlier ones are not. A rejected
    /// observation leaves the ingestor unchanged.
    pub fn ingest(&mut self, raw: RawObservation) -> Result<Observation, MonitorError> {
        let timestamp = raw.timestamp.ok_or_else(|| {
            MonitorError::MalformedObservation("observation has no timestamp".to_string())
        })?;

        if let Some(last) = self.last_accepted {
            if timestamp < last {
                return Err(MonitorError::MalformedObservation(format!(
                    "timestamp {} is earlier than last accepted {}",
                    timestamp.to_rfc3339(),
                    last.to_rfc3339()
                )));
            }
        }

        self.last_accepted = Some(timestamp);

        if raw.face_absent {
            return Ok(Observation {
                timestamp,
                emotion: EmotionLabel::Unknown,
                confidence: 0.0,
                motion: 0.0,
                gaze_stability: 0.0,
                face_present: false,
                blink_rate_per_min: None,
                motor_precision: None,
            });
        }

        Ok(Observation {
            timestamp,
            emotion: raw.emotion,
            confidence: unit(raw.emotion_confidence, 0.0),
            motion: unit(raw.motion_magnitude, 0.0),
            gaze_stability: unit(raw.gaze_stability, 0.0),
            face_present: true,
            blink_rate_per_min: raw.blink_rate_per_min.map(|rate| {
                if rate.is_finite() {
                    rate.clamp(0.0, MAX_BLINK_RATE)
                } else {
                    DEFAULT_BLINK_RATE
                }
            }),
            motor_precision: raw.motor_precision.map(|p| unit(p, 1.0)),
        })
    }

    pub fn last_accepted(&self) -> Option<DateTime<Utc>> {
        self.last_accepted
    }

    /// Forget the last accepted timestamp (new session).
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
