//! Capture sources polled by the producer thread.
//!
//! A source stands in for the external detector: it hands the producer one
//! `RawObservation` at a time. Opening the source is the only fatal step of
//! starting a capture session.

use crate::capture::types::{EmotionLabel, RawObservation};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::collections::VecDeque;
use std::time::Duration;

/// Result of polling a source once.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePoll {
    /// A new observation is available
    Frame(RawObservation),
    /// Nothing arrived within the timeout
    Idle,
    /// The source will never produce again
    Exhausted,
}

/// Errors raised by capture sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The handle could not be acquired
    Unavailable(String),
    /// The bounded queue is full and the frame was dropped
    QueueFull,
    /// The receiving side is gone
    Disconnected,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(e) => write!(f, "Source unavailable: {e}"),
            SourceError::QueueFull => write!(f, "Frame queue is full"),
            SourceError::Disconnected => write!(f, "Source disconnected"),
        }
    }
}

impl std::error::Error for SourceError {}

/// A capture handle owned by the producer thread.
pub trait CaptureSource: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Acquire the handle. Failure aborts the session start.
    fn open(&mut self) -> Result<(), SourceError>;

    /// Wait up to `timeout` for the next observation.
    fn poll(&mut self, timeout: Duration) -> SourcePoll;

    /// Release the handle. Called once when the producer stops.
    fn release(&mut self);
}

/// Detector-side handle feeding a [`ChannelSource`].
#[derive(Debug, Clone)]
pub struct FrameSender {
    sender: Sender<RawObservation>,
}

impl FrameSender {
    /// Queue an observation without blocking the detector.
    pub fn send(&self, observation: RawObservation) -> Result<(), SourceError> {
        self.sender.try_send(observation).map_err(|e| match e {
            TrySendError::Full(_) => SourceError::QueueFull,
            TrySendError::Disconnected(_) => SourceError::Disconnected,
        })
    }
}

/// Source backed by a bounded channel that an external detector pushes into.
pub struct ChannelSource {
    receiver: Receiver<RawObservation>,
    released: bool,
}

impl ChannelSource {
    /// Create a source and the sender the detector uses.
    ///
    /// The channel is bounded to prevent unbounded memory growth when the
    /// producer falls behind.
    pub fn new(capacity: usize) -> (Self, FrameSender) {
        let (sender, receiver) = bounded(capacity.max(1));
        (
            Self {
                receiver,
                released: false,
            },
            FrameSender { sender },
        )
    }
}

impl CaptureSource for ChannelSource {
    fn name(&self) -> &str {
        "channel"
    }

    fn open(&mut self) -> Result<(), SourceError> {
        if self.released {
            return Err(SourceError::Unavailable(
                "channel source was already released".to_string(),
            ));
        }
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> SourcePoll {
        if self.released {
            return SourcePoll::Exhausted;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(observation) => SourcePoll::Frame(observation),
            Err(RecvTimeoutError::Timeout) => SourcePoll::Idle,
            Err(RecvTimeoutError::Disconnected) => SourcePoll::Exhausted,
        }
    }

    fn release(&mut self) {
        self.released = true;
        // Drop anything still queued.
        while self.receiver.try_recv().is_ok() {}
    }
}

/// Source replaying a fixed list of observations, e.g. a recorded log.
pub struct ReplaySource {
    pending: VecDeque<RawObservation>,
    open: bool,
}

impl ReplaySource {
    pub fn new(observations: Vec<RawObservation>) -> Self {
        Self {
            pending: observations.into(),
            open: false,
        }
    }

    /// Parse a JSON Lines log, one observation per non-empty line.
    pub fn from_jsonl(content: &str) -> Result<Self, serde_json::Error> {
        let observations = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<RawObservation>, _>>()?;
        Ok(Self::new(observations))
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl CaptureSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn open(&mut self) -> Result<(), SourceError> {
        self.open = true;
        Ok(())
    }

    fn poll(&mut self, _timeout: Duration) -> SourcePoll {
        if !self.open {
            return SourcePoll::Exhausted;
        }
        match self.pending.pop_front() {
            Some(observation) => SourcePoll::Frame(observation),
            None => SourcePoll::Exhausted,
        }
    }

    fn release(&mut self) {
        self.open = false;
        self.pending.clear();
    }
}

/// Deterministic synthetic observation stream for demos.
///
/// The stream cycles through a calm phase, a stressed phase and a short
/// stretch without a face, so every score and alert path gets exercised.
/// The stream ends early if timestamps would leave the representable range.
pub fn synthetic_observations(
    start: DateTime<Utc>,
    count: usize,
    interval: ChronoDuration,
) -> Vec<RawObservation> {
    const CYCLE: usize = 240;

    let mut next = Some(start);
    (0..count)
        .map_while(|i| {
            // Stop at the end of the representable time range.
            let timestamp = next?;
            next = timestamp.checked_add_signed(interval);
            let phase = i % CYCLE;
            let wave = ((i as f64) * 0.21).sin() * 0.5 + 0.5;

            let observation = match phase {
                0..=119 => {
                    let emotion = if i % 7 == 0 {
                        EmotionLabel::Happy
                    } else {
                        EmotionLabel::Neutral
                    };
                    RawObservation::new(timestamp, emotion, 0.7 + 0.2 * wave, 0.1 * wave, 0.85)
                        .with_blink_rate(14.0 + 4.0 * wave)
                        .with_motor_precision(0.9)
                }
                120..=209 => {
                    let emotion = match i % 4 {
                        0 => EmotionLabel::Angry,
                        1 => EmotionLabel::Fearful,
                        2 => EmotionLabel::Sad,
                        _ => EmotionLabel::Neutral,
                    };
                    RawObservation::new(timestamp, emotion, 0.8 + 0.2 * wave, 0.3 + 0.7 * wave, 0.3)
                        .with_blink_rate(26.0 + 6.0 * wave)
                        .with_motor_precision(0.5 + 0.2 * wave)
                }
                _ => RawObservation::face_lost(timestamp),
            };
            Some(observation)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(offset_secs: i64) -> RawObservation {
        RawObservation::new(
            Utc::now() + ChronoDuration::seconds(offset_secs),
            EmotionLabel::Neutral,
            0.9,
            0.1,
            0.9,
        )
    }

    #[test]
    fn test_channel_source_delivers_in_order() {
        let (mut source, sender) = ChannelSource::new(8);
        source.open().unwrap();

        let first = sample(0);
        let second = sample(1);
        sender.send(first.clone()).unwrap();
        sender.send(second.clone()).unwrap();

        assert_eq!(source.poll(Duration::from_millis(10)), SourcePoll::Frame(first));
        assert_eq!(source.poll(Duration::from_millis(10)), SourcePoll::Frame(second));
        assert_eq!(source.poll(Duration::from_millis(10)), SourcePoll::Idle);
    }

    #[test]
    fn test_channel_source_bounded() {
        let (_source, sender) = ChannelSource::new(1);
        sender.send(sample(0)).unwrap();
        assert_eq!(sender.send(sample(1)), Err(SourceError::QueueFull));
    }

    #[test]
    fn test_channel_source_exhausted_when_sender_dropped() {
        let (mut source, sender) = ChannelSource::new(4);
        source.open().unwrap();
        drop(sender);
        assert_eq!(source.poll(Duration::from_millis(10)), SourcePoll::Exhausted);
    }

    #[test]
    fn test_released_channel_cannot_reopen() {
        let (mut source, _sender) = ChannelSource::new(4);
        source.release();
        assert!(matches!(source.open(), Err(SourceError::Unavailable(_))));
    }

    #[test]
    fn test_replay_source_from_jsonl() {
        let content = concat!(
            r#"{"timestamp":"2024-01-22T10:00:00Z","emotion":"happy","emotion_confidence":0.9,"motion_magnitude":0.1,"gaze_stability":0.9}"#,
            "\n\n",
            r#"{"timestamp":"2024-01-22T10:00:01Z","emotion":"sad","emotion_confidence":0.6,"motion_magnitude":0.4,"gaze_stability":0.5,"face_absent":false}"#,
            "\n"
        );
        let mut source = ReplaySource::from_jsonl(content).unwrap();
        assert_eq!(source.remaining(), 2);

        source.open().unwrap();
        assert!(matches!(source.poll(Duration::ZERO), SourcePoll::Frame(_)));
        assert!(matches!(source.poll(Duration::ZERO), SourcePoll::Frame(_)));
        assert_eq!(source.poll(Duration::ZERO), SourcePoll::Exhausted);
    }

    #[test]
    fn test_synthetic_stream_is_monotonic_and_varied() {
        let start = Utc::now();
        let observations = synthetic_observations(start, 480, ChronoDuration::seconds(1));
        assert_eq!(observations.len(), 480);
        assert!(observations
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));
        assert!(observations.iter().any(|o| o.face_absent));
        assert!(observations.iter().any(|o| o.emotion.is_negative()));
    }

    #[test]
    fn test_synthetic_stream_stops_at_time_limit() {
        let start = DateTime::<Utc>::MAX_UTC - ChronoDuration::seconds(10);
        let observations = synthetic_observations(start, 100, ChronoDuration::seconds(5));
        assert_eq!(observations.len(), 3);
        assert_eq!(observations[2].timestamp, Some(start + ChronoDuration::seconds(10)));
    }
}
