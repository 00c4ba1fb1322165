//! Capture side of the engine.
//!
//! This module provides the raw observation types supplied by the external
//! detector, the frame-skip scheduler, and the capture sources the producer
//! thread polls.

pub mod scheduler;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use scheduler::{CaptureScheduler, FrameDecision};
pub use source::{
    synthetic_observations, CaptureSource, ChannelSource, FrameSender, ReplaySource, SourceError,
    SourcePoll,
};
pub use types::{EmotionLabel, RawObservation};
