//! Adaptive Monitor - real-time signal fusion and rolling-window analytics.
//!
//! This library turns per-frame perceptual detections (emotion label, gaze
//! stability, motion) into stress, attention, engagement, cognitive-load,
//! visual-strain, motor-precision and ADHD-risk scores, keeps a bounded
//! history of them, raises threshold alerts and produces dashboard reports
//! with performance metrics and accessibility indicators.
//!
//! # Guarantees
//!
//! - **Bounded memory**: history and alert log are fixed-capacity FIFOs
//! - **Single writer**: one pipeline mutates session state
//! - **Non-blocking reads**: queries work on copied snapshots
//! - **Clean shutdown**: `stop()` returns only after the producer has exited
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Adaptive Monitor                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐   │
//! │  │  Capture  │──▶│  Signal   │──▶│  Scorer   │──▶│  Alert    │   │
//! │  │ Scheduler │   │ Ingestor  │   │           │   │  Engine   │   │
//! │  └───────────┘   └───────────┘   └───────────┘   └───────────┘   │
//! │                                        │               │         │
//! │                                        ▼               ▼         │
//! │                                  ┌──────────────────────────┐    │
//! │                                  │ SessionState (history +  │    │
//! │                                  │ alert log, RwLock)       │    │
//! │                                  └──────────────────────────┘    │
//! │                                        │ snapshot                │
//! │                                        ▼                         │
//! │                          ┌───────────┐   ┌───────────┐           │
//! │                          │ Analytics │──▶│  Report   │           │
//! │                          └───────────┘   └───────────┘           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use adaptive_monitor::{EmotionLabel, Monitor, MonitorConfig, RawObservation};
//! use chrono::Utc;
//!
//! let monitor = Monitor::new(MonitorConfig::default());
//! monitor.start().expect("session already running");
//!
//! let frame = RawObservation::new(Utc::now(), EmotionLabel::Happy, 0.8, 0.1, 0.9);
//! monitor.submit_frame(frame).expect("frame rejected");
//!
//! let report = monitor.dashboard_data();
//! println!("{}", report.status_line());
//! ```

pub mod capture;
pub mod config;
pub mod core;
pub mod error;
pub mod session;

// Re-export key types at crate root for convenience
pub use capture::{
    synthetic_observations, CaptureScheduler, CaptureSource, ChannelSource, EmotionLabel,
    FrameSender, RawObservation, ReplaySource,
};
pub use config::{Config, ConfigError, MonitorConfig};
pub use core::{
    AccessibilityIndicators, Adaptation, Alert, AlertCategory, AssessmentRecord,
    PerformanceMetrics, Report, RiskCategory, ScoreKind, SessionExport, Severity, Summary,
    TimeSeries,
};
pub use error::MonitorError;
pub use session::{FrameCounts, Monitor};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
