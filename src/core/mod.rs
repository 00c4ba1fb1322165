//! Core processing for the adaptive monitor.
//!
//! This module contains:
//! - Observation validation and normalization
//! - Composite scoring and the rolling history buffer
//! - Threshold alerts with cooldowns
//! - Windowed analytics and accessibility indicators
//! - Dashboard reports and session exports

pub mod accessibility;
pub mod alerts;
pub mod analytics;
pub mod history;
pub mod ingest;
pub mod record;
pub mod report;
pub mod scoring;

// Re-export commonly used types
pub use accessibility::{AccessibilityIndicators, Adaptation};
pub use alerts::{
    Alert, AlertCategory, AlertEngine, AlertLog, AlertThresholds, Severity, ThresholdDirection,
    ThresholdRule,
};
pub use analytics::{
    performance, summarize, time_series, PerformanceMetrics, ScoreStats, Summary, TimeSeries, Trend,
    TrendDirection,
};
pub use history::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
pub use ingest::{Observation, SignalIngestor};
pub use record::{AssessmentRecord, RiskCategory, ScoreKind, Scores};
pub use report::{
    recommendations, RecommendationTag, Report, ReportBuilder, SessionExport, SessionInfo,
    EXPORT_VERSION, REPORT_SCHEMA_VERSION,
};
pub use scoring::Scorer;
