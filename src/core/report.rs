//! Dashboard report and session export builder.
//!
//! Reports and exports use a fixed, versioned JSON schema. Both are built
//! from owned snapshots and can be produced at any time, including for an
//! empty session.

use crate::core::accessibility::{self, AccessibilityIndicators};
use crate::core::alerts::{Alert, AlertCategory};
use crate::core::analytics::{self, summarize, within_window, PerformanceMetrics, Summary};
use crate::core::record::{AssessmentRecord, ScoreKind};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Current dashboard report schema version.
pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Current session export format version.
pub const EXPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "adaptive-monitor";

/// Default number of recent records carried by a report.
pub const DEFAULT_RECENT_RECORDS: usize = 30;

/// Recommendation tags attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationTag {
    HighStress,
    ElevatedStress,
    LowAttention,
    UnstableAttention,
    AdhdSupport,
    VisualComfort,
    CognitiveOverload,
    LowEngagement,
    FaceFrequentlyLost,
}

impl RecommendationTag {
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationTag::HighStress => "high-stress",
            RecommendationTag::ElevatedStress => "elevated-stress",
            RecommendationTag::LowAttention => "low-attention",
            RecommendationTag::UnstableAttention => "unstable-attention",
            RecommendationTag::AdhdSupport => "adhd-support",
            RecommendationTag::VisualComfort => "visual-comfort",
            RecommendationTag::CognitiveOverload => "cognitive-overload",
            RecommendationTag::LowEngagement => "low-engagement",
            RecommendationTag::FaceFrequentlyLost => "face-frequently-lost",
        }
    }
}

impl fmt::Display for RecommendationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

impl Default for Producer {
    fn default() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Session metadata carried by reports and exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub running: bool,
    /// When the session was first started
    pub start: Option<DateTime<Utc>>,
    /// When the session was last stopped; `None` while running
    pub end: Option<DateTime<Utc>>,
    pub duration_secs: i64,
    pub frames_submitted: u64,
    pub frames_processed: u64,
    pub frames_rejected: u64,
    /// Records currently held in history
    pub data_points: usize,
}

/// Dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub producer: Producer,
    pub session: SessionInfo,
    /// Look-back window in seconds; `None` covers the whole history
    pub window_secs: Option<i64>,
    pub summary: Summary,
    pub latest: Option<AssessmentRecord>,
    pub recent_records: Vec<AssessmentRecord>,
    /// The current alert log; windowed counts live in the summary
    pub alerts: Vec<Alert>,
    pub performance: PerformanceMetrics,
    pub accessibility: AccessibilityIndicators,
    pub recommendations: Vec<RecommendationTag>,
}

impl Report {
    /// One-line status for terminal output.
    pub fn status_line(&self) -> String {
        match &self.latest {
            Some(latest) => format!(
                "records={} emotion={} stress={:.1} attention={:.1} adhd={:.1} ({:?}) alerts={} tags=[{}]",
                self.summary.record_count,
                latest.emotion,
                latest.scores.stress,
                latest.scores.attention,
                latest.scores.adhd_risk,
                latest.adhd_risk_category,
                self.alerts.len(),
                self.recommendations
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            None => "records=0 (no data yet)".to_string(),
        }
    }
}

/// Full session export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    pub export_version: String,
    pub exported_at: DateTime<Utc>,
    pub producer: Producer,
    pub session: SessionInfo,
    pub records: Vec<AssessmentRecord>,
    pub alerts: Vec<Alert>,
    pub summary: Summary,
}

impl SessionExport {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Derive recommendation tags from a summary. Sorted and free of duplicates.
pub fn recommendations(summary: &Summary) -> Vec<RecommendationTag> {
    let mut tags = BTreeSet::new();

    if summary
        .alert_categories
        .get(&AlertCategory::FaceLost)
        .is_some_and(|&count| count > 0)
    {
        tags.insert(RecommendationTag::FaceFrequentlyLost);
    }

    if summary.is_empty() {
        return tags.into_iter().collect();
    }

    let stress = summary.stats(ScoreKind::Stress).mean;
    if stress > 70.0 {
        tags.insert(RecommendationTag::HighStress);
    } else if stress > 50.0 {
        tags.insert(RecommendationTag::ElevatedStress);
    }

    let attention = summary.stats(ScoreKind::Attention);
    if attention.mean < 50.0 {
        tags.insert(RecommendationTag::LowAttention);
    }
    if attention.std_dev > 30.0 {
        tags.insert(RecommendationTag::UnstableAttention);
    }

    if summary.stats(ScoreKind::AdhdRisk).mean > 40.0 {
        tags.insert(RecommendationTag::AdhdSupport);
    }
    if summary.stats(ScoreKind::VisualStrain).mean > 40.0 {
        tags.insert(RecommendationTag::VisualComfort);
    }
    if summary.stats(ScoreKind::CognitiveLoad).mean > 70.0 {
        tags.insert(RecommendationTag::CognitiveOverload);
    }
    if summary.stats(ScoreKind::Engagement).mean < 40.0 {
        tags.insert(RecommendationTag::LowEngagement);
    }

    tags.into_iter().collect()
}

/// Builder for reports and exports.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    recent_records: usize,
    producer: Producer,
}

impl ReportBuilder {
    pub fn new(recent_records: usize) -> Self {
        Self {
            recent_records,
            producer: Producer::default(),
        }
    }

    pub fn recent_records(&self) -> usize {
        self.recent_records
    }

    /// Build a dashboard report over an optional look-back window.
    pub fn build(
        &self,
        session: SessionInfo,
        records: &[AssessmentRecord],
        alerts: &[Alert],
        window: Option<Duration>,
    ) -> Report {
        let summary = summarize(records, alerts, window);
        let windowed = within_window(records, window);
        let start = records.len().saturating_sub(self.recent_records);

        Report {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            producer: self.producer.clone(),
            session,
            window_secs: window.map(|w| w.num_seconds()),
            recommendations: recommendations(&summary),
            performance: analytics::performance(windowed, &summary),
            accessibility: accessibility::assess(windowed),
            summary,
            latest: records.last().cloned(),
            recent_records: records[start..].to_vec(),
            alerts: alerts.to_vec(),
        }
    }

    /// Build a full session export over the whole history.
    pub fn export(
        &self,
        session: SessionInfo,
        records: Vec<AssessmentRecord>,
        alerts: Vec<Alert>,
    ) -> SessionExport {
        let summary = summarize(&records, &alerts, None);
        SessionExport {
            export_version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            producer: self.producer.clone(),
            session,
            records,
            alerts,
            summary,
        }
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_RECORDS)
    }
}
