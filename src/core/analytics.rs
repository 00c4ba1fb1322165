//! Windowed summary statistics over history snapshots.
//!
//! Everything here works on owned snapshots and never touches live state.
//! Look-back windows are anchored at the newest record of the snapshot, so a
//! replayed or simulated session summarizes the same way as a live one.

use crate::capture::types::EmotionLabel;
use crate::core::alerts::{Alert, AlertCategory, Severity};
use crate::core::record::{AssessmentRecord, RiskCategory, ScoreKind};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;

/// Slopes smaller than this (score points per minute) count as stable.
const STABLE_SLOPE_PER_MINUTE: f64 = 0.05;

/// Direction of a linear trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    /// Fewer than two points, or all points at the same instant
    Undefined,
}

/// Least-squares trend of a score over time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Slope in score points per minute; positive means increasing
    pub slope_per_minute: Option<f64>,
    pub direction: TrendDirection,
}

impl Trend {
    pub const UNDEFINED: Trend = Trend {
        slope_per_minute: None,
        direction: TrendDirection::Undefined,
    };

    pub fn is_defined(&self) -> bool {
        self.slope_per_minute.is_some()
    }
}

/// Summary statistics of one score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub trend: Trend,
}

impl ScoreStats {
    pub const EMPTY: ScoreStats = ScoreStats {
        mean: 0.0,
        median: 0.0,
        min: 0.0,
        max: 0.0,
        std_dev: 0.0,
        trend: Trend::UNDEFINED,
    };
}

/// Point-in-time summary of a look-back window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub record_count: usize,
    /// Records produced while no face was visible
    pub face_lost_records: usize,
    pub scores: BTreeMap<ScoreKind, ScoreStats>,
    pub emotion_distribution: BTreeMap<EmotionLabel, usize>,
    pub dominant_emotion: Option<EmotionLabel>,
    /// 100 minus the spread of attention; 0 for an empty window
    pub attention_stability: f64,
    pub risk_distribution: BTreeMap<RiskCategory, usize>,
    pub alert_counts: BTreeMap<Severity, usize>,
    pub alert_categories: BTreeMap<AlertCategory, usize>,
}

impl Summary {
    /// Summary of no data: zeroed counts, every trend undefined.
    pub fn empty() -> Self {
        Self {
            window_start: None,
            window_end: None,
            record_count: 0,
            face_lost_records: 0,
            scores: ScoreKind::ALL
                .iter()
                .map(|&kind| (kind, ScoreStats::EMPTY))
                .collect(),
            emotion_distribution: EmotionLabel::ALL.iter().map(|&e| (e, 0)).collect(),
            dominant_emotion: None,
            attention_stability: 0.0,
            risk_distribution: RiskCategory::ALL.iter().map(|&r| (r, 0)).collect(),
            alert_counts: Severity::ALL.iter().map(|&s| (s, 0)).collect(),
            alert_categories: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Stats for one score (zeroed when absent).
    pub fn stats(&self, kind: ScoreKind) -> ScoreStats {
        self.scores.get(&kind).copied().unwrap_or(ScoreStats::EMPTY)
    }

    pub fn alert_count(&self, severity: Severity) -> usize {
        self.alert_counts.get(&severity).copied().unwrap_or(0)
    }
}

impl Default for Summary {
    fn default() -> Self {
        Self::empty()
    }
}

/// Stress above this counts as a spike.
pub const STRESS_SPIKE_THRESHOLD: f64 = 70.0;

/// Session performance indicators over a window. Score-based values are
/// `None` when the window holds no records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Mean attention
    pub attention_efficiency: Option<f64>,
    /// 100 minus the spread of attention
    pub attention_consistency: Option<f64>,
    /// Mean engagement
    pub engagement_rate: Option<f64>,
    pub peak_engagement: Option<f64>,
    /// Percent of records without a stress spike
    pub stress_management: Option<f64>,
    /// 100 minus mean visual strain
    pub visual_comfort: Option<f64>,
    /// Critical alerts raised within the window
    pub critical_events: usize,
}

/// Chart-ready series per score over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub emotions: Vec<EmotionLabel>,
    pub series: BTreeMap<ScoreKind, Vec<f64>>,
}

/// Cutoff for a look-back window anchored at the newest record.
///
/// A window reaching past the representable time range has no cutoff.
pub fn window_cutoff(records: &[AssessmentRecord], window: Option<Duration>) -> Option<DateTime<Utc>> {
    let window = window?;
    let anchor = records.last()?.timestamp;
    anchor.checked_sub_signed(window)
}

/// Records at or after the window cutoff. `records` must be time ordered.
pub fn within_window(records: &[AssessmentRecord], window: Option<Duration>) -> &[AssessmentRecord] {
    match window_cutoff(records, window) {
        Some(cutoff) => {
            let start = records.partition_point(|r| r.timestamp < cutoff);
            &records[start..]
        }
        None => records,
    }
}

/// Summarize a snapshot over an optional look-back window.
pub fn summarize(records: &[AssessmentRecord], alerts: &[Alert], window: Option<Duration>) -> Summary {
    let cutoff = window_cutoff(records, window);
    let records = within_window(records, window);

    let mut summary = Summary::empty();
    for alert in alerts
        .iter()
        .filter(|a| cutoff.map_or(true, |c| a.raised_at >= c))
    {
        *summary.alert_counts.entry(alert.severity).or_insert(0) += 1;
        *summary.alert_categories.entry(alert.category).or_insert(0) += 1;
    }

    if records.is_empty() {
        return summary;
    }

    summary.record_count = records.len();
    summary.window_start = records.first().map(|r| r.timestamp);
    summary.window_end = records.last().map(|r| r.timestamp);
    summary.face_lost_records = records.iter().filter(|r| !r.face_present).count();

    let origin = records[0].timestamp;
    let minutes: Vec<f64> = records
        .iter()
        .map(|r| (r.timestamp - origin).num_milliseconds() as f64 / 60_000.0)
        .collect();

    for kind in ScoreKind::ALL {
        let values: Vec<f64> = records.iter().map(|r| r.score(kind)).collect();
        summary.scores.insert(kind, score_stats(&minutes, &values));
    }
    summary.attention_stability = (100.0 - summary.stats(ScoreKind::Attention).std_dev).max(0.0);

    for record in records {
        *summary.emotion_distribution.entry(record.emotion).or_insert(0) += 1;
        *summary
            .risk_distribution
            .entry(record.adhd_risk_category)
            .or_insert(0) += 1;
    }

    // Ties resolve to the label declared first.
    summary.dominant_emotion = EmotionLabel::ALL
        .iter()
        .map(|&label| (label, summary.emotion_distribution[&label]))
        .filter(|&(_, count)| count > 0)
        .fold(None, |best: Option<(EmotionLabel, usize)>, (label, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label);

    summary
}

/// Performance indicators for the windowed `records` and their summary.
pub fn performance(records: &[AssessmentRecord], summary: &Summary) -> PerformanceMetrics {
    let mut metrics = PerformanceMetrics {
        critical_events: summary.alert_count(Severity::Critical),
        ..PerformanceMetrics::default()
    };
    if records.is_empty() {
        return metrics;
    }

    let attention = summary.stats(ScoreKind::Attention);
    let engagement = summary.stats(ScoreKind::Engagement);
    let spikes = records
        .iter()
        .filter(|r| r.scores.stress > STRESS_SPIKE_THRESHOLD)
        .count();

    metrics.attention_efficiency = Some(attention.mean);
    metrics.attention_consistency = Some(summary.attention_stability);
    metrics.engagement_rate = Some(engagement.mean);
    metrics.peak_engagement = Some(engagement.max);
    metrics.stress_management = Some(100.0 - spikes as f64 / records.len() as f64 * 100.0);
    metrics.visual_comfort =
        Some((100.0 - summary.stats(ScoreKind::VisualStrain).mean).max(0.0));
    metrics
}

/// Chart-ready series of every score over a look-back window.
pub fn time_series(records: &[AssessmentRecord], window: Option<Duration>) -> TimeSeries {
    let records = within_window(records, window);
    TimeSeries {
        timestamps: records.iter().map(|r| r.timestamp).collect(),
        emotions: records.iter().map(|r| r.emotion).collect(),
        series: ScoreKind::ALL
            .iter()
            .map(|&kind| (kind, records.iter().map(|r| r.score(kind)).collect()))
            .collect(),
    }
}

fn score_stats(minutes: &[f64], values: &[f64]) -> ScoreStats {
    if values.is_empty() {
        return ScoreStats::EMPTY;
    }

    ScoreStats {
        mean: values.iter().mean(),
        median: Data::new(values.to_vec()).median(),
        min: Statistics::min(values.iter()),
        max: Statistics::max(values.iter()),
        std_dev: if values.len() > 1 {
            values.iter().population_std_dev()
        } else {
            0.0
        },
        trend: linear_trend(minutes, values),
    }
}

/// Simple linear regression slope of `values` against `minutes`.
pub fn linear_trend(minutes: &[f64], values: &[f64]) -> Trend {
    if minutes.len() != values.len() || values.len() < 2 {
        return Trend::UNDEFINED;
    }

    let x_mean = minutes.iter().mean();
    let y_mean = values.iter().mean();

    let (covariance, x_variance) = minutes
        .iter()
        .zip(values)
        .fold((0.0, 0.0), |(cov, var), (&x, &y)| {
            let dx = x - x_mean;
            (cov + dx * (y - y_mean), var + dx * dx)
        });

    if x_variance <= f64::EPSILON {
        return Trend::UNDEFINED;
    }

    let slope = covariance / x_variance;
    let direction = if slope > STABLE_SLOPE_PER_MINUTE {
        TrendDirection::Increasing
    } else if slope < -STABLE_SLOPE_PER_MINUTE {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    Trend {
        slope_per_minute: Some(slope),
        direction,
    }
}
