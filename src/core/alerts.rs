//! Threshold and cooldown alerting.
//!
//! The alert engine turns score crossings into deduplicated notifications.
//! At most one alert per category is raised within a cooldown window; later
//! crossings inside the window are suppressed, not recorded.

use crate::core::record::AssessmentRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Default number of alerts retained in the log.
pub const DEFAULT_ALERT_CAPACITY: usize = 200;

/// Default consecutive face-absent records before a face-lost alert.
pub const DEFAULT_FACE_LOST_GRACE: u32 = 10;

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertCategory {
    Stress,
    Attention,
    VisualStrain,
    AdhdRisk,
    FaceLost,
}

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warning, Severity::Critical];
}

/// Which side of a threshold is the bad side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    /// Values at or above the thresholds alert
    Above,
    /// Values at or below the thresholds alert
    Below,
}

/// Warning and critical thresholds for one score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub warning: f64,
    pub critical: f64,
    pub direction: ThresholdDirection,
}

impl ThresholdRule {
    pub fn above(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            direction: ThresholdDirection::Above,
        }
    }

    pub fn below(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            direction: ThresholdDirection::Below,
        }
    }

    /// Severity of `value` under this rule, if it crosses a threshold.
    pub fn severity(&self, value: f64) -> Option<Severity> {
        let crosses = |threshold: f64| match self.direction {
            ThresholdDirection::Above => value >= threshold,
            ThresholdDirection::Below => value <= threshold,
        };

        if crosses(self.critical) {
            Some(Severity::Critical)
        } else if crosses(self.warning) {
            Some(Severity::Warning)
        } else {
            None
        }
    }
}

/// Per-category thresholds on the [0, 100] scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub stress: ThresholdRule,
    pub attention: ThresholdRule,
    pub visual_strain: ThresholdRule,
    pub adhd_risk: ThresholdRule,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            stress: ThresholdRule::above(60.0, 80.0),
            attention: ThresholdRule::below(40.0, 25.0),
            visual_strain: ThresholdRule::above(60.0, 75.0),
            adhd_risk: ThresholdRule::above(50.0, 75.0),
        }
    }
}

/// An immutable notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub category: AlertCategory,
    pub severity: Severity,
    /// The score that crossed the threshold (none for face-lost)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub raised_at: DateTime<Utc>,
    pub cooldown_until: DateTime<Utc>,
}

/// Bounded FIFO of raised alerts.
#[derive(Debug, Clone)]
pub struct AlertLog {
    alerts: VecDeque<Alert>,
    capacity: usize,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY)
    }
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            alerts: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an alert, evicting the oldest when at capacity.
    pub fn push(&mut self, alert: Alert) {
        if self.alerts.len() >= self.capacity {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert);
    }

    /// Owned copy of the alerts raised at or after `since`.
    pub fn snapshot(&self, since: Option<DateTime<Utc>>) -> Vec<Alert> {
        self.alerts
            .iter()
            .filter(|a| since.map_or(true, |cutoff| a.raised_at >= cutoff))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

/// Threshold, cooldown and face-lost tracking.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    thresholds: AlertThresholds,
    cooldown: Duration,
    face_lost_grace: u32,
    consecutive_face_lost: u32,
    cooldown_until: HashMap<AlertCategory, DateTime<Utc>>,
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(
            AlertThresholds::default(),
            Duration::minutes(5),
            DEFAULT_FACE_LOST_GRACE,
        )
    }
}

impl AlertEngine {
    pub fn new(thresholds: AlertThresholds, cooldown: Duration, face_lost_grace: u32) -> Self {
        Self {
            thresholds,
            cooldown,
            face_lost_grace: face_lost_grace.max(1),
            consecutive_face_lost: 0,
            cooldown_until: HashMap::new(),
        }
    }

    /// Evaluate one appended record and return the alerts it raises.
    ///
    /// Cooldowns are measured on record timestamps. Face-absent records only
    /// feed the face-lost counter: their scores are decayed, not observed.
    pub fn evaluate(&mut self, record: &AssessmentRecord) -> Vec<Alert> {
        let mut raised = Vec::new();

        if !record.face_present {
            self.consecutive_face_lost = self.consecutive_face_lost.saturating_add(1);
            if self.consecutive_face_lost == self.face_lost_grace {
                if let Some(alert) =
                    self.raise(AlertCategory::FaceLost, Severity::Warning, None, record.timestamp)
                {
                    raised.push(alert);
                }
            }
            return raised;
        }

        self.consecutive_face_lost = 0;

        let checks = [
            (AlertCategory::Stress, self.thresholds.stress, record.scores.stress),
            (AlertCategory::Attention, self.thresholds.attention, record.scores.attention),
            (
                AlertCategory::VisualStrain,
                self.thresholds.visual_strain,
                record.scores.visual_strain,
            ),
            (AlertCategory::AdhdRisk, self.thresholds.adhd_risk, record.scores.adhd_risk),
        ];

        for (category, rule, value) in checks {
            if let Some(severity) = rule.severity(value) {
                if let Some(alert) = self.raise(category, severity, Some(value), record.timestamp) {
                    raised.push(alert);
                }
            }
        }

        raised
    }

    /// Raise an alert unless the category is cooling down.
    fn raise(
        &mut self,
        category: AlertCategory,
        severity: Severity,
        value: Option<f64>,
        at: DateTime<Utc>,
    ) -> Option<Alert> {
        if let Some(until) = self.cooldown_until.get(&category) {
            if at < *until {
                tracing::debug!(?category, ?severity, "alert suppressed by cooldown");
                return None;
            }
        }

        let cooldown_until = at
            .checked_add_signed(self.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.cooldown_until.insert(category, cooldown_until);

        Some(Alert {
            id: Uuid::new_v4(),
            category,
            severity,
            value,
            raised_at: at,
            cooldown_until,
        })
    }

    /// Consecutive face-absent records seen so far.
    pub fn consecutive_face_lost(&self) -> u32 {
        self.consecutive_face_lost
    }

    /// Forget cooldowns and the face-lost streak (new session).
    pub fn reset(&mut self) {
        self.consecutive_face_lost = 0;
        self.cooldown_until.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::EmotionLabel;
    use crate::core::record::Scores;

    fn record(at: DateTime<Utc>, stress: f64, face_present: bool) -> AssessmentRecord {
        AssessmentRecord::from_parts(
            at,
            EmotionLabel::Neutral,
            0.8,
            Scores {
                stress,
                ..Scores::NEUTRAL
            },
            0.1,
            face_present,
        )
    }

    #[test]
    fn test_threshold_rule_directions() {
        let above = ThresholdRule::above(60.0, 80.0);
        assert_eq!(above.severity(59.9), None);
        assert_eq!(above.severity(60.0), Some(Severity::Warning));
        assert_eq!(above.severity(85.0), Some(Severity::Critical));

        let below = ThresholdRule::below(40.0, 25.0);
        assert_eq!(below.severity(50.0), None);
        assert_eq!(below.severity(35.0), Some(Severity::Warning));
        assert_eq!(below.severity(10.0), Some(Severity::Critical));
    }

    #[test]
    fn test_stress_ramp_within_cooldown_raises_once() {
        let mut engine = AlertEngine::default();
        let t0 = Utc::now();

        let mut alerts = Vec::new();
        alerts.extend(engine.evaluate(&record(t0, 40.0, true)));
        alerts.extend(engine.evaluate(&record(t0 + Duration::minutes(1), 85.0, true)));
        alerts.extend(engine.evaluate(&record(t0 + Duration::minutes(2), 90.0, true)));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::Stress);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].value, Some(85.0));
        assert_eq!(alerts[0].cooldown_until, alerts[0].raised_at + Duration::minutes(5));
    }

    #[test]
    fn test_crossing_after_cooldown_raises_again() {
        let mut engine = AlertEngine::default();
        let t0 = Utc::now();

        assert_eq!(engine.evaluate(&record(t0, 85.0, true)).len(), 1);
        assert!(engine
            .evaluate(&record(t0 + Duration::seconds(299), 85.0, true))
            .is_empty());
        assert_eq!(
            engine
                .evaluate(&record(t0 + Duration::minutes(5), 85.0, true))
                .len(),
            1
        );
    }

    #[test]
    fn test_face_lost_after_grace_period() {
        let mut engine = AlertEngine::default();
        let t0 = Utc::now();

        let mut raised = Vec::new();
        for i in 0..10 {
            let alerts = engine.evaluate(&record(t0 + Duration::seconds(i), 95.0, false));
            if !alerts.is_empty() {
                raised.push((i, alerts));
            }
        }

        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].0, 9);
        assert_eq!(raised[0].1[0].category, AlertCategory::FaceLost);
        assert_eq!(raised[0].1[0].value, None);

        // The streak keeps going without a second alert
        for i in 10..30 {
            assert!(engine
                .evaluate(&record(t0 + Duration::seconds(i), 95.0, false))
                .is_empty());
        }
    }

    #[test]
    fn test_face_regained_resets_streak() {
        let mut engine = AlertEngine::default();
        let t0 = Utc::now();

        for i in 0..9 {
            engine.evaluate(&record(t0 + Duration::seconds(i), 30.0, false));
        }
        engine.evaluate(&record(t0 + Duration::seconds(9), 30.0, true));
        assert_eq!(engine.consecutive_face_lost(), 0);
        assert!(engine
            .evaluate(&record(t0 + Duration::seconds(10), 30.0, false))
            .is_empty());
    }

    #[test]
    fn test_categories_cool_down_independently() {
        let mut engine = AlertEngine::default();
        let t0 = Utc::now();
        let mut scores = Scores::NEUTRAL;
        scores.stress = 90.0;
        scores.visual_strain = 80.0;
        let both = AssessmentRecord::from_parts(t0, EmotionLabel::Angry, 0.9, scores, 0.5, true);

        let alerts = engine.evaluate(&both);
        let categories: Vec<_> = alerts.iter().map(|a| a.category).collect();
        assert_eq!(
            categories,
            vec![AlertCategory::Stress, AlertCategory::VisualStrain]
        );
    }

    #[test]
    fn test_alert_log_fifo() {
        let mut engine = AlertEngine::new(AlertThresholds::default(), Duration::zero(), 10);
        let mut log = AlertLog::new(3);
        let t0 = Utc::now();

        for i in 0..5 {
            for alert in engine.evaluate(&record(t0 + Duration::seconds(i), 90.0, true)) {
                log.push(alert);
            }
        }

        assert_eq!(log.len(), 3);
        let alerts = log.snapshot(None);
        assert_eq!(alerts[0].raised_at, t0 + Duration::seconds(2));
        assert_eq!(log.snapshot(Some(t0 + Duration::seconds(4))).len(), 1);
    }

    #[test]
    fn test_reset_clears_cooldowns() {
        let mut engine = AlertEngine::default();
        let t0 = Utc::now();
        assert_eq!(engine.evaluate(&record(t0, 85.0, true)).len(), 1);
        engine.reset();
        assert_eq!(engine.evaluate(&record(t0, 85.0, true)).len(), 1);
    }

    #[test]
    fn test_huge_cooldown_saturates() {
        let mut engine = AlertEngine::new(
            AlertThresholds::default(),
            Duration::days(100_000_000),
            DEFAULT_FACE_LOST_GRACE,
        );
        let t0 = Utc::now();

        let alerts = engine.evaluate(&record(t0, 85.0, true));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].cooldown_until, DateTime::<Utc>::MAX_UTC);
        assert!(engine
            .evaluate(&record(t0 + Duration::days(365), 85.0, true))
            .is_empty());
    }
}
