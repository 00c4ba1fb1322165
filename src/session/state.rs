//! Shared session state and frame statistics.
//!
//! `SessionState` is written by exactly one pipeline and read by any number
//! of query callers. Readers clone what they need under a short read lock and
//! do all computation afterwards.

use crate::core::alerts::{Alert, AlertLog};
use crate::core::history::HistoryBuffer;
use crate::core::record::AssessmentRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Frame counters for the current session.
///
/// Kept inside `SessionState` and bumped under its write lock, so a snapshot
/// always agrees with the records it was taken with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameCounts {
    /// Frames accepted by the scheduler while running
    pub frames_submitted: u64,
    /// Frames that produced a record
    pub frames_processed: u64,
    /// Forwarded frames rejected as malformed
    pub frames_rejected: u64,
    /// Alerts raised
    pub alerts_raised: u64,
}

impl FrameCounts {
    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "Session Statistics:\n\
             - Frames submitted: {}\n\
             - Frames processed: {}\n\
             - Frames rejected: {}\n\
             - Alerts raised: {}",
            self.frames_submitted, self.frames_processed, self.frames_rejected, self.alerts_raised
        )
    }
}

/// Owned copy of the history, alert log and counters taken under one read lock.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub records: Vec<AssessmentRecord>,
    pub alerts: Vec<Alert>,
    pub counts: FrameCounts,
}

/// Buffer, alert log and session metadata.
#[derive(Debug)]
pub struct SessionState {
    id: Uuid,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    buffer: HistoryBuffer,
    alerts: AlertLog,
    counts: FrameCounts,
}

impl SessionState {
    pub fn new(buffer_capacity: usize, alert_capacity: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: None,
            stopped_at: None,
            buffer: HistoryBuffer::new(buffer_capacity),
            alerts: AlertLog::new(alert_capacity),
            counts: FrameCounts::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<DateTime<Utc>> {
        self.stopped_at
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.stopped_at.is_none()
    }

    /// Mark the session started. The first start time is kept across restarts.
    pub fn mark_started(&mut self, at: DateTime<Utc>) {
        self.started_at.get_or_insert(at);
        self.stopped_at = None;
    }

    pub fn mark_stopped(&mut self, at: DateTime<Utc>) {
        self.stopped_at = Some(at);
    }

    pub fn record_submitted(&mut self) {
        self.counts.frames_submitted += 1;
    }

    pub fn record_rejected(&mut self) {
        self.counts.frames_rejected += 1;
    }

    /// Append one record and the alerts it raised, counting both.
    pub fn commit(&mut self, record: AssessmentRecord, alerts: Vec<Alert>) {
        self.buffer.append(record);
        self.counts.frames_processed += 1;
        self.counts.alerts_raised += alerts.len() as u64;
        for alert in alerts {
            self.alerts.push(alert);
        }
    }

    pub fn counts(&self) -> FrameCounts {
        self.counts
    }

    pub fn buffer(&self) -> &HistoryBuffer {
        &self.buffer
    }

    pub fn alert_log(&self) -> &AlertLog {
        &self.alerts
    }

    /// Owned copy of records and alerts at or after `since`.
    pub fn snapshot(&self, since: Option<DateTime<Utc>>) -> StateSnapshot {
        StateSnapshot {
            records: self.buffer.snapshot(since),
            alerts: self.alerts.snapshot(since),
            counts: self.counts,
        }
    }

    /// Drop all data and begin a fresh session identity.
    pub fn clear(&mut self) {
        self.id = Uuid::new_v4();
        self.started_at = None;
        self.stopped_at = None;
        self.buffer.clear();
        self.alerts.clear();
        self.counts = FrameCounts::default();
    }
}

/// Thread-safe shared session state.
pub type SharedSessionState = Arc<RwLock<SessionState>>;

/// Take a read guard, recovering from a poisoned lock.
///
/// State is only mutated through `commit` and `clear`, which leave it
/// consistent even if the writer panics afterwards.
pub fn read_state(state: &RwLock<SessionState>) -> RwLockReadGuard<'_, SessionState> {
    state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Take a write guard, recovering from a poisoned lock.
pub fn write_state(state: &RwLock<SessionState>) -> RwLockWriteGuard<'_, SessionState> {
    state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
