//! The single-writer ingestion pipeline.
//!
//! frame → skip decision → ingest → score → append → alert evaluation, run
//! to completion for each forwarded frame. Scoring context is read from the
//! history buffer; the pipeline keeps no copy of past records.

use crate::capture::scheduler::CaptureScheduler;
use crate::capture::types::RawObservation;
use crate::config::MonitorConfig;
use crate::core::alerts::AlertEngine;
use crate::core::ingest::SignalIngestor;
use crate::core::record::AssessmentRecord;
use crate::core::scoring::Scorer;
use crate::error::MonitorError;
use crate::session::state::{read_state, write_state, SessionState};
use std::sync::RwLock;

/// Scheduler, ingestor, scorer and alert engine driven as one unit.
#[derive(Debug)]
pub struct Pipeline {
    scheduler: CaptureScheduler,
    ingestor: SignalIngestor,
    scorer: Scorer,
    alerts: AlertEngine,
}

impl Pipeline {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            scheduler: CaptureScheduler::new(config.frame_skip),
            ingestor: SignalIngestor::new(),
            scorer: Scorer::new(config.risk_window, config.decay_factor),
            alerts: AlertEngine::new(
                config.thresholds.clone(),
                config.cooldown(),
                config.face_lost_grace,
            ),
        }
    }

    pub fn start(&mut self) {
        self.scheduler.start();
    }

    /// Stop forwarding. Takes effect for the next `submit`.
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Submit a candidate frame through the skip policy.
    ///
    /// Returns `Ok(None)` for skipped frames. Rejected observations are
    /// counted as submitted and rejected, then returned as errors.
    pub fn submit(
        &mut self,
        raw: RawObservation,
        state: &RwLock<SessionState>,
    ) -> Result<Option<AssessmentRecord>, MonitorError> {
        let decision = self.scheduler.submit()?;
        write_state(state).record_submitted();

        if !decision.is_forward() {
            tracing::trace!(frame = decision.frame(), "frame skipped");
            return Ok(None);
        }

        tracing::debug!(frame = decision.frame(), "frame forwarded");
        self.process(raw, state).map(Some)
    }

    /// Ingest an observation directly, bypassing the skip policy.
    pub fn ingest(
        &mut self,
        raw: RawObservation,
        state: &RwLock<SessionState>,
    ) -> Result<AssessmentRecord, MonitorError> {
        if !self.scheduler.is_running() {
            return Err(MonitorError::SessionNotRunning);
        }
        write_state(state).record_submitted();
        self.process(raw, state)
    }

    fn process(
        &mut self,
        raw: RawObservation,
        state: &RwLock<SessionState>,
    ) -> Result<AssessmentRecord, MonitorError> {
        let observation = match self.ingestor.ingest(raw) {
            Ok(observation) => observation,
            Err(e) => {
                write_state(state).record_rejected();
                tracing::warn!(error = %e, "observation rejected");
                return Err(e);
            }
        };

        // This pipeline is the only writer, so the tail cannot change
        // between this read and the commit below.
        let context = read_state(state).buffer().tail(self.scorer.window_len());
        let record = self.scorer.score(&observation, &context);
        let alerts = self.alerts.evaluate(&record);

        for alert in &alerts {
            tracing::info!(
                category = ?alert.category,
                severity = ?alert.severity,
                value = ?alert.value,
                "alert raised"
            );
        }

        // The write lock covers only the append and its counters.
        write_state(state).commit(record.clone(), alerts);
        Ok(record)
    }

    pub fn frames_submitted(&self) -> u64 {
        self.scheduler.frames_submitted()
    }

    /// Reset all scoring state for a new session. The running flag is kept.
    pub fn reset(&mut self) {
        self.scheduler.reset_counters();
        self.ingestor.reset();
        self.alerts.reset();
    }
}
