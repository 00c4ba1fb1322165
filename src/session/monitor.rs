//! The monitor: lifecycle, producer thread and read-only queries.
//!
//! One `Monitor` owns one session. Writes go through the pipeline mutex,
//! from either the producer thread or direct `submit_frame` callers. Queries
//! clone a snapshot under a short read lock and compute outside it, so they
//! never hold up ingestion.

use crate::capture::source::{CaptureSource, SourcePoll};
use crate::capture::types::RawObservation;
use crate::config::MonitorConfig;
use crate::core::alerts::Alert;
use crate::core::analytics::{self, Summary, TimeSeries};
use crate::core::record::AssessmentRecord;
use crate::core::report::{Report, ReportBuilder, SessionExport, SessionInfo};
use crate::error::MonitorError;
use crate::session::pipeline::Pipeline;
use crate::session::state::{
    read_state, write_state, FrameCounts, SessionState, SharedSessionState, StateSnapshot,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread::{self, JoinHandle};

/// How long the producer waits on an idle source before rechecking its flag.
const POLL_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(50);

type SharedPipeline = Arc<Mutex<Pipeline>>;

fn lock_pipeline(pipeline: &Mutex<Pipeline>) -> MutexGuard<'_, Pipeline> {
    pipeline.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a running producer thread.
struct Producer {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Real-time analytics engine for one session.
pub struct Monitor {
    config: MonitorConfig,
    pipeline: SharedPipeline,
    state: SharedSessionState,
    reports: ReportBuilder,
    producer: Mutex<Option<Producer>>,
}

impl Monitor {
    /// Create a stopped monitor.
    pub fn new(config: MonitorConfig) -> Self {
        let state = SessionState::new(config.buffer_capacity, config.alert_capacity);
        Self {
            pipeline: Arc::new(Mutex::new(Pipeline::new(&config))),
            state: Arc::new(RwLock::new(state)),
            reports: ReportBuilder::new(config.recent_records),
            producer: Mutex::new(None),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start a session fed by `submit_frame` / `ingest` calls.
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut pipeline = lock_pipeline(&self.pipeline);
        if pipeline.is_running() {
            return Err(MonitorError::SessionAlreadyRunning);
        }
        pipeline.start();
        write_state(&self.state).mark_started(Utc::now());
        tracing::info!(session_id = %self.session_id(), "session started");
        Ok(())
    }

    /// Start a session and a producer thread polling `source`.
    ///
    /// Fails with `CaptureUnavailable` and leaves the monitor stopped when
    /// the source cannot be opened.
    pub fn start_capture(&self, mut source: Box<dyn CaptureSource>) -> Result<(), MonitorError> {
        let mut producer_slot = self
            .producer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        {
            let mut pipeline = lock_pipeline(&self.pipeline);
            if pipeline.is_running() {
                return Err(MonitorError::SessionAlreadyRunning);
            }

            source.open().map_err(|e| {
                tracing::warn!(source = source.name(), error = %e, "capture source unavailable");
                MonitorError::CaptureUnavailable(e.to_string())
            })?;

            pipeline.start();
        }

        let running = Arc::new(AtomicBool::new(true));
        let spawned = {
            let running = Arc::clone(&running);
            let pipeline = Arc::clone(&self.pipeline);
            let state = Arc::clone(&self.state);
            thread::Builder::new()
                .name("capture-producer".to_string())
                .spawn(move || run_producer(source, running, pipeline, state))
        };

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                lock_pipeline(&self.pipeline).stop();
                return Err(MonitorError::CaptureUnavailable(format!(
                    "failed to spawn producer thread: {e}"
                )));
            }
        };

        write_state(&self.state).mark_started(Utc::now());
        *producer_slot = Some(Producer { running, handle });
        tracing::info!(session_id = %self.session_id(), "capture session started");
        Ok(())
    }

    /// Stop the session.
    ///
    /// When this returns no further frame is forwarded, the producer thread
    /// has exited and its source has been released.
    pub fn stop(&self) -> Result<(), MonitorError> {
        let producer = self
            .producer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(producer) = &producer {
            producer.running.store(false, Ordering::SeqCst);
        }

        {
            let mut pipeline = lock_pipeline(&self.pipeline);
            if !pipeline.is_running() && producer.is_none() {
                return Err(MonitorError::SessionNotRunning);
            }
            pipeline.stop();
        }

        if let Some(producer) = producer {
            if producer.handle.join().is_err() {
                tracing::warn!("capture producer thread panicked");
            }
        }

        write_state(&self.state).mark_stopped(Utc::now());
        tracing::info!(summary = %self.stats_summary(), "session stopped");
        Ok(())
    }

    /// Stop if running, then clear all session data and counters.
    pub fn reset(&self) -> Result<(), MonitorError> {
        if self.is_running() {
            self.stop()?;
        }
        lock_pipeline(&self.pipeline).reset();
        write_state(&self.state).clear();
        tracing::info!("session reset");
        Ok(())
    }

    /// Submit a candidate frame through the skip policy.
    ///
    /// Returns the record for forwarded frames and `None` for skipped ones.
    pub fn submit_frame(&self, raw: RawObservation) -> Result<Option<AssessmentRecord>, MonitorError> {
        lock_pipeline(&self.pipeline).submit(raw, &self.state)
    }

    /// Ingest an observation directly, bypassing the skip policy.
    pub fn ingest(&self, raw: RawObservation) -> Result<AssessmentRecord, MonitorError> {
        lock_pipeline(&self.pipeline).ingest(raw, &self.state)
    }

    pub fn is_running(&self) -> bool {
        read_state(&self.state).is_running()
    }

    /// Whether a producer thread is still polling its source.
    pub fn is_capturing(&self) -> bool {
        self.producer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }

    pub fn session_id(&self) -> uuid::Uuid {
        read_state(&self.state).id()
    }

    pub fn stats(&self) -> FrameCounts {
        read_state(&self.state).counts()
    }

    /// Frame counters formatted for terminal output.
    pub fn stats_summary(&self) -> String {
        self.stats().summary()
    }

    /// Latest dashboard report over the configured look-back window.
    pub fn dashboard_data(&self) -> Report {
        let (session, snapshot) = self.snapshot(None);
        let window = Duration::from_std(self.config.report_window).ok();
        self.reports
            .build(session, &snapshot.records, &snapshot.alerts, window)
    }

    /// Summary over an optional look-back window.
    pub fn summary(&self, window: Option<Duration>) -> Summary {
        let (_, snapshot) = self.snapshot(None);
        analytics::summarize(&snapshot.records, &snapshot.alerts, window)
    }

    /// Chart-ready series per score over an optional look-back window.
    pub fn time_series(&self, window: Option<Duration>) -> TimeSeries {
        let records = read_state(&self.state).buffer().snapshot(None);
        analytics::time_series(&records, window)
    }

    /// Alerts raised at or after `since` (all when `None`).
    pub fn alerts(&self, since: Option<DateTime<Utc>>) -> Vec<Alert> {
        read_state(&self.state).alert_log().snapshot(since)
    }

    /// Records at or after `since` (all when `None`).
    pub fn records(&self, since: Option<DateTime<Utc>>) -> Vec<AssessmentRecord> {
        read_state(&self.state).buffer().snapshot(since)
    }

    /// Full buffer, alert log and session metadata.
    pub fn export_session(&self) -> SessionExport {
        let (session, snapshot) = self.snapshot(None);
        self.reports
            .export(session, snapshot.records, snapshot.alerts)
    }

    /// Session info, data and counters copied under one read lock.
    fn snapshot(&self, since: Option<DateTime<Utc>>) -> (SessionInfo, StateSnapshot) {
        let state = read_state(&self.state);
        let snapshot = state.snapshot(since);
        let counts = snapshot.counts;

        let start = state.started_at();
        let end = state.stopped_at();
        let duration_secs = start
            .map(|s| (end.unwrap_or_else(Utc::now) - s).num_seconds().max(0))
            .unwrap_or(0);

        let session = SessionInfo {
            id: state.id(),
            running: state.is_running(),
            start,
            end,
            duration_secs,
            frames_submitted: counts.frames_submitted,
            frames_processed: counts.frames_processed,
            frames_rejected: counts.frames_rejected,
            data_points: state.buffer().len(),
        };
        (session, snapshot)
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        let producer = self
            .producer
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(producer) = producer {
            producer.running.store(false, Ordering::SeqCst);
            lock_pipeline(&self.pipeline).stop();
            if producer.handle.join().is_err() {
                tracing::warn!("capture producer thread panicked");
            }
        }
    }
}

/// Producer loop: poll, submit, repeat until cancelled or exhausted.
fn run_producer(
    mut source: Box<dyn CaptureSource>,
    running: Arc<AtomicBool>,
    pipeline: SharedPipeline,
    state: SharedSessionState,
) {
    tracing::debug!(source = source.name(), "producer started");

    while running.load(Ordering::SeqCst) {
        match source.poll(POLL_TIMEOUT) {
            SourcePoll::Frame(observation) => {
                let mut pipeline = lock_pipeline(&pipeline);
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                match pipeline.submit(observation, &state) {
                    Ok(_) => {}
                    Err(MonitorError::SessionNotRunning) => break,
                    // Already logged by the pipeline; one bad frame must not stop capture.
                    Err(_) => {}
                }
            }
            SourcePoll::Idle => {}
            SourcePoll::Exhausted => {
                tracing::info!(source = source.name(), "capture source exhausted");
                break;
            }
        }
    }

    source.release();
    tracing::debug!(source = source.name(), "producer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::source::{ReplaySource, SourceError};
    use crate::capture::types::EmotionLabel;

    struct BrokenSource;

    impl CaptureSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        fn open(&mut self) -> Result<(), SourceError> {
            Err(SourceError::Unavailable("no camera".to_string()))
        }

        fn poll(&mut self, _timeout: std::time::Duration) -> SourcePoll {
            SourcePoll::Exhausted
        }

        fn release(&mut self) {}
    }

    struct CrashingSource;

    impl CaptureSource for CrashingSource {
        fn name(&self) -> &str {
            "crashing"
        }

        fn open(&mut self) -> Result<(), SourceError> {
            Ok(())
        }

        fn poll(&mut self, _timeout: std::time::Duration) -> SourcePoll {
            panic!("detector crashed");
        }

        fn release(&mut self) {}
    }

    fn config(frame_skip: u32) -> MonitorConfig {
        MonitorConfig {
            frame_skip,
            ..MonitorConfig::default()
        }
    }

    #[test]
    fn test_start_twice_fails() {
        let monitor = Monitor::new(config(1));
        monitor.start().unwrap();
        assert_eq!(monitor.start(), Err(MonitorError::SessionAlreadyRunning));
        assert!(monitor.is_running());
    }

    #[test]
    fn test_stop_before_start_fails() {
        let monitor = Monitor::default();
        assert_eq!(monitor.stop(), Err(MonitorError::SessionNotRunning));
    }

    #[test]
    fn test_unavailable_source_creates_no_session() {
        let monitor = Monitor::default();
        let result = monitor.start_capture(Box::new(BrokenSource));
        assert!(matches!(result, Err(MonitorError::CaptureUnavailable(_))));
        assert!(!monitor.is_running());
        assert_eq!(
            monitor.submit_frame(RawObservation::face_lost(Utc::now())),
            Err(MonitorError::SessionNotRunning)
        );
    }

    #[test]
    fn test_replay_runs_to_exhaustion() {
        let monitor = Monitor::new(config(1));
        let t0 = Utc::now();
        let observations = (0..20)
            .map(|i| {
                RawObservation::new(
                    t0 + Duration::seconds(i),
                    EmotionLabel::Happy,
                    0.8,
                    0.1,
                    0.9,
                )
            })
            .collect();

        monitor
            .start_capture(Box::new(ReplaySource::new(observations)))
            .unwrap();
        while monitor.is_capturing() {
            thread::sleep(std::time::Duration::from_millis(5));
        }
        monitor.stop().unwrap();

        assert_eq!(monitor.records(None).len(), 20);
        assert_eq!(monitor.stats().frames_processed, 20);
        assert!(!monitor.is_running());
    }

    #[test]
    fn test_reset_clears_session() {
        let monitor = Monitor::new(config(1));
        monitor.start().unwrap();
        monitor
            .submit_frame(RawObservation::new(Utc::now(), EmotionLabel::Sad, 0.9, 0.5, 0.5))
            .unwrap();
        let first_id = monitor.session_id();

        monitor.reset().unwrap();
        assert!(!monitor.is_running());
        assert!(monitor.records(None).is_empty());
        assert_eq!(monitor.stats(), FrameCounts::default());
        assert_ne!(monitor.session_id(), first_id);

        monitor.start().unwrap();
        assert!(monitor.is_running());
    }

    #[test]
    fn test_dashboard_on_empty_session() {
        let monitor = Monitor::default();
        monitor.start().unwrap();
        let report = monitor.dashboard_data();
        assert!(report.session.running);
        assert_eq!(report.summary.record_count, 0);
        assert!(report.latest.is_none());
    }

    #[test]
    fn test_drop_after_producer_panic() {
        let monitor = Monitor::default();
        monitor.start_capture(Box::new(CrashingSource)).unwrap();
        while monitor.is_capturing() {
            thread::sleep(std::time::Duration::from_millis(5));
        }
        // Joining the crashed producer is logged, not propagated.
        drop(monitor);
    }

    #[test]
    fn test_session_info_matches_snapshot() {
        let monitor = Monitor::new(config(1));
        monitor.start().unwrap();
        let t0 = Utc::now();
        for i in 0..5 {
            monitor
                .submit_frame(RawObservation::new(
                    t0 + Duration::seconds(i),
                    EmotionLabel::Happy,
                    0.8,
                    0.1,
                    0.9,
                ))
                .unwrap();
        }

        let export = monitor.export_session();
        assert_eq!(export.session.frames_processed, export.records.len() as u64);
        assert_eq!(export.session.data_points, export.records.len());
    }
}
