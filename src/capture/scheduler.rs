//! Frame pacing.
//!
//! The scheduler decouples ingestion cost from the detector's frame rate:
//! every submitted frame is counted, but only every Nth one is forwarded.

use crate::error::MonitorError;

/// Outcome of a frame submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    /// The frame should be ingested
    Forward { frame: u64 },
    /// The frame was counted and dropped
    Skip { frame: u64 },
}

impl FrameDecision {
    pub fn is_forward(&self) -> bool {
        matches!(self, FrameDecision::Forward { .. })
    }

    pub fn frame(&self) -> u64 {
        match *self {
            FrameDecision::Forward { frame } | FrameDecision::Skip { frame } => frame,
        }
    }
}

/// Frame counter with a deterministic skip cadence.
#[derive(Debug, Clone)]
pub struct CaptureScheduler {
    frame_skip: u64,
    frames_submitted: u64,
    frames_forwarded: u64,
    running: bool,
}

impl CaptureScheduler {
    /// Create a stopped scheduler forwarding every `frame_skip`-th frame.
    pub fn new(frame_skip: u32) -> Self {
        Self {
            frame_skip: u64::from(frame_skip.max(1)),
            frames_submitted: 0,
            frames_forwarded: 0,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Count a frame and decide whether it is forwarded.
    ///
    /// Frames N, 2N, 3N, ... are forwarded. Submissions while stopped are
    /// rejected without touching the counter.
    pub fn submit(&mut self) -> Result<FrameDecision, MonitorError> {
        if !self.running {
            return Err(MonitorError::SessionNotRunning);
        }

        self.frames_submitted += 1;
        let frame = self.frames_submitted;

        if frame % self.frame_skip == 0 {
            self.frames_forwarded += 1;
            Ok(FrameDecision::Forward { frame })
        } else {
            Ok(FrameDecision::Skip { frame })
        }
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    pub fn frames_forwarded(&self) -> u64 {
        self.frames_forwarded
    }

    /// Zero the counters (new session). The running flag is left untouched.
    pub fn reset_counters(&mut self) {
        self.frames_submitted = 0;
        self.frames_forwarded = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_third_frame_forwarded() {
        let mut scheduler = CaptureScheduler::new(3);
        scheduler.start();

        let forwarded: Vec<u64> = (0..9)
            .map(|_| scheduler.submit().unwrap())
            .filter(|d| d.is_forward())
            .map(|d| d.frame())
            .collect();

        assert_eq!(forwarded, vec![3, 6, 9]);
        assert_eq!(scheduler.frames_submitted(), 9);
        assert_eq!(scheduler.frames_forwarded(), 3);
    }

    #[test]
    fn test_skip_of_one_forwards_everything() {
        let mut scheduler = CaptureScheduler::new(1);
        scheduler.start();
        assert!((0..5).all(|_| scheduler.submit().unwrap().is_forward()));
    }

    #[test]
    fn test_submit_while_stopped() {
        let mut scheduler = CaptureScheduler::new(3);
        assert_eq!(scheduler.submit(), Err(MonitorError::SessionNotRunning));
        assert_eq!(scheduler.frames_submitted(), 0);

        scheduler.start();
        scheduler.submit().unwrap();
        scheduler.stop();
        assert_eq!(scheduler.submit(), Err(MonitorError::SessionNotRunning));
        assert_eq!(scheduler.frames_submitted(), 1);
    }
}
