//! Error types for the Adaptive Monitor engine.

use thiserror::Error;

/// Errors surfaced by the monitoring engine.
///
/// An empty look-back window is not an error, and neither is a missing face:
/// the former yields an empty summary, the latter is an observation with the
/// absence flag set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("Malformed observation: {0}")]
    MalformedObservation(String),

    #[error("A monitoring session is already running")]
    SessionAlreadyRunning,

    #[error("No monitoring session is running")]
    SessionNotRunning,

    #[error("Capture source unavailable: {0}")]
    CaptureUnavailable(String),
}

impl MonitorError {
    /// Whether the error only rejects a single observation and leaves the
    /// pipeline usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MonitorError::MalformedObservation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::MalformedObservation("missing timestamp".to_string());
        assert_eq!(err.to_string(), "Malformed observation: missing timestamp");
        assert!(err.is_recoverable());
        assert!(!MonitorError::SessionNotRunning.is_recoverable());
    }
}
