//! Configuration for the Adaptive Monitor.

use crate::core::alerts::AlertThresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration: where exports go plus the engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path for exported session documents
    pub export_path: PathBuf,

    /// Path for storing state
    pub data_path: PathBuf,

    /// Engine tuning
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adaptive-monitor");

        Self {
            export_path: data_dir.join("exports"),
            data_path: data_dir,
            monitor: MonitorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.monitor.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adaptive-monitor")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Tuning for the capture, scoring, history and alert stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Forward every Nth submitted frame to the ingestor
    pub frame_skip: u32,
    /// Capacity of the rolling history buffer
    pub buffer_capacity: usize,
    /// Capacity of the alert log
    pub alert_capacity: usize,
    /// Number of trailing records used for ADHD-risk smoothing
    pub risk_window: usize,
    /// Number of most recent records included in a report timeline
    pub recent_records: usize,
    /// Consecutive face-absent records before a face-lost alert
    pub face_lost_grace: u32,
    /// Fraction of the distance to neutral covered per face-absent record
    pub decay_factor: f64,
    /// Minimum interval between two alerts of the same category
    #[serde(with = "duration_serde")]
    pub alert_cooldown: Duration,
    /// Look-back window used for the dashboard report
    #[serde(with = "duration_serde")]
    pub report_window: Duration,
    /// Per-category alert thresholds
    pub thresholds: AlertThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            frame_skip: 3,
            buffer_capacity: 1000,
            alert_capacity: 200,
            risk_window: 30,
            recent_records: 30,
            face_lost_grace: 10,
            decay_factor: 0.2,
            alert_cooldown: Duration::from_secs(300), // 5 minutes
            report_window: Duration::from_secs(3600),
            thresholds: AlertThresholds::default(),
        }
    }
}

impl MonitorConfig {
    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_skip == 0 {
            return Err(ConfigError::InvalidValue(
                "frame_skip must be at least 1".to_string(),
            ));
        }
        if self.buffer_capacity == 0 || self.alert_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "buffer and alert capacities must be non-zero".to_string(),
            ));
        }
        if self.risk_window == 0 {
            return Err(ConfigError::InvalidValue(
                "risk_window must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.decay_factor) {
            return Err(ConfigError::InvalidValue(
                "decay_factor must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Cooldown as a chrono duration for timestamp arithmetic.
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.alert_cooldown)
            .unwrap_or_else(|_| chrono::Duration::days(36_500))
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration (whole seconds).
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.monitor.frame_skip, 3);
        assert_eq!(config.monitor.buffer_capacity, 1000);
        assert_eq!(config.monitor.alert_capacity, 200);
        assert_eq!(config.monitor.alert_cooldown, Duration::from_secs(300));
        assert!(config.monitor.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_skip() {
        let monitor = MonitorConfig {
            frame_skip: 0,
            ..MonitorConfig::default()
        };
        assert!(matches!(
            monitor.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("adaptive-monitor-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");

        let mut config = Config::default();
        config.monitor.frame_skip = 5;
        config.monitor.alert_cooldown = Duration::from_secs(60);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.monitor.frame_skip, 5);
        assert_eq!(loaded.monitor.alert_cooldown, Duration::from_secs(60));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("adaptive-monitor-does-not-exist.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.monitor.risk_window, 30);
    }

    #[test]
    fn test_partial_monitor_section_uses_defaults() {
        let json = r#"{
            "export_path": "/tmp/exports",
            "data_path": "/tmp/data",
            "monitor": { "frame_skip": 2, "alert_cooldown": 120 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.monitor.frame_skip, 2);
        assert_eq!(config.monitor.alert_cooldown, Duration::from_secs(120));
        assert_eq!(config.monitor.buffer_capacity, 1000);
    }
}
