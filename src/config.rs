//! Configuration for the posture monitor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Immutable tuning parameters for one monitor instance.
///
/// Fixed at construction; a running monitor never observes a change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Target sampling frequency; faster arrivals are throttled away
    pub frequency_hz: u32,

    /// Tilt angle above which a slouch may begin, in degrees
    pub slouch_threshold_deg: f64,

    /// How long the tilt must persist before slouching is confirmed
    pub slouch_duration_ms: u64,

    /// High-pass magnitude that counts as a significant spike
    pub vibration_threshold: f64,

    /// Bounds on the first-to-last spike span of a vibration pattern
    pub vibration_span_ms: SpanBounds,

    /// Magnitude std-dev above which the wearer is considered moving
    pub movement_threshold: f64,

    /// Accepted samples before the filters are considered settled
    pub calibration_samples: usize,
}

/// Inclusive lower and upper bounds on a duration, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpanBounds {
    pub min: u64,
    pub max: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 50,
            slouch_threshold_deg: 15.0,
            slouch_duration_ms: 5000,
            vibration_threshold: 2.5,
            vibration_span_ms: SpanBounds { min: 300, max: 800 },
            movement_threshold: 1.5,
            calibration_samples: 100,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: MonitorConfig = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("posture-monitor")
            .join("config.json")
    }

    /// Default path for session statistics persistence.
    pub fn data_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("posture-monitor")
    }

    /// Milliseconds between two accepted samples at the target frequency.
    pub fn throttle_interval_ms(&self) -> i64 {
        (1000 / self.frequency_hz.max(1)) as i64
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.frequency_hz, 50);
        assert_eq!(config.slouch_threshold_deg, 15.0);
        assert_eq!(config.slouch_duration_ms, 5000);
        assert_eq!(config.vibration_threshold, 2.5);
        assert_eq!(config.vibration_span_ms.min, 300);
        assert_eq!(config.vibration_span_ms.max, 800);
        assert_eq!(config.movement_threshold, 1.5);
        assert_eq!(config.calibration_samples, 100);
    }

    #[test]
    fn test_throttle_interval() {
        let config = MonitorConfig::default();
        assert_eq!(config.throttle_interval_ms(), 20);

        let slow = MonitorConfig {
            frequency_hz: 10,
            ..MonitorConfig::default()
        };
        assert_eq!(slow.throttle_interval_ms(), 100);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = MonitorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: MonitorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.frequency_hz, config.frequency_hz);
        assert_eq!(parsed.vibration_span_ms.max, config.vibration_span_ms.max);
    }
}
