//! Posture Monitor - motion-sensor posture classification engine.
//!
//! This library turns a noisy stream of 3-axis acceleration samples into
//! a single exclusive posture status (`good`, `slouching`, `moving`,
//! `vibration`) and a continuously updated 0–100 posture score.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Posture Monitor                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐ │
//! │  │  Source  │──▶│ Throttle │──▶│  Filters  │──▶│ Detectors│ │
//! │  │  (chain) │   │   gate   │   │ (LP / HP) │   │ (3-way)  │ │
//! │  └──────────┘   └──────────┘   └───────────┘   └────┬─────┘ │
//! │        │                                            ▼       │
//! │  ┌──────────┐                                 ┌──────────┐  │
//! │  │ Session  │                                 │Classifier│  │
//! │  │  Stats   │                                 │{status,  │  │
//! │  └──────────┘                                 │  score}  │  │
//! │                                               └──────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sources are tried in a fixed fallback order — inertial pair, coarse
//! motion-event feed, simulated generator — so the pipeline always has
//! a live signal; capability absence, permission denial, and
//! subscription failure all degrade rather than fail.
//!
//! # Example
//!
//! ```no_run
//! use posture_monitor::{MonitorConfig, PostureMonitor};
//! use std::time::Duration;
//!
//! let mut monitor = PostureMonitor::new(MonitorConfig::default());
//! monitor.start();
//!
//! for _ in 0..100 {
//!     monitor.step(Duration::from_millis(100));
//!     println!("{} (score {})", monitor.status(), monitor.score());
//! }
//!
//! monitor.stop();
//! ```

pub mod config;
pub mod engine;
pub mod source;
pub mod telemetry;

// Re-export key types at crate root for convenience
pub use config::{ConfigError, MonitorConfig, SpanBounds};
pub use engine::{
    MonitorSnapshot, PostureMonitor, PostureStatus, BASELINE_SCORE,
};
pub use source::{
    AccessDecision, MotionSample, RotationRate, SensorSource, SourceChain, SourceError, SourceKind,
};
pub use telemetry::{SessionStats, SharedSessionStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_crate_root_reexports() {
        // The collaborator-facing surface is reachable from the root.
        let config = MonitorConfig::default();
        let monitor = PostureMonitor::new(config);
        assert_eq!(monitor.status(), PostureStatus::Good);
        assert_eq!(monitor.score(), BASELINE_SCORE);
    }
}
