//! The posture classification pipeline.
//!
//! This module contains:
//! - The parallel low/high-pass filter stage
//! - The movement, vibration, and tilt/slouch detectors
//! - The classifier resolving detector outputs into one status per tick
//! - The lifecycle controller owning all of the above

pub mod classifier;
pub mod filters;
pub mod monitor;
pub mod movement;
pub mod tilt;
pub mod vibration;

// Re-export commonly used types
pub use classifier::{Classifier, PostureStatus, Tick, BASELINE_SCORE};
pub use filters::{FilterBank, FilteredSample, Vec3, HIGH_PASS_ALPHA, LOW_PASS_ALPHA};
pub use monitor::{LifecycleState, MonitorSnapshot, PostureMonitor};
pub use movement::MovementDetector;
pub use tilt::{score_for_angle, tilt_angle_deg, TiltDetector};
pub use vibration::VibrationDetector;
