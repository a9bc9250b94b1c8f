//! Sample and access types shared by all sensor sources.
//!
//! A source's only job is to deliver `MotionSample`s into a channel.
//! Samples are ephemeral: the engine consumes them synchronously, in
//! arrival order, and never retains them past the current tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single 3-axis acceleration reading, optionally paired with a
/// rotation rate when the source exposes a gyroscope.
///
/// Acceleration includes gravity (m/s²); the filter stage separates the
/// slow gravity component from transient shocks downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionSample {
    /// Timestamp when the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Acceleration along the x axis (m/s²)
    pub x: f64,
    /// Acceleration along the y axis (m/s²)
    pub y: f64,
    /// Acceleration along the z axis (m/s²)
    pub z: f64,
    /// Rotation rate, when the source has a gyroscope
    pub rotation: Option<RotationRate>,
}

impl MotionSample {
    /// Create a sample stamped with the current time.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            x,
            y,
            z,
            rotation: None,
        }
    }

    /// Create a sample with an explicit timestamp.
    pub fn at(timestamp: DateTime<Utc>, x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp,
            x,
            y,
            z,
            rotation: None,
        }
    }

    /// Attach a rotation rate reading.
    pub fn with_rotation(mut self, rotation: RotationRate) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Acceleration magnitude across all three axes.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Angular velocity around the device axes (deg/s).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RotationRate {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Identifies which source implementation produced the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// High-resolution accelerometer + gyroscope pair
    InertialPair,
    /// Coarse push-event sample feed
    MotionEvent,
    /// Generated fallback stream
    Simulated,
}

impl SourceKind {
    /// True for sources backed by real hardware.
    pub fn is_hardware(&self) -> bool {
        !matches!(self, SourceKind::Simulated)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::InertialPair => write!(f, "inertial-pair"),
            SourceKind::MotionEvent => write!(f, "motion-event"),
            SourceKind::Simulated => write!(f, "simulated"),
        }
    }
}

/// Outcome of a permission negotiation.
///
/// Denial is a signal, not an error: the caller moves on to the next
/// source in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The platform granted access (explicitly or automatically)
    Granted,
    /// The user or platform declined
    Denied,
    /// No permission gate exists for this source
    NotRequired,
}

impl AccessDecision {
    /// Whether the source may be subscribed.
    pub fn allows_subscription(&self) -> bool {
        matches!(self, AccessDecision::Granted | AccessDecision::NotRequired)
    }
}

/// Errors a source can report while being brought up.
///
/// All variants are recovered locally by falling through to the next
/// source in the chain; none of them surface to the engine's caller.
#[derive(Debug)]
pub enum SourceError {
    /// The sensor API or device node is not present
    CapabilityUnavailable,
    /// Permission negotiation ended in a denial
    PermissionDenied,
    /// The platform failed to start delivery
    SubscriptionFailure(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::CapabilityUnavailable => write!(f, "sensor capability unavailable"),
            SourceError::PermissionDenied => write!(f, "sensor permission denied"),
            SourceError::SubscriptionFailure(e) => write!(f, "sensor subscription failed: {e}"),
        }
    }
}

impl std::error::Error for SourceError {}
