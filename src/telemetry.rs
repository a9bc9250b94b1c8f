//! Session statistics for the posture monitor.
//!
//! Tracks what the pipeline did — samples accepted and throttled, ticks
//! per status, vibrations confirmed, source fallbacks — without
//! retaining any sample data. Counters are atomics so the stats handle
//! can be shared with reporting code while the monitor keeps mutating.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Statistics for the current monitoring session.
#[derive(Debug)]
pub struct SessionStats {
    /// Samples that passed the throttle gate
    samples_accepted: AtomicU64,
    /// Samples dropped by the throttle gate
    samples_dropped: AtomicU64,
    /// Ticks classified per status
    ticks_good: AtomicU64,
    ticks_slouching: AtomicU64,
    ticks_moving: AtomicU64,
    ticks_vibration: AtomicU64,
    /// Confirmed vibration events
    vibration_events: AtomicU64,
    /// Sources skipped while walking the fallback chain
    source_fallbacks: AtomicU64,
    /// Successful subscriptions (one per start)
    subscriptions: AtomicU64,
    /// Session identifier
    session_id: Uuid,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl SessionStats {
    /// Create a new statistics record.
    pub fn new() -> Self {
        Self {
            samples_accepted: AtomicU64::new(0),
            samples_dropped: AtomicU64::new(0),
            ticks_good: AtomicU64::new(0),
            ticks_slouching: AtomicU64::new(0),
            ticks_moving: AtomicU64::new(0),
            ticks_vibration: AtomicU64::new(0),
            vibration_events: AtomicU64::new(0),
            source_fallbacks: AtomicU64::new(0),
            subscriptions: AtomicU64::new(0),
            session_id: Uuid::new_v4(),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a statistics record that persists to the given path.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);
        stats
    }

    /// Record a sample accepted past the throttle gate.
    pub fn record_accepted(&self) {
        self.samples_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a throttled sample.
    pub fn record_dropped(&self) {
        self.samples_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one classified tick.
    pub fn record_tick(&self, status: crate::engine::PostureStatus) {
        use crate::engine::PostureStatus;
        let counter = match status {
            PostureStatus::Good => &self.ticks_good,
            PostureStatus::Slouching => &self.ticks_slouching,
            PostureStatus::Moving => &self.ticks_moving,
            PostureStatus::Vibration => &self.ticks_vibration,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a confirmed vibration event.
    pub fn record_vibration_event(&self) {
        self.vibration_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a source skipped during the fallback walk.
    pub fn record_source_fallback(&self) {
        self.source_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful subscription.
    pub fn record_subscription(&self) {
        self.subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of successful subscriptions so far.
    pub fn subscriptions(&self) -> u64 {
        self.subscriptions.load(Ordering::Relaxed)
    }

    /// Number of samples accepted so far.
    pub fn samples_accepted(&self) -> u64 {
        self.samples_accepted.load(Ordering::Relaxed)
    }

    /// Get the current statistics snapshot.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            session_id: self.session_id,
            samples_accepted: self.samples_accepted.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            ticks_good: self.ticks_good.load(Ordering::Relaxed),
            ticks_slouching: self.ticks_slouching.load(Ordering::Relaxed),
            ticks_moving: self.ticks_moving.load(Ordering::Relaxed),
            ticks_vibration: self.ticks_vibration.load(Ordering::Relaxed),
            vibration_events: self.vibration_events.load(Ordering::Relaxed),
            source_fallbacks: self.source_fallbacks.load(Ordering::Relaxed),
            subscriptions: self.subscriptions.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Samples accepted: {}\n\
             - Samples throttled: {}\n\
             - Ticks good/slouching/moving/vibration: {}/{}/{}/{}\n\
             - Vibration events: {}\n\
             - Source fallbacks: {}\n\
             - Session duration: {} seconds",
            stats.samples_accepted,
            stats.samples_dropped,
            stats.ticks_good,
            stats.ticks_slouching,
            stats.ticks_moving,
            stats.ticks_vibration,
            stats.vibration_events,
            stats.source_fallbacks,
            stats.session_duration_secs
        )
    }

    /// Save the snapshot to disk, if a persistence path was configured.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.stats())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to session statistics.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create a shared statistics handle.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

/// Create a shared statistics handle with persistence.
pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedSessionStats {
    Arc::new(SessionStats::with_persistence(path))
}

/// Serializable point-in-time view of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub session_id: Uuid,
    pub samples_accepted: u64,
    pub samples_dropped: u64,
    pub ticks_good: u64,
    pub ticks_slouching: u64,
    pub ticks_moving: u64,
    pub ticks_vibration: u64,
    pub vibration_events: u64,
    pub source_fallbacks: u64,
    pub subscriptions: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}
