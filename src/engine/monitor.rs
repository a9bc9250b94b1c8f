//! Lifecycle controller for the posture pipeline.
//!
//! One `PostureMonitor` owns all filter and detector state and drives
//! the full flow: source acquisition with fallback, the throttle gate,
//! the filter bank, and the classifier. Processing is synchronous and
//! single-threaded; sources push samples from their capture threads
//! through a bounded channel that the owner pumps with `step`.
//!
//! Lifecycle: Idle → Initializing → Active → Stopping → Idle. The
//! Initializing and Stopping states are transient within `start` and
//! `stop`; both operations are re-entrancy-safe and `stop` is
//! idempotent from any state.

use crate::config::MonitorConfig;
use crate::engine::classifier::{Classifier, PostureStatus};
use crate::engine::filters::FilterBank;
use crate::source::{MotionSample, SensorSource, SimulatedSource, SourceChain, SourceKind};
use crate::telemetry::{create_shared_stats, SharedSessionStats};
use chrono::{DateTime, Duration, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Capacity of the source → monitor sample channel.
const CHANNEL_CAPACITY: usize = 1024;

/// Lifecycle states of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Initializing,
    Active,
    Stopping,
}

/// Serializable view of the monitor for collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub status: PostureStatus,
    pub score: u8,
    pub is_monitoring: bool,
    pub vibration_count: u64,
    pub sensor_supported: bool,
    pub source: Option<SourceKind>,
    pub calibrated: bool,
}

/// The posture monitoring engine.
pub struct PostureMonitor {
    config: MonitorConfig,
    state: LifecycleState,
    filters: FilterBank,
    classifier: Classifier,
    build_chain: Box<dyn Fn() -> SourceChain + Send>,
    active_source: Option<Box<dyn SensorSource>>,
    receiver: Option<Receiver<MotionSample>>,
    last_accepted: Option<DateTime<Utc>>,
    sensor_supported: bool,
    stats: SharedSessionStats,
}

impl PostureMonitor {
    /// Create a monitor using the standard source fallback chain.
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_chain_factory(config, SourceChain::standard)
    }

    /// Create a monitor with a custom source chain factory.
    ///
    /// The factory is invoked on every `start`, since acquisition
    /// consumes chain entries.
    pub fn with_chain_factory(
        config: MonitorConfig,
        build_chain: impl Fn() -> SourceChain + Send + 'static,
    ) -> Self {
        let classifier = Classifier::new(
            config.movement_threshold,
            config.vibration_threshold,
            config.vibration_span_ms.min,
            config.vibration_span_ms.max,
            config.slouch_threshold_deg,
            config.slouch_duration_ms,
        );
        let sensor_supported = build_chain().hardware_detected();

        Self {
            config,
            state: LifecycleState::Idle,
            filters: FilterBank::new(),
            classifier,
            build_chain: Box::new(build_chain),
            active_source: None,
            receiver: None,
            last_accepted: None,
            sensor_supported,
            stats: create_shared_stats(),
        }
    }

    /// Replace the statistics handle (e.g. with a persisting one).
    pub fn with_stats(mut self, stats: SharedSessionStats) -> Self {
        self.stats = stats;
        self
    }

    /// Begin monitoring.
    ///
    /// A no-op when already Initializing or Active. Walks the source
    /// chain and degrades to the simulated generator on any capability,
    /// permission, or subscription failure — the monitor always reaches
    /// Active.
    pub fn start(&mut self) {
        if matches!(
            self.state,
            LifecycleState::Initializing | LifecycleState::Active
        ) {
            debug!("start ignored, monitor already running");
            return;
        }
        self.state = LifecycleState::Initializing;

        let mut chain = (self.build_chain)();
        self.sensor_supported = chain.hardware_detected();
        let chain_size = chain.len();

        let (sender, receiver) = bounded(CHANNEL_CAPACITY);
        let source = match chain.acquire(&sender, self.config.frequency_hz) {
            Some(source) => {
                let consumed = chain_size - chain.len();
                for _ in 1..consumed {
                    self.stats.record_source_fallback();
                }
                source
            }
            None => {
                // A custom chain without the simulated tail was
                // exhausted; degrade rather than fail.
                warn!("source chain exhausted, degrading to simulated generator");
                for _ in 0..chain_size {
                    self.stats.record_source_fallback();
                }
                let mut simulated = SimulatedSource::new();
                let subscribed = simulated.subscribe(sender.clone(), self.config.frequency_hz);
                debug_assert!(subscribed.is_ok());
                Box::new(simulated)
            }
        };

        info!(source = %source.kind(), supported = self.sensor_supported, "monitoring started");
        self.stats.record_subscription();
        self.active_source = Some(source);
        self.receiver = Some(receiver);
        self.state = LifecycleState::Active;
    }

    /// Stop monitoring and clear all pipeline state.
    ///
    /// Idempotent; safe before any `start` and never panics. Pending
    /// vibration reversions are cancelled deterministically as part of
    /// the classifier reset.
    pub fn stop(&mut self) {
        if self.state == LifecycleState::Idle {
            return;
        }
        self.state = LifecycleState::Stopping;

        // Dropping the receiver first unblocks a capture thread stuck on
        // a full channel, so unsubscribe can join it promptly.
        self.receiver = None;
        if let Some(mut source) = self.active_source.take() {
            source.unsubscribe();
        }
        self.filters.reset();
        self.classifier.reset();
        self.last_accepted = None;

        self.state = LifecycleState::Idle;
        info!("monitoring stopped");
    }

    /// Process one delivered sample through the pipeline.
    ///
    /// Ignored unless Active. Samples arriving faster than the
    /// configured frequency allows are dropped before the filter stage
    /// so its recursive state sees a steady cadence.
    pub fn handle_sample(&mut self, sample: MotionSample) {
        if self.state != LifecycleState::Active {
            return;
        }

        if let Some(last) = self.last_accepted {
            let min_gap = Duration::milliseconds(self.config.throttle_interval_ms());
            if sample.timestamp - last < min_gap {
                self.stats.record_dropped();
                return;
            }
        }
        self.last_accepted = Some(sample.timestamp);
        self.stats.record_accepted();

        let filtered = self.filters.process(&sample);
        let vibrations_before = self.classifier.vibration_count();
        let tick = self.classifier.classify(&sample, &filtered);
        if self.classifier.vibration_count() > vibrations_before {
            self.stats.record_vibration_event();
        }
        self.stats.record_tick(tick.status);
    }

    /// Advance timer-driven state without a sample (vibration revert).
    pub fn poll(&mut self, now: DateTime<Utc>) {
        if self.state == LifecycleState::Active {
            self.classifier.poll(now);
        }
    }

    /// Pump the sample channel once, waiting up to `timeout`.
    ///
    /// Delivers the next sample into the pipeline, or runs a timer poll
    /// when none arrives in time.
    pub fn step(&mut self, timeout: std::time::Duration) {
        let Some(receiver) = self.receiver.clone() else {
            return;
        };
        match receiver.recv_timeout(timeout) {
            Ok(sample) => self.handle_sample(sample),
            Err(RecvTimeoutError::Timeout) => self.poll(Utc::now()),
            Err(RecvTimeoutError::Disconnected) => {
                // The capture thread is gone; keep the caller's pacing
                // so a pump loop does not spin.
                std::thread::sleep(timeout);
                self.poll(Utc::now());
            }
        }
    }

    /// Current posture status.
    pub fn status(&self) -> PostureStatus {
        self.classifier.status()
    }

    /// Current posture score, 0–100.
    pub fn score(&self) -> u8 {
        self.classifier.score()
    }

    /// Whether the monitor is Active.
    pub fn is_monitoring(&self) -> bool {
        self.state == LifecycleState::Active
    }

    /// Whether the monitor is inside the permission/subscribe phase.
    pub fn is_initializing(&self) -> bool {
        self.state == LifecycleState::Initializing
    }

    /// Lifetime count of confirmed vibrations.
    pub fn vibration_count(&self) -> u64 {
        self.classifier.vibration_count()
    }

    /// Whether any hardware-backed source probed positive.
    pub fn sensor_supported(&self) -> bool {
        self.sensor_supported
    }

    /// Which source is currently delivering samples.
    pub fn active_source(&self) -> Option<SourceKind> {
        self.active_source.as_ref().map(|s| s.kind())
    }

    /// Whether enough samples have been accepted to settle the filters.
    pub fn is_calibrated(&self) -> bool {
        self.stats.samples_accepted() >= self.config.calibration_samples as u64
    }

    /// Shared session statistics handle.
    pub fn stats(&self) -> SharedSessionStats {
        self.stats.clone()
    }

    /// The configuration this monitor was built with.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Serializable view of the current state.
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            timestamp: Utc::now(),
            status: self.status(),
            score: self.score(),
            is_monitoring: self.is_monitoring(),
            vibration_count: self.vibration_count(),
            sensor_supported: self.sensor_supported(),
            source: self.active_source(),
            calibrated: self.is_calibrated(),
        }
    }
}

impl Drop for PostureMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
