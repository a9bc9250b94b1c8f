//! Sensor source adapters for the posture monitor.
//!
//! Three implementations of one uniform contract: a high-resolution
//! accelerometer/gyroscope pair, a coarse push-event feed, and a
//! simulated generator. The `SourceChain` tries them in that order so
//! the pipeline always ends up with a live signal.

pub mod inertial;
pub mod motion_event;
pub mod simulated;
pub mod types;

use crossbeam_channel::Sender;
use tracing::{debug, warn};

pub use inertial::InertialPairSource;
pub use motion_event::MotionEventSource;
pub use simulated::SimulatedSource;
pub use types::{AccessDecision, MotionSample, RotationRate, SourceError, SourceKind};

/// Uniform contract every sample source implements.
///
/// `detect` is a side-effect-free capability probe. `request_access`
/// never fails fatally; a denial is an ordinary decision. `subscribe`
/// begins pushing samples into the channel until `unsubscribe`, which
/// is idempotent and safe to call in any state.
pub trait SensorSource: Send {
    /// Which implementation this is, for logging and telemetry.
    fn kind(&self) -> SourceKind;

    /// Probe whether the backing capability is present. No side effects.
    fn detect(&self) -> bool;

    /// Negotiate access with the platform. May block on a user-mediated
    /// decision; never panics.
    fn request_access(&mut self) -> AccessDecision;

    /// Start delivering samples into `sender` at roughly `frequency_hz`.
    fn subscribe(
        &mut self,
        sender: Sender<MotionSample>,
        frequency_hz: u32,
    ) -> Result<(), SourceError>;

    /// Stop delivery and release threads. Idempotent.
    fn unsubscribe(&mut self);
}

/// Ordered fallback chain of sensor sources.
///
/// Sources are tried front to back: probe, negotiate access, subscribe.
/// Any failure advances to the next entry. The standard chain ends with
/// the simulated generator, whose probe and subscription cannot fail.
pub struct SourceChain {
    sources: Vec<Box<dyn SensorSource>>,
}

impl SourceChain {
    /// The standard fallback order: inertial pair, motion-event feed,
    /// simulated generator.
    pub fn standard() -> Self {
        Self {
            sources: vec![
                Box::new(InertialPairSource::new()),
                Box::new(MotionEventSource::new(motion_event::default_feed_path())),
                Box::new(SimulatedSource::new()),
            ],
        }
    }

    /// A chain containing only the simulated generator.
    pub fn simulated_only() -> Self {
        Self {
            sources: vec![Box::new(SimulatedSource::new())],
        }
    }

    /// Build a chain from an explicit source list.
    pub fn with_sources(sources: Vec<Box<dyn SensorSource>>) -> Self {
        Self { sources }
    }

    /// Whether any hardware-backed source in the chain probes positive.
    ///
    /// Probing has no side effects, so this is safe to call before or
    /// after acquisition.
    pub fn hardware_detected(&self) -> bool {
        self.sources
            .iter()
            .any(|s| s.kind().is_hardware() && s.detect())
    }

    /// Walk the chain and return the first source that subscribes.
    ///
    /// Returns `None` only if every entry fails, which cannot happen for
    /// a chain that ends with the simulated generator.
    pub fn acquire(
        &mut self,
        sender: &Sender<MotionSample>,
        frequency_hz: u32,
    ) -> Option<Box<dyn SensorSource>> {
        while !self.sources.is_empty() {
            let mut source = self.sources.remove(0);
            let kind = source.kind();

            if !source.detect() {
                debug!(source = %kind, "capability not detected, trying next source");
                continue;
            }

            let decision = source.request_access();
            if !decision.allows_subscription() {
                warn!(source = %kind, "access denied, trying next source");
                continue;
            }

            match source.subscribe(sender.clone(), frequency_hz) {
                Ok(()) => {
                    debug!(source = %kind, frequency_hz, "source subscribed");
                    return Some(source);
                }
                Err(e) => {
                    warn!(source = %kind, error = %e, "subscription failed, trying next source");
                }
            }
        }
        None
    }

    /// Number of sources remaining in the chain.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the chain has been exhausted.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
