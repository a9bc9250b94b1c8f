//! Simulated sample generator, the guaranteed tail of the source chain.
//!
//! Emits plausible near-upright gravity vectors at the requested fixed
//! interval so the pipeline always has a live signal: tilt angles drift
//! inside the band that maps to posture scores of roughly 85–95, with
//! mild noise.

use crate::source::types::{AccessDecision, MotionSample, SourceError, SourceKind};
use crate::source::SensorSource;
use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Standard gravity, m/s².
const GRAVITY: f64 = 9.81;

/// Tilt band generated by the walk, degrees. Maps to scores 85–95.
const TILT_MIN_DEG: f64 = 2.5;
const TILT_MAX_DEG: f64 = 7.5;

/// Generator of plausible posture samples.
pub struct SimulatedSource {
    rng_seed: Option<u64>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SimulatedSource {
    /// Create a generator with entropy-based randomness.
    pub fn new() -> Self {
        Self {
            rng_seed: None,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Create a deterministic generator for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng_seed: Some(seed),
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for SimulatedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Simulated
    }

    fn detect(&self) -> bool {
        true
    }

    fn request_access(&mut self) -> AccessDecision {
        AccessDecision::NotRequired
    }

    fn subscribe(
        &mut self,
        sender: Sender<MotionSample>,
        frequency_hz: u32,
    ) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::SubscriptionFailure(
                "already subscribed".to_string(),
            ));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let period = Duration::from_millis((1000 / frequency_hz.max(1)) as u64);
        let mut rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let handle = thread::spawn(move || {
            debug!(?period, "simulated source started");
            let mut tilt_deg = rng.gen_range(TILT_MIN_DEG..TILT_MAX_DEG);

            while running.load(Ordering::SeqCst) {
                // Random walk inside the band, small per-step drift.
                tilt_deg = (tilt_deg + rng.gen_range(-0.15..0.15)).clamp(TILT_MIN_DEG, TILT_MAX_DEG);

                let tilt_rad = tilt_deg.to_radians();
                let sample = MotionSample::new(
                    GRAVITY * tilt_rad.sin() + rng.gen_range(-0.02..0.02),
                    rng.gen_range(-0.05..0.05),
                    GRAVITY * tilt_rad.cos() + rng.gen_range(-0.02..0.02),
                );

                if sender.send(sample).is_err() {
                    break;
                }
                thread::sleep(period);
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
