//! Parallel low-pass and high-pass exponential filters.
//!
//! Both filters are recursive and stateful per axis, so every accepted
//! sample must pass through in arrival order — a skipped or reordered
//! sample corrupts the accumulators. The low-pass output isolates the
//! slow gravity component for tilt detection; the high-pass output
//! isolates transient shocks for vibration detection.

use crate::source::MotionSample;

/// Smoothing coefficient of the low-pass filter.
pub const LOW_PASS_ALPHA: f64 = 0.1;

/// Coefficient of the complementary high-pass filter.
pub const HIGH_PASS_ALPHA: f64 = 0.9;

/// A three-axis vector produced by the filter stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean magnitude.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Low-pass and high-pass outputs for one accepted sample.
#[derive(Debug, Clone, Copy)]
pub struct FilteredSample {
    /// Slow orientation component (gravity estimate)
    pub low_pass: Vec3,
    /// Fast transient component (shock signal)
    pub high_pass: Vec3,
}

/// Recursive filter state for a single axis.
#[derive(Debug, Clone, Copy, Default)]
struct AxisState {
    low: f64,
    high: f64,
    prev_raw: f64,
}

impl AxisState {
    /// Advance both recurrences by one input value.
    ///
    /// Low-pass:  `out = α_lp·in + (1−α_lp)·out_prev`
    /// High-pass: `out = α_hp·(out_prev + in − in_prev)`
    fn step(&mut self, input: f64) -> (f64, f64) {
        self.low = LOW_PASS_ALPHA * input + (1.0 - LOW_PASS_ALPHA) * self.low;
        self.high = HIGH_PASS_ALPHA * (self.high + input - self.prev_raw);
        self.prev_raw = input;
        (self.low, self.high)
    }
}

/// Per-axis filter bank owned by the lifecycle controller.
///
/// Created at start, discarded (reset) at stop.
#[derive(Debug, Clone, Default)]
pub struct FilterBank {
    x: AxisState,
    y: AxisState,
    z: AxisState,
}

impl FilterBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample through both filters on all three axes.
    pub fn process(&mut self, sample: &MotionSample) -> FilteredSample {
        let (lx, hx) = self.x.step(sample.x);
        let (ly, hy) = self.y.step(sample.y);
        let (lz, hz) = self.z.step(sample.z);

        FilteredSample {
            low_pass: Vec3::new(lx, ly, lz),
            high_pass: Vec3::new(hx, hy, hz),
        }
    }

    /// Zero all accumulators.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
