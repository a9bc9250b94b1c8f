//! Movement detection over a sliding magnitude window.
//!
//! Walking, running, or carrying the device shows up as sustained
//! variance in the raw acceleration magnitude. The detector keeps the
//! last 20 magnitudes and flags movement when their population standard
//! deviation exceeds the configured threshold.

use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Sliding window capacity, in samples.
const WINDOW_CAPACITY: usize = 20;

/// Minimum fill before the window is evaluated.
const MIN_SAMPLES: usize = 10;

/// Windowed variance detector for sustained motion.
#[derive(Debug, Clone)]
pub struct MovementDetector {
    window: VecDeque<f64>,
    threshold: f64,
}

impl MovementDetector {
    /// Create a detector flagging above `threshold` std-dev (m/s²).
    pub fn new(threshold: f64) -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_CAPACITY),
            threshold,
        }
    }

    /// Push one raw magnitude and evaluate the window.
    ///
    /// Returns true when the window is sufficiently full and its
    /// population standard deviation exceeds the threshold.
    pub fn update(&mut self, magnitude: f64) -> bool {
        if self.window.len() == WINDOW_CAPACITY {
            self.window.pop_front();
        }
        self.window.push_back(magnitude);

        if self.window.len() < MIN_SAMPLES {
            return false;
        }

        self.std_dev() > self.threshold
    }

    /// Population standard deviation of the current window.
    pub fn std_dev(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().population_std_dev()
    }

    /// Number of magnitudes currently held.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Discard all window contents.
    pub fn reset(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_below_minimum_fill() {
        let mut detector = MovementDetector::new(1.5);
        // Wildly varying input, but fewer than MIN_SAMPLES entries.
        for i in 0..9 {
            assert!(!detector.update(if i % 2 == 0 { 0.0 } else { 20.0 }));
        }
    }

    #[test]
    fn test_steady_magnitude_is_not_movement() {
        let mut detector = MovementDetector::new(1.5);
        for _ in 0..30 {
            assert!(!detector.update(9.81));
        }
        assert!(detector.std_dev() < 1e-9);
    }

    #[test]
    fn test_oscillation_flags_movement() {
        let mut detector = MovementDetector::new(1.5);
        let mut flagged = false;
        // Alternating 6/14 m/s² gives std-dev 4, well above threshold.
        for i in 0..20 {
            flagged = detector.update(if i % 2 == 0 { 6.0 } else { 14.0 });
        }
        assert!(flagged);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut detector = MovementDetector::new(1.5);
        for _ in 0..100 {
            detector.update(9.81);
        }
        assert_eq!(detector.len(), WINDOW_CAPACITY);
    }

    #[test]
    fn test_old_spikes_age_out() {
        let mut detector = MovementDetector::new(1.5);
        for i in 0..20 {
            detector.update(if i % 2 == 0 { 0.0 } else { 20.0 });
        }
        assert!(detector.std_dev() > 1.5);
        // Twenty quiet samples push every spike out of the window.
        let mut flagged = true;
        for _ in 0..20 {
            flagged = detector.update(9.81);
        }
        assert!(!flagged);
    }

    #[test]
    fn test_reset_empties_window() {
        let mut detector = MovementDetector::new(1.5);
        for _ in 0..15 {
            detector.update(9.81);
        }
        detector.reset();
        assert!(detector.is_empty());
    }
}
