//! Tilt angle measurement and slouch debouncing.
//!
//! The low-pass acceleration vector approximates gravity in the device
//! frame. The angle between that vector and the reference (z) axis is
//! the tilt angle; the posture score is derived from it on every tick,
//! while the slouching status requires the angle to persist above
//! threshold for the debounce duration. Score reacts instantly, status
//! lags — the asymmetry keeps the status stable without going numb.

use crate::engine::filters::Vec3;
use chrono::{DateTime, Duration, Utc};

/// Score floor and ceiling.
const SCORE_MIN: f64 = 10.0;
const SCORE_MAX: f64 = 100.0;

/// Tilt angle from the reference axis, in degrees.
///
/// A zero-magnitude vector has no direction; it is reported as angle 0
/// rather than an error.
pub fn tilt_angle_deg(gravity: &Vec3) -> f64 {
    let magnitude = gravity.magnitude();
    if magnitude == 0.0 {
        return 0.0;
    }
    (gravity.z.abs() / magnitude).acos().to_degrees()
}

/// Posture score for a tilt angle: `clamp(100 − 2·angle, 10, 100)`.
pub fn score_for_angle(angle_deg: f64) -> u8 {
    (SCORE_MAX - 2.0 * angle_deg).clamp(SCORE_MIN, SCORE_MAX).round() as u8
}

/// Debounced slouch detector.
#[derive(Debug, Clone)]
pub struct TiltDetector {
    threshold_deg: f64,
    debounce: Duration,
    onset: Option<DateTime<Utc>>,
}

impl TiltDetector {
    /// Create a detector confirming slouch after `debounce_ms` of
    /// sustained tilt above `threshold_deg`.
    pub fn new(threshold_deg: f64, debounce_ms: u64) -> Self {
        Self {
            threshold_deg,
            debounce: Duration::milliseconds(debounce_ms as i64),
            onset: None,
        }
    }

    /// Evaluate one tick.
    ///
    /// Above threshold: the onset timestamp starts on the first
    /// crossing, and the tick reports slouching once the exceedance has
    /// lasted the full debounce duration. At or below threshold the
    /// onset clears.
    pub fn update(&mut self, angle_deg: f64, now: DateTime<Utc>) -> bool {
        if angle_deg > self.threshold_deg {
            let onset = *self.onset.get_or_insert(now);
            now - onset >= self.debounce
        } else {
            self.onset = None;
            false
        }
    }

    /// Abort any accumulating exceedance (movement/vibration preemption).
    pub fn clear(&mut self) {
        self.onset = None;
    }

    /// Whether an exceedance is currently accumulating.
    pub fn is_accumulating(&self) -> bool {
        self.onset.is_some()
    }

    /// Alias for clear, used on session teardown.
    pub fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ms(offset: i64) -> DateTime<Utc> {
        base() + Duration::milliseconds(offset)
    }

    fn vector_at_deg(angle_deg: f64) -> Vec3 {
        let rad = angle_deg.to_radians();
        Vec3::new(9.81 * rad.sin(), 0.0, 9.81 * rad.cos())
    }

    #[test]
    fn test_angle_of_upright_vector() {
        assert!(tilt_angle_deg(&Vec3::new(0.0, 0.0, 9.81)) < 1e-9);
    }

    #[test]
    fn test_angle_recovers_construction_angle() {
        for expected in [5.0, 15.0, 30.0, 60.0, 90.0] {
            let angle = tilt_angle_deg(&vector_at_deg(expected));
            assert!((angle - expected).abs() < 1e-9, "expected {expected}, got {angle}");
        }
    }

    #[test]
    fn test_zero_magnitude_guard() {
        assert_eq!(tilt_angle_deg(&Vec3::default()), 0.0);
    }

    #[test]
    fn test_angle_sign_invariance() {
        // Device flipped upside down reads the same tilt.
        let up = Vec3::new(0.0, 0.0, 9.81);
        let down = Vec3::new(0.0, 0.0, -9.81);
        assert!((tilt_angle_deg(&up) - tilt_angle_deg(&down)).abs() < 1e-12);
    }

    #[test]
    fn test_score_mapping() {
        assert_eq!(score_for_angle(0.0), 100);
        assert_eq!(score_for_angle(15.0), 70);
        assert_eq!(score_for_angle(45.0), 10);
        // Clamped at the floor.
        assert_eq!(score_for_angle(50.0), 10);
        assert_eq!(score_for_angle(90.0), 10);
    }

    #[test]
    fn test_slouch_confirms_at_debounce_boundary() {
        let mut detector = TiltDetector::new(15.0, 5000);
        assert!(!detector.update(20.0, ms(0)));
        assert!(!detector.update(20.0, ms(2500)));
        assert!(!detector.update(20.0, ms(4999)));
        assert!(detector.update(20.0, ms(5000)));
        // Stays confirmed while the exceedance lasts.
        assert!(detector.update(20.0, ms(6000)));
    }

    #[test]
    fn test_drop_below_threshold_resets_debounce() {
        let mut detector = TiltDetector::new(15.0, 5000);
        assert!(!detector.update(20.0, ms(0)));
        assert!(!detector.update(20.0, ms(3000)));
        // Recovery clears the onset.
        assert!(!detector.update(5.0, ms(3100)));
        // A fresh 3000 ms excursion still does not confirm.
        assert!(!detector.update(20.0, ms(3200)));
        assert!(!detector.update(20.0, ms(6200)));
        assert!(detector.update(20.0, ms(8200)));
    }

    #[test]
    fn test_clear_aborts_accumulation() {
        let mut detector = TiltDetector::new(15.0, 5000);
        detector.update(20.0, ms(0));
        assert!(detector.is_accumulating());
        detector.clear();
        assert!(!detector.is_accumulating());
        assert!(!detector.update(20.0, ms(5001)));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut detector = TiltDetector::new(15.0, 5000);
        // Exactly at threshold does not start the timer.
        assert!(!detector.update(15.0, ms(0)));
        assert!(!detector.is_accumulating());
    }
}
