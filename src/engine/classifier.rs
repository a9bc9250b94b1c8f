//! Tick orchestration: one exclusive status and one score per sample.
//!
//! Detector precedence is fixed: movement, then vibration, then
//! tilt/slouch as the default path. Movement preempts both other
//! detectors and cancels a pending vibration hold; a confirmed
//! vibration holds its status until the revert deadline passes. The
//! score is tilt-derived on every tick regardless of which status wins.

use crate::engine::filters::FilteredSample;
use crate::engine::movement::MovementDetector;
use crate::engine::tilt::{score_for_angle, tilt_angle_deg, TiltDetector};
use crate::engine::vibration::VibrationDetector;
use crate::source::MotionSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Score reported before any sample has been classified.
pub const BASELINE_SCORE: u8 = 87;

/// Exclusive posture status. Exactly one is active per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureStatus {
    #[default]
    Good,
    Slouching,
    Moving,
    Vibration,
}

impl std::fmt::Display for PostureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostureStatus::Good => write!(f, "good"),
            PostureStatus::Slouching => write!(f, "slouching"),
            PostureStatus::Moving => write!(f, "moving"),
            PostureStatus::Vibration => write!(f, "vibration"),
        }
    }
}

/// Outcome of one classified tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub status: PostureStatus,
    pub score: u8,
    pub tilt_angle_deg: f64,
}

/// Resolves detector outputs into the per-tick status and score.
pub struct Classifier {
    movement: MovementDetector,
    vibration: VibrationDetector,
    tilt: TiltDetector,
    status: PostureStatus,
    score: u8,
}

impl Classifier {
    pub fn new(
        movement_threshold: f64,
        vibration_threshold: f64,
        vibration_min_span_ms: u64,
        vibration_max_span_ms: u64,
        slouch_threshold_deg: f64,
        slouch_duration_ms: u64,
    ) -> Self {
        Self {
            movement: MovementDetector::new(movement_threshold),
            vibration: VibrationDetector::new(
                vibration_threshold,
                vibration_min_span_ms,
                vibration_max_span_ms,
            ),
            tilt: TiltDetector::new(slouch_threshold_deg, slouch_duration_ms),
            status: PostureStatus::Good,
            score: BASELINE_SCORE,
        }
    }

    /// Classify one accepted sample.
    ///
    /// The sample's raw magnitude feeds movement, the high-pass output
    /// feeds vibration, and the low-pass output yields the tilt angle
    /// that both the score and the slouch debounce are derived from.
    pub fn classify(&mut self, sample: &MotionSample, filtered: &FilteredSample) -> Tick {
        let now = sample.timestamp;
        let angle = tilt_angle_deg(&filtered.low_pass);
        let score = score_for_angle(angle);

        let status = if self.movement.update(sample.magnitude()) {
            // Movement wins precedence and aborts the other detectors'
            // accumulating state.
            self.tilt.clear();
            self.vibration.cancel_hold();
            PostureStatus::Moving
        } else if self.vibration.update(filtered.high_pass.magnitude(), now) {
            self.tilt.clear();
            PostureStatus::Vibration
        } else if self.vibration.hold_active(now) {
            // Confirmed vibration persists until the revert deadline;
            // slouch accumulation stays suppressed meanwhile.
            self.tilt.clear();
            PostureStatus::Vibration
        } else if self.tilt.update(angle, now) {
            PostureStatus::Slouching
        } else {
            PostureStatus::Good
        };

        if status != self.status {
            debug!(from = %self.status, to = %status, angle, "status transition");
        }
        self.status = status;
        self.score = score;

        Tick {
            status,
            score,
            tilt_angle_deg: angle,
        }
    }

    /// Advance time without a sample, settling any pending vibration
    /// reversion. Returns the status after the poll.
    pub fn poll(&mut self, now: DateTime<Utc>) -> PostureStatus {
        if self.status == PostureStatus::Vibration && !self.vibration.hold_active(now) {
            debug!("vibration hold expired, reverting to good");
            self.status = PostureStatus::Good;
        }
        self.status
    }

    /// Current status.
    pub fn status(&self) -> PostureStatus {
        self.status
    }

    /// Current score.
    pub fn score(&self) -> u8 {
        self.score
    }

    /// Lifetime vibration confirmations.
    pub fn vibration_count(&self) -> u64 {
        self.vibration.count()
    }

    /// Clear all detector state and restore the idle status and score.
    pub fn reset(&mut self) {
        self.movement.reset();
        self.vibration.reset();
        self.tilt.reset();
        self.status = PostureStatus::Good;
        self.score = BASELINE_SCORE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::filters::FilterBank;
    use chrono::Duration;

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample_at_deg(offset_ms: i64, angle_deg: f64) -> MotionSample {
        let rad = angle_deg.to_radians();
        MotionSample::at(
            base() + Duration::milliseconds(offset_ms),
            9.81 * rad.sin(),
            0.0,
            9.81 * rad.cos(),
        )
    }

    fn classifier() -> Classifier {
        Classifier::new(1.5, 2.5, 300, 800, 15.0, 5000)
    }

    /// Drive a sample through a filter bank into the classifier.
    fn tick(
        classifier: &mut Classifier,
        bank: &mut FilterBank,
        sample: MotionSample,
    ) -> Tick {
        let filtered = bank.process(&sample);
        classifier.classify(&sample, &filtered)
    }

    #[test]
    fn test_upright_is_good() {
        let mut classifier = classifier();
        let mut bank = FilterBank::new();
        let mut out = tick(&mut classifier, &mut bank, sample_at_deg(0, 0.0));
        for i in 1..50 {
            out = tick(&mut classifier, &mut bank, sample_at_deg(i * 20, 0.0));
        }
        assert_eq!(out.status, PostureStatus::Good);
        assert_eq!(out.score, 100);
    }

    #[test]
    fn test_sustained_tilt_slouches_once_at_boundary() {
        let mut classifier = classifier();
        let mut bank = FilterBank::new();
        let mut transitions = 0;
        let mut previous = PostureStatus::Good;

        // 20° constant tilt, 20 ms cadence, 7 seconds.
        for i in 0..350 {
            let out = tick(&mut classifier, &mut bank, sample_at_deg(i * 20, 20.0));
            if out.status == PostureStatus::Slouching && previous != PostureStatus::Slouching {
                transitions += 1;
                // Constant input keeps angle constant through the filter,
                // so onset is the first tick; confirmation lands at 5000 ms.
                assert_eq!(i * 20, 5000);
            }
            previous = out.status;
        }
        assert_eq!(transitions, 1);
        assert_eq!(previous, PostureStatus::Slouching);
    }

    #[test]
    fn test_interrupted_excursions_never_slouch() {
        let mut classifier = classifier();
        let mut bank = FilterBank::new();
        let mut saw_slouch = false;

        let drive = |classifier: &mut Classifier,
                     bank: &mut FilterBank,
                     from_ms: i64,
                     to_ms: i64,
                     angle: f64,
                     saw: &mut bool| {
            let mut t = from_ms;
            while t < to_ms {
                let out = tick(classifier, bank, sample_at_deg(t, angle));
                *saw |= out.status == PostureStatus::Slouching;
                t += 20;
            }
        };

        // 3000 ms above threshold, a recovery dip, then 3000 ms more.
        drive(&mut classifier, &mut bank, 0, 3000, 20.0, &mut saw_slouch);
        drive(&mut classifier, &mut bank, 3000, 4000, 0.0, &mut saw_slouch);
        drive(&mut classifier, &mut bank, 4000, 7000, 20.0, &mut saw_slouch);
        assert!(!saw_slouch);
    }

    #[test]
    fn test_movement_wins_over_tilt() {
        let mut classifier = classifier();
        let mut bank = FilterBank::new();

        // Tilted AND shaking: magnitude oscillates enough that the
        // window std-dev exceeds the movement threshold.
        let mut out = None;
        for i in 0..40 {
            let scale = if i % 2 == 0 { 0.6 } else { 1.4 };
            let rad: f64 = 30f64.to_radians();
            let sample = MotionSample::at(
                base() + Duration::milliseconds(i * 20),
                9.81 * rad.sin() * scale,
                0.0,
                9.81 * rad.cos() * scale,
            );
            out = Some(tick(&mut classifier, &mut bank, sample));
        }
        assert_eq!(out.unwrap().status, PostureStatus::Moving);
        // Score still tracks the tilt angle, not the movement.
        assert!(out.unwrap().score < 70);
    }

    #[test]
    fn test_movement_preempts_slouch_accumulation() {
        let mut classifier = classifier();
        let mut bank = FilterBank::new();

        // Accumulate 4 s of tilt, then a burst of movement, then tilt
        // again: the debounce must restart.
        for i in 0..200 {
            tick(&mut classifier, &mut bank, sample_at_deg(i * 20, 20.0));
        }
        for i in 200..240 {
            let scale = if i % 2 == 0 { 0.5 } else { 1.5 };
            let sample = MotionSample::at(
                base() + Duration::milliseconds(i * 20),
                0.0,
                0.0,
                9.81 * scale,
            );
            tick(&mut classifier, &mut bank, sample);
        }
        // 4800 ms of renewed tilt: not slouching yet (timer restarted),
        // and the movement window needs to drain first.
        let mut out = None;
        for i in 240..480 {
            out = Some(tick(&mut classifier, &mut bank, sample_at_deg(i * 20, 20.0)));
        }
        assert_ne!(out.unwrap().status, PostureStatus::Slouching);
    }

    #[test]
    fn test_vibration_confirms_and_reverts() {
        let mut classifier = classifier();
        let mut bank = FilterBank::new();

        // Settle the filters upright first.
        for i in 0..100 {
            tick(&mut classifier, &mut bank, sample_at_deg(i * 20, 0.0));
        }
        let settle_end = 100 * 20;

        // Three sharp z spikes at 0/250/500 ms past settle. Amplitude is
        // kept below what would tip the movement window's std-dev over
        // its threshold, so precedence stays with vibration.
        let mut status_after_spikes = None;
        for i in 0..=25 {
            let t = settle_end + i * 20;
            let spike = matches!(i, 0 | 12 | 25);
            let z = if spike { 9.81 + 4.0 } else { 9.81 };
            let sample = MotionSample::at(base() + Duration::milliseconds(t), 0.0, 0.0, z);
            let out = tick(&mut classifier, &mut bank, sample);
            status_after_spikes = Some(out.status);
        }
        assert_eq!(status_after_spikes.unwrap(), PostureStatus::Vibration);
        assert_eq!(classifier.vibration_count(), 1);

        // Quiet ticks: the hold persists short of 1000 ms, then reverts.
        let confirm_ms = settle_end + 500;
        let mut out = tick(
            &mut classifier,
            &mut bank,
            sample_at_deg(confirm_ms + 900, 0.0),
        );
        assert_eq!(out.status, PostureStatus::Vibration);
        out = tick(
            &mut classifier,
            &mut bank,
            sample_at_deg(confirm_ms + 1001, 0.0),
        );
        assert_eq!(out.status, PostureStatus::Good);
        assert_eq!(classifier.vibration_count(), 1);
    }

    #[test]
    fn test_poll_settles_vibration_revert() {
        let mut classifier = classifier();
        let mut bank = FilterBank::new();
        for i in 0..100 {
            tick(&mut classifier, &mut bank, sample_at_deg(i * 20, 0.0));
        }
        let settle_end = 2000;
        for i in 0..=25 {
            let t = settle_end + i * 20;
            let spike = matches!(i, 0 | 12 | 25);
            let z = if spike { 9.81 + 4.0 } else { 9.81 };
            let sample = MotionSample::at(base() + Duration::milliseconds(t), 0.0, 0.0, z);
            tick(&mut classifier, &mut bank, sample);
        }
        assert_eq!(classifier.status(), PostureStatus::Vibration);

        // No further samples; a timer poll past the deadline reverts.
        let confirm = base() + Duration::milliseconds(settle_end + 500);
        assert_eq!(
            classifier.poll(confirm + Duration::milliseconds(500)),
            PostureStatus::Vibration
        );
        assert_eq!(
            classifier.poll(confirm + Duration::milliseconds(1000)),
            PostureStatus::Good
        );
    }

    #[test]
    fn test_score_follows_angle_while_slouching() {
        let mut classifier = classifier();
        let mut bank = FilterBank::new();
        let mut out = tick(&mut classifier, &mut bank, sample_at_deg(0, 25.0));
        for i in 1..300 {
            out = tick(&mut classifier, &mut bank, sample_at_deg(i * 20, 25.0));
        }
        assert_eq!(out.status, PostureStatus::Slouching);
        assert_eq!(out.score, 50);
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut classifier = classifier();
        let mut bank = FilterBank::new();
        for i in 0..300 {
            tick(&mut classifier, &mut bank, sample_at_deg(i * 20, 25.0));
        }
        classifier.reset();
        assert_eq!(classifier.status(), PostureStatus::Good);
        assert_eq!(classifier.score(), BASELINE_SCORE);
    }
}
