//! Vibration pattern detection over a time-pruned spike window.
//!
//! Short sharp taps — a phone buzzing on the desk, a knuckle rap — show
//! up as a cluster of high-pass spikes. The detector keeps the trailing
//! second of high-pass magnitudes and confirms a vibration when at
//! least three significant spikes span a bounded interval: long enough
//! to rule out a single noise transient, short enough to rule out
//! sustained shaking (which movement detection owns).

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// How much history the window retains.
const WINDOW_SPAN_MS: i64 = 1000;

/// Spikes required for a confirmation.
const MIN_SPIKES: usize = 3;

/// How long a confirmed vibration holds before reverting to good.
const REVERT_AFTER_MS: i64 = 1000;

/// One retained high-pass reading.
#[derive(Debug, Clone, Copy)]
struct SpikeSample {
    magnitude: f64,
    timestamp: DateTime<Utc>,
}

/// Spike-pattern matcher with a cancelable revert deadline.
#[derive(Debug, Clone)]
pub struct VibrationDetector {
    window: VecDeque<SpikeSample>,
    threshold: f64,
    min_span: Duration,
    max_span: Duration,
    count: u64,
    revert_deadline: Option<DateTime<Utc>>,
}

impl VibrationDetector {
    /// Create a detector.
    ///
    /// `threshold` is the significant-spike magnitude (m/s²);
    /// `min_span_ms`/`max_span_ms` bound the first-to-last spike
    /// interval of a confirmable pattern.
    pub fn new(threshold: f64, min_span_ms: u64, max_span_ms: u64) -> Self {
        Self {
            window: VecDeque::new(),
            threshold,
            min_span: Duration::milliseconds(min_span_ms as i64),
            max_span: Duration::milliseconds(max_span_ms as i64),
            count: 0,
            revert_deadline: None,
        }
    }

    /// Push one high-pass magnitude and evaluate the pattern.
    ///
    /// Returns true on confirmation. The window is cleared on
    /// confirmation so one spike train confirms exactly once, and a
    /// revert deadline is armed `REVERT_AFTER_MS` past `now`.
    pub fn update(&mut self, magnitude: f64, now: DateTime<Utc>) -> bool {
        self.window.push_back(SpikeSample {
            magnitude,
            timestamp: now,
        });

        let horizon = now - Duration::milliseconds(WINDOW_SPAN_MS);
        while self
            .window
            .front()
            .is_some_and(|s| s.timestamp < horizon)
        {
            self.window.pop_front();
        }

        let mut first: Option<DateTime<Utc>> = None;
        let mut last: Option<DateTime<Utc>> = None;
        let mut spikes = 0usize;
        for sample in &self.window {
            if sample.magnitude > self.threshold {
                if first.is_none() {
                    first = Some(sample.timestamp);
                }
                last = Some(sample.timestamp);
                spikes += 1;
            }
        }

        let (Some(first), Some(last)) = (first, last) else {
            return false;
        };
        let span = last - first;
        if spikes >= MIN_SPIKES && span >= self.min_span && span <= self.max_span {
            self.count += 1;
            self.window.clear();
            self.revert_deadline = Some(now + Duration::milliseconds(REVERT_AFTER_MS));
            return true;
        }
        false
    }

    /// Whether a confirmed vibration is still holding at `now`.
    ///
    /// A deadline that has passed is cleared as a side effect, so the
    /// caller observes the reversion exactly once per confirmation.
    pub fn hold_active(&mut self, now: DateTime<Utc>) -> bool {
        match self.revert_deadline {
            Some(deadline) if now < deadline => true,
            Some(_) => {
                self.revert_deadline = None;
                false
            }
            None => false,
        }
    }

    /// Cancel any pending reversion without touching the counter.
    pub fn cancel_hold(&mut self) {
        self.revert_deadline = None;
    }

    /// Lifetime count of confirmed vibrations.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Discard window contents and pending reversion. The lifetime
    /// counter survives; it is monotonic across the session.
    pub fn reset(&mut self) {
        self.window.clear();
        self.revert_deadline = None;
    }
}
