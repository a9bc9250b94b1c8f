//! Coarse push-event source reading a line-delimited sample feed.
//!
//! External bridges (a serial accelerometer daemon, a phone companion
//! app) push whitespace-separated readings into a FIFO or character
//! device, one sample per line:
//!
//! ```text
//! <x> <y> <z> [<alpha> <beta> <gamma>]
//! ```
//!
//! The feed sets its own pace; the monitor's throttle gate downsamples
//! to the configured frequency. No gyroscope is required — rotation is
//! attached only when the line carries all six values.

use crate::source::types::{AccessDecision, MotionSample, RotationRate, SourceError, SourceKind};
use crate::source::SensorSource;
use crossbeam_channel::Sender;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Environment variable overriding the feed location.
const FEED_PATH_ENV: &str = "POSTURE_FEED_PATH";

/// Default feed location when the environment does not override it.
const DEFAULT_FEED_PATH: &str = "/run/posture-feed";

/// Resolve the feed path from the environment, with the standard default.
pub fn default_feed_path() -> PathBuf {
    std::env::var(FEED_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_FEED_PATH))
}

/// Push-event sample feed at a filesystem path.
pub struct MotionEventSource {
    path: PathBuf,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MotionEventSource {
    /// Create a source reading from the given feed path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }
}

impl SensorSource for MotionEventSource {
    fn kind(&self) -> SourceKind {
        SourceKind::MotionEvent
    }

    fn detect(&self) -> bool {
        self.path.exists()
    }

    fn request_access(&mut self) -> AccessDecision {
        // The feed has no consent dialog; readability is the gate.
        if !self.path.exists() {
            return AccessDecision::NotRequired;
        }
        match File::open(&self.path) {
            Ok(_) => AccessDecision::Granted,
            Err(_) => AccessDecision::Denied,
        }
    }

    fn subscribe(
        &mut self,
        sender: Sender<MotionSample>,
        _frequency_hz: u32,
    ) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::SubscriptionFailure(
                "already subscribed".to_string(),
            ));
        }

        let file = File::open(&self.path)
            .map_err(|e| SourceError::SubscriptionFailure(format!("{:?}: {e}", self.path)))?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let path = self.path.clone();

        let handle = thread::spawn(move || {
            debug!(?path, "motion event feed thread started");
            let reader = BufReader::new(file);
            for line in reader.lines() {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "feed read failed, stopping delivery");
                        break;
                    }
                };
                let Some(sample) = parse_feed_line(&line) else {
                    continue;
                };
                if sender.send(sample).is_err() {
                    break;
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // The reader blocks on the next pushed line; it exits on its own
        // once the feed produces one or the channel closes. Joining here
        // could stall stop() indefinitely, so the handle is dropped.
        self.thread_handle.take();
    }
}

impl Drop for MotionEventSource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Parse one feed line into a sample. Blank and malformed lines yield `None`.
fn parse_feed_line(line: &str) -> Option<MotionSample> {
    let fields: Vec<f64> = line
        .split_whitespace()
        .map(|f| f.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    match fields.len() {
        3 => Some(MotionSample::new(fields[0], fields[1], fields[2])),
        6 => Some(
            MotionSample::new(fields[0], fields[1], fields[2]).with_rotation(RotationRate {
                alpha: fields[3],
                beta: fields[4],
                gamma: fields[5],
            }),
        ),
        _ => None,
    }
}
