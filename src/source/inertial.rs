//! High-resolution inertial source backed by the Linux IIO sysfs interface.
//!
//! Reads a paired accelerometer and gyroscope from
//! `/sys/bus/iio/devices/iio:deviceN`. The pair is resolved and validated
//! before the sampling thread starts, so the two devices are brought up
//! and torn down atomically: a missing gyroscope fails the subscription
//! with nothing left running.

use crate::source::types::{AccessDecision, MotionSample, RotationRate, SourceError, SourceKind};
use crate::source::SensorSource;
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Root of the IIO device tree.
const IIO_DEVICES_DIR: &str = "/sys/bus/iio/devices";

/// Rad/s to deg/s, the unit rotation rates are exposed in.
const DEG_PER_RAD: f64 = 180.0 / std::f64::consts::PI;

/// Accelerometer + gyroscope pair polled at the requested frequency.
pub struct InertialPairSource {
    devices_dir: PathBuf,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl InertialPairSource {
    /// Create a source scanning the standard IIO device tree.
    pub fn new() -> Self {
        Self::with_devices_dir(IIO_DEVICES_DIR)
    }

    /// Create a source scanning a custom device tree root.
    pub fn with_devices_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            devices_dir: dir.into(),
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Find the first device directory exposing the given channel file.
    fn find_device(&self, probe_file: &str) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.devices_dir).ok()?;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.join(probe_file).exists() {
                return Some(path);
            }
        }
        None
    }
}

impl Default for InertialPairSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for InertialPairSource {
    fn kind(&self) -> SourceKind {
        SourceKind::InertialPair
    }

    fn detect(&self) -> bool {
        self.find_device("in_accel_x_raw").is_some() && self.find_device("in_anglvel_x_raw").is_some()
    }

    fn request_access(&mut self) -> AccessDecision {
        // Sysfs access is governed by file permissions, not a consent
        // dialog. A readable raw channel means access is granted.
        match self.find_device("in_accel_x_raw") {
            Some(dev) => {
                if std::fs::read_to_string(dev.join("in_accel_x_raw")).is_ok() {
                    AccessDecision::Granted
                } else {
                    AccessDecision::Denied
                }
            }
            None => AccessDecision::NotRequired,
        }
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

        // Resolve both halves of the pair before anything starts.
        let accel_dir = self
            .find_device("in_accel_x_raw")
            .ok_or(SourceError::CapabilityUnavailable)?;
        let gyro_dir = self
            .find_device("in_anglvel_x_raw")
            .ok_or(SourceError::CapabilityUnavailable)?;

        let accel = ChannelTriplet::open(&accel_dir, "in_accel")
            .map_err(SourceError::SubscriptionFailure)?;
        let gyro = ChannelTriplet::open(&gyro_dir, "in_anglvel")
            .map_err(SourceError::SubscriptionFailure)?;

        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let period = Duration::from_millis((1000 / frequency_hz.max(1)) as u64);

        let handle = thread::spawn(move || {
            debug!(?period, "inertial pair sampling thread started");
            while running.load(Ordering::SeqCst) {
                let sample = match accel.read() {
                    Ok((x, y, z)) => {
                        let mut sample = MotionSample::new(x, y, z);
                        if let Ok((a, b, g)) = gyro.read() {
                            sample = sample.with_rotation(RotationRate {
                                alpha: a * DEG_PER_RAD,
                                beta: b * DEG_PER_RAD,
                                gamma: g * DEG_PER_RAD,
                            });
                        }
                        sample
                    }
                    Err(e) => {
                        warn!(error = %e, "accelerometer read failed, stopping delivery");
                        break;
                    }
                };

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

impl Drop for InertialPairSource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// One three-channel IIO device: x/y/z raw files plus a shared scale.
struct ChannelTriplet {
    x: PathBuf,
    y: PathBuf,
    z: PathBuf,
    scale: f64,
}

impl ChannelTriplet {
    /// Validate the channel files and read the scale factor.
    fn open(dir: &Path, prefix: &str) -> Result<Self, String> {
        let x = dir.join(format!("{prefix}_x_raw"));
        let y = dir.join(format!("{prefix}_y_raw"));
        let z = dir.join(format!("{prefix}_z_raw"));

        for path in [&x, &y, &z] {
            if !path.exists() {
                return Err(format!("missing channel file {path:?}"));
            }
        }

        let scale = std::fs::read_to_string(dir.join(format!("{prefix}_scale")))
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(1.0);

        Ok(Self { x, y, z, scale })
    }

    /// Read and scale the current x/y/z values.
    fn read(&self) -> Result<(f64, f64, f64), String> {
        Ok((
            self.read_axis(&self.x)?,
            self.read_axis(&self.y)?,
            self.read_axis(&self.z)?,
        ))
    }

    fn read_axis(&self, path: &Path) -> Result<f64, String> {
        let raw = std::fs::read_to_string(path).map_err(|e| format!("{path:?}: {e}"))?;
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("{path:?}: {e}"))?;
        Ok(value * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_channel(dir: &Path, name: &str, value: &str) {
        std::fs::write(dir.join(name), value).unwrap();
    }

    fn fake_iio_tree(accel: bool, gyro: bool) -> PathBuf {
        let root = std::env::temp_dir().join(format!("iio-test-{}", uuid::Uuid::new_v4()));
        let device = root.join("iio:device0");
        std::fs::create_dir_all(&device).unwrap();
        if accel {
            write_channel(&device, "in_accel_x_raw", "100");
            write_channel(&device, "in_accel_y_raw", "0");
            write_channel(&device, "in_accel_z_raw", "1000");
            write_channel(&device, "in_accel_scale", "0.00981");
        }
        if gyro {
            write_channel(&device, "in_anglvel_x_raw", "0");
            write_channel(&device, "in_anglvel_y_raw", "0");
            write_channel(&device, "in_anglvel_z_raw", "0");
            write_channel(&device, "in_anglvel_scale", "0.001");
        }
        root
    }

    #[test]
    fn test_detect_requires_both_devices() {
        let accel_only = InertialPairSource::with_devices_dir(fake_iio_tree(true, false));
        assert!(!accel_only.detect());

        let pair = InertialPairSource::with_devices_dir(fake_iio_tree(true, true));
        assert!(pair.detect());
    }

    #[test]
    fn test_detect_missing_tree() {
        let source = InertialPairSource::with_devices_dir("/nonexistent/iio");
        assert!(!source.detect());
    }

    #[test]
    fn test_subscribe_fails_atomically_without_gyro() {
        let mut source = InertialPairSource::with_devices_dir(fake_iio_tree(true, false));
        let (sender, _receiver) = crossbeam_channel::bounded(16);
        let result = source.subscribe(sender, 50);
        assert!(matches!(result, Err(SourceError::CapabilityUnavailable)));
        // Nothing was started.
        assert!(source.thread_handle.is_none());
        source.unsubscribe();
    }

    #[test]
    fn test_subscribe_delivers_scaled_samples() {
        let mut source = InertialPairSource::with_devices_dir(fake_iio_tree(true, true));
        let (sender, receiver) = crossbeam_channel::bounded(64);
        source.subscribe(sender, 50).unwrap();

        let sample = receiver
            .recv_timeout(Duration::from_secs(2))
            .expect("sample should arrive");
        assert!((sample.x - 0.981).abs() < 1e-9);
        assert!((sample.z - 9.81).abs() < 1e-9);
        assert!(sample.rotation.is_some());

        drop(receiver);
        source.unsubscribe();
        // Idempotent after stop.
        source.unsubscribe();
    }
}
