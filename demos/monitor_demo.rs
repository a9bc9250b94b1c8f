//! Demonstration of the posture monitor pipeline.
//!
//! This example shows how to:
//! 1. Construct a monitor with the standard source fallback chain
//! 2. Start monitoring (degrading to the simulated generator if no
//!    hardware is available)
//! 3. Pump the sample channel and observe status/score changes
//! 4. Read session statistics after stopping
//!
//! Run with: cargo run --example monitor_demo

use posture_monitor::{MonitorConfig, PostureMonitor, VERSION};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() {
    println!("Posture Monitor - Pipeline Demo");
    println!("===============================");
    println!();

    let config = MonitorConfig::default();
    println!("Tunables:");
    println!("  Sampling: {} Hz", config.frequency_hz);
    println!(
        "  Slouch: > {}° sustained {} ms",
        config.slouch_threshold_deg, config.slouch_duration_ms
    );
    println!(
        "  Vibration: {} m/s² spikes over {}-{} ms",
        config.vibration_threshold, config.vibration_span_ms.min, config.vibration_span_ms.max
    );
    println!();

    let mut monitor = PostureMonitor::new(config);
    monitor.start();

    println!(
        "Monitoring via {} source (hardware {})",
        monitor
            .active_source()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "no".to_string()),
        if monitor.sensor_supported() {
            "detected"
        } else {
            "not detected"
        }
    );
    println!();
    println!("Running for 30 seconds, Ctrl+C to stop early...");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let start = Instant::now();
    let mut last_line = Instant::now();
    let mut last_status = monitor.status();

    while running.load(Ordering::SeqCst) && start.elapsed() < Duration::from_secs(30) {
        monitor.step(Duration::from_millis(100));

        if monitor.status() != last_status {
            println!(
                "  status change: {} -> {} (score {})",
                last_status,
                monitor.status(),
                monitor.score()
            );
            last_status = monitor.status();
        }

        if last_line.elapsed() >= Duration::from_secs(2) {
            println!(
                "  [{:>2}s] {} | score {} | calibrated: {}",
                start.elapsed().as_secs(),
                monitor.status(),
                monitor.score(),
                monitor.is_calibrated()
            );
            last_line = Instant::now();
        }
    }

    println!();
    println!("Stopping...");
    let stats = monitor.stats();
    monitor.stop();

    println!();
    println!("{}", stats.summary());
    println!();
    println!("Demo complete! (engine v{VERSION})");
}
