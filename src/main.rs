//! Posture Monitor CLI
//!
//! Runs the classification engine in the foreground and reports the
//! live posture status and score.

use clap::{Parser, Subcommand};
use posture_monitor::{
    telemetry::create_shared_stats_with_persistence, MonitorConfig, PostureMonitor, SourceChain,
    VERSION,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "posture-monitor")]
#[command(version = VERSION)]
#[command(about = "Motion-sensor posture classification engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring in the foreground
    Start {
        /// Stop automatically after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Skip hardware probing and use the simulated generator
        #[arg(long)]
        simulated: bool,

        /// Emit one JSON snapshot per line instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration and last session statistics
    Status,

    /// Show the effective configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            duration_secs,
            simulated,
            json,
        } => cmd_start(duration_secs, simulated, json),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    }
}

fn cmd_start(duration_secs: Option<u64>, simulated: bool, json: bool) {
    println!("Posture Monitor v{VERSION}");
    println!();

    let config = MonitorConfig::load().unwrap_or_default();
    let stats = create_shared_stats_with_persistence(MonitorConfig::data_path().join("session.json"));

    let mut monitor = if simulated {
        PostureMonitor::with_chain_factory(config, SourceChain::simulated_only)
    } else {
        PostureMonitor::new(config)
    }
    .with_stats(stats.clone());

    monitor.start();

    println!(
        "  Source: {}",
        monitor
            .active_source()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "  Hardware sensors: {}",
        if monitor.sensor_supported() {
            "detected"
        } else {
            "not detected"
        }
    );
    println!("  Sampling: {} Hz", monitor.config().frequency_hz);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let started = Instant::now();
    let mut last_report = Instant::now();
    let mut last_status = monitor.status();

    while running.load(Ordering::SeqCst) {
        if let Some(limit) = duration_secs {
            if started.elapsed() >= Duration::from_secs(limit) {
                break;
            }
        }

        monitor.step(Duration::from_millis(100));

        let status_changed = monitor.status() != last_status;
        if status_changed || last_report.elapsed() >= Duration::from_secs(1) {
            let snapshot = monitor.snapshot();
            if json {
                match serde_json::to_string(&snapshot) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("Error serializing snapshot: {e}"),
                }
            } else {
                println!(
                    "[{}] {} | score {} | vibrations {}",
                    snapshot.timestamp.format("%H:%M:%S"),
                    snapshot.status,
                    snapshot.score,
                    snapshot.vibration_count
                );
            }
            last_report = Instant::now();
            last_status = monitor.status();
        }
    }

    println!();
    println!("Stopping...");
    monitor.stop();

    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save session statistics: {e}");
    }

    println!();
    println!("{}", stats.summary());
}

fn cmd_status() {
    let config = MonitorConfig::load().unwrap_or_default();

    println!("Posture Monitor Status");
    println!("======================");
    println!();

    println!("Configuration:");
    println!("  Sampling: {} Hz", config.frequency_hz);
    println!(
        "  Slouch: > {}° for {} ms",
        config.slouch_threshold_deg, config.slouch_duration_ms
    );
    println!(
        "  Vibration: > {} m/s² over {}-{} ms",
        config.vibration_threshold, config.vibration_span_ms.min, config.vibration_span_ms.max
    );
    println!("  Movement: std-dev > {} m/s²", config.movement_threshold);
    println!();

    let stats_path = MonitorConfig::data_path().join("session.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Last Session:");
                if let Some(accepted) = stats.get("samples_accepted") {
                    println!("  Samples accepted: {accepted}");
                }
                if let Some(dropped) = stats.get("samples_dropped") {
                    println!("  Samples throttled: {dropped}");
                }
                if let Some(vibrations) = stats.get("vibration_events") {
                    println!("  Vibration events: {vibrations}");
                }
                if let Some(duration) = stats.get("session_duration_secs") {
                    println!("  Duration: {duration}s");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config() {
    let config = MonitorConfig::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", MonitorConfig::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
