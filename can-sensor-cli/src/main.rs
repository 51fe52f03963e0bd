//! CAN Sensor CLI Application
//!
//! Reads frames from a SocketCAN interface, a candump replay or the built-in
//! generator, keeps the latest sensor values and:
//! - Prints selected channels to the terminal
//! - Appends periodic snapshots to a JSON Lines log

use anyhow::{Context, Result};
use can_sensor_decoder::SourceKind;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod config;
mod display;
mod runner;

use config::AppConfig;
use runner::RunOptions;

/// CAN Sensor - Decode live sensor values from a CAN bus
#[derive(Parser, Debug)]
#[command(name = "can-sensor")]
#[command(about = "Decode, display and log CAN sensor values", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Frame source: synthetic, socketcan or replay
    #[arg(short, long, value_name = "KIND")]
    source: Option<SourceKind>,

    /// SocketCAN interface name
    #[arg(short, long, value_name = "IFACE")]
    interface: Option<String>,

    /// candump log to replay (implies --source replay)
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Record log path
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Disable persistence
    #[arg(long)]
    no_persist: bool,

    /// Disable the terminal display
    #[arg(long)]
    no_display: bool,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration)]
    duration: Option<Duration>,

    /// Maximum number of frames to read (for testing)
    #[arg(long, value_name = "COUNT")]
    max_frames: Option<u64>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CAN Sensor CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", can_sensor_decoder::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &args);
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);

    let options = RunOptions {
        duration: args.duration,
        max_frames: args.max_frames,
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            log::info!("Shutdown signal received");
            stop.store(true, Ordering::Relaxed);
        })
        .context("Failed to install signal handler")?;
    }

    let summary = runner::run(&config, &options, stop)?;

    log::info!(
        "Done ({:?}): {} frames, {} decoded, {} ignored, {} records written, {} failed",
        summary.exit,
        summary.stats.frames_read,
        summary.stats.frames_decoded,
        summary.stats.frames_ignored,
        summary.records_written,
        summary.record_failures
    );

    Ok(())
}

/// Parse a positive number of seconds
fn parse_duration(value: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid number of seconds '{}': {}", value, e))?;
    if secs.is_nan() || secs <= 0.0 {
        return Err(format!("duration must be greater than 0, got {}", value));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("duration {} out of range: {}", value, e))
}

/// Command-line flags win over the config file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(source) = args.source {
        config.bus.source = source;
    }
    if let Some(interface) = &args.interface {
        config.bus.interface = interface.clone();
    }
    if let Some(replay) = &args.replay {
        config.bus.source = SourceKind::Replay;
        config.bus.replay_file = Some(replay.clone());
    }
    if let Some(db) = &args.db {
        config.persistence.path = db.clone();
    }
    if args.no_persist {
        config.persistence.enabled = false;
    }
    if args.no_display || args.quiet {
        config.display.enabled = false;
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
