//! # Rover Teleop Binary
//!
//! Keyboard control of the drive motor and steering servo while a
//! background thread saves a still image every half second.
//!
//! # Usage
//!
//! ```bash
//! # On the Pi, with /etc/rover/rover.toml or built-in defaults
//! rover
//!
//! # Workstation run: simulated GPIO and test-pattern camera
//! rover --simulate --output-dir /tmp/frames -v
//! ```

#![deny(warnings)]

use clap::Parser;
use rover_common::config::{CaptureDeviceKind, LogLevel, RoverConfig};
use rover_control::control::{help_banner, write_status};
use rover_control::keyboard::TerminalKeys;
use rover_control::{RoverError, Session};
use rover_hal::DriverRegistry;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Rover teleop - keyboard drive and steering with periodic still capture
#[derive(Parser, Debug)]
#[command(name = "rover")]
#[command(version)]
#[command(about = "Keyboard teleop for an H-bridge drive motor and steering servo")]
#[command(long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply if missing)
    #[arg(short, long, default_value = rover_common::consts::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use the simulation GPIO driver and test-pattern camera
    #[arg(short = 's', long)]
    simulate: bool,

    /// Override the capture output directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = RoverConfig::load_or_default(&args.config);

    let level = match &config {
        Ok(config) => config.shared.log_level,
        Err(_) => LogLevel::Info,
    };
    setup_tracing(&args, level);

    let result = config
        .map_err(RoverError::from)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("Rover failed: {}", e);
        std::process::exit(1);
    }

    info!("Rover teleop shutdown complete");
}

fn run(args: &Args, mut config: RoverConfig) -> Result<(), RoverError> {
    info!(
        "{} v{} starting (log level {})",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        config.shared.log_level.as_str()
    );

    if args.simulate {
        info!("Simulation mode enabled");
        config.hardware.driver = "simulation".to_string();
        config.capture.device = CaptureDeviceKind::Simulation;
    }
    if let Some(dir) = &args.output_dir {
        config.capture.output_dir = dir.clone();
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| RoverError::Signal(e.to_string()))?;

    let registry = DriverRegistry::with_builtin_drivers();
    let mut session = Session::start(&config, &registry)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = write!(out, "{}", help_banner())
        .map_err(RoverError::Console)
        .and_then(|()| TerminalKeys::new(interrupted).map_err(RoverError::Keyboard))
        .and_then(|mut keys| session.run(&mut keys, &mut out));

    let report = session.shutdown();
    if let Some(stats) = report.capture_stats {
        info!(
            "Captured {} image(s) in {} attempt(s)",
            stats.frames_written, stats.attempts
        );
    }
    for (step, reason) in &report.failures {
        warn!("Cleanup step '{}' failed: {}", step, reason);
    }
    write_status(&mut out, "Program terminated, GPIO cleanup complete.");

    let exit = outcome?;
    info!("Control loop ended: {:?}", exit);
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        match configured {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
}
