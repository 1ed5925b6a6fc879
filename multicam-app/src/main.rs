//! Multicam
//!
//! Command-line front end for multi-camera extrinsic calibration:
//! - `capture`: live preview, synchronized frame saving, then the calibration tool
//! - `extract`: link-frame transforms and static publisher commands from the result
//! - `devices`: list attached cameras

mod calibration_tool;
mod capture;
mod config;
mod extract;
mod logging;
mod terminal;

use capture::{Backend, CaptureOptions};
use clap::{Parser, Subcommand};
use config::AppConfig;
use std::error::Error;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

#[cfg(feature = "realsense")]
const DEFAULT_BACKEND: &str = "realsense";
#[cfg(all(feature = "webcam", not(feature = "realsense")))]
const DEFAULT_BACKEND: &str = "webcam";
#[cfg(not(any(feature = "realsense", feature = "webcam")))]
const DEFAULT_BACKEND: &str = "synthetic";

/// Multi-camera calibration capture and transform extraction
#[derive(Parser, Debug)]
#[command(name = "multicam")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file; defaults are used for anything it omits
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview all cameras and save numbered frame sets on `c`, quit on `q`
    Capture {
        #[arg(short, long, value_enum, default_value = DEFAULT_BACKEND)]
        backend: Backend,

        /// Directory holding camera1..cameraN
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wipe existing camera directories instead of appending
        #[arg(long)]
        regenerate: bool,

        /// Height of each camera in the preview mosaic
        #[arg(long)]
        preview_height: Option<u32>,

        /// Do not run the calibration tool after quitting
        #[arg(long)]
        skip_calibration: bool,
    },
    /// Print link-frame transforms for every pairwise pose in a calibration result
    Extract {
        /// Calibration result JSON
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// List attached cameras
    Devices {
        #[arg(short, long, value_enum, default_value = DEFAULT_BACKEND)]
        backend: Backend,
    },
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    let logs = logging::init(&config.logging.level);
    debug!("{:?}", config);

    match args.command {
        Command::Capture {
            backend,
            output,
            regenerate,
            preview_height,
            skip_calibration,
        } => {
            if let Some(output) = output {
                config.capture.output_dir = output;
            }
            if let Some(height) = preview_height {
                config.capture.preview_height = height;
            }
            let options = CaptureOptions {
                backend,
                regenerate,
                skip_calibration,
            };
            capture::run(&options, &config, &logs)
        }
        Command::Extract { input } => {
            let input = input.unwrap_or_else(|| config.extract.input.clone());
            let stdout = io::stdout();
            let count = extract::run(&config.extract, &input, &mut stdout.lock())?;
            info!("Extracted {} pairwise transforms", count);
            Ok(())
        }
        Command::Devices { backend } => {
            let devices = capture::list_devices(backend, &config.capture)?;
            if devices.is_empty() {
                info!("No {:?} cameras attached", backend);
            }
            for device in devices {
                println!("{}", device);
            }
            Ok(())
        }
    }
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
