//! # Teleop Twist
//!
//! Drive a mobile robot from a gamepad.
//!
//! Reads joystick samples (JSON lines on stdin, or an evdev gamepad) and
//! writes velocity commands as JSON lines on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use teleop_twist::config::{Config, InputSource};
use teleop_twist::joy::evdev_source::{self, GamepadDevice, SampleAssembler};
use teleop_twist::joy::json;
use teleop_twist::node::TeleopNode;
use teleop_twist::params::ParameterStore;
use teleop_twist::publish::JsonLinesSink;

/// Config file used when no path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Samples buffered between the input source and the node.
const SAMPLE_QUEUE_DEPTH: usize = 64;

/// Main entry point for Teleop Twist
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, `config/default.toml`, or built-in defaults)
///    - Set up logging to stderr
///    - Start the configured input source
///
/// 2. **Main Loop**
///    - Turn each sample into a velocity command and write it to stdout
///    - Apply parameter updates between samples
///
/// 3. **Shutdown**
///    - On Ctrl+C or end of input, log totals and exit
///
/// # Examples
///
/// ```bash
/// echo '{"type":"joy","axes":[0,0,0,0,0,0.8],"buttons":[0,0,0,0,0,1]}' | teleop-twist
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;

    let level = Level::from_str(&config.logging.level).unwrap_or(Level::INFO);
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Teleop Twist v{} starting...", env!("CARGO_PKG_VERSION"));
    config.teleop.log_summary();

    let store = ParameterStore::new(config.teleop.clone());
    let (sample_tx, sample_rx) = mpsc::channel(SAMPLE_QUEUE_DEPTH);

    match config.input.source {
        InputSource::Stdin => {
            info!("Reading samples from stdin");
            let store = store.clone();
            tokio::spawn(async move {
                let reader = BufReader::new(tokio::io::stdin());
                match json::read_messages(reader, sample_tx, store).await {
                    Ok(stats) => info!(
                        "Stdin closed: {} samples, {} parameter batches ({} rejected), {} malformed lines",
                        stats.samples, stats.parameter_batches, stats.rejected_batches, stats.malformed
                    ),
                    Err(e) => warn!("Failed to read stdin: {}", e),
                }
            });
        }
        InputSource::Evdev => {
            let path = Some(config.input.device_path.as_str()).filter(|p| !p.is_empty());
            let device = GamepadDevice::open(path)?;
            info!(
                "Gamepad opened at: {} ({})",
                device.device_path(),
                device.name().unwrap_or("unnamed")
            );
            let assembler = SampleAssembler::for_device(&device, &config.input);
            evdev_source::spawn_reader(device, assembler, sample_tx)?;
        }
    }

    let sink = JsonLinesSink::new(tokio::io::stdout(), config.output.stamp);
    let node = TeleopNode::new(store.subscribe(), sink);

    info!("Press Ctrl+C to exit");

    tokio::select! {
        stats = node.run(sample_rx) => {
            info!(
                "Total commands published: {} ({} publish failures)",
                stats.published, stats.publish_failures
            );
        }

        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    match std::env::args().nth(1) {
        Some(path) => {
            Config::load(&path).with_context(|| format!("Failed to load config from {}", path))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = Config::load(path).unwrap();
        assert_eq!(config.input.source, InputSource::Stdin);
        assert_eq!(config.teleop, teleop_twist::config::TeleopConfig::default());
    }
}
