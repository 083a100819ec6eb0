//! # ZFM Fingerprint
//!
//! Command-line front end for ZFM/AS608-class fingerprint sensors.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (or use defaults)
//!    - Set up logging with tracing subscriber
//!    - Discover the sensor on the configured serial candidates
//!
//! 2. **Command**
//!    - Run one workflow or maintenance command, or the access monitor
//!    - Handle Ctrl+C for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! zfm-fingerprint enroll 3
//! zfm-fingerprint --config /etc/zfm.toml watch
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zfm_fingerprint::config::{Config, LoggingConfig};
use zfm_fingerprint::discovery::discover;
use zfm_fingerprint::gate::SensorGate;
use zfm_fingerprint::monitor::access_log::AccessLog;
use zfm_fingerprint::monitor::AccessMonitor;
use zfm_fingerprint::serial::port_trait::SensorTransport;
use zfm_fingerprint::serial::SerialConnector;
use zfm_fingerprint::workflow::{EnrollOutcome, IdentifyOutcome, Scanner};

/// File name prefix for daily log files
const LOG_FILE_PREFIX: &str = "zfm-fingerprint.log";

#[derive(Debug, Parser)]
#[command(name = "zfm-fingerprint", version, about = "Drive a ZFM/AS608 fingerprint sensor")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Find the sensor and report the link it answered on
    Discover,

    /// Capture a finger and search the template library
    Identify,

    /// Enroll a finger into a library location
    Enroll { location: u16 },

    /// Delete templates starting at a location
    Delete {
        location: u16,

        #[arg(long, default_value_t = 1)]
        count: u16,
    },

    /// Erase every stored template
    Clear {
        /// Confirm erasing the whole library
        #[arg(long)]
        yes: bool,
    },

    /// Print the number of stored templates
    Count,

    /// Run the access monitor until Ctrl+C
    Watch,
}

type Gate = SensorGate<Box<dyn SensorTransport>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let _log_guard = init_logging(&config.logging)?;
    info!("ZFM fingerprint v{} starting...", env!("CARGO_PKG_VERSION"));

    if cli.command == (Command::Clear { yes: false }) {
        bail!("Refusing to erase the template library without --yes");
    }

    let engine = discover(
        &SerialConnector,
        &config.candidates(),
        config.credentials(),
        config.command_timeout(),
    )
    .await?
    .with_strict_checksum(config.sensor.strict_checksum);

    if cli.command == Command::Discover {
        println!("Sensor found on {}", engine.session().link);
        return Ok(());
    }

    let gate = SensorGate::new(Scanner::new(engine, config.workflow_settings()));

    tokio::select! {
        result = run_command(cli.command, &config, gate) => result,

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            Ok(())
        }
    }
}

/// Install the tracing subscriber
///
/// The returned guard flushes the log file on drop and must live until exit.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("Invalid logging level '{}'", logging.level))?;
    let stderr = fmt::layer().with_writer(std::io::stderr);

    if logging.log_dir.is_empty() {
        tracing_subscriber::registry().with(filter).with(stderr).init();
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(&logging.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}

async fn run_command(command: Command, config: &Config, gate: Gate) -> Result<()> {
    let timeout = config.command_timeout();

    match command {
        Command::Discover => {}

        Command::Identify => match gate.identify(timeout).await? {
            IdentifyOutcome::Matched { id, confidence } => {
                println!("Match: id {} (confidence {})", id, confidence);
            }
            IdentifyOutcome::NotFound => println!("No matching fingerprint"),
            IdentifyOutcome::CaptureTimeout => println!("No finger detected"),
            IdentifyOutcome::ProtocolError { phase, status } => {
                bail!("Identification failed during {}: {}", phase, status);
            }
        },

        Command::Enroll { location } => match gate.enroll(location, timeout).await? {
            EnrollOutcome::Stored { location } => println!("Fingerprint stored at {}", location),
            EnrollOutcome::PhaseFailed { phase, status } => {
                bail!("Enrollment failed during {}: {} ({})", phase, status, phase.remediation());
            }
            EnrollOutcome::CaptureTimeout { phase } => {
                bail!("No finger detected during {}", phase);
            }
        },

        Command::Delete { location, count } => {
            gate.delete(location, count, timeout).await?;
            println!("Deleted {} template(s) from {}", count, location);
        }

        Command::Clear { .. } => {
            gate.clear_database(timeout).await?;
            println!("Template library erased");
        }

        Command::Count => {
            let count = gate.template_count(timeout).await?;
            println!("{} template(s) stored", count);
        }

        Command::Watch => {
            let mut monitor = AccessMonitor::new(gate, config.monitor_settings());
            if !config.monitor.access_log.is_empty() {
                let log = AccessLog::open(&config.monitor.access_log)
                    .with_context(|| format!("Failed to open access log {}", config.monitor.access_log))?;
                monitor = monitor.with_access_log(log);
            }
            monitor.run().await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_delete_with_default_count() {
        let cli = Cli::try_parse_from(["zfm-fingerprint", "delete", "5"]).unwrap();
        assert_eq!(cli.command, Command::Delete { location: 5, count: 1 });
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_delete_range_with_config() {
        let cli = Cli::try_parse_from([
            "zfm-fingerprint",
            "--config",
            "zfm.toml",
            "delete",
            "10",
            "--count",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.command, Command::Delete { location: 10, count: 4 });
        assert_eq!(cli.config, Some(PathBuf::from("zfm.toml")));
    }

    #[test]
    fn test_clear_needs_flag_to_confirm() {
        let cli = Cli::try_parse_from(["zfm-fingerprint", "clear"]).unwrap();
        assert_eq!(cli.command, Command::Clear { yes: false });

        let cli = Cli::try_parse_from(["zfm-fingerprint", "clear", "--yes"]).unwrap();
        assert_eq!(cli.command, Command::Clear { yes: true });
    }

    #[test]
    fn test_enroll_rejects_out_of_range_location() {
        assert!(Cli::try_parse_from(["zfm-fingerprint", "enroll", "70000"]).is_err());
    }

    #[test]
    fn test_log_file_prefix() {
        assert!(LOG_FILE_PREFIX.ends_with(".log"));
    }
}
