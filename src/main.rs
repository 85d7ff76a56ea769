//! uart-term
//!
//! Minimal interactive terminal for a serial device.
//!
//! # Usage
//!
//! ```bash
//! # Default device at 115200 baud
//! uart-term
//!
//! # Explicit device and speed
//! uart-term /dev/ttyUSB0 57600
//!
//! # Settings from a file, debug logging on stderr
//! uart-term --config board.toml -v
//! ```
//!
//! Exit with Ctrl+].

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use uart_term::{session, FileConfig, TermConfig};

/// Raw serial terminal
///
/// Relays bytes between this console and a serial device. Exit with Ctrl+].
#[derive(Parser)]
#[command(name = "uart-term")]
#[command(version)]
#[command(about = "Minimal raw serial terminal for UART devices")]
struct Cli {
    /// Serial device path (e.g., /dev/ttyACM0, /dev/ttyUSB0)
    device: Option<PathBuf>,

    /// Baud rate: 9600, 19200, 38400, 57600, 115200 (default) or 230400
    baud: Option<u32>,

    /// TOML file with device, baud and write_backoff_ms defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", "[ERROR]".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = TermConfig::resolve(cli.device, cli.baud, file)?;
    log::debug!(
        "resolved {} @ {}, write backoff {:?}",
        config.port.port_path.display(),
        config.port.baud_rate,
        config.write_backoff
    );

    session::run(&config).with_context(|| {
        format!(
            "Could not start session on {}",
            config.port.port_path.display()
        )
    })?;
    Ok(())
}

/// Log to stderr. The console is in raw mode for most of the run, so each
/// record ends in CR LF to stay left-aligned.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            write!(
                buf,
                "[{} {}] {}\r\n",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
