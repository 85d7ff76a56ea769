//! One terminal session: configure, relay, tear down
//!
//! Order of events:
//! 1. open and configure the serial device, route termination signals
//! 2. switch the console to raw mode
//! 3. print the startup banner and relay until exit
//! 4. restore the console, close the device, print the shutdown banner
//!
//! Steps in 4 happen exactly once whichever way the relay ended, including a
//! SIGTERM/SIGHUP/SIGQUIT/SIGINT during the relay.

use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;

use colored::Colorize;
use log::{debug, error, info};

use crate::config::TermConfig;
use crate::console::{ConsoleInput, ConsoleOutput, RawModeGuard, TerminalMode, TtyMode};
use crate::error::{Result, TermError};
use crate::relay::{ExitReason, FdPoller, Readiness, Relay, RelayConfig, RelayStats};
use crate::serial::SerialDevice;
use crate::signals;

/// How a finished session ended
#[derive(Debug)]
pub struct SessionOutcome {
    pub reason: ExitReason,
    pub stats: RelayStats,
}

/// Run an interactive session against the configured device.
pub fn run(config: &TermConfig) -> Result<SessionOutcome> {
    let device = SerialDevice::open(config.port.clone())?;
    signals::install().map_err(TermError::Signals)?;
    let console_in = ConsoleInput::stdin();
    let console_out = ConsoleOutput::stdout();
    let poller = FdPoller::new(
        device.as_raw_fd(),
        console_in.as_raw_fd(),
        console_out.as_raw_fd(),
    );
    let relay = Relay::new(
        device,
        console_in,
        console_out,
        poller,
        RelayConfig {
            write_backoff: config.write_backoff,
        },
    );

    let banner = format!(
        "{} {} @ {}. Exit with Ctrl+]\r\n",
        "Connected to".green().bold(),
        config.port.port_path.display(),
        config.port.baud_rate
    );
    let outcome = drive(TtyMode::stdin(), relay, &banner)?;

    // stdout may be the reason the relay stopped; the exit status does not
    // depend on this line reaching it.
    if let Err(err) = print_disconnected(&mut io::stdout().lock()) {
        debug!("shutdown banner not printed: {err}");
    }
    Ok(outcome)
}

fn print_disconnected(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\n{}", "Disconnected.".yellow())?;
    out.flush()
}

/// Hold the console in raw mode around one relay run.
///
/// The console is restored before the relay (and with it the device) is
/// dropped. If raw mode cannot be entered the relay is dropped unused.
pub(crate) fn drive<M, D, I, O, P>(
    mode: M,
    mut relay: Relay<D, I, O, P>,
    banner: &str,
) -> Result<SessionOutcome>
where
    M: TerminalMode,
    D: Read + Write,
    I: Read,
    O: Write,
    P: Readiness,
{
    let mut guard = RawModeGuard::acquire(mode).map_err(TermError::ConsoleMode)?;

    let reason = match relay.announce(banner) {
        Ok(()) => relay.run(),
        Err(err) => ExitReason::ConsoleWrite(err),
    };
    let stats = relay.stats();

    if let Err(err) = guard.release() {
        error!("failed to restore console mode: {err}");
    }
    drop(relay);

    if reason.is_user_requested() {
        debug!("session ended by user");
    } else {
        info!("session ended: {reason}");
    }
    info!(
        "relayed {} bytes from device, {} bytes to device",
        stats.device_to_console, stats.console_to_device
    );

    Ok(SessionOutcome { reason, stats })
}
