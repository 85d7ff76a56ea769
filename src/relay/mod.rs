//! Bidirectional byte relay between the console and the serial device
//!
//! A single-threaded loop: wait for either side to be readable, move one
//! chunk from each ready side to the other, repeat. Device bytes go to the
//! console in chunks of up to [`DEVICE_CHUNK`]; keystrokes go to the device
//! one byte at a time. The loop stops when the user types [`SENTINEL`] or
//! either side closes or fails.

pub mod poller;
pub mod write;

pub use poller::{FdPoller, Readiness, Ready, Sink};
pub use write::{write_all_with_backoff, WriteError};

use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;

use log::{debug, trace};

/// Ctrl+]
pub const SENTINEL: u8 = 0x1D;

/// Largest device read per loop iteration
pub const DEVICE_CHUNK: usize = 4096;

/// How long a blocked write waits for its destination before retrying
pub const DEFAULT_WRITE_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub write_backoff: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            write_backoff: DEFAULT_WRITE_BACKOFF,
        }
    }
}

/// Why the relay stopped
#[derive(Debug)]
pub enum ExitReason {
    /// User typed the sentinel
    Sentinel,
    /// Device read returned end-of-file (unplugged)
    DeviceClosed,
    DeviceRead(io::Error),
    DeviceWrite(WriteError),
    ConsoleClosed,
    ConsoleRead(io::Error),
    ConsoleWrite(WriteError),
    /// Readiness wait itself failed
    Wait(io::Error),
    /// SIGTERM, SIGHUP, SIGQUIT or SIGINT arrived
    Signal(i32),
}

impl ExitReason {
    /// Whether the user asked to leave, as opposed to a disconnect
    pub fn is_user_requested(&self) -> bool {
        matches!(self, ExitReason::Sentinel)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Sentinel => write!(f, "exit requested"),
            ExitReason::DeviceClosed => write!(f, "device closed"),
            ExitReason::DeviceRead(e) => write!(f, "device read failed: {e}"),
            ExitReason::DeviceWrite(e) => write!(f, "device write failed: {e}"),
            ExitReason::ConsoleClosed => write!(f, "console input closed"),
            ExitReason::ConsoleRead(e) => write!(f, "console read failed: {e}"),
            ExitReason::ConsoleWrite(e) => write!(f, "console write failed: {e}"),
            ExitReason::Wait(e) => write!(f, "readiness wait failed: {e}"),
            ExitReason::Signal(sig) => write!(f, "terminated by signal {sig}"),
        }
    }
}

/// Byte counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub device_to_console: u64,
    pub console_to_device: u64,
    pub iterations: u64,
}

#[derive(Debug)]
enum State {
    Running,
    Exiting(ExitReason),
}

/// Relay over a device `D`, console input `I`, console output `O`, driven by
/// readiness source `P`.
///
/// The relay owns the device; dropping the relay closes it.
pub struct Relay<D, I, O, P> {
    device: D,
    console_in: I,
    console_out: O,
    poller: P,
    config: RelayConfig,
    stats: RelayStats,
    buf: Box<[u8]>,
}

impl<D, I, O, P> Relay<D, I, O, P>
where
    D: Read + Write,
    I: Read,
    O: Write,
    P: Readiness,
{
    pub fn new(device: D, console_in: I, console_out: O, poller: P, config: RelayConfig) -> Self {
        Self {
            device,
            console_in,
            console_out,
            poller,
            config,
            stats: RelayStats::default(),
            buf: vec![0u8; DEVICE_CHUNK].into_boxed_slice(),
        }
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Write a status line to the console output with the same delivery
    /// guarantees as relayed bytes.
    pub fn announce(&mut self, text: &str) -> Result<(), WriteError> {
        let backoff = self.config.write_backoff;
        let poller = &mut self.poller;
        write_all_with_backoff(&mut self.console_out, text.as_bytes(), || {
            poller.wait_writable(Sink::Console, backoff)
        })
    }

    /// Run until the sentinel is typed or either side goes away.
    pub fn run(&mut self) -> ExitReason {
        loop {
            if let State::Exiting(reason) = self.step() {
                debug!("relay stopped: {reason} ({:?})", self.stats);
                return reason;
            }
        }
    }

    /// One loop iteration: wait, then service the device and the console in
    /// that order if ready.
    fn step(&mut self) -> State {
        self.stats.iterations += 1;

        let ready = match self.poller.wait_readable() {
            Ok(ready) => ready,
            Err(err) => return State::Exiting(ExitReason::Wait(err)),
        };
        if let Some(sig) = ready.signal {
            return State::Exiting(ExitReason::Signal(sig));
        }

        if ready.device {
            if let State::Exiting(reason) = self.pump_device() {
                return State::Exiting(reason);
            }
        }
        if ready.console {
            if let State::Exiting(reason) = self.pump_console() {
                return State::Exiting(reason);
            }
        }
        State::Running
    }

    fn pump_device(&mut self) -> State {
        let n = match self.device.read(&mut self.buf) {
            Ok(0) => return State::Exiting(ExitReason::DeviceClosed),
            Ok(n) => n,
            Err(err) if is_transient(&err) => {
                trace!("device read: {err}");
                return State::Running;
            }
            Err(err) => return State::Exiting(ExitReason::DeviceRead(err)),
        };

        let backoff = self.config.write_backoff;
        let poller = &mut self.poller;
        if let Err(err) = write_all_with_backoff(&mut self.console_out, &self.buf[..n], || {
            poller.wait_writable(Sink::Console, backoff)
        }) {
            return State::Exiting(ExitReason::ConsoleWrite(err));
        }
        self.stats.device_to_console += n as u64;
        State::Running
    }

    fn pump_console(&mut self) -> State {
        let mut byte = [0u8; 1];
        match self.console_in.read(&mut byte) {
            Ok(0) => return State::Exiting(ExitReason::ConsoleClosed),
            Ok(_) => {}
            Err(err) if is_transient(&err) => return State::Running,
            Err(err) => return State::Exiting(ExitReason::ConsoleRead(err)),
        }

        if byte[0] == SENTINEL {
            return State::Exiting(ExitReason::Sentinel);
        }

        let backoff = self.config.write_backoff;
        let poller = &mut self.poller;
        if let Err(err) = write_all_with_backoff(&mut self.device, &byte, || {
            poller.wait_writable(Sink::Device, backoff)
        }) {
            return State::Exiting(ExitReason::DeviceWrite(err));
        }
        self.stats.console_to_device += 1;
        State::Running
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
