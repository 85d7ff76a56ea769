//! Readiness waits for the relay loop
//!
//! The loop never spins: it sleeps in [`Readiness::wait_readable`] until the
//! device or the keyboard has something, and a blocked write sleeps in
//! [`Readiness::wait_writable`] for at most the backoff interval.

use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::AtomicI32;
use std::time::Duration;

use log::{debug, trace};

use crate::signals;

/// Which sources have data (or a hang-up/error to report) right now, and
/// whether a terminating signal arrived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ready {
    pub device: bool,
    pub console: bool,
    pub signal: Option<i32>,
}

impl Ready {
    pub const DEVICE: Ready = Ready {
        device: true,
        console: false,
        signal: None,
    };
    pub const CONSOLE: Ready = Ready {
        device: false,
        console: true,
        signal: None,
    };
    pub const BOTH: Ready = Ready {
        device: true,
        console: true,
        signal: None,
    };

    pub const fn signal(sig: i32) -> Ready {
        Ready {
            device: false,
            console: false,
            signal: Some(sig),
        }
    }
}

/// Write destinations of the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    Device,
    Console,
}

pub trait Readiness {
    /// Block until the device or console input is readable or a terminating
    /// signal is pending. Both sources are watched on every call.
    fn wait_readable(&mut self) -> io::Result<Ready>;

    /// Wait up to `timeout` for `sink` to accept writes. Returning without
    /// the sink being writable is fine; the caller just retries.
    fn wait_writable(&mut self, sink: Sink, timeout: Duration) -> io::Result<()>;
}

/// `poll(2)` over the device, console input and console output descriptors
#[derive(Debug, Clone, Copy)]
pub struct FdPoller {
    device: RawFd,
    console_in: RawFd,
    console_out: RawFd,
    signal_flag: &'static AtomicI32,
}

impl FdPoller {
    /// Poller that stops on signals recorded by [`signals::install`].
    pub fn new(device: RawFd, console_in: RawFd, console_out: RawFd) -> Self {
        Self {
            device,
            console_in,
            console_out,
            signal_flag: signals::pending_flag(),
        }
    }

    /// Watch `flag` instead of the process-wide signal flag.
    pub fn with_signal_flag(mut self, flag: &'static AtomicI32) -> Self {
        self.signal_flag = flag;
        self
    }

    fn pending_signal(&self) -> Option<Ready> {
        let sig = signals::pending_in(self.signal_flag)?;
        debug!("signal {sig} pending, stopping");
        Some(Ready::signal(sig))
    }
}

// Hang-up and error conditions are reported as readable so the next read
// surfaces them (as EOF or an error) and ends the session.
const READABLE_EVENTS: libc::c_short = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;

impl Readiness for FdPoller {
    fn wait_readable(&mut self) -> io::Result<Ready> {
        let mut fds = [
            libc::pollfd {
                fd: self.device,
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: self.console_in,
                events: libc::POLLIN,
                revents: 0,
            },
        ];
        loop {
            // Also covers a signal that landed while the relay was busy writing.
            if let Some(ready) = self.pending_signal() {
                return Ok(ready);
            }
            let result = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
            if result < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    // Checked at the top of the loop.
                    continue;
                }
                return Err(err);
            }
            let ready = Ready {
                device: fds[0].revents & READABLE_EVENTS != 0,
                console: fds[1].revents & READABLE_EVENTS != 0,
                signal: None,
            };
            if ready == Ready::default() {
                // Infinite timeout should not return empty, but avoid a tight loop if it does.
                continue;
            }
            trace!("ready: {ready:?}");
            return Ok(ready);
        }
    }

    fn wait_writable(&mut self, sink: Sink, timeout: Duration) -> io::Result<()> {
        let fd = match sink {
            Sink::Device => self.device,
            Sink::Console => self.console_out,
        };
        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLOUT,
            revents: 0,
        };
        let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        let result = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
        Ok(())
    }
}
