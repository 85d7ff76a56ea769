//! Console raw mode with guaranteed restoration
//!
//! [`RawModeGuard`] snapshots the console mode, switches it to raw, and puts
//! the snapshot back when dropped. Dropping happens on every exit path out of
//! the session, including early returns and unwinding panics, so the user's
//! shell is left in the mode it started in.

use std::io;
use std::os::unix::io::RawFd;

use log::{debug, error};

use crate::serial::port::{get_termios, set_termios};

/// A terminal whose input mode can be captured, made raw and restored.
pub trait TerminalMode {
    type Snapshot;

    fn capture(&mut self) -> io::Result<Self::Snapshot>;
    fn make_raw(&mut self, original: &Self::Snapshot) -> io::Result<()>;
    fn restore(&mut self, original: &Self::Snapshot) -> io::Result<()>;
}

/// termios-backed mode control for a tty descriptor (normally stdin)
#[derive(Debug, Clone, Copy)]
pub struct TtyMode {
    fd: RawFd,
}

impl TtyMode {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }
}

impl TerminalMode for TtyMode {
    type Snapshot = libc::termios;

    fn capture(&mut self) -> io::Result<libc::termios> {
        get_termios(self.fd)
    }

    fn make_raw(&mut self, original: &libc::termios) -> io::Result<()> {
        let mut raw = *original;
        // SAFETY: `raw` is an initialised copy of the captured termios.
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.fd, &raw)
    }

    fn restore(&mut self, original: &libc::termios) -> io::Result<()> {
        set_termios(self.fd, original)
    }
}

/// Holds a terminal in raw mode for its lifetime.
pub struct RawModeGuard<M: TerminalMode> {
    mode: M,
    original: Option<M::Snapshot>,
}

impl<M: TerminalMode> RawModeGuard<M> {
    /// Capture the current mode, then switch to raw.
    ///
    /// If the switch fails the captured mode is put back before returning
    /// the error, since a failed `tcsetattr` may have partially applied.
    pub fn acquire(mut mode: M) -> io::Result<Self> {
        let original = mode.capture()?;
        if let Err(err) = mode.make_raw(&original) {
            let _ = mode.restore(&original);
            return Err(err);
        }
        debug!("console switched to raw mode");
        Ok(Self {
            mode,
            original: Some(original),
        })
    }

    /// Restore the captured mode now. Later calls, and the eventual drop,
    /// do nothing.
    pub fn release(&mut self) -> io::Result<()> {
        match self.original.take() {
            Some(original) => {
                self.mode.restore(&original)?;
                debug!("console mode restored");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<M: TerminalMode> Drop for RawModeGuard<M> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            error!("failed to restore console mode: {err}");
        }
    }
}
