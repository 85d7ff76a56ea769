//! Bounded retry write
//!
//! Pushes a whole buffer into a destination that may accept it piecemeal or
//! refuse it for a while. Every byte is delivered once, in order, or the
//! caller gets an error. Nothing is skipped or repeated.

use std::io::{self, Write};

use log::trace;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    /// Destination accepted nothing; treated as closed
    #[error("destination accepted zero bytes")]
    WriteZero,

    #[error("write reported {accepted} bytes for a {requested}-byte buffer")]
    Overrun { accepted: usize, requested: usize },

    #[error("waiting for destination to become writable failed")]
    Wait(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Write all of `bytes` to `dst`.
///
/// Partial writes advance by exactly the accepted count. On would-block,
/// `wait_writable` is called (it should block for at most the backoff
/// interval) and the same remaining suffix is retried. Interrupted writes
/// are retried immediately. Anything else aborts.
pub fn write_all_with_backoff<W, F>(
    dst: &mut W,
    bytes: &[u8],
    mut wait_writable: F,
) -> Result<(), WriteError>
where
    W: Write + ?Sized,
    F: FnMut() -> io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        let remaining = &bytes[written..];
        match dst.write(remaining) {
            Ok(0) => return Err(WriteError::WriteZero),
            Ok(count) if count > remaining.len() => {
                return Err(WriteError::Overrun {
                    accepted: count,
                    requested: remaining.len(),
                });
            }
            Ok(count) => written += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                trace!("destination full with {} bytes pending", remaining.len());
                wait_writable().map_err(WriteError::Wait)?;
            }
            Err(err) => return Err(WriteError::Io(err)),
        }
    }
    Ok(())
}
