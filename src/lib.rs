//! Raw serial terminal
//!
//! Bridges the local console to a serial device (typically a
//! microcontroller's UART over USB): the line is put into raw 8N1 mode, the
//! console into raw mode, and bytes are relayed both ways until the user
//! types Ctrl+] or the device goes away.
//!
//! - [`serial`]: supported baud rates, opening and configuring the device
//! - [`console`]: raw mode with guaranteed restore, unbuffered stdio
//! - [`relay`]: the single-threaded relay loop and its write protocol
//! - [`session`]: ties the above together with banners and teardown
//! - [`signals`]: turns termination signals into a normal relay exit
//! - [`config`]: argument/file/default resolution

#[cfg(not(unix))]
compile_error!("uart-term drives termios and poll(2) and only builds on Unix");

pub mod config;
pub mod console;
pub mod error;
pub mod relay;
pub mod serial;
pub mod session;
pub mod signals;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{FileConfig, TermConfig};
pub use error::{Result, TermError};
pub use relay::{ExitReason, SENTINEL};
pub use session::SessionOutcome;
