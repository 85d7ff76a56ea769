//! Setup error types
//!
//! Everything that can go wrong before the relay loop starts. Once bytes are
//! flowing, failures end the session through [`crate::relay::ExitReason`]
//! instead of an error.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::serial::BaudRate;

pub type Result<T> = std::result::Result<T, TermError>;

#[derive(Debug, Error)]
pub enum TermError {
    /// Requested baud rate is not one of [`BaudRate::ALL`]
    #[error("Unsupported baud: {requested} (supported: {})", BaudRate::supported_list())]
    UnsupportedBaud { requested: u32 },

    #[error("Failed to read config file: {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file: {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to open serial device: {}", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to configure serial line on {}", path.display())]
    DeviceConfigure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Console input is not a terminal, or its mode could not be changed
    #[error("Failed to switch console to raw mode")]
    ConsoleMode(#[source] io::Error),
    #[error("Failed to install termination signal handlers")]
    Signals(#[source] io::Error),
}
