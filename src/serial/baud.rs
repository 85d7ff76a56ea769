//! Supported line speeds
//!
//! Only a fixed set of rates is accepted. Anything else is rejected up front
//! so the driver is never asked for a speed it might silently round.

use std::fmt;

use crate::error::TermError;

/// Default line speed for USB CDC/UART bridges
pub const DEFAULT_BAUD: BaudRate = BaudRate::B115200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
}

impl BaudRate {
    pub const ALL: [BaudRate; 6] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
        BaudRate::B230400,
    ];

    /// Bits per second
    pub fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
            BaudRate::B230400 => 230400,
        }
    }

    /// Platform speed constant for `cfsetispeed`/`cfsetospeed`
    #[cfg(unix)]
    pub fn speed(self) -> libc::speed_t {
        match self {
            BaudRate::B9600 => libc::B9600,
            BaudRate::B19200 => libc::B19200,
            BaudRate::B38400 => libc::B38400,
            BaudRate::B57600 => libc::B57600,
            BaudRate::B115200 => libc::B115200,
            BaudRate::B230400 => libc::B230400,
        }
    }

    pub(crate) fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|b| b.bits_per_second().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        DEFAULT_BAUD
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = TermError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|b| b.bits_per_second() == value)
            .ok_or(TermError::UnsupportedBaud { requested: value })
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits_per_second())
    }
}
