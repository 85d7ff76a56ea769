//! Serial device access
//!
//! - Supported line speeds ([`BaudRate`])
//! - Opening a device node and programming it for a raw 8N1 link

pub mod baud;
pub mod port;

pub use baud::BaudRate;
pub use port::{PortConfig, SerialDevice, DEFAULT_DEVICE};
