//! Local console handling
//!
//! Raw mode management for the keyboard side and unbuffered endpoints for
//! the relay loop.

pub mod raw_mode;
pub mod stdio;

pub use raw_mode::{RawModeGuard, TerminalMode, TtyMode};
pub use stdio::{ConsoleInput, ConsoleOutput};
