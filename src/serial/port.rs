//! Serial device connection and raw line configuration
//!
//! Opens the device node directly and programs its termios for an 8N1,
//! byte-at-a-time, local-only link.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;

use log::debug;

use crate::error::{Result, TermError};
use crate::serial::BaudRate;

/// Conventional serial device for a USB-attached microcontroller
#[cfg(target_os = "macos")]
pub const DEFAULT_DEVICE: &str = "/dev/cu.usbmodem1";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_DEVICE: &str = "/dev/ttyACM0";

/// Configuration for a serial device connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    /// Device node (e.g., /dev/ttyUSB0, /dev/ttyACM0)
    pub port_path: PathBuf,
    /// Line speed, applied to both directions
    pub baud_rate: BaudRate,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: PathBuf::from(DEFAULT_DEVICE),
            baud_rate: BaudRate::default(),
        }
    }
}

impl PortConfig {
    pub fn new(port_path: impl Into<PathBuf>) -> Self {
        Self {
            port_path: port_path.into(),
            ..Default::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: BaudRate) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Open serial device in raw mode.
///
/// The descriptor is non-blocking; reads and writes surface
/// [`io::ErrorKind::WouldBlock`] instead of stalling the relay loop. The
/// device is closed when this value is dropped.
#[derive(Debug)]
pub struct SerialDevice {
    file: File,
    config: PortConfig,
}

impl SerialDevice {
    /// Open the device and program the line. The device is closed again if
    /// configuration fails.
    pub fn open(config: PortConfig) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&config.port_path)
            .map_err(|source| TermError::DeviceOpen {
                path: config.port_path.clone(),
                source,
            })?;

        configure_raw_line(file.as_raw_fd(), config.baud_rate).map_err(|source| {
            TermError::DeviceConfigure {
                path: config.port_path.clone(),
                source,
            }
        })?;

        debug!(
            "opened {} at {} baud (raw 8N1, VMIN=1 VTIME=0)",
            config.port_path.display(),
            config.baud_rate
        );

        Ok(Self { file, config })
    }
}

impl Read for SerialDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for SerialDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl AsRawFd for SerialDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl Drop for SerialDevice {
    fn drop(&mut self) {
        debug!("closing {}", self.config.port_path.display());
    }
}

/// Build the raw line settings on top of the device's current termios.
///
/// No input/output translation, no line discipline, 8 data bits with the
/// receiver on and modem control lines ignored. Reads return as soon as one
/// byte is available.
pub(crate) fn raw_line_settings(
    mut tio: libc::termios,
    baud: BaudRate,
) -> io::Result<libc::termios> {
    tio.c_iflag = 0;
    tio.c_oflag = 0;
    tio.c_cflag = libc::CS8 | libc::CREAD | libc::CLOCAL;
    tio.c_lflag = 0;
    tio.c_cc[libc::VMIN] = 1;
    tio.c_cc[libc::VTIME] = 0;

    let speed = baud.speed();
    // SAFETY: `tio` is a valid, initialised termios owned by this frame.
    if unsafe { libc::cfsetispeed(&mut tio, speed) } != 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::cfsetospeed(&mut tio, speed) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(tio)
}

fn configure_raw_line(fd: RawFd, baud: BaudRate) -> io::Result<()> {
    let current = get_termios(fd)?;
    let raw = raw_line_settings(current, baud)?;
    set_termios(fd, &raw)
}

pub(crate) fn get_termios(fd: RawFd) -> io::Result<libc::termios> {
    // SAFETY: termios is plain data; tcgetattr fully initialises it on success.
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

pub(crate) fn set_termios(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
