//! Unbuffered console endpoints
//!
//! `std::io::Stdout` is line buffered, which would hold device output until
//! a newline arrives. These wrappers go straight to the descriptor.

use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};

fn read_fd(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    let result = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result as usize)
    }
}

fn write_fd(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    let result = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result as usize)
    }
}

/// Console keyboard input. Does not own (or close) the descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleInput {
    fd: RawFd,
}

impl ConsoleInput {
    pub fn stdin() -> Self {
        Self {
            fd: libc::STDIN_FILENO,
        }
    }
}

impl Read for ConsoleInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_fd(self.fd, buf)
    }
}

impl AsRawFd for ConsoleInput {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

/// Console display output. Does not own (or close) the descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleOutput {
    fd: RawFd,
}

impl ConsoleOutput {
    pub fn stdout() -> Self {
        Self {
            fd: libc::STDOUT_FILENO,
        }
    }
}

impl Write for ConsoleOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        write_fd(self.fd, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsRawFd for ConsoleOutput {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}
