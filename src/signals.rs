//! Termination signals
//!
//! SIGINT, SIGTERM, SIGHUP and SIGQUIT would otherwise kill the process with
//! the console still raw. The handler only records the signal number; the
//! relay notices it at its next readiness wait (a blocked `poll(2)` returns
//! EINTR) and leaves through the normal teardown path.

use std::io;
use std::sync::atomic::{AtomicI32, Ordering};

use log::debug;

/// Signals that end a session cleanly
pub const TERMINATING: [libc::c_int; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

/// Last terminating signal received, 0 if none
static PENDING: AtomicI32 = AtomicI32::new(0);

extern "C" fn record_signal(sig: libc::c_int) {
    PENDING.store(sig, Ordering::SeqCst);
}

/// Route the terminating signals to the pending flag.
pub fn install() -> io::Result<()> {
    install_for(&TERMINATING)?;
    debug!("termination handlers installed for {:?}", TERMINATING);
    Ok(())
}

/// `SA_RESTART` is left off so a blocked `poll(2)` wakes up with EINTR.
fn install_for(signals: &[libc::c_int]) -> io::Result<()> {
    for &sig in signals {
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = record_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);
            if libc::sigaction(sig, &action, std::ptr::null_mut()) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
    }
    Ok(())
}

/// The flag written by the installed handlers
pub fn pending_flag() -> &'static AtomicI32 {
    &PENDING
}

/// Signal number recorded in `flag`, if any
pub fn pending_in(flag: &AtomicI32) -> Option<i32> {
    match flag.load(Ordering::SeqCst) {
        0 => None,
        sig => Some(sig),
    }
}
