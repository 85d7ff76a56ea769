//! Scripted stand-ins for the device, the console and the poller.
//!
//! Every double is cheaply cloneable and clones share state, so a test can
//! hand one copy to the relay and inspect another afterwards.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use crate::console::TerminalMode;
use crate::relay::{Readiness, Ready, Sink};

/// How a destination responds to one `write` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accept {
    /// Take everything offered
    All,
    /// Take at most this many bytes (zero means closed)
    Bytes(usize),
    /// Claim this many bytes were taken without taking any
    Overreport(usize),
    WouldBlock,
    Interrupted,
    Fail(io::ErrorKind),
}

#[derive(Debug, Default)]
struct SinkState {
    pattern: VecDeque<Accept>,
    attempts: Vec<Vec<u8>>,
    delivered: Vec<u8>,
    reads: VecDeque<Result<Vec<u8>, io::ErrorKind>>,
}

/// Writable endpoint with a scripted acceptance pattern. Once the pattern
/// runs out, every write is accepted in full. Also readable, which makes it
/// usable as the serial device.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSink {
    state: Rc<RefCell<SinkState>>,
    drops: Option<DropCounter>,
}

impl ScriptedSink {
    pub fn new(pattern: Vec<Accept>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SinkState {
                pattern: pattern.into(),
                ..Default::default()
            })),
            drops: None,
        }
    }

    /// Script the results of `read`. Once exhausted, reads would block.
    pub fn with_reads(self, reads: Vec<Result<Vec<u8>, io::ErrorKind>>) -> Self {
        self.state.borrow_mut().reads = reads.into();
        self
    }

    /// Count drops of this handle (clones taken earlier are not counted).
    pub fn with_drop_counter(mut self, counter: &DropCounter) -> Self {
        self.drops = Some(counter.clone());
        self
    }

    pub fn delivered(&self) -> Vec<u8> {
        self.state.borrow().delivered.clone()
    }

    /// Buffers offered to each `write` call, in order
    pub fn attempts(&self) -> Vec<Vec<u8>> {
        self.state.borrow().attempts.clone()
    }
}

impl Write for ScriptedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.attempts.push(buf.to_vec());
        let response = state.pattern.pop_front().unwrap_or(Accept::All);
        match response {
            Accept::All => {
                state.delivered.extend_from_slice(buf);
                Ok(buf.len())
            }
            Accept::Bytes(n) => {
                let n = n.min(buf.len());
                state.delivered.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            Accept::Overreport(n) => Ok(n),
            Accept::WouldBlock => Err(io::ErrorKind::WouldBlock.into()),
            Accept::Interrupted => Err(io::ErrorKind::Interrupted.into()),
            Accept::Fail(kind) => Err(kind.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for ScriptedSink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        match state.reads.pop_front() {
            Some(Ok(mut chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    state.reads.push_front(Ok(chunk.split_off(n)));
                }
                Ok(n)
            }
            Some(Err(kind)) => Err(kind.into()),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl Drop for ScriptedSink {
    fn drop(&mut self) {
        if let Some(counter) = &self.drops {
            counter.bump();
        }
    }
}

/// Readable endpoint with scripted results; used as console input
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    reads: Rc<RefCell<VecDeque<Result<Vec<u8>, io::ErrorKind>>>>,
    taken: Rc<Cell<usize>>,
}

impl ScriptedSource {
    pub fn new(reads: Vec<Result<Vec<u8>, io::ErrorKind>>) -> Self {
        Self {
            reads: Rc::new(RefCell::new(reads.into())),
            taken: Rc::new(Cell::new(0)),
        }
    }

    /// Number of scripted reads consumed
    pub fn reads_taken(&self) -> usize {
        self.taken.get()
    }
}

impl Read for ScriptedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let next = self.reads.borrow_mut().pop_front();
        match next {
            Some(Ok(chunk)) => {
                self.taken.set(self.taken.get() + 1);
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.reads.borrow_mut().push_front(Ok(chunk[n..].to_vec()));
                }
                Ok(n)
            }
            Some(Err(kind)) => {
                self.taken.set(self.taken.get() + 1);
                Err(kind.into())
            }
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

#[derive(Debug, Default)]
struct PollerState {
    script: VecDeque<Ready>,
    waits: usize,
    writable_waits: Vec<Sink>,
}

/// Readiness source that replays a fixed sequence and then fails
#[derive(Debug, Clone, Default)]
pub struct ScriptedPoller {
    state: Rc<RefCell<PollerState>>,
}

impl ScriptedPoller {
    pub fn new(script: Vec<Ready>) -> Self {
        Self {
            state: Rc::new(RefCell::new(PollerState {
                script: script.into(),
                ..Default::default()
            })),
        }
    }

    /// Number of readable waits performed
    pub fn waits(&self) -> usize {
        self.state.borrow().waits
    }

    pub fn writable_waits(&self) -> Vec<Sink> {
        self.state.borrow().writable_waits.clone()
    }
}

impl Readiness for ScriptedPoller {
    fn wait_readable(&mut self) -> io::Result<Ready> {
        let mut state = self.state.borrow_mut();
        state.waits += 1;
        state
            .script
            .pop_front()
            .ok_or_else(|| io::Error::other("readiness script exhausted"))
    }

    fn wait_writable(&mut self, sink: Sink, _timeout: Duration) -> io::Result<()> {
        self.state.borrow_mut().writable_waits.push(sink);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DropCounter(Rc<Cell<usize>>);

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.get()
    }

    fn bump(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Ordered record of lifecycle events shared between doubles
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<&'static str>>>);

impl EventLog {
    pub fn push(&self, event: &'static str) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.0.borrow().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.borrow().iter().filter(|e| **e == event).count()
    }
}

/// Console mode double that records capture/raw/restore into an [`EventLog`]
#[derive(Debug, Clone)]
pub struct RecordingMode {
    log: EventLog,
}

impl RecordingMode {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl TerminalMode for RecordingMode {
    type Snapshot = ();

    fn capture(&mut self) -> io::Result<()> {
        self.log.push("capture");
        Ok(())
    }

    fn make_raw(&mut self, _original: &()) -> io::Result<()> {
        self.log.push("raw");
        Ok(())
    }

    fn restore(&mut self, _original: &()) -> io::Result<()> {
        self.log.push("restore");
        Ok(())
    }
}

/// Device double that logs "close" into an [`EventLog`] when dropped
#[derive(Debug)]
pub struct LoggedDevice {
    pub inner: ScriptedSink,
    log: EventLog,
}

impl LoggedDevice {
    pub fn new(inner: ScriptedSink, log: &EventLog) -> Self {
        Self {
            inner,
            log: log.clone(),
        }
    }
}

impl Read for LoggedDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for LoggedDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Drop for LoggedDevice {
    fn drop(&mut self) {
        self.log.push("close");
    }
}
