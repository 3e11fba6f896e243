//! Scripted in-memory port for unit tests.

use crate::error::Result;
use crate::port::Port;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

/// One observed transport operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Op {
    Write(Vec<u8>),
    Read(usize),
}

/// Mock serial port with separate read/write buffers.
///
/// Reads are served from a script; once it runs dry the port either reports
/// end of stream (`Ok(0)`) or a timeout, depending on `timeout_when_empty`.
pub(crate) struct MockPort {
    read_buf: VecDeque<u8>,
    pub(crate) written: Vec<u8>,
    pub(crate) ops: Vec<Op>,
    chunk: usize,
    timeout_when_empty: bool,
    pub(crate) cleared: bool,
}

impl MockPort {
    pub(crate) fn new(response: &[u8]) -> Self {
        Self {
            read_buf: response.iter().copied().collect(),
            written: Vec::new(),
            ops: Vec::new(),
            chunk: usize::MAX,
            timeout_when_empty: false,
            cleared: false,
        }
    }

    /// Serve at most `chunk` bytes per read call.
    pub(crate) fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    /// Fail with `TimedOut` instead of returning `Ok(0)` once the script is exhausted.
    pub(crate) fn timeout_when_empty(mut self) -> Self {
        self.timeout_when_empty = true;
        self
    }

    pub(crate) fn remaining(&self) -> usize {
        self.read_buf.len()
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.read_buf.is_empty() {
            if self.timeout_when_empty {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
            }
            self.ops.push(Op::Read(0));
            return Ok(0);
        }
        let n = buf.len().min(self.read_buf.len()).min(self.chunk);
        for (slot, byte) in buf.iter_mut().zip(self.read_buf.drain(..n)) {
            *slot = byte;
        }
        self.ops.push(Op::Read(n));
        Ok(n)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        self.ops.push(Op::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Port for MockPort {
    fn set_timeout(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(100)
    }

    // The script models bytes that arrive later, so nothing is discarded
    fn clear_buffers(&mut self) -> Result<()> {
        self.cleared = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
