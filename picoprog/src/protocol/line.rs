//! Read primitives: single reads, exact reads, and newline-terminated lines.

use crate::error::{Error, Result};
use crate::protocol::NEWLINE;
use log::{trace, warn};
use std::io::{ErrorKind, Read};

/// Outcome of a single transport read.
///
/// A zero-byte read is not an error on this link: the device side may close
/// the stream, and callers decide whether that is acceptable at their point
/// in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes (at least one) were stored at the front of the buffer.
    Data(usize),
    /// The transport returned zero bytes.
    EndOfStream,
}

/// One line received from the programmer, without its `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line content, decoded as lossy UTF-8.
    pub text: String,
    /// The line was cut short by end of stream instead of a newline.
    pub end_of_stream: bool,
}

impl Line {
    /// Line content.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Issue one read. `Interrupted` is retried; all other errors propagate.
pub fn read_some<R: Read + ?Sized>(port: &mut R, buf: &mut [u8]) -> Result<ReadOutcome> {
    loop {
        match port.read(buf) {
            Ok(0) => return Ok(ReadOutcome::EndOfStream),
            Ok(n) => return Ok(ReadOutcome::Data(n)),
            Err(e) if e.kind() == ErrorKind::Interrupted => {},
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

/// Fill `buf` completely, looping over short reads.
///
/// End of stream before the buffer is full is a fatal [`Error::UnexpectedEof`].
pub fn read_exact_into<R: Read + ?Sized>(port: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match read_some(port, &mut buf[filled..])? {
            ReadOutcome::Data(n) => filled += n,
            ReadOutcome::EndOfStream => {
                return Err(Error::UnexpectedEof {
                    expected: buf.len(),
                    received: filled,
                });
            },
        }
    }
    Ok(())
}

/// Read a single byte.
pub fn read_byte<R: Read + ?Sized>(port: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact_into(port, &mut buf)?;
    Ok(buf[0])
}

/// Read one line, consuming but not returning the terminating `\n`.
///
/// Bytes are read one at a time so nothing past the newline is taken from
/// the transport; the next sub-protocol step may be raw binary.
pub fn read_line<R: Read + ?Sized>(port: &mut R) -> Result<Line> {
    let mut bytes = Vec::new();
    let mut buf = [0u8; 1];

    let end_of_stream = loop {
        match read_some(port, &mut buf)? {
            ReadOutcome::Data(_) if buf[0] == NEWLINE => break false,
            ReadOutcome::Data(_) => bytes.push(buf[0]),
            ReadOutcome::EndOfStream => {
                warn!("End of stream while reading a line ({} bytes so far)", bytes.len());
                break true;
            },
        }
    };

    let text = String::from_utf8_lossy(&bytes).into_owned();
    trace!("Line: {text:?}");
    Ok(Line {
        text,
        end_of_stream,
    })
}
