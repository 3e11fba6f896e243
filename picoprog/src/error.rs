//! Error types for picoprog.

use std::io;
use thiserror::Error;

/// Result type for picoprog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for picoprog operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (serial port, file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The transport signalled end of stream before a fixed-size unit was complete.
    #[error("Unexpected end of stream: expected {expected} bytes, got {received}")]
    UnexpectedEof {
        /// Number of bytes the unit requires.
        expected: usize,
        /// Number of bytes received before the stream ended.
        received: usize,
    },

    /// The identification line could not be parsed.
    #[error("Could not parse the banner, got [{line}]: {reason}")]
    Banner {
        /// Raw banner text as received.
        line: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The programmer reported an error in place of an acknowledgement.
    #[error("Device reported an error (0x{code:02X}): {message}")]
    Device {
        /// Byte received in place of the acknowledgement sentinel.
        code: u8,
        /// Error line sent by the programmer.
        message: String,
    },

    /// Read-back verification found mismatching pages.
    #[error("Validation failed on {failures} pages")]
    ValidationFailed {
        /// Number of pages whose read-back differed.
        failures: usize,
    },

    /// The local image cannot be transferred.
    #[error("Invalid image: {0}")]
    Image(String),
}

impl Error {
    /// Whether this error came from the byte stream rather than the protocol.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Io(_) | Self::UnexpectedEof { .. } => true,
            #[cfg(feature = "native")]
            Self::Serial(_) => true,
            _ => false,
        }
    }
}
