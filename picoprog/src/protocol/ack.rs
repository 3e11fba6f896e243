//! Per-unit acknowledgement.
//!
//! After every flash page or FPGA block the programmer answers with one
//! byte. `#` means the unit was accepted; any other byte starts an in-band
//! error report that runs to the end of the line.

use crate::error::{Error, Result};
use crate::protocol::ACK_SENTINEL;
use crate::protocol::line::{read_byte, read_line};
use log::{debug, trace};
use std::io::Read;

/// Acknowledgement received for one transfer unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// The sentinel byte: the unit was written.
    Sentinel,
    /// In-band error report.
    Error {
        /// The byte received in place of the sentinel.
        code: u8,
        /// Rest of the report line.
        message: String,
    },
}

impl Ack {
    /// Read and classify one acknowledgement.
    pub fn read<R: Read + ?Sized>(port: &mut R) -> Result<Self> {
        let first = read_byte(port)?;
        if first == ACK_SENTINEL {
            trace!("ACK");
            return Ok(Self::Sentinel);
        }

        debug!("Non-sentinel acknowledgement 0x{first:02X}, reading error report");
        let line = read_line(port)?;
        Ok(Self::Error {
            code: first,
            message: line.text.trim_end().to_string(),
        })
    }

    /// Convert into a `Result`, mapping an error report to [`Error::Device`].
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Sentinel => Ok(()),
            Self::Error { code, message } => Err(Error::Device { code, message }),
        }
    }
}

/// Wait for the acknowledgement of one unit; an error report is fatal.
pub fn expect_ack<R: Read + ?Sized>(port: &mut R) -> Result<()> {
    Ack::read(port)?.into_result()
}
