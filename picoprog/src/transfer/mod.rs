//! Page transfer engine.
//!
//! Three sub-protocols run after the mode byte:
//!
//! - [`flash::write_flash`]: page count header, acknowledged 256-byte pages,
//!   then a read-back of every page for verification.
//! - [`flash::read_flash`]: the programmer streams the whole capacity.
//! - [`fpga::write_fpga`]: length-prefixed blocks of up to 255 bytes, a zero
//!   length terminator and one CDONE status byte.
//!
//! Every step blocks until complete; there is never more than one
//! outstanding transport operation.

pub mod flash;
pub mod fpga;
pub mod verify;

pub use flash::{
    check_image, drain_readback, read_flash, verify_readback, write_flash, write_pages,
};
pub use fpga::write_fpga;
pub use verify::{Verifier, verify_page};

use crate::error::{Error, Result};
use std::fmt;

/// Transfer phase reported to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Sending flash pages.
    Write,
    /// Comparing read-back pages.
    Verify,
    /// Receiving flash pages.
    Read,
    /// Streaming FPGA blocks.
    Configure,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "Writing"),
            Self::Verify => write!(f, "Verifying"),
            Self::Read => write!(f, "Reading"),
            Self::Configure => write!(f, "Configuring"),
        }
    }
}

/// Progress callback: `(phase, units_done, units_total)`, called once per unit.
pub type Progress<'a> = &'a mut dyn FnMut(Phase, usize, usize);

/// Options for the flash-write sub-protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Read every page back and compare it after writing.
    pub verify: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { verify: true }
    }
}

/// Outcome of a flash write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransferResult {
    /// Pages acknowledged by the programmer.
    pub pages_sent: usize,
    /// Pages whose read-back differed from the image.
    pub validation_failures: usize,
    /// Indices of the failed pages, ascending.
    pub failed_pages: Vec<usize>,
    /// Whether the read-back phase ran.
    pub verified: bool,
}

impl TransferResult {
    /// Whether every page verified (or verification was skipped).
    pub fn is_success(&self) -> bool {
        self.validation_failures == 0
    }

    /// Turn validation failures into [`Error::ValidationFailed`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::ValidationFailed {
                failures: self.validation_failures,
            })
        }
    }
}

/// CDONE level reported by the programmer after FPGA configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CdoneState {
    /// Configuration done asserted.
    High,
    /// Configuration done not asserted.
    Low,
}

impl CdoneState {
    /// Classify the status byte.
    pub fn from_status(byte: u8) -> Self {
        if byte == crate::protocol::CDONE_HIGH {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for CdoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

/// Outcome of an FPGA configuration stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FpgaResult {
    /// Blocks acknowledged by the programmer.
    pub blocks_sent: usize,
    /// Bytes of bitstream sent.
    pub bytes_sent: usize,
    /// CDONE level after the terminator.
    pub cdone: CdoneState,
}
