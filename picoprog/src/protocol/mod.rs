//! Programmer wire protocol.
//!
//! The protocol is a plain 8-bit byte stream with no framing below it:
//!
//! ```text
//! host                                  programmer
//!  | ' ' (wake-up)                          |
//!  |--------------------------------------->|
//!  |            "<name> <capacity>\n"       |
//!  |<---------------------------------------|
//!  | 'w' | 'r' | 'f' (mode)                 |
//!  |--------------------------------------->|
//!  |            ... sub-protocol ...        |
//! ```
//!
//! Sub-protocols live in [`crate::transfer`]; this module holds the shared
//! primitives they are built from.

pub mod ack;
pub mod banner;
pub mod line;

pub use ack::Ack;
pub use banner::Banner;
pub use line::{Line, ReadOutcome};

use std::fmt;

/// Wake-up byte sent right after opening the port.
pub const WAKE_BYTE: u8 = b' ';

/// Acknowledgement sentinel for a successfully written page or block.
pub const ACK_SENTINEL: u8 = b'#';

/// Line terminator.
pub const NEWLINE: u8 = b'\n';

/// Flash page size in bytes.
pub const PAGE_SIZE: usize = 256;

/// Largest FPGA block payload; the length travels in a single byte.
pub const MAX_BLOCK_SIZE: usize = 255;

/// FPGA end-of-stream marker (a zero-length block).
pub const END_OF_BLOCKS: u8 = 0;

/// FPGA status byte meaning CDONE was sampled high.
pub const CDONE_HIGH: u8 = b'H';

/// Programmer operating modes, selected by a single command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Write an image to SPI flash and verify it.
    WriteFlash,
    /// Read the whole SPI flash.
    ReadFlash,
    /// Stream a bitstream into the FPGA configuration port.
    WriteFpga,
}

impl Mode {
    /// Command byte that selects this mode.
    pub fn command(self) -> u8 {
        match self {
            Self::WriteFlash => b'w',
            Self::ReadFlash => b'r',
            Self::WriteFpga => b'f',
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFlash => write!(f, "write-flash"),
            Self::ReadFlash => write!(f, "read-flash"),
            Self::WriteFpga => write!(f, "write-fpga"),
        }
    }
}
