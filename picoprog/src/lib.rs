//! # picoprog
//!
//! A library for driving a USB-serial SPI flash and FPGA programmer.
//!
//! The programmer is a microcontroller that enumerates as a serial device
//! and speaks a small page-oriented protocol. This crate provides:
//!
//! - A [`Port`] abstraction with a native implementation over `serialport`
//! - Banner parsing and the per-unit acknowledgement protocol
//! - The page transfer engine: flash write with read-back verification,
//!   flash read, and direct FPGA configuration streaming
//! - Image loading with page padding
//!
//! ## Features
//!
//! - `native` (default): Native serial port support
//! - `serde`: Serialization support for result types
//!
//! ## Example
//!
//! ```rust,no_run
//! use picoprog::{NativePort, SerialConfig, Session};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let port = NativePort::open(&SerialConfig::new("/dev/ttyACM0"))?;
//!     let session = Session::connect(port)?;
//!
//!     let image = session.read_flash(&mut |_, done, total| {
//!         eprint!("\r{done}/{total}");
//!     })?;
//!     image.save("dump.bin")?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod image;
pub mod port;
pub mod protocol;
pub mod session;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
#[cfg(feature = "native")]
pub use port::NativePort;
pub use {
    error::{Error, Result},
    image::{Image, Padding, pad_to_page},
    port::{Port, SerialConfig},
    protocol::{Ack, Banner, Line, Mode, PAGE_SIZE, ReadOutcome},
    session::Session,
    transfer::{
        CdoneState, FpgaResult, Phase, Progress, TransferResult, Verifier, WriteOptions,
        verify_page,
    },
};
