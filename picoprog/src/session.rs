//! Programmer session: wake-up, identification and mode dispatch.
//!
//! A session owns the open port for one operation. [`Session::connect`]
//! sends the wake-up byte and reads the banner line; exactly one of
//! [`Session::write_flash`], [`Session::read_flash`] or
//! [`Session::write_fpga`] then sends its mode byte, runs the
//! sub-protocol and closes the port.
//!
//! ## Example
//!
//! ```rust,no_run
//! use picoprog::{Image, NativePort, Padding, Session, SerialConfig, WriteOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let image = Image::load("gateware.bin", Padding::Page)?;
//!     let port = NativePort::open(&SerialConfig::new("/dev/ttyACM0"))?;
//!
//!     let session = Session::connect(port)?;
//!     println!("{}", session.flash_banner()?);
//!
//!     let result = session.write_flash(&image, WriteOptions::default(), &mut |phase, done, total| {
//!         println!("{phase}: {done}/{total}");
//!     })?;
//!     result.into_result()?;
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use crate::image::Image;
use crate::port::Port;
use crate::protocol::line::read_line;
use crate::protocol::{Banner, Line, Mode, WAKE_BYTE};
use crate::transfer::{self, FpgaResult, Progress, TransferResult, WriteOptions};
use log::{debug, info, warn};

/// One programmer session over an open port.
pub struct Session<P: Port> {
    port: P,
    banner: Line,
}

impl<P: Port> Session<P> {
    /// Wake the programmer and read its identification line.
    pub fn connect(mut port: P) -> Result<Self> {
        debug!("Waking programmer on {}", port.name());
        // Anything buffered before the wake-up byte is not part of the banner
        port.clear_buffers()?;
        port.write_all_bytes(&[WAKE_BYTE])?;

        let banner = read_line(&mut port)?;
        if banner.end_of_stream {
            warn!("Banner cut short by end of stream");
        }
        info!("Banner: {}", banner.text);

        Ok(Self { port, banner })
    }

    /// Raw banner text.
    pub fn banner_text(&self) -> &str {
        &self.banner.text
    }

    /// Banner parsed as `<device> <capacity>`, required by the flash modes.
    pub fn flash_banner(&self) -> Result<Banner> {
        Banner::parse(&self.banner.text)
    }

    /// Name of the underlying port.
    pub fn port_name(&self) -> &str {
        self.port.name()
    }

    /// Write a page-aligned image to flash, then verify it unless disabled.
    ///
    /// Verification failures are reported in the result, not as an error.
    pub fn write_flash(
        mut self,
        image: &Image,
        options: WriteOptions,
        progress: Progress<'_>,
    ) -> Result<TransferResult> {
        let result = self.run_write_flash(image, options, progress);
        self.finish(result)
    }

    /// Read the whole flash as announced by the banner.
    pub fn read_flash(mut self, progress: Progress<'_>) -> Result<Image> {
        let result = self.run_read_flash(progress);
        self.finish(result)
    }

    /// Stream a bitstream into the FPGA.
    pub fn write_fpga(mut self, bitstream: &[u8], progress: Progress<'_>) -> Result<FpgaResult> {
        let result = self.run_write_fpga(bitstream, progress);
        self.finish(result)
    }

    /// Close without running an operation.
    pub fn close(mut self) -> Result<()> {
        self.port.close()
    }

    fn run_write_flash(
        &mut self,
        image: &Image,
        options: WriteOptions,
        progress: Progress<'_>,
    ) -> Result<TransferResult> {
        let banner = self.flash_banner()?;
        info!("{banner}");

        transfer::flash::check_image(image)?;
        if image.len() > banner.capacity_bytes {
            return Err(Error::Image(format!(
                "{} bytes do not fit {} ({} bytes)",
                image.len(),
                banner.device_name,
                banner.capacity_bytes
            )));
        }
        info!(
            "File is {} bytes ({} pages)",
            image.len(),
            image.page_count()
        );

        self.select(Mode::WriteFlash)?;
        transfer::write_flash(&mut self.port, image, options, progress)
    }

    fn run_read_flash(&mut self, progress: Progress<'_>) -> Result<Image> {
        let banner = self.flash_banner()?;
        info!("{banner}");

        self.select(Mode::ReadFlash)?;
        transfer::read_flash(&mut self.port, banner.capacity_bytes, progress)
    }

    fn run_write_fpga(&mut self, bitstream: &[u8], progress: Progress<'_>) -> Result<FpgaResult> {
        info!("File is {} bytes", bitstream.len());
        self.select(Mode::WriteFpga)?;
        transfer::write_fpga(&mut self.port, bitstream, progress)
    }

    fn select(&mut self, mode: Mode) -> Result<()> {
        debug!("Selecting {mode} (0x{:02X})", mode.command());
        self.port.write_all_bytes(&[mode.command()])
    }

    /// Close the port; the operation's own error takes precedence.
    fn finish<T>(mut self, result: Result<T>) -> Result<T> {
        let closed = self.port.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}
