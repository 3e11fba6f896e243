//! Port abstraction for the programmer's byte stream.
//!
//! The programmer enumerates as a USB CDC-ACM device, so on the host side it
//! is an ordinary serial port. Protocol code only ever sees the [`Port`]
//! trait, which keeps the page transfer engine independent of the concrete
//! transport and lets tests drive it with an in-memory script.
//!
//! ```text
//! +----------------------+
//! |  Session / transfer  |
//! +----------+-----------+
//!            |
//!            v
//! +----------+-----------+
//! |      Port trait      |
//! +----------+-----------+
//!            |
//!            v
//! +----------+-----------+
//! |  NativePort          |
//! |  (serialport crate)  |
//! +----------------------+
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use picoprog::port::Port;
//!
//! fn example<P: Port>(port: &mut P) -> picoprog::Result<()> {
//!     port.write_all_bytes(b" ")?;
//!
//!     let mut buf = [0u8; 32];
//!     let n = port.read(&mut buf)?;
//!     println!("Received: {:?}", &buf[..n]);
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "native")]
pub mod native;

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Default device node of the programmer on Linux.
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Default baud rate. USB CDC links ignore it but the OS still wants one.
pub const DEFAULT_BAUD: u32 = 115200;

/// Default read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Serial port configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port name/path (e.g., "/dev/ttyACM0", "COM3").
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read/write timeout.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SerialConfig {
    /// Create a new configuration for the given port with default settings.
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Default::default()
        }
    }

    /// Set the baud rate.
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Blocking byte stream to the programmer.
///
/// `read` may return fewer bytes than requested; a return of `Ok(0)` is an
/// end-of-stream signal, distinct from an `Err`. A read timeout surfaces as
/// an `Err` of kind `TimedOut`.
pub trait Port: Read + Write + Send {
    /// Set the read/write timeout.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Get the current timeout.
    fn timeout(&self) -> Duration;

    /// Discard any bytes pending in the input and output buffers.
    fn clear_buffers(&mut self) -> Result<()>;

    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Close the port and release resources.
    ///
    /// After calling this method, the port cannot be used for further I/O.
    fn close(&mut self) -> Result<()>;

    /// Write all bytes, blocking until complete.
    fn write_all_bytes(&mut self, buf: &[u8]) -> Result<()> {
        std::io::Write::write_all(self, buf)?;
        std::io::Write::flush(self)?;
        Ok(())
    }
}

impl<P: Port + ?Sized> Port for &mut P {
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_timeout(timeout)
    }

    fn timeout(&self) -> Duration {
        (**self).timeout()
    }

    fn clear_buffers(&mut self) -> Result<()> {
        (**self).clear_buffers()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

// Re-export the native implementation
#[cfg(feature = "native")]
pub use native::NativePort;
