//! Command implementations.
//!
//! Each mode is implemented in its own module; opening the port and waking
//! the programmer is shared.

pub(crate) mod flash;
pub(crate) mod fpga;

use anyhow::{Context, Result};
use console::style;
use picoprog::{NativePort, Session};

use crate::Cli;
use crate::config::Config;

/// Open the configured port and read the programmer banner.
pub(crate) fn connect(cli: &Cli, config: &Config) -> Result<Session<NativePort>> {
    let serial = cli.serial_config(config);
    if !cli.quiet {
        eprintln!(
            "{} Using port {} at {} baud",
            style("🔌").cyan(),
            style(&serial.port_name).green(),
            serial.baud_rate
        );
    }

    let port = NativePort::open(&serial)
        .with_context(|| format!("Failed to open port {}", serial.port_name))?;

    if !cli.quiet {
        eprintln!("{} Waking programmer...", style("⏳").yellow());
    }
    let session = Session::connect(port).context("Programmer did not identify itself")?;
    if !cli.quiet {
        eprintln!(
            "{} Connected: {}",
            style("✓").green(),
            style(session.banner_text()).bold()
        );
    }

    Ok(session)
}
