//! FPGA configuration command implementation.

use anyhow::{Context, Result};
use console::style;
use picoprog::{CdoneState, Image, Padding};

use crate::Cli;
use crate::commands::connect;
use crate::config::Config;
use crate::progress::PhaseProgress;

/// Configure command implementation.
///
/// A low CDONE is reported but does not fail the command.
pub(crate) fn cmd_write_fpga(cli: &Cli, config: &Config) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "{} Loading bitstream {}",
            style("📦").cyan(),
            cli.file.display()
        );
    }

    let bitstream = Image::load(&cli.file, Padding::None)
        .with_context(|| format!("Failed to load bitstream {}", cli.file.display()))?;

    let session = connect(cli, config)?;

    let mut progress = PhaseProgress::new(cli.quiet);
    let result = session.write_fpga(bitstream.as_bytes(), &mut |phase, done, total| {
        progress.update(phase, done, total);
    });
    let result = match result {
        Ok(result) => result,
        Err(err) => {
            progress.abandon();
            return Err(err).context("FPGA configuration failed");
        },
    };
    progress.finish("Complete");

    if !cli.quiet {
        let cdone = match result.cdone {
            CdoneState::High => style(result.cdone.to_string()).green().bold(),
            CdoneState::Low => style(result.cdone.to_string()).yellow().bold(),
        };
        eprintln!(
            "\n{} Sent {} bytes in {} blocks, got a {cdone} on CDONE",
            style("✓").green().bold(),
            result.bytes_sent,
            result.blocks_sent
        );
    }

    Ok(())
}
