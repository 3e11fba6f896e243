//! Flash write and flash read command implementations.

use anyhow::{Context, Result};
use console::style;
use picoprog::transfer::check_image;
use picoprog::{Image, Padding};

use crate::Cli;
use crate::commands::connect;
use crate::config::Config;
use crate::progress::PhaseProgress;

/// Write command implementation.
pub(crate) fn cmd_write_flash(cli: &Cli, config: &Config) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "{} Loading image {}",
            style("📦").cyan(),
            cli.file.display()
        );
    }

    // Loaded before the port is opened
    let image = Image::load(&cli.file, Padding::Page)
        .with_context(|| format!("Failed to load image {}", cli.file.display()))?;
    check_image(&image).with_context(|| format!("Cannot write {}", cli.file.display()))?;
    let options = cli.write_options(config);

    let session = connect(cli, config)?;
    let banner = session.flash_banner()?;
    if !cli.quiet {
        eprintln!("{} {banner}", style("ℹ").blue());
        eprintln!(
            "    {} {} bytes ({} pages)",
            style("•").dim(),
            image.len(),
            image.page_count()
        );
    }

    let mut progress = PhaseProgress::new(cli.quiet);
    let result = session.write_flash(&image, options, &mut |phase, done, total| {
        progress.update(phase, done, total);
    });
    let result = match result {
        Ok(result) => result,
        Err(err) => {
            progress.abandon();
            return Err(err).context("Flash write failed");
        },
    };
    progress.finish("Complete");

    if !result.verified && !cli.quiet {
        eprintln!("{} Verification skipped", style("⚠").yellow());
    }
    if !result.is_success() {
        eprintln!(
            "{} {} of {} pages failed verification: {:?}",
            style("✗").red().bold(),
            result.validation_failures,
            result.pages_sent,
            result.failed_pages
        );
    }
    let result = result.into_result()?;

    if !cli.quiet {
        eprintln!(
            "\n{} Flash write completed ({} pages)",
            style("🎉").green().bold(),
            result.pages_sent
        );
    }

    Ok(())
}

/// Read command implementation.
pub(crate) fn cmd_read_flash(cli: &Cli, config: &Config) -> Result<()> {
    let session = connect(cli, config)?;
    let banner = session.flash_banner()?;
    if !cli.quiet {
        eprintln!("{} {banner}", style("ℹ").blue());
    }

    let mut progress = PhaseProgress::new(cli.quiet);
    let result = session.read_flash(&mut |phase, done, total| {
        progress.update(phase, done, total);
    });
    let image = match result {
        Ok(image) => image,
        Err(err) => {
            progress.abandon();
            return Err(err).context("Flash read failed");
        },
    };
    progress.finish("Complete");

    // Only a complete dump reaches the file
    image
        .save(&cli.file)
        .with_context(|| format!("Failed to write {}", cli.file.display()))?;

    if !cli.quiet {
        eprintln!(
            "\n{} Read {} bytes into {}",
            style("🎉").green().bold(),
            image.len(),
            cli.file.display()
        );
    }

    Ok(())
}
