//! picoprog CLI - Command-line tool for a USB-serial SPI flash and FPGA programmer.
//!
//! ## Features
//!
//! - Write an image to SPI flash with read-back verification
//! - Dump the whole SPI flash to a file
//! - Stream a bitstream straight into the FPGA
//! - Configuration files and environment variable support

use anyhow::Result;
use clap::{ArgGroup, Parser};
use console::style;
use env_logger::Env;
use log::debug;
use picoprog::port::{DEFAULT_BAUD, DEFAULT_PORT, DEFAULT_TIMEOUT};
use picoprog::{Mode, SerialConfig, WriteOptions};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

mod commands;
mod config;
mod progress;

use config::Config;

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: AtomicBool = AtomicBool::new(true);

/// Check if animations should be used (TTY and colors enabled).
pub(crate) fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(Ordering::Relaxed) && console::colors_enabled_stderr()
}

/// picoprog - Program SPI flash and FPGAs through a USB-serial programmer.
///
/// Environment variables:
///   PICOPROG_PORT        - Serial device of the programmer
///   PICOPROG_TIMEOUT_MS  - Read timeout in milliseconds
#[derive(Parser, Debug)]
#[command(name = "picoprog")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["write_flash", "read_flash", "write_fpga"])
))]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct Cli {
    /// Write the file to SPI flash, then verify it.
    #[arg(long)]
    pub write_flash: bool,

    /// Read the whole SPI flash into the file.
    #[arg(long)]
    pub read_flash: bool,

    /// Stream the file into the FPGA configuration port.
    #[arg(long)]
    pub write_fpga: bool,

    /// Image to write, or destination of a flash read.
    #[arg(short, long, value_name = "PATH")]
    pub file: PathBuf,

    /// Serial device of the programmer [default: /dev/ttyACM0].
    #[arg(short, long, env = "PICOPROG_PORT")]
    pub port: Option<String>,

    /// Baud rate [default: 115200].
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Read timeout in milliseconds [default: 5000].
    #[arg(long, env = "PICOPROG_TIMEOUT_MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Skip the read-back verification after a flash write.
    #[arg(long, requires = "write_flash")]
    pub no_verify: bool,

    /// Path to a configuration file.
    #[arg(long = "config", value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Selected operating mode.
    pub(crate) fn mode(&self) -> Mode {
        if self.write_flash {
            Mode::WriteFlash
        } else if self.read_flash {
            Mode::ReadFlash
        } else {
            Mode::WriteFpga
        }
    }

    /// Serial settings: flags and environment, then config files, then defaults.
    pub(crate) fn serial_config(&self, config: &Config) -> SerialConfig {
        let port = self
            .port
            .clone()
            .or_else(|| config.connection.port.clone())
            .unwrap_or_else(|| DEFAULT_PORT.to_string());
        let baud = self
            .baud
            .or(config.connection.baud)
            .unwrap_or(DEFAULT_BAUD);
        let timeout = self
            .timeout_ms
            .or(config.connection.timeout_ms)
            .map_or(DEFAULT_TIMEOUT, Duration::from_millis);

        SerialConfig::new(port)
            .with_baud_rate(baud)
            .with_timeout(timeout)
    }

    /// Flash-write options.
    pub(crate) fn write_options(&self, config: &Config) -> WriteOptions {
        let verify = if self.no_verify {
            false
        } else {
            config.flash.verify.unwrap_or(true)
        };
        WriteOptions { verify }
    }
}

/// Errors classified for the process exit code.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// A configuration file given with `--config` could not be loaded.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 3,
        }
    }
}

/// Map an error chain to the process exit code.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>()
        .map_or(1, CliError::exit_code)
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();
}

fn main() -> ExitCode {
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, Ordering::Relaxed);

    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = Cli::parse();
    init_logging(&cli);

    debug!(
        "picoprog v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", style("Error:").red().bold());
            ExitCode::from(exit_code_for(&err))
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = if let Some(ref path) = cli.config_path {
        Config::load_from_path(path).map_err(CliError::from)?
    } else {
        Config::load()
    };

    match cli.mode() {
        Mode::WriteFlash => commands::flash::cmd_write_flash(cli, &config),
        Mode::ReadFlash => commands::flash::cmd_read_flash(cli, &config),
        Mode::WriteFpga => commands::fpga::cmd_write_fpga(cli, &config),
    }
}
