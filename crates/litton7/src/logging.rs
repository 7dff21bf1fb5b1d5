//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem with either human-readable or JSON output.
//! Logging is opt-in: without `--log` no subscriber is installed at all.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Where warnings and errors are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl FromStr for LogTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("stderr") {
            Ok(Self::Stderr)
        } else {
            Ok(Self::File(PathBuf::from(s)))
        }
    }
}

/// Flags that shape the subscriber regardless of target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub json: bool,
}

/// Initialize the logging subsystem.
///
/// # Notes
///
/// - `None` leaves logging disabled
/// - Log files are truncated and start with a UTF-8 byte-order mark
/// - The RUST_LOG environment variable can override the level
pub fn init(
    target: Option<&LogTarget>,
    config: &litton7_core::Config,
    options: LogOptions,
) -> anyhow::Result<()> {
    let Some(target) = target else {
        return Ok(());
    };

    let default_level = if options.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let json = options.json || config.logging.format == "json";

    match target {
        LogTarget::Stderr => install(filter, json, true, std::io::stderr),
        LogTarget::File(path) => {
            let mut file = File::create(path)?;
            file.write_all(litton7_core::output::UTF8_BOM)?;
            install(filter, json, false, Mutex::new(file))
        }
    }
}

fn install<W>(filter: EnvFilter, json: bool, ansi: bool, writer: W) -> anyhow::Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init()?;
    }
    Ok(())
}
