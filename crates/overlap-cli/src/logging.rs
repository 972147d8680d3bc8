//! Tracing setup for the `overlap` binary.
//!
//! Logs go to stderr so stdout stays machine-readable. `RUST_LOG` overrides the
//! level picked from `--verbose`.

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line human-readable output
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

/// Level used when `RUST_LOG` is unset: info, then debug and trace per `-v`.
pub fn level_for(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Call once, before any command runs.
pub fn init(format: LogFormat, verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("overlap={}", level_for(verbose))));

    let layer = match format {
        LogFormat::Compact => fmt::layer()
            .compact()
            .without_time()
            .with_target(verbose > 0)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set global tracing subscriber")
}
