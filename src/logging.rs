//! Diagnostic logging for the `reword` binary.
//!
//! Logs go to stderr so that results printed on stdout stay machine-readable.
//! `RUST_LOG` takes precedence over the `-v` count.

use crate::errors::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Maps the number of `-v` flags to a default filter directive.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "reword=warn",
        1 => "reword=info",
        2 => "reword=debug",
        _ => "reword=trace",
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(verbosity: u8) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to set tracing subscriber: {e}")))
}
