use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::TARGETS;

/// Log file written next to the other run artifacts
pub fn log_file_path(outfile_prefix: &str) -> String {
    format!("{}_log.txt", outfile_prefix)
}

/// Filter for the log file: `info` everywhere, `debug` for every crate target
pub fn file_filter_directives() -> String {
    let mut directives = vec!["info".to_string()];
    directives.extend(TARGETS.iter().map(|target| format!("{}=debug", target)));
    directives.join(",")
}

/// Installs the global subscriber: terse stdout plus a detailed per-run log file
///
/// Stdout honours `RUST_LOG` and defaults to `info`; the file always
/// records debug output from this crate.
pub fn configure_logging(outfile_prefix: &str) -> Result<()> {
    let log_path = log_file_path(outfile_prefix);
    let path = Path::new(&log_path);
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .context("Output prefix does not name a file")?;

    // Stdout log configuration
    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    // File log configuration
    let file_appender = rolling::never(directory, file_name);
    let file_log = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new(file_filter_directives()));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
