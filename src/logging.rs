//! Diagnostic logging through `tracing`.
//!
//! Filtering comes from `GOTCHA_LOG` (same syntax as `RUST_LOG`), defaulting
//! to `warn`. When a log file is given, output goes there without ANSI colours
//! so it never interleaves with streamed answers on the terminal.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_VAR: &str = "GOTCHA_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

fn filter_from(directive: Option<String>) -> EnvFilter {
    directive
        .and_then(|value| EnvFilter::try_new(value.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber. Calling it twice is an error from
/// `tracing_subscriber`, surfaced to the caller.
pub fn init_tracing(log_file: Option<&Path>) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = filter_from(std::env::var(LOG_FILTER_VAR).ok());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()?;
        }
        None => builder.with_writer(std::io::stderr).try_init()?,
    }
    Ok(())
}
