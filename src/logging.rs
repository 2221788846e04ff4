use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g. `CODETYPE_LOG=debug`.
pub const LOG_ENV: &str = "CODETYPE_LOG";

/// Whether a log file should be written at all.
pub fn logging_requested(flag: bool) -> bool {
    flag || std::env::var_os(LOG_ENV).is_some()
}

pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Send `tracing` output to `path`, appending.
///
/// The terminal belongs to the TUI so nothing is ever written to stdout or
/// stderr. Fails if a global subscriber is already installed.
pub fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(log_filter())
        .try_init()?;

    Ok(())
}
