//! Structured log output for explanation runs

use crate::io::error::{ExplainError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;

/// Most detailed level emitted for the given flags
///
/// `verbose` wins over `quiet`; quiet runs still report warnings.
pub const fn log_level(verbose: bool, quiet: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    }
}

/// Install the global subscriber
///
/// Events go to `log_file` when given, without colours, and to stderr
/// otherwise. Installing twice keeps the first subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be created
pub fn init_logging(log_file: Option<&Path>, level: Level) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);
    let installed = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| ExplainError::FileSystem {
                path: path.to_path_buf(),
                operation: "create log file",
                source: e,
            })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Log subscriber already installed, keeping it");
    }
    Ok(())
}
