use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{AppError, Result};

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "DIRVIEW_LOG";

/// Build the filter from `DIRVIEW_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber writing to `log_file`.
///
/// The terminal belongs to the UI, so nothing is installed without a file.
/// Returns whether a subscriber was installed.
pub fn init(log_file: Option<&Path>, level: &str) -> Result<bool> {
    let Some(path) = log_file else {
        return Ok(false);
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    tracing::info!(log_file = %path.display(), "logging started");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn no_file_installs_nothing() {
        assert!(!init(None, "debug").unwrap());
    }

    #[test]
    fn unwritable_log_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("dirview.log");
        let err = init(Some(&path), "info").unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn env_filter_builds_from_level() {
        let filter = env_filter("warn");
        assert!(!filter.to_string().is_empty());
    }
}
