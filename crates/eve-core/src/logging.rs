//! Logging configuration using tracing
//!
//! Everything goes to a daily-rotated file; stdout stays reserved for the
//! headless NDJSON stream.

use std::ffi::OsString;
use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Filter directive variable
const LOG_FILTER_ENV: &str = "EVE_LOG";

/// Overrides the log directory, e.g. for scripted headless sessions
const LOG_DIR_ENV: &str = "EVE_LOG_DIR";

const LOG_FILE_PREFIX: &str = "eveged.log";

const DEFAULT_FILTER: &str = "eve_inspector=info,eve_app=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/eve-inspector/logs/` unless
/// `EVE_LOG_DIR` names another directory. Log level is controlled by the
/// `EVE_LOG` environment variable.
///
/// # Examples
/// ```bash
/// EVE_LOG=debug eveged headless < session.ndjson
/// EVE_LOG=eve_app=trace EVE_LOG_DIR=/tmp/eve eveged summary scene.json
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory(std::env::var_os(LOG_DIR_ENV));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    let env_filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!(
        "EVE inspector {} logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );

    Ok(())
}

/// Log directory: the override if set and non-empty, else the data dir.
fn log_directory(override_dir: Option<OsString>) -> PathBuf {
    match override_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eve-inspector")
            .join("logs"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_override() {
        assert_eq!(
            log_directory(Some(OsString::from("/tmp/eve-logs"))),
            PathBuf::from("/tmp/eve-logs")
        );
    }

    #[test]
    fn test_log_directory_default() {
        let dir = log_directory(Some(OsString::new()));
        assert!(dir.ends_with("eve-inspector/logs"));
        assert_eq!(dir, log_directory(None));
    }
}
