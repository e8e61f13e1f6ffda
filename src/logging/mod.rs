//! Application logging functionality
//!
//! Sets up the `tracing` subscriber: human-readable output on stderr and,
//! optionally, a copy in a dated file under ~/.config/glyphwright/logs/.

use crate::core::config_file::ConfigFile;
use crate::core::settings::APP_NAME;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    ConfigFile::config_dir().join("logs")
}

/// Get the path to the current log file
pub fn current_log_file() -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d");
    logs_dir().join(format!("{APP_NAME}-{timestamp}.log"))
}

/// Initialize the logs directory
pub fn initialize_logs_directory() -> anyhow::Result<()> {
    fs::create_dir_all(logs_dir())?;
    Ok(())
}

/// Filter directive for a `-v` count
///
/// Without `-v` debug builds log at info and release builds only warn.
pub fn filter_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 if cfg!(debug_assertions) => "info",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("{APP_NAME}={level}")
}

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `verbosity`.
///
/// With `log_to_file`, events are also appended to [`current_log_file`];
/// keep the returned guard alive until exit so buffered lines are flushed.
pub fn init_logging(verbosity: u8, log_to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(verbosity)))?;

    let (file_layer, guard) = if log_to_file {
        initialize_logs_directory()?;
        let path = current_log_file();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{APP_NAME}.log"));
        let appender = tracing_appender::rolling::never(logs_dir(), file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(1), "glyphwright=info");
        assert_eq!(filter_directive(2), "glyphwright=debug");
        assert_eq!(filter_directive(7), "glyphwright=trace");
    }

    #[test]
    fn test_log_file_is_dated() {
        let path = current_log_file();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("glyphwright-"));
        assert!(name.ends_with(".log"));
        assert!(path.starts_with(logs_dir()));
    }
}
