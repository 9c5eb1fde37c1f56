//! Tracing setup for plume clients.
//!
//! One call installs the global subscriber: a console layer filtered by
//! `RUST_LOG` (default `info`), plus an optional file layer.
//!
//! # Activation
//!
//! ```bash
//! # Console only, default filter
//! my-feed-app
//!
//! # Verbose engine internals
//! RUST_LOG=plume_feed=trace,plume_client=debug my-feed-app
//!
//! # Additionally mirror to a file (non-blocking writer)
//! PLUME_LOG_FILE=/tmp/plume.log my-feed-app
//! ```
//!
//! Keep the returned [`TelemetryGuard`] alive for the life of the process —
//! dropping it flushes and stops the file writer.

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Env var naming a file to mirror logs into.
pub const LOG_FILE_ENV: &str = "PLUME_LOG_FILE";

/// Errors from telemetry setup.
#[derive(Debug, Error)]
pub enum InitError {
    /// A global subscriber is already installed.
    #[error("telemetry already initialized")]
    AlreadyInitialized,
    /// The log file named by `PLUME_LOG_FILE` couldn't be created.
    #[error("failed to create log file: {0}")]
    LogFile(#[from] std::io::Error),
}

/// Keeps the non-blocking file writer alive. Dropping flushes it.
pub struct TelemetryGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG`, falling back to `info`. When
/// [`LOG_FILE_ENV`] names a path, logs are additionally written there
/// without ANSI escapes, through a non-blocking writer.
pub fn init() -> Result<TelemetryGuard, InitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, file_guard) = match std::env::var(LOG_FILE_ENV) {
        Ok(path) => {
            let file = std::fs::File::create(&path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|_| InitError::AlreadyInitialized)?;

    Ok(TelemetryGuard { _file_guard: file_guard })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // One test drives all the init paths: installation is process-global,
    // so splitting these up would make them racy under the parallel runner.
    #[test]
    fn test_init_paths() {
        let dir = tempfile::tempdir().unwrap();

        // Unwritable log file fails before anything is installed.
        unsafe {
            std::env::set_var(LOG_FILE_ENV, dir.path().join("no/such/dir/x.log"));
        }
        assert!(matches!(init(), Err(InitError::LogFile(_))));

        // Writable log file installs the subscriber and creates the file.
        let log_path = dir.path().join("plume.log");
        unsafe {
            std::env::set_var(LOG_FILE_ENV, &log_path);
        }
        let guard = init().expect("first successful init");
        assert!(log_path.exists());
        tracing::info!("telemetry smoke line");

        // Second install is rejected, not silently swallowed.
        assert!(matches!(init(), Err(InitError::AlreadyInitialized)));

        unsafe {
            std::env::remove_var(LOG_FILE_ENV);
        }
        // Dropping the guard flushes the non-blocking writer.
        drop(guard);
        let written = std::fs::read_to_string(&log_path).unwrap();
        assert!(written.contains("telemetry smoke line"));
    }
}
