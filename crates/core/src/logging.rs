//! Structured logging initialization.
//!
//! Built on the `tracing` ecosystem: an `EnvFilter` controls verbosity
//! (overridable with `RUST_LOG`), and when a log directory is configured
//! the output goes to a JSON file through a non-blocking appender. Each
//! process gets a run ID (UUID v7) that names the log file, so sessions
//! can be told apart.
//!
//! Initialization is optional; the core logs through `tracing` macros
//! either way and an embedder with its own subscriber can skip this
//! module entirely.

use std::fs;
use std::sync::{Mutex, OnceLock};

use anyhow::{Context, Error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::LoggingSettings;

const LOG_FILE_PREFIX: &str = "swipenav-";
const LOG_FILE_SUFFIX: &str = "json";

static LOG_GUARD: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();
static RUN_ID: OnceLock<String> = OnceLock::new();

/// Returns the unique run ID for this process, generated at first access.
pub fn get_run_id() -> &'static str {
    RUN_ID.get_or_init(|| Uuid::now_v7().to_string()).as_str()
}

/// Installs the global subscriber according to `settings`. A no-op when
/// logging is disabled. Fails if another subscriber was installed first.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), Error> {
    if !settings.enabled {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

    match settings.directory {
        Some(ref directory) => {
            fs::create_dir_all(directory)
                .with_context(|| format!("can't create log directory {}", directory.display()))?;
            let path = directory.join(format!(
                "{}{}.{}",
                LOG_FILE_PREFIX,
                get_run_id(),
                LOG_FILE_SUFFIX
            ));
            let file = fs::File::create(&path)
                .with_context(|| format!("can't create log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            LOG_GUARD
                .get_or_init(|| Mutex::new(None))
                .lock()
                .map_err(|_| anyhow::anyhow!("log guard poisoned"))?
                .replace(guard);

            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .try_init()
                .context("can't install logging subscriber")?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .context("can't install logging subscriber")?;
        }
    }

    tracing::info!(run_id = get_run_id(), "logging initialized");
    Ok(())
}

/// Flushes and releases the file appender, if one was installed.
pub fn shutdown_logging() {
    if let Some(guard) = LOG_GUARD.get() {
        if let Ok(mut slot) = guard.lock() {
            slot.take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_logging_is_a_no_op() {
        let settings = LoggingSettings {
            enabled: false,
            ..Default::default()
        };
        assert!(init_logging(&settings).is_ok());
    }

    #[test]
    fn test_run_id_is_stable() {
        assert_eq!(get_run_id(), get_run_id());
    }

    #[test]
    fn test_shutdown_without_init_is_safe() {
        shutdown_logging();
    }
}
