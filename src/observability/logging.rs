use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Result, ScraperError};

const LOG_FILE_PREFIX: &str = "equine_events.log";

/// Initializes console and JSON file logging. Keep the returned guard alive
/// for the lifetime of the process so buffered file logs are flushed.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    let (non_blocking_writer, guard) = file_writer(log_dir)?;

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    // Console goes to stderr so `--json` output on stdout stays clean
    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // Respect RUST_LOG if set; otherwise info for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("equine_events=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(guard)
}

/// Daily-rolling non-blocking writer under `log_dir`, creating the directory.
fn file_writer(log_dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
        .map_err(|e| {
            ScraperError::Config(format!(
                "Cannot write logs to {}: {}",
                log_dir.display(),
                e
            ))
        })?;
    Ok(tracing_appender::non_blocking(appender))
}
