use std::error::Error;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global subscriber writing to a daily rolling file.
///
/// Console output belongs to the reporter, so nothing is logged to stdout.
/// `RUST_LOG` overrides the configured level. Keep the returned guard alive
/// until exit or buffered lines are lost.
pub fn init(settings: &LoggingConfig) -> Result<WorkerGuard, Box<dyn Error + Send + Sync>> {
    let directory = settings.directory.as_deref().unwrap_or_else(|| Path::new("logs"));
    std::fs::create_dir_all(directory)?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::new(
        tracing_appender::rolling::Rotation::DAILY,
        directory,
        "glmrun",
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.level.to_lowercase()))?;

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_line_number(true)
        .with_file(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(false)
        .try_init()?;

    tracing::info!(directory = %std::fs::canonicalize(directory)?.display(), "Logging initialized");
    Ok(guard)
}
