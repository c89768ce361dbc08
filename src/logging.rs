use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "adaptive.log";

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

pub fn log_dir_from_env() -> Option<PathBuf> {
    if !file_logging_enabled() {
        return None;
    }
    Some(PathBuf::from(
        std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
    ))
}

/// Installs the global subscriber for a host embedding the engine.
///
/// The engine is a library, so an already-installed subscriber is left in
/// place instead of panicking.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    init_tracing_with(log_level, log_dir_from_env().as_deref())
}

pub fn init_tracing_with(log_level: &str, log_dir: Option<&Path>) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir.and_then(daily_file_writer) {
        Some((writer, guard)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true)),
            Some(guard),
        ),
        None => (None, None),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
    {
        eprintln!("tracing subscriber already installed, keeping it: {err}");
    }

    guard.map(|guard| FileLogGuard { _guard: guard })
}

fn daily_file_writer(log_dir: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {}: {err}", log_dir.display());
        return None;
    }
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME);
    Some(tracing_appender::non_blocking(appender))
}
