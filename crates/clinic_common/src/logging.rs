//! Logging setup for the clinic service.
//!
//! Console output is always enabled. When `logging.directory` is configured a
//! second, non-blocking layer writes a daily rolling file; the returned
//! [`WorkerGuard`] must be kept alive for the lifetime of the process.

use clinic_config::LoggingConfig;
use tracing::{error, info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize with the default configuration (INFO, console only).
pub fn init() -> Option<WorkerGuard> {
    init_with_config(&LoggingConfig::default())
}

/// Initialize console logging at a fixed level.
pub fn init_with_level(level: Level) -> Option<WorkerGuard> {
    init_with_config(&LoggingConfig {
        level: level.to_string().to_lowercase(),
        ..LoggingConfig::default()
    })
}

/// Initialize the global subscriber from the logging configuration.
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this more than once
/// is harmless; later calls leave the first subscriber in place.
pub fn init_with_config(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(file_layer)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", config.level);
    }

    guard
}

/// Log an error with context at the ERROR level.
pub fn log_error<E: std::fmt::Display>(error: E, context: &str) {
    error!("{}: {}", context, error);
}
