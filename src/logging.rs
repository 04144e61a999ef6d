//! Tracing setup: console output plus an optional daily-rolled log file.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ragbench_config::LoggingConfig;

use crate::error::WorkbenchError;

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.level`. File output goes to
/// `<log_dir>/ragbench.<date>.log` with 30 days kept. Fails if a global
/// subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<(), WorkbenchError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| WorkbenchError::Logging(format!("bad level '{}': {}", config.level, e)))?,
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.json {
        layers.push(fmt::layer().json().with_target(true).boxed());
    } else {
        layers.push(fmt::layer().with_target(true).with_ansi(true).boxed());
    }

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir).map_err(|e| WorkbenchError::Logging(e.to_string()))?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("ragbench")
            .filename_suffix("log")
            .max_log_files(30)
            .build(log_dir)
            .map_err(|e| WorkbenchError::Logging(e.to_string()))?;

        let (writer, guard) = tracing_appender::non_blocking(appender);
        // Dropping the guard would stop the writer thread.
        let _ = GUARD.set(guard);
        layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| WorkbenchError::Logging(e.to_string()))
}
