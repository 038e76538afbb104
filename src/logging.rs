use std::path::PathBuf;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::LoggingConfig;
use crate::error::{ListenerError, Result};

const DEFAULT_LOG_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "qa_listener";

/// Parse a rotation name from the config. Unset means daily.
pub fn parse_rotation(value: Option<&str>) -> Result<Rotation> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("daily") => Ok(Rotation::DAILY),
        Some("hourly") => Ok(Rotation::HOURLY),
        Some("minutely") => Ok(Rotation::MINUTELY),
        Some("never") => Ok(Rotation::NEVER),
        Some(other) => Err(ListenerError::ConfigError(format!(
            "Unknown log rotation '{}' (expected minutely, hourly, daily or never)",
            other
        ))),
    }
}

pub struct FileLogger {
    log_directory: PathBuf,
    rotation: Rotation,
}

impl FileLogger {
    pub fn new(log_directory: PathBuf) -> Self {
        Self {
            log_directory,
            rotation: Rotation::DAILY,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard)> {
        // Ensure log directory exists
        std::fs::create_dir_all(&self.log_directory)?;

        let file_appender =
            RollingFileAppender::new(self.rotation.clone(), &self.log_directory, LOG_FILE_PREFIX);

        Ok(tracing_appender::non_blocking(file_appender))
    }
}

/// Install the global subscriber: console output always, plus a rolling file
/// when `config.directory` is set. The returned guard must outlive the server
/// or buffered file lines are lost.
pub fn setup_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let console_layer = tracing_subscriber::fmt::layer().with_filter(filter());

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let rotation = parse_rotation(config.rotation.as_deref())?;
            let (writer, guard) = FileLogger::new(directory.clone())
                .with_rotation(rotation)
                .setup_file_logging()?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false) // Disable ANSI colors for file logs
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ListenerError::ConfigError(format!("Failed to install logger: {}", e)))?;

    Ok(guard)
}
