//! Logging setup for the command-line tool.
//!
//! Every run writes to the console and, when a log directory is configured,
//! to a timestamped run log. `RUST_LOG` overrides the configured level.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level when `RUST_LOG` is unset.
    pub level: Level,

    /// Directory for the run log. `None` logs to the console only.
    pub log_dir: Option<PathBuf>,

    /// Colored console output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_dir: None,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Default level, or debug when `verbose`.
    pub fn with_verbosity(verbose: bool) -> Self {
        Self {
            level: if verbose { Level::DEBUG } else { Level::INFO },
            ..Default::default()
        }
    }
}

/// Errors preparing the run log.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot create log directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open run log: {0}")]
    Appender(#[from] InitError),
}

/// Run log file name for a run started at `started`.
///
/// ```rust
/// use chrono::TimeZone;
/// use office_deploy::logging::log_file_name;
///
/// let started = chrono::Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(log_file_name(started), "office-deploy-20240309-140507.log");
/// ```
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("office-deploy-{}.log", started.format("%Y%m%d-%H%M%S"))
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when a run log is open; keep it alive
/// until exit so buffered lines are flushed. Calling this twice leaves the
/// first subscriber in place.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string().to_lowercase()));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi)
        .with_target(false);

    let (file, guard) = match &config.log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(open_run_log(dir)?);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();
    Ok(guard)
}

fn open_run_log(dir: &Path) -> Result<RollingFileAppender, LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(log_file_name(Local::now()))
        .build(dir)?;
    Ok(appender)
}
