//! # Logging Utilities
//!
//! Logging infrastructure for linetrace using `tracing`.
//!
//! Console output always goes to stderr: standard output belongs to the
//! resolved `file:line` results, which scripts parse.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use linetrace_utils::{init_logging, LoggingConfig};
//!
//! // Keep the guard alive until exit so buffered file output is flushed
//! let _guard = init_logging(&LoggingConfig::from_env()).expect("Failed to initialize logging");
//!
//! tracing::warn!("line unit runs past the end of .debug_line");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Filter directives (e.g., `RUST_LOG=debug`, `RUST_LOG=linetrace_core=trace`)
//! - `LINETRACE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `LINETRACE_LOG_FILE`: Optional log file, rotated daily, written in addition to stderr

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "LINETRACE_LOG_FORMAT";
/// Environment variable naming an optional log file.
pub const LOG_FILE_ENV: &str = "LINETRACE_LOG_FILE";

/// Level used when neither an explicit level nor `RUST_LOG` is given.
///
/// Malformed-input diagnostics are warnings, so they show by default.
const DEFAULT_LEVEL: Level = Level::WARN;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Human-readable lines (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    Info,
    Debug,
    /// Every candidate row considered by the line interpreter
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Logging settings, assembled from the environment and command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig
{
    /// Overrides `RUST_LOG` when set
    pub level: Option<LogLevel>,
    pub format: LogFormat,
    /// Daily-rotated log file written next to the console output
    pub file: Option<PathBuf>,
}

impl LoggingConfig
{
    /// Read `LINETRACE_LOG_FORMAT` and `LINETRACE_LOG_FILE`.
    ///
    /// An unrecognised format falls back to pretty output. `RUST_LOG` is
    /// consulted later, when the filter is built.
    pub fn from_env() -> Self
    {
        let format = env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|s| LogFormat::from_str(&s).ok())
            .unwrap_or_default();
        let file = env::var_os(LOG_FILE_ENV)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self {
            level: None,
            format,
            file,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Option<LogLevel>) -> Self
    {
        if level.is_some() {
            self.level = level;
        }
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: Option<LogFormat>) -> Self
    {
        if let Some(format) = format {
            self.format = format;
        }
        self
    }

    /// Filter priority: explicit level, then `RUST_LOG`, then warnings.
    fn env_filter(&self) -> EnvFilter
    {
        if let Some(level) = self.level {
            return EnvFilter::new(Level::from(level).to_string());
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL.to_string()))
    }
}

/// Keeps the background file writer alive. Dropping it flushes the log file.
#[derive(Debug)]
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// ## Errors
///
/// Returns an error if:
/// - A global subscriber is already installed
/// - The log file's directory cannot be created
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError>
{
    let env_filter = config.env_filter();

    let (file_writer, guard) = match &config.file {
        Some(path) => {
            let (directory, name) = split_log_path(path)?;
            std::fs::create_dir_all(&directory)?;
            let appender = tracing_appender::rolling::daily(directory, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let result = match config.format {
        LogFormat::Pretty => {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(io::IsTerminal::is_terminal(&io::stderr()))
                .with_writer(io::stderr)
                .with_filter(env_filter.clone());
            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_filter(env_filter)
            });
            Registry::default().with(console_layer).with(file_layer).try_init()
        }
        LogFormat::Json => {
            let console_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_writer(io::stderr)
                .with_filter(env_filter.clone());
            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_current_span(true)
                    .with_filter(env_filter)
            });
            Registry::default().with(console_layer).with(file_layer).try_init()
        }
    };
    result.map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(LoggingGuard { _file: guard })
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError>
{
    let name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidFile(path.to_path_buf()))?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((directory.to_path_buf(), PathBuf::from(name)))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    #[error("Log file path has no file name: {}", .0.display())]
    InvalidFile(PathBuf),

    /// A subscriber was already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
