//! # Logging Utilities
//!
//! `tracing` setup for the cxxviz binary and for debugger hosts.
//!
//! Two entry points cover the two ways the visualizers run:
//! - As a CLI: events go to stderr so they never mix with rendered output on
//!   stdout. `CXXVIZ_LOG_FILE` adds a second, daily-rolled file sink.
//! - Inside a debugger host: the host owns the console, so events go only to
//!   `~/.cxxviz/YYYY-MM-DD-cxxviz.log`.
//!
//! Both return a [`LoggingGuard`]. Keep it alive until shutdown; dropping it
//! flushes and stops the background file writer.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: level filter (`debug`, `cxxviz_core=trace`, ...)
//! - `CXXVIZ_LOG_FORMAT`: `pretty` (default) or `json`
//! - `CXXVIZ_LOG_FILE`: optional extra log file for the CLI
//!
//! ## Example
//!
//! ```rust,no_run
//! use cxxviz_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
//!     .expect("Failed to initialize logging");
//! tracing::debug!("visualizers ready");
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const FORMAT_VAR: &str = "CXXVIZ_LOG_FORMAT";
const FILE_VAR: &str = "CXXVIZ_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Human-readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default for the CLI)
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level, one event per element step
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
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Keeps the background file writer running.
///
/// Holds nothing when logging is console-only.
#[derive(Debug, Default)]
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging from the environment
///
/// `CXXVIZ_LOG_FORMAT` picks the format. `RUST_LOG` sets the filter and
/// defaults to `warn`.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    let format = env::var(FORMAT_VAR)
        .ok()
        .and_then(|s| LogFormat::from_str(&s).ok())
        .unwrap_or(LogFormat::Pretty);

    let filter = build_filter(None, env::var("RUST_LOG").ok().as_deref());
    init_console(format, filter)
}

/// Initialize logging with an explicit level, ignoring `RUST_LOG`
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_console(format, build_filter(Some(level.into()), None))
}

/// Initialize file-only logging for use inside a debugger host
///
/// Events are written to `~/.cxxviz/YYYY-MM-DD-cxxviz.log`, or to the same
/// file name under `/tmp` when `HOME` is unset. Returns the chosen path.
///
/// `level` overrides `RUST_LOG`; with neither, the filter is `info`.
///
/// ## Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_logging_for_host(level: Option<LogLevel>) -> Result<(PathBuf, LoggingGuard), LoggingError>
{
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let home = env::var_os("HOME").map(PathBuf::from);
    let log_file = host_log_path(home.as_deref(), &today);
    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let rust_log = env::var("RUST_LOG").ok();
    let filter = match (level, rust_log.as_deref()) {
        (Some(level), _) => build_filter(Some(level.into()), None),
        (None, Some(directives)) => build_filter(None, Some(directives)),
        (None, None) => build_filter(Some(Level::INFO), None),
    };

    // Already date-stamped, so never roll.
    let (dir, name) = split_path(&log_file);
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    let layers = vec![format_layer(LogFormat::Pretty, writer, false, filter)];
    install(layers)?;

    Ok((log_file, LoggingGuard { _file: Some(guard) }))
}

/// Path of the host log file for `today` under `home`.
fn host_log_path(home: Option<&Path>, today: &str) -> PathBuf
{
    let dir = match home {
        Some(home) => home.join(".cxxviz"),
        None => PathBuf::from("/tmp"),
    };
    dir.join(format!("{today}-cxxviz.log"))
}

/// Filter for an explicit level, else `RUST_LOG` directives, else `warn`.
///
/// Invalid directives fall back to `warn` rather than failing startup.
fn build_filter(explicit: Option<Level>, rust_log: Option<&str>) -> EnvFilter
{
    if let Some(level) = explicit {
        return EnvFilter::new(level.to_string());
    }
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(Level::WARN.to_string()))
}

fn init_console(format: LogFormat, filter: EnvFilter) -> Result<LoggingGuard, LoggingError>
{
    let mut layers = vec![format_layer(format, io::stderr, true, filter.clone())];
    let mut file_guard = None;

    if let Some(path) = env::var_os(FILE_VAR).map(PathBuf::from) {
        let (dir, name) = split_path(&path);
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
        layers.push(format_layer(format, writer, false, filter));
        file_guard = Some(guard);
    }

    install(layers)?;
    Ok(LoggingGuard { _file: file_guard })
}

/// Directory and file name of a log path; a bare name lives in `.`.
fn split_path(path: &Path) -> (&Path, &OsStr)
{
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    (dir, path.file_name().unwrap_or_default())
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn install(layers: Vec<BoxedLayer>) -> Result<(), LoggingError>
{
    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// A global subscriber was already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// The log directory could not be created
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
