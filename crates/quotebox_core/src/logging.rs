//! Optional file logging for the CLI process.
//!
//! # Responsibility
//! - Start one rolling `quotebox*.log` writer when a log directory is given.
//! - Route panics from any thread (auto-sync included) into the log.
//!
//! # Invariants
//! - Log lines are metadata only: events, counts, ids and states. Quote text
//!   and authors are never logged, and panic payloads are cut to one line.
//! - A second `init_logging` with the same level and directory is a no-op;
//!   any other second call is rejected.

use flexi_logger::{Age, Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "quotebox";
const ROTATE_AT_BYTES: u64 = 2 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 7;
const PANIC_SUMMARY_CHARS: usize = 120;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    level: LogLevel,
    log_dir: PathBuf,
    _handle: LoggerHandle,
}

/// Verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Result<Self, LoggingError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LoggingError::UnknownLevel(other.to_string())),
        }
    }
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> LogLevel {
    if cfg!(debug_assertions) {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    Directory { path: PathBuf, message: String },
    Backend(String),
    AlreadyActive { level: LogLevel, log_dir: PathBuf },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::Directory { path, message } => {
                write!(f, "log directory `{}` is unusable: {message}", path.display())
            }
            Self::Backend(message) => write!(f, "failed to start logger: {message}"),
            Self::AlreadyActive { level, log_dir } => write!(
                f,
                "logging already active at `{}` with level `{}`",
                log_dir.display(),
                level.as_str()
            ),
        }
    }
}

impl Error for LoggingError {}

/// Starts file logging under `log_dir`; relative paths resolve against the
/// current directory.
///
/// Until this succeeds the `log` macros stay no-ops, so commands run without
/// `--log-dir` write nothing.
///
/// # Errors
/// - `LoggingError::Directory` when the directory cannot be resolved or created.
/// - `LoggingError::Backend` when the file writer cannot start.
/// - `LoggingError::AlreadyActive` when logging runs with another level or
///   directory.
pub fn init_logging(level: LogLevel, log_dir: &Path) -> Result<(), LoggingError> {
    let log_dir = std::path::absolute(log_dir).map_err(|err| LoggingError::Directory {
        path: log_dir.to_path_buf(),
        message: err.to_string(),
    })?;

    let active = ACTIVE.get_or_try_init(|| start_logger(level, &log_dir))?;
    if active.level != level || active.log_dir != log_dir {
        return Err(LoggingError::AlreadyActive {
            level: active.level,
            log_dir: active.log_dir.clone(),
        });
    }
    Ok(())
}

fn start_logger(level: LogLevel, log_dir: &Path) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|err| LoggingError::Directory {
        path: log_dir.to_path_buf(),
        message: err.to_string(),
    })?;

    // Direct writes: a CLI run can end before a buffered flush.
    let handle = Logger::try_with_str(level.as_str())
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::AgeOrSize(Age::Day, ROTATE_AT_BYTES),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::Direct)
        .append()
        .format_for_files(flexi_logger::with_thread)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook();
    info!(
        "event=logging_start module=logging status=ok level={} os={} version={}",
        level.as_str(),
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        log_dir: log_dir.to_path_buf(),
        _handle: handle,
    })
}

// Runs once, from inside the `ACTIVE` initializer.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned());
        error!(
            "event=panic module=logging status=error thread={} location={} payload={}",
            std::thread::current().name().unwrap_or("unnamed"),
            location,
            payload
                .as_deref()
                .map(one_line_summary)
                .unwrap_or_else(|| "opaque".to_string())
        );
        previous(panic_info);
    }));
}

fn one_line_summary(message: &str) -> String {
    let first_line = message.lines().next().unwrap_or_default();
    let mut summary: String = first_line.chars().take(PANIC_SUMMARY_CHARS).collect();
    if summary.len() < message.len() {
        summary.push_str("...");
    }
    summary
}
