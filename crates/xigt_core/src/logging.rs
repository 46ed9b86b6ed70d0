//! Logging bootstrap for the xigt library and CLI.
//!
//! # Responsibility
//! - Start one `flexi_logger` backend per process, writing either rolling
//!   files in a directory or plain lines on stderr.
//! - Emit `key=value` diagnostic events that never include document text.
//!
//! # Invariants
//! - Initialization is idempotent for the same target and level.
//! - Re-initialization with a different target or level is rejected.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_FILE_BASENAME: &str = "xigt";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 120;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Rolling files under an absolute directory.
    Directory(PathBuf),
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => write!(f, "stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Failure to start or reconfigure logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// Level name outside `trace|debug|info|warn|error`.
    UnknownLevel(String),
    /// Log directory is empty or relative.
    LogDir(String),
    /// Backend could not be created or started.
    Backend(String),
    /// Logging is already active with a different level or target.
    AlreadyActive { active: String, requested: String },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::LogDir(message) => write!(f, "invalid log directory: {message}"),
            Self::Backend(message) => write!(f, "logger backend failed: {message}"),
            Self::AlreadyActive { active, requested } => write!(
                f,
                "logging already active as `{active}`; cannot reconfigure to `{requested}`"
            ),
        }
    }
}

impl Error for LoggingError {}

struct LoggingState {
    level: LevelFilter,
    target: LogTarget,
    _logger: LoggerHandle,
}

/// Starts rolling file logs in `log_dir`.
///
/// # Errors
/// - `level` is not one of `trace|debug|info|warn|error`.
/// - `log_dir` is empty, relative, or cannot be created.
/// - Logging is already active with another level or target.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let target = LogTarget::Directory(absolute_log_dir(log_dir)?);
    init_with_target(level, target)
}

/// Starts logging to stderr. Used by the CLI when no log directory is given.
pub fn init_stderr_logging(level: &str) -> Result<(), LoggingError> {
    init_with_target(level, LogTarget::Stderr)
}

/// Returns the active `(level, target)` pair, if any.
pub fn logging_status() -> Option<(LevelFilter, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn init_with_target(level: &str, target: LogTarget) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, target.clone()))?;

    if state.level != level || state.target != target {
        return Err(LoggingError::AlreadyActive {
            active: format!("{} {}", state.level, state.target),
            requested: format!("{level} {target}"),
        });
    }
    Ok(())
}

/// Parses a level name with `log`'s own parser; `warning` is accepted and
/// `off` is not.
fn parse_level(raw: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = raw.trim();
    let name = if trimmed.eq_ignore_ascii_case("warning") {
        "warn"
    } else {
        trimmed
    };
    match LevelFilter::from_str(name) {
        Ok(LevelFilter::Off) | Err(_) => Err(LoggingError::UnknownLevel(trimmed.to_string())),
        Ok(level) => Ok(level),
    }
}

fn absolute_log_dir(raw: &str) -> Result<PathBuf, LoggingError> {
    let path = Path::new(raw.trim());
    if path.as_os_str().is_empty() {
        return Err(LoggingError::LogDir("path is empty".to_string()));
    }
    if path.is_relative() {
        return Err(LoggingError::LogDir(format!(
            "`{}` is not absolute",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

fn start_logger(level: LevelFilter, target: LogTarget) -> Result<LoggingState, LoggingError> {
    let logger = match &target {
        LogTarget::Stderr => Logger::with(level)
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|err| LoggingError::Backend(format!("{}: {err}", dir.display())))?;
            Logger::with(level)
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };
    let handle = logger
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    PANIC_HOOK.get_or_init(install_panic_hook);
    info!(
        "event=logger_started module=xigt version={} debug_assertions={} level={} target={}",
        env!("CARGO_PKG_VERSION"),
        cfg!(debug_assertions),
        level,
        target
    );

    Ok(LoggingState {
        level,
        target,
        _logger: handle,
    })
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let (file, line) = info
            .location()
            .map_or(("?", 0), |loc| (loc.file(), loc.line()));
        error!(
            "event=panic module=xigt at={file}:{line} message={}",
            panic_summary(info.payload())
        );
        previous(info);
    }));
}

/// First line of a string panic payload, capped in length; payloads may
/// quote document text.
fn panic_summary(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<opaque payload>");
    let first_line = message.lines().next().unwrap_or_default();
    match first_line.char_indices().nth(PANIC_SUMMARY_CHARS) {
        Some((cut, _)) => format!("{}~", &first_line[..cut]),
        None => first_line.to_string(),
    }
}
