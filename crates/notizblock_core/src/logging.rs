//! File logging for the note core.
//!
//! # Responsibility
//! - Start one `flexi_logger` file backend per process.
//! - Turn panics into single-line log events before the default hook runs.
//!
//! # Invariants
//! - A second `init_logging` with an equal level and directory succeeds
//!   without touching the running backend.
//! - A second `init_logging` with any other level or directory fails and
//!   the running backend keeps its configuration.
//! - Nothing in here panics.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "notizblock";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;

/// Accepted spellings and the level name handed to the backend.
const LEVELS: &[(&str, &str)] = &[
    ("trace", "trace"),
    ("debug", "debug"),
    ("info", "info"),
    ("warn", "warn"),
    ("warning", "warn"),
    ("error", "error"),
];

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    level: &'static str,
    dir: PathBuf,
    _handle: LoggerHandle,
}

/// Why logging could not be started.
#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    InvalidLogDir(String),
    CreateLogDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// A backend with another level or directory is already running.
    AlreadyInitialized {
        level: &'static str,
        log_dir: PathBuf,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => {
                write!(f, "log level `{level}` is not one of trace, debug, info, warn, error")
            }
            Self::InvalidLogDir(message) => write!(f, "log directory rejected: {message}"),
            Self::CreateLogDir { path, source } => {
                write!(f, "cannot create log directory {}: {source}", path.display())
            }
            Self::Backend(err) => write!(f, "log backend did not start: {err}"),
            Self::AlreadyInitialized { level, log_dir } => write!(
                f,
                "logging is already running at {level} in {}; restart to reconfigure",
                log_dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateLogDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Starts file logging at `level`, writing into the absolute `log_dir`.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let dir = parse_log_dir(log_dir)?;

    let active = ACTIVE_LOGGER.get_or_try_init(|| start_file_logger(level, &dir))?;
    if active.level == level && active.dir == dir {
        return Ok(());
    }
    Err(LoggingError::AlreadyInitialized {
        level: active.level,
        log_dir: active.dir.clone(),
    })
}

/// Level and directory of the running backend, if any.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE_LOGGER
        .get()
        .map(|active| (active.level, active.dir.clone()))
}

/// Level used when the host does not pick one.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_file_logger(level: &'static str, dir: &Path) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateLogDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let files = FileSpec::default().directory(dir).basename(LOG_BASENAME);
    let handle = Logger::try_with_str(level)
        .and_then(|logger| {
            logger
                .log_to_file(files)
                .format_for_files(flexi_logger::detailed_format)
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
                )
                .start()
        })
        .map_err(LoggingError::Backend)?;

    install_panic_hook();
    info!(
        "event=logging_start module=core status=ok level={level} dir={} os={} version={}",
        dir.display(),
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

fn parse_level(raw: &str) -> Result<&'static str, LoggingError> {
    let wanted = raw.trim().to_ascii_lowercase();
    LEVELS
        .iter()
        .find(|(spelling, _)| *spelling == wanted)
        .map(|(_, level)| *level)
        .ok_or(LoggingError::UnsupportedLevel(wanted))
}

fn parse_log_dir(raw: &str) -> Result<PathBuf, LoggingError> {
    let dir = PathBuf::from(raw.trim());
    if dir.as_os_str().is_empty() {
        return Err(LoggingError::InvalidLogDir("no path given".to_string()));
    }
    if dir.is_relative() {
        return Err(LoggingError::InvalidLogDir(format!(
            "{} is relative",
            dir.display()
        )));
    }
    Ok(dir)
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let chained = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        // Payload may echo note text.
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string payload>");
        error!(
            "event=panic module=core status=error location={location} payload={}",
            one_line(payload, PANIC_PAYLOAD_LIMIT)
        );
        chained(info);
    }));
}

/// Flattens line breaks and cuts to `limit` chars, marking the cut with `...`.
fn one_line(text: &str, limit: usize) -> String {
    let mut chars = text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c });
    let mut out: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, one_line, parse_level, parse_log_dir, LoggingError};

    #[test]
    fn level_spellings_map_to_backend_levels() {
        assert_eq!(parse_level("INFO").unwrap(), "info");
        assert_eq!(parse_level(" warning ").unwrap(), "warn");
        assert!(matches!(
            parse_level("verbose"),
            Err(LoggingError::UnsupportedLevel(level)) if level == "verbose"
        ));
    }

    #[test]
    fn log_dir_must_be_absolute_and_present() {
        assert!(matches!(
            parse_log_dir("logs/dev"),
            Err(LoggingError::InvalidLogDir(_))
        ));
        assert!(matches!(
            parse_log_dir("   "),
            Err(LoggingError::InvalidLogDir(_))
        ));
    }

    #[test]
    fn one_line_flattens_and_marks_truncation() {
        assert_eq!(one_line("a\nb\rc", 10), "a b c");
        assert_eq!(one_line("line1\nline2", 8), "line1 li...");
        assert_eq!(one_line("exact", 5), "exact");
    }

    #[test]
    fn second_init_accepts_same_config_and_refuses_changes() {
        let log_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();
        let log_dir_str = log_dir.path().to_str().unwrap().to_string();
        let other_dir_str = other_dir.path().to_str().unwrap().to_string();

        init_logging("info", &log_dir_str).unwrap();
        init_logging("INFO", &log_dir_str).unwrap();

        let level_err = init_logging("debug", &log_dir_str).unwrap_err();
        assert!(matches!(level_err, LoggingError::AlreadyInitialized { .. }));
        let dir_err = init_logging("info", &other_dir_str).unwrap_err();
        assert!(dir_err.to_string().contains("restart to reconfigure"));

        let (level, dir) = logging_status().unwrap();
        assert_eq!(level, "info");
        assert_eq!(dir, log_dir.path());
    }
}
