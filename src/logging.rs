//! Operator logging
//!
//! Rolling file logs under `logs/` through the `log` facade. Initialization
//! happens at most once per process; a second call with the same directory
//! and level is a no-op.

use std::path::{Path, PathBuf};

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;

use crate::error::{LedgerError, LedgerResult};

const LOG_FILE_BASENAME: &str = "pocket";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Start file logging at `level` in `log_dir`
///
/// # Errors
/// - unknown level names
/// - a different directory or level than an earlier successful call
/// - the directory cannot be created or the backend fails to start
pub fn init_logging(level: &str, log_dir: &Path) -> LedgerResult<()> {
    let level = normalize_level(level)?;

    let state = LOGGING_STATE.get_or_try_init(|| -> LedgerResult<LoggingState> {
        std::fs::create_dir_all(log_dir).map_err(|e| {
            LedgerError::Io(format!(
                "Failed to create log directory {}: {}",
                log_dir.display(),
                e
            ))
        })?;

        let logger = Logger::try_with_str(level)
            .map_err(|e| LedgerError::Config(format!("Invalid log level {}: {}", level, e)))?
            .log_to_file(
                FileSpec::default()
                    .directory(log_dir)
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
            .start()
            .map_err(|e| LedgerError::Config(format!("Failed to start logger: {}", e)))?;

        info!(
            "event=startup version={} level={} log_dir={}",
            env!("CARGO_PKG_VERSION"),
            level,
            log_dir.display()
        );

        Ok(LoggingState {
            level,
            log_dir: log_dir.to_path_buf(),
            _logger: logger,
        })
    })?;

    if state.log_dir != log_dir {
        return Err(LedgerError::Config(format!(
            "Logging already initialized at {}",
            state.log_dir.display()
        )));
    }
    if state.level != level {
        return Err(LedgerError::Config(format!(
            "Logging already initialized with level {}",
            state.level
        )));
    }

    Ok(())
}

/// Active `(level, log_dir)`, `None` before initialization
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_dir.clone()))
}

fn normalize_level(level: &str) -> LedgerResult<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LedgerError::Config(format!(
            "Unsupported log level '{}'; expected trace|debug|info|warn|error",
            other
        ))),
    }
}
