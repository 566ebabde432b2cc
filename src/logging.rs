use std::path::Path;

use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};

use crate::config::LoggingConfig;
use crate::error::PillTrackError;

const LOG_BASENAME: &str = "pilltrack-db";
const LOG_ROTATE_BYTES: u64 = 10 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 5;

/// Builds the log specification: our own crate at the configured level,
/// dependencies at `warn`.
pub fn log_spec(config: &LoggingConfig) -> String {
    format!("warn, pilltrack_db={}", config.pilltrack)
}

/// Starts the logger. `RUST_LOG` takes precedence over the configured level.
///
/// With a log directory, records go to rotating files there and warnings are
/// duplicated to stderr; without one everything goes to stderr.
/// The returned handle must be kept alive for the lifetime of the process.
pub fn init_logging(
    config: &LoggingConfig,
    log_dir: Option<&Path>,
) -> Result<LoggerHandle, PillTrackError> {
    let logger = Logger::try_with_env_or_str(log_spec(config))?;

    let logger = match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir).basename(LOG_BASENAME))
            .rotate(
                Criterion::Size(LOG_ROTATE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(LOG_FILES_KEPT),
            )
            .duplicate_to_stderr(Duplicate::Warn)
            .format_for_files(flexi_logger::detailed_format),
        None => logger.log_to_stderr(),
    };

    Ok(logger.start()?)
}
