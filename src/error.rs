use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PillTrackError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] Box<figment::Error>),

    #[error("Logger error: {0}")]
    LoggerError(#[from] flexi_logger::FlexiLoggerError),

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}

/// True for store failures that only concern the statement being executed
/// (a rejected value or constraint), as opposed to failures of the connection
/// or the database file itself.
pub fn is_row_level_db_error(err: &RusqliteError) -> bool {
    match err {
        RusqliteError::SqliteFailure(e, _) => matches!(
            e.code,
            rusqlite::ErrorCode::ConstraintViolation | rusqlite::ErrorCode::TooBig
        ),
        RusqliteError::ToSqlConversionFailure(_) => true,
        _ => false,
    }
}
