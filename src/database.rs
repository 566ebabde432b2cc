use std::path::Path;

use log::{error, info};
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};

use crate::error::PillTrackError;

/// The single store connection a run works through.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self, PillTrackError> {
        if let Some(folder) = db_path.parent() {
            if !folder.as_os_str().is_empty() && !folder.is_dir() {
                return Err(PillTrackError::Error(format!(
                    "Database folder '{}' does not exist or is not a directory",
                    folder.display()
                )));
            }
        }

        let conn = Connection::open(db_path)?;
        info!("Database opened at: {}", db_path.display());
        Self::with_connection(conn)
    }

    /// Opens a database that must already exist. Unlike `open`, a missing
    /// file is an error and nothing is created on disk.
    pub fn open_existing(db_path: &Path) -> Result<Self, PillTrackError> {
        if !db_path.is_file() {
            return Err(PillTrackError::Error(format!(
                "Database '{}' does not exist; run setup first",
                db_path.display()
            )));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(db_path, flags)?;
        info!("Database opened at: {}", db_path.display());
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, PillTrackError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, PillTrackError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` inside an immediate transaction. Commits when `f` succeeds,
    /// rolls back and returns the original error when it fails.
    pub fn in_transaction<T, F>(&mut self, f: F) -> Result<T, PillTrackError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, PillTrackError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                error!("Rolling back transaction: {}", err);
                if let Err(rollback_err) = tx.rollback() {
                    error!("Rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    pub fn count_rows(&self, table: &str) -> Result<i64, PillTrackError> {
        let count = self
            .conn
            .query_row(&format!("SELECT count(*) FROM \"{}\"", table), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// Closes the connection, surfacing any error SQLite reports while doing so.
    pub fn close(self) -> Result<(), PillTrackError> {
        self.conn.close().map_err(|(_, err)| err)?;
        Ok(())
    }
}
