mod indications;
mod manufacturers;
mod medicines;
mod source;

use std::collections::BTreeMap;
use std::fmt;

use log::warn;

use crate::error::{is_row_level_db_error, PillTrackError};

pub use indications::IndicationImporter;
pub use medicines::MedicineImporter;
pub use source::CsvSource;
use source::CsvRow;

/// Why a row was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkipReason {
    /// A mandatory column was absent or blank
    MissingField(&'static str),
    /// The CSV record itself could not be read
    MalformedRow,
    /// The store refused the row (constraint violation, oversized value, ...)
    Rejected,
    /// The natural key is already in the store
    AlreadyPresent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField(field) => write!(f, "missing {}", field),
            SkipReason::MalformedRow => f.write_str("malformed row"),
            SkipReason::Rejected => f.write_str("rejected by store"),
            SkipReason::AlreadyPresent => f.write_str("already present"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Imported,
    Skipped(SkipReason),
}

/// Totals for one catalog import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub reasons: BTreeMap<SkipReason, usize>,
}

impl ImportSummary {
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Imported => self.imported += 1,
            RowOutcome::Skipped(reason) => {
                self.skipped += 1;
                *self.reasons.entry(reason).or_insert(0) += 1;
            }
        }
    }

    #[cfg(test)]
    pub fn skipped_for(&self, reason: &SkipReason) -> usize {
        self.reasons.get(reason).copied().unwrap_or(0)
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} imported, {} skipped", self.imported, self.skipped)?;
        if !self.reasons.is_empty() {
            let detail: Vec<String> = self
                .reasons
                .iter()
                .map(|(reason, n)| format!("{}: {}", reason, n))
                .collect();
            write!(f, " ({})", detail.join(", "))?;
        }
        Ok(())
    }
}

/// Splits a CSV read result into a row to process, a skipped row, or a fatal
/// error. I/O failures end the import; anything else wrong with a single
/// record only costs that record.
pub(crate) fn classify_record(
    record: Result<CsvRow, csv::Error>,
) -> Result<Result<CsvRow, SkipReason>, PillTrackError> {
    match record {
        Ok(row) => Ok(Ok(row)),
        Err(err) if err.is_io_error() => Err(err.into()),
        Err(err) => {
            warn!("Skipping malformed CSV record: {}", err);
            Ok(Err(SkipReason::MalformedRow))
        }
    }
}

/// Maps a failed insert to a row skip when the failure is confined to that
/// row. Anything else is fatal for the import.
pub(crate) fn classify_insert_error(
    err: rusqlite::Error,
    what: &str,
) -> Result<RowOutcome, PillTrackError> {
    if is_row_level_db_error(&err) {
        warn!("Skipping {}: {}", what, err);
        Ok(RowOutcome::Skipped(SkipReason::Rejected))
    } else {
        Err(err.into())
    }
}
