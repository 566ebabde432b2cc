use std::io::Read;

use log::{debug, info, warn, Level};
use logging_timer::timer;
use rusqlite::{params, Connection};

use super::source::{CsvRow, CsvSource};
use super::{classify_insert_error, classify_record, ImportSummary, RowOutcome, SkipReason};
use crate::error::PillTrackError;
use crate::progress::ProgressReporter;

const INSERT_SQL: &str = "INSERT INTO indications (indication_id, indication_name, slug, generics_count)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(indication_id) DO NOTHING";

/// Loads `indication.csv` rows into `indications`. Rows whose `indication id`
/// is already stored are left alone and counted as skipped.
pub struct IndicationImporter<'a> {
    conn: &'a Connection,
    reporter: &'a dyn ProgressReporter,
    progress_interval: usize,
    summary: ImportSummary,
}

impl<'a> IndicationImporter<'a> {
    pub fn new(
        conn: &'a Connection,
        reporter: &'a dyn ProgressReporter,
        progress_interval: usize,
    ) -> Self {
        IndicationImporter {
            conn,
            reporter,
            progress_interval: progress_interval.max(1),
            summary: ImportSummary::default(),
        }
    }

    pub fn import<R: Read>(
        mut self,
        source: &mut CsvSource<R>,
    ) -> Result<ImportSummary, PillTrackError> {
        let _tmr = timer!(Level::Trace; "IndicationImporter::import");

        if !source.has_column("indication name") {
            warn!("Indication CSV has no 'indication name' column; every row will be skipped");
        }

        for record in source.rows() {
            let outcome = match classify_record(record)? {
                Ok(row) => {
                    let outcome = self.import_row(&row)?;
                    if let RowOutcome::Skipped(reason) = &outcome {
                        debug!("Skipped indication at line {:?}: {}", row.line(), reason);
                    }
                    outcome
                }
                Err(reason) => RowOutcome::Skipped(reason),
            };
            self.summary.record(outcome);
        }

        info!("Indication import finished: {}", self.summary);
        Ok(self.summary)
    }

    pub fn import_row(&mut self, row: &CsvRow) -> Result<RowOutcome, PillTrackError> {
        let name = match row.field("indication name") {
            Some(name) => name,
            None => return Ok(RowOutcome::Skipped(SkipReason::MissingField("indication name"))),
        };

        let inserted = self.conn.execute(
            INSERT_SQL,
            params![
                row.int_field("indication id"),
                name,
                row.field("slug"),
                row.count_field("generics count", 0),
            ],
        );

        match inserted {
            Ok(0) => Ok(RowOutcome::Skipped(SkipReason::AlreadyPresent)),
            Ok(_) => {
                let imported = self.summary.imported + 1;
                if imported % self.progress_interval == 0 {
                    self.reporter
                        .progress(&format!("Imported {} indications...", imported));
                }
                Ok(RowOutcome::Imported)
            }
            Err(err) => classify_insert_error(err, &format!("indication '{}'", name)),
        }
    }
}
