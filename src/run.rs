use std::path::{Path, PathBuf};

use log::{error, info};
use strum::Display;

use crate::config::{Config, SeedConfig};
use crate::database::Database;
use crate::error::PillTrackError;
use crate::import::{CsvSource, ImportSummary, IndicationImporter, MedicineImporter};
use crate::progress::ProgressReporter;
use crate::reports::CatalogCounts;
use crate::schema::{Schema, SeedReport};

const TOTAL_STAGES: u32 = 5;

/// Where a setup run has got to. `Failed` is terminal for the run; the
/// database keeps whatever earlier stages committed.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Disconnected,
    Connected,
    SchemaConverged,
    Seeded,
    Imported,
    Verified,
    Closed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Drop every table before creating the schema
    pub reset: bool,
    /// Allow importing medicines into a table that already has rows
    pub append: bool,
    pub skip_indications: bool,
    pub skip_medicines: bool,
    pub indication_csv: PathBuf,
    pub medicine_csv: PathBuf,
    pub progress_interval: usize,
    pub seed: SeedConfig,
}

impl SetupOptions {
    pub fn from_config(config: &Config) -> Self {
        SetupOptions {
            reset: false,
            append: false,
            skip_indications: false,
            skip_medicines: false,
            indication_csv: PathBuf::from(&config.import.indication_csv),
            medicine_csv: PathBuf::from(&config.import.medicine_csv),
            progress_interval: config.import.progress_interval,
            seed: config.seed.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub seed: SeedReport,
    pub indications: Option<ImportSummary>,
    pub medicines: Option<ImportSummary>,
    pub counts: CatalogCounts,
}

/// Drives `setup`: schema and seed in one transaction, then each catalog in
/// its own transaction, then verification counts.
pub struct SetupRun<'a> {
    state: RunState,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> SetupRun<'a> {
    pub fn new(reporter: &'a dyn ProgressReporter) -> Self {
        SetupRun {
            state: RunState::Disconnected,
            reporter,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run(
        &mut self,
        db_path: &Path,
        options: &SetupOptions,
    ) -> Result<SetupReport, PillTrackError> {
        self.reporter
            .stage_start(1, TOTAL_STAGES, "Connecting to database...");
        let db = Database::open(db_path).inspect_err(|e| self.fail(e))?;
        self.run_with(db, options)
    }

    /// Runs every stage against an already open database. The connection is
    /// closed on success and failure alike.
    pub fn run_with(
        &mut self,
        mut db: Database,
        options: &SetupOptions,
    ) -> Result<SetupReport, PillTrackError> {
        self.transition(RunState::Connected);
        self.reporter.stage_finish("Connected");

        match self.stages(&mut db, options) {
            Ok(report) => {
                db.close()?;
                self.transition(RunState::Closed);
                Ok(report)
            }
            Err(err) => {
                self.fail(&err);
                if let Err(close_err) = db.close() {
                    error!("Error closing database after failure: {}", close_err);
                }
                Err(err)
            }
        }
    }

    fn stages(
        &mut self,
        db: &mut Database,
        options: &SetupOptions,
    ) -> Result<SetupReport, PillTrackError> {
        let reporter = self.reporter;

        reporter.stage_start(2, TOTAL_STAGES, "Creating tables and seed data...");
        let seed = db.in_transaction(|tx| {
            Schema::create(tx, options.reset)?;
            if !options.skip_medicines && !options.append {
                ensure_medicines_empty(tx)?;
            }
            Schema::seed(tx, &options.seed)
        })?;
        self.transition(RunState::SchemaConverged);
        reporter.stage_finish(&format!(
            "Schema ready; seeded {} roles, {} categories, {} admin users",
            seed.roles, seed.categories, seed.admin
        ));
        self.transition(RunState::Seeded);

        reporter.stage_start(3, TOTAL_STAGES, "Importing indications...");
        let indications = if options.skip_indications {
            reporter.stage_finish("Skipped");
            None
        } else {
            let mut source = CsvSource::open(&options.indication_csv)?;
            let summary = db.in_transaction(|tx| {
                IndicationImporter::new(tx, reporter, options.progress_interval)
                    .import(&mut source)
            })?;
            reporter.stage_finish(&format!("Indications: {}", summary));
            Some(summary)
        };

        reporter.stage_start(4, TOTAL_STAGES, "Importing medicines...");
        let medicines = if options.skip_medicines {
            reporter.stage_finish("Skipped");
            None
        } else {
            let mut source = CsvSource::open(&options.medicine_csv)?;
            let summary = db.in_transaction(|tx| {
                MedicineImporter::new(tx, reporter, options.progress_interval)
                    .import(&mut source)
            })?;
            reporter.stage_finish(&format!("Medicines: {}", summary));
            Some(summary)
        };
        self.transition(RunState::Imported);

        reporter.stage_start(5, TOTAL_STAGES, "Verifying...");
        let counts = CatalogCounts::load(db)?;
        reporter.stage_finish(&format!(
            "{} medicines, {} manufacturers, {} indications, {} categories",
            counts.medicines, counts.manufacturers, counts.indications, counts.categories
        ));
        self.transition(RunState::Verified);

        Ok(SetupReport {
            seed,
            indications,
            medicines,
            counts,
        })
    }

    fn transition(&mut self, next: RunState) {
        info!("Setup run: {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: &PillTrackError) {
        error!("Setup failed while {}: {}", self.state, err);
        self.transition(RunState::Failed);
    }
}

/// Re-importing into a populated `medicines` table duplicates every row.
fn ensure_medicines_empty(conn: &rusqlite::Connection) -> Result<(), PillTrackError> {
    let existing: i64 = conn.query_row("SELECT count(*) FROM medicines", [], |row| row.get(0))?;
    if existing > 0 {
        return Err(PillTrackError::Error(format!(
            "medicines already holds {} rows; importing again would duplicate them. \
             Use --reset to start over or --append to import anyway",
            existing
        )));
    }
    Ok(())
}
