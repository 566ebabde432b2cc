use std::io::Read;

use log::{debug, info, warn, Level};
use logging_timer::timer;
use rusqlite::{params, Connection};

use super::manufacturers::ManufacturerCache;
use super::source::{CsvRow, CsvSource};
use super::{classify_insert_error, classify_record, ImportSummary, RowOutcome, SkipReason};
use crate::error::PillTrackError;
use crate::progress::ProgressReporter;
use crate::slug::{slugify, SlugRegistry};

/// Slug base for rows whose name and slug column normalize to nothing.
const FALLBACK_SLUG: &str = "medicine";

const INSERT_SQL: &str = "INSERT INTO medicines (
        brand_id, brand_name, type, slug, dosage_form,
        generic_name, strength, manufacturer_id,
        unit_quantity, container_type, unit_price,
        pack_quantity, pack_price,
        is_active, view_count
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, TRUE, 0)";

/// One catalog row, normalized. Text fields are trimmed and `None` when blank;
/// numeric fields are `None` when absent or unparseable.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicineRecord {
    pub brand_id: Option<i64>,
    pub brand_name: String,
    pub med_type: Option<String>,
    pub slug: String,
    pub dosage_form: Option<String>,
    pub generic_name: Option<String>,
    pub strength: Option<String>,
    pub manufacturer: Option<String>,
    pub unit_quantity: Option<String>,
    pub container_type: Option<String>,
    pub unit_price: Option<f64>,
    pub pack_quantity: Option<f64>,
    pub pack_price: Option<f64>,
}

impl MedicineRecord {
    pub fn from_row(row: &CsvRow) -> Result<Self, SkipReason> {
        let brand_name = row
            .field("brand name")
            .ok_or(SkipReason::MissingField("brand name"))?
            .to_owned();

        let slug = row
            .field("slug")
            .and_then(slugify)
            .or_else(|| slugify(&brand_name))
            .unwrap_or_else(|| FALLBACK_SLUG.to_owned());

        let text = |name: &str| row.field(name).map(str::to_owned);

        Ok(MedicineRecord {
            brand_id: row.int_field("brand id"),
            med_type: text("type"),
            slug,
            dosage_form: text("dosage form"),
            generic_name: text("generic"),
            strength: text("strength"),
            manufacturer: text("manufacturer"),
            unit_quantity: text("unit_quantity"),
            container_type: text("container_type"),
            unit_price: row.decimal_field("unit_price"),
            pack_quantity: row.decimal_field("pack_quantity"),
            pack_price: row.decimal_field("pack_price"),
            brand_name,
        })
    }
}

/// Loads `medicine.csv` rows into `medicines`, resolving manufacturers and
/// keeping slugs unique across the run. Holds all per-run state; create one
/// per import.
pub struct MedicineImporter<'a> {
    conn: &'a Connection,
    reporter: &'a dyn ProgressReporter,
    progress_interval: usize,
    manufacturers: ManufacturerCache,
    slugs: SlugRegistry,
    summary: ImportSummary,
}

impl<'a> MedicineImporter<'a> {
    pub fn new(
        conn: &'a Connection,
        reporter: &'a dyn ProgressReporter,
        progress_interval: usize,
    ) -> Self {
        MedicineImporter {
            conn,
            reporter,
            progress_interval: progress_interval.max(1),
            manufacturers: ManufacturerCache::new(),
            slugs: SlugRegistry::new(),
            summary: ImportSummary::default(),
        }
    }

    /// Streams every row of `source` through the importer. Row problems are
    /// counted as skips; store and I/O failures end the import with an error
    /// and leave the rollback to the caller.
    pub fn import<R: Read>(
        mut self,
        source: &mut CsvSource<R>,
    ) -> Result<ImportSummary, PillTrackError> {
        let _tmr = timer!(Level::Trace; "MedicineImporter::import");

        if !source.has_column("brand name") {
            warn!("Medicine CSV has no 'brand name' column; every row will be skipped");
        }

        for record in source.rows() {
            let outcome = match classify_record(record)? {
                Ok(row) => {
                    let outcome = self.import_row(&row)?;
                    if let RowOutcome::Skipped(reason) = &outcome {
                        debug!("Skipped medicine at line {:?}: {}", row.line(), reason);
                    }
                    outcome
                }
                Err(reason) => RowOutcome::Skipped(reason),
            };
            self.summary.record(outcome);
        }

        info!(
            "Medicine import finished: {}; {} slugs, {} manufacturers resolved, {} created",
            self.summary,
            self.slugs.len(),
            self.manufacturers.len(),
            self.manufacturers.created()
        );
        Ok(self.summary)
    }

    pub fn import_row(&mut self, row: &CsvRow) -> Result<RowOutcome, PillTrackError> {
        let record = match MedicineRecord::from_row(row) {
            Ok(record) => record,
            Err(reason) => return Ok(RowOutcome::Skipped(reason)),
        };

        let slug = self
            .slugs
            .claim(&record.slug, record.brand_id, self.summary.imported);
        let manufacturer_id = self
            .manufacturers
            .resolve(self.conn, record.manufacturer.as_deref())?;

        let inserted = self.conn.execute(
            INSERT_SQL,
            params![
                record.brand_id,
                record.brand_name,
                record.med_type,
                slug,
                record.dosage_form,
                record.generic_name,
                record.strength,
                manufacturer_id,
                record.unit_quantity,
                record.container_type,
                record.unit_price,
                record.pack_quantity,
                record.pack_price,
            ],
        );

        match inserted {
            Ok(_) => {
                let imported = self.summary.imported + 1;
                if imported % self.progress_interval == 0 {
                    self.reporter
                        .progress(&format!("Imported {} medicines...", imported));
                }
                Ok(RowOutcome::Imported)
            }
            Err(err) => classify_insert_error(err, &format!("medicine '{}'", record.brand_name)),
        }
    }
}
