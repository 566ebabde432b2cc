use rusqlite::Connection;

use crate::database::Database;
use crate::error::PillTrackError;
use crate::users::UserHealth;

/// Row counts of the catalog tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogCounts {
    pub medicines: i64,
    pub manufacturers: i64,
    pub indications: i64,
    pub categories: i64,
}

impl CatalogCounts {
    pub fn load(db: &Database) -> Result<Self, PillTrackError> {
        Ok(CatalogCounts {
            medicines: db.count_rows("medicines")?,
            manufacturers: db.count_rows("medicine_manufacturers")?,
            indications: db.count_rows("indications")?,
            categories: db.count_rows("medicine_categories")?,
        })
    }

    pub fn print(&self) {
        println!("  Medicines:     {}", self.medicines);
        println!("  Manufacturers: {}", self.manufacturers);
        println!("  Indications:   {}", self.indications);
        println!("  Categories:    {}", self.categories);
    }
}

/// A column as declared on a live table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>, PillTrackError> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                declared_type: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

pub fn print_columns(table: &str, columns: &[ColumnInfo]) {
    println!("\nColumns of {}:", table);
    for column in columns {
        println!("  {}: {}", column.name, column.declared_type);
    }
}

/// Reminder settings of one medication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationSample {
    pub id: i64,
    pub name: String,
    pub reminder_minutes_before: Option<i64>,
    pub quantity_per_dose: Option<i64>,
}

pub fn sample_medications(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<MedicationSample>, PillTrackError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, reminder_minutes_before, quantity_per_dose
        FROM medications
        ORDER BY id ASC
        LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(MedicationSample {
                id: row.get(0)?,
                name: row.get(1)?,
                reminder_minutes_before: row.get(2)?,
                quantity_per_dose: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn or_none(value: &Option<impl std::fmt::Display>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

pub fn print_medication_samples(samples: &[MedicationSample]) {
    if samples.is_empty() {
        println!("\nNo medications stored yet");
        return;
    }

    println!("\nSample medications:");
    for m in samples {
        println!(
            "  ID: {}, Name: {}, ReminderMins: {}, QtyPerDose: {}",
            m.id,
            m.name,
            or_none(&m.reminder_minutes_before),
            or_none(&m.quantity_per_dose)
        );
    }
}

pub fn print_user(user: &UserHealth) {
    println!("ID: {}", user.id);
    println!("  Name: {}", user.name);
    println!("  Email: {}", user.email);
    println!("  Phone: {}", or_none(&user.phone));
    println!("  Address: {}", or_none(&user.address));
    println!("  DOB: {}", or_none(&user.date_of_birth));
    println!("  Blood Type: {}", or_none(&user.blood_type));
    println!("  Allergies: {}", or_none(&user.allergies));
    println!("  Emergency Contact: {}", or_none(&user.emergency_contact));
}
