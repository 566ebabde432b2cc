use crate::reconciler::ColumnSpec;

use super::ColumnMigration;

/// Column Migration: medication reminders
///
/// Adds per-medication reminder lead time and dose size to `medications`.
/// Rows created before either column existed, or written as NULL by older
/// clients, are backfilled with the column default:
///   - `reminder_minutes_before` → 0 (remind at the scheduled time)
///   - `quantity_per_dose` → 1
pub const MEDICATION_REMINDERS: ColumnMigration = ColumnMigration {
    name: "medication-reminders",
    table: "medications",
    columns: &[
        ColumnSpec::with_backfill("reminder_minutes_before", "INTEGER DEFAULT 0", "0"),
        ColumnSpec::with_backfill("quantity_per_dose", "INTEGER DEFAULT 1", "1"),
    ],
};
