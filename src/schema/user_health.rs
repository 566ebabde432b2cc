use crate::reconciler::ColumnSpec;

use super::ColumnMigration;

/// Column Migration: user health profile
///
/// Adds optional health fields to `users`. All are nullable with no backfill;
/// an unset value means the user hasn't provided it.
pub const USER_HEALTH: ColumnMigration = ColumnMigration {
    name: "user-health",
    table: "users",
    columns: &[
        ColumnSpec::new("date_of_birth", "DATE"),
        ColumnSpec::new("blood_type", "VARCHAR(5)"),
        ColumnSpec::new("allergies", "TEXT"),
        ColumnSpec::new("emergency_contact", "VARCHAR(200)"),
    ],
};
