mod base;
mod medication_reminders;
mod user_health;

use log::info;
use rusqlite::Connection;

use crate::config::SeedConfig;
use crate::error::PillTrackError;
use crate::reconciler::{ColumnSpec, ReconcileReport, Reconciler};

pub use base::{CREATE_SCHEMA_SQL, DROP_SCHEMA_SQL, SCHEMA_TABLES};
use base::{SEED_ADMIN_SQL, SEED_CATEGORIES_SQL, SEED_ROLES_SQL};
pub use medication_reminders::MEDICATION_REMINDERS;
pub use user_health::USER_HEALTH;

/// Column-level migration descriptor: one table and the columns it must carry.
///
/// Unlike a versioned upgrade, a column migration carries no version check;
/// it inspects the live table and applies only what is missing, so it can be
/// re-run against any prior state.
pub struct ColumnMigration {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl ColumnMigration {
    pub fn apply(&self, conn: &Connection) -> Result<ReconcileReport, PillTrackError> {
        info!("Applying column migration '{}' to {}", self.name, self.table);
        Reconciler::reconcile(conn, self.table, self.columns)
    }
}

/// Rows inserted by a seed pass. All zero when the database was already seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub roles: usize,
    pub categories: usize,
    pub admin: usize,
}

pub struct Schema;

impl Schema {
    /// Creates every table and index that doesn't exist yet. With `reset`, all
    /// tables are dropped first, discarding their data.
    pub fn create(conn: &Connection, reset: bool) -> Result<(), PillTrackError> {
        if reset {
            info!("Dropping all PillTrack tables");
            conn.execute_batch(DROP_SCHEMA_SQL)?;
        }

        conn.execute_batch(CREATE_SCHEMA_SQL)?;
        info!("Schema created ({} tables)", SCHEMA_TABLES.len());
        Ok(())
    }

    pub fn seed(conn: &Connection, seed: &SeedConfig) -> Result<SeedReport, PillTrackError> {
        let report = SeedReport {
            roles: conn.execute(SEED_ROLES_SQL, [])?,
            categories: conn.execute(SEED_CATEGORIES_SQL, [])?,
            admin: conn.execute(
                SEED_ADMIN_SQL,
                [&seed.admin_name, &seed.admin_email, &seed.admin_password_hash],
            )?,
        };

        info!(
            "Seeded {} roles, {} categories, {} admin users",
            report.roles, report.categories, report.admin
        );
        Ok(report)
    }

    /// Tables from the base schema that are missing in the live database.
    pub fn missing_tables(conn: &Connection) -> Result<Vec<&'static str>, PillTrackError> {
        let mut stmt =
            conn.prepare("SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;

        let mut missing = Vec::new();
        for table in SCHEMA_TABLES {
            let count: i64 = stmt.query_row([table], |row| row.get(0))?;
            if count == 0 {
                missing.push(table);
            }
        }
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::ColumnSet;
    use pretty_assertions::assert_eq;

    fn seed_config() -> SeedConfig {
        SeedConfig {
            admin_name: "Admin User".to_string(),
            admin_email: "admin@pilltrack.com".to_string(),
            admin_password_hash: "$2a$10$testhash".to_string(),
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT count(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_create_schema_builds_every_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(Schema::missing_tables(&conn).unwrap().len(), SCHEMA_TABLES.len());

        Schema::create(&conn, false).unwrap();
        assert!(Schema::missing_tables(&conn).unwrap().is_empty());

        // Re-running is harmless
        Schema::create(&conn, false).unwrap();
    }

    #[test]
    fn test_seed_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        Schema::create(&conn, false).unwrap();

        let first = Schema::seed(&conn, &seed_config()).unwrap();
        assert_eq!(
            first,
            SeedReport {
                roles: 3,
                categories: 5,
                admin: 1
            }
        );

        let second = Schema::seed(&conn, &seed_config()).unwrap();
        assert_eq!(second, SeedReport::default());

        assert_eq!(count(&conn, "roles"), 3);
        assert_eq!(count(&conn, "medicine_categories"), 5);
        assert_eq!(count(&conn, "users"), 1);

        let role: String = conn
            .query_row(
                "SELECT r.name FROM users u JOIN roles r ON r.id = u.role_id WHERE u.email = ?1",
                ["admin@pilltrack.com"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(role, "ADMIN");
    }

    #[test]
    fn test_reset_discards_data() {
        let conn = Connection::open_in_memory().unwrap();
        Schema::create(&conn, false).unwrap();
        Schema::seed(&conn, &seed_config()).unwrap();
        conn.execute(
            "INSERT INTO medicine_manufacturers (name, slug) VALUES ('Beximco', 'beximco')",
            [],
        )
        .unwrap();

        Schema::create(&conn, true).unwrap();

        assert_eq!(count(&conn, "medicine_manufacturers"), 0);
        assert_eq!(count(&conn, "roles"), 0);
    }

    #[test]
    fn test_reset_clears_migrated_columns() {
        let conn = Connection::open_in_memory().unwrap();
        Schema::create(&conn, false).unwrap();
        USER_HEALTH.apply(&conn).unwrap();
        assert!(ColumnSet::load(&conn, "users").unwrap().contains("blood_type"));

        Schema::create(&conn, true).unwrap();
        assert!(!ColumnSet::load(&conn, "users").unwrap().contains("blood_type"));
    }

    #[test]
    fn test_medication_reminders_migration() {
        let conn = Connection::open_in_memory().unwrap();
        Schema::create(&conn, false).unwrap();

        let first = MEDICATION_REMINDERS.apply(&conn).unwrap();
        assert_eq!(first.added, vec!["reminder_minutes_before", "quantity_per_dose"]);

        let second = MEDICATION_REMINDERS.apply(&conn).unwrap();
        assert!(second.added.is_empty());
        assert!(second.is_noop());
    }

    #[test]
    fn test_user_health_migration() {
        let conn = Connection::open_in_memory().unwrap();
        Schema::create(&conn, false).unwrap();

        let first = USER_HEALTH.apply(&conn).unwrap();
        assert_eq!(first.added.len(), 4);

        let second = USER_HEALTH.apply(&conn).unwrap();
        assert!(second.added.is_empty());
        assert_eq!(
            second.unchanged,
            vec!["date_of_birth", "blood_type", "allergies", "emergency_contact"]
        );
    }
}
