use std::collections::BTreeSet;

use log::{debug, info};
use rusqlite::Connection;

use crate::error::PillTrackError;

/// A column a table must carry: its declared definition, and optionally an SQL
/// expression used to fill rows where the column is still NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub definition: &'static str,
    pub backfill: Option<&'static str>,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, definition: &'static str) -> Self {
        Self {
            name,
            definition,
            backfill: None,
        }
    }

    pub const fn with_backfill(
        name: &'static str,
        definition: &'static str,
        backfill: &'static str,
    ) -> Self {
        Self {
            name,
            definition,
            backfill: Some(backfill),
        }
    }
}

/// Column names currently present on a table. Names are ASCII lower-cased,
/// matching SQLite's case-insensitive column lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnSet(BTreeSet<String>);

impl ColumnSet {
    /// Introspects `table`. A table that does not exist yields an empty set.
    pub fn load(conn: &Connection, table: &str) -> Result<Self, PillTrackError> {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        let names = stmt
            .query_map([table], |row| {
                row.get::<_, String>(0).map(|name| name.to_ascii_lowercase())
            })?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ColumnSet(names))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(&column.to_ascii_lowercase())
    }

    fn insert(&mut self, column: &str) {
        self.0.insert(column.to_ascii_lowercase());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// What a reconcile pass changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub table: String,
    pub added: Vec<String>,
    pub backfilled: Vec<(String, usize)>,
    pub unchanged: Vec<String>,
}

impl ReconcileReport {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_owned(),
            ..Default::default()
        }
    }

    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.backfilled.iter().all(|(_, rows)| *rows == 0)
    }
}

pub struct Reconciler;

impl Reconciler {
    /// Brings `table` to carry every column in `columns`.
    ///
    /// Missing columns are added with their declared definition. Present columns
    /// with a backfill get it applied to NULL rows only. Runs on the caller's
    /// connection or transaction and does not commit; any failure is returned
    /// as-is and the caller is expected to roll back.
    pub fn reconcile(
        conn: &Connection,
        table: &str,
        columns: &[ColumnSpec],
    ) -> Result<ReconcileReport, PillTrackError> {
        ensure_identifier(table)?;
        for spec in columns {
            ensure_identifier(spec.name)?;
        }

        let mut existing = ColumnSet::load(conn, table)?;
        if existing.is_empty() {
            return Err(PillTrackError::Error(format!(
                "Table '{}' does not exist",
                table
            )));
        }
        debug!("{} has {} columns: {:?}", table, existing.len(), existing);

        let mut report = ReconcileReport::new(table);

        for spec in columns {
            if !existing.contains(spec.name) {
                conn.execute(
                    &format!(
                        "ALTER TABLE \"{}\" ADD COLUMN \"{}\" {}",
                        table, spec.name, spec.definition
                    ),
                    [],
                )?;
                existing.insert(spec.name);
                info!("Added {}.{} ({})", table, spec.name, spec.definition);
                report.added.push(spec.name.to_owned());
                continue;
            }

            match spec.backfill {
                Some(expr) => {
                    let rows = conn.execute(
                        &format!(
                            "UPDATE \"{table}\" SET \"{col}\" = {expr} WHERE \"{col}\" IS NULL",
                            table = table,
                            col = spec.name,
                            expr = expr
                        ),
                        [],
                    )?;
                    info!("Backfilled {}.{}: {} rows", table, spec.name, rows);
                    report.backfilled.push((spec.name.to_owned(), rows));
                }
                None => {
                    debug!("{}.{} already exists", table, spec.name);
                    report.unchanged.push(spec.name.to_owned());
                }
            }
        }

        Ok(report)
    }
}

/// DDL can't be parameterized, so table and column names are restricted to
/// plain identifiers before being quoted into statements.
fn ensure_identifier(name: &str) -> Result<(), PillTrackError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(PillTrackError::Error(format!(
            "'{}' is not a valid SQL identifier",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const COLUMNS: [ColumnSpec; 2] = [
        ColumnSpec::with_backfill("reminder_minutes_before", "INTEGER DEFAULT 0", "0"),
        ColumnSpec::new("notes", "TEXT"),
    ];

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE meds (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             INSERT INTO meds (name) VALUES ('Napa'), ('Seclo');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_adds_missing_columns() {
        let conn = setup();
        let report = Reconciler::reconcile(&conn, "meds", &COLUMNS).unwrap();

        assert_eq!(report.added, vec!["reminder_minutes_before", "notes"]);
        assert!(report.backfilled.is_empty());

        let columns = ColumnSet::load(&conn, "meds").unwrap();
        assert!(columns.contains("reminder_minutes_before"));
        assert!(columns.contains("notes"));

        // Existing rows pick up the declared default
        let value: i64 = conn
            .query_row(
                "SELECT reminder_minutes_before FROM meds WHERE name = 'Napa'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(value, 0);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let conn = setup();
        Reconciler::reconcile(&conn, "meds", &COLUMNS).unwrap();
        let after_first = ColumnSet::load(&conn, "meds").unwrap();

        let report = Reconciler::reconcile(&conn, "meds", &COLUMNS).unwrap();
        let after_second = ColumnSet::load(&conn, "meds").unwrap();

        assert!(report.added.is_empty());
        assert_eq!(report.backfilled, vec![("reminder_minutes_before".to_string(), 0)]);
        assert_eq!(report.unchanged, vec!["notes"]);
        assert!(report.is_noop());
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_backfill_preserves_non_null_values() {
        let conn = setup();
        Reconciler::reconcile(&conn, "meds", &COLUMNS).unwrap();

        conn.execute(
            "UPDATE meds SET reminder_minutes_before = 15 WHERE name = 'Napa'",
            [],
        )
        .unwrap();
        conn.execute(
            "UPDATE meds SET reminder_minutes_before = NULL WHERE name = 'Seclo'",
            [],
        )
        .unwrap();

        let report = Reconciler::reconcile(&conn, "meds", &COLUMNS).unwrap();
        assert_eq!(report.backfilled, vec![("reminder_minutes_before".to_string(), 1)]);
        assert!(!report.is_noop());

        let values: Vec<(String, i64)> = conn
            .prepare("SELECT name, reminder_minutes_before FROM meds ORDER BY id")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            values,
            vec![("Napa".to_string(), 15), ("Seclo".to_string(), 0)]
        );
    }

    #[test]
    fn test_column_names_match_case_insensitively() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, Blood_Type VARCHAR(5));
             INSERT INTO people (Blood_Type) VALUES ('A-'), (NULL);",
        )
        .unwrap();

        let columns = [ColumnSpec::with_backfill("blood_type", "VARCHAR(5)", "'O+'")];
        let report = Reconciler::reconcile(&conn, "people", &columns).unwrap();

        assert!(report.added.is_empty());
        assert_eq!(report.backfilled, vec![("blood_type".to_string(), 1)]);

        let values: Vec<String> = conn
            .prepare("SELECT blood_type FROM people ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values, vec!["A-", "O+"]);
    }

    #[test]
    fn test_reserved_word_identifiers() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE \"order\" (id INTEGER PRIMARY KEY);
             INSERT INTO \"order\" (id) VALUES (1);",
        )
        .unwrap();

        let columns = [ColumnSpec::with_backfill("group", "INTEGER", "7")];
        let report = Reconciler::reconcile(&conn, "order", &columns).unwrap();
        assert_eq!(report.added, vec!["group"]);

        let report = Reconciler::reconcile(&conn, "order", &columns).unwrap();
        assert_eq!(report.backfilled, vec![("group".to_string(), 1)]);

        let value: i64 = conn
            .query_row("SELECT \"group\" FROM \"order\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_repeated_column_is_added_once() {
        let conn = setup();
        let columns = [
            ColumnSpec::new("notes", "TEXT"),
            ColumnSpec::with_backfill("Notes", "TEXT", "''"),
        ];

        let report = Reconciler::reconcile(&conn, "meds", &columns).unwrap();
        assert_eq!(report.added, vec!["notes"]);
        assert_eq!(report.backfilled, vec![("Notes".to_string(), 2)]);
        assert_eq!(ColumnSet::load(&conn, "meds").unwrap().len(), 3);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let conn = setup();
        assert!(Reconciler::reconcile(&conn, "no_such_table", &COLUMNS).is_err());
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let conn = setup();
        assert!(Reconciler::reconcile(&conn, "meds; DROP TABLE meds", &COLUMNS).is_err());

        let bad = [ColumnSpec::new("bad name", "TEXT")];
        assert!(Reconciler::reconcile(&conn, "meds", &bad).is_err());

        // Nothing was applied
        assert_eq!(ColumnSet::load(&conn, "meds").unwrap().len(), 2);
    }

    #[test]
    fn test_failed_statement_rolls_back_with_transaction() {
        let mut conn = setup();
        let broken = [
            ColumnSpec::new("added_first", "TEXT"),
            ColumnSpec::new("broken", "INTEGER NOT NULL"),
        ];

        let tx = conn.transaction().unwrap();
        // NOT NULL without a default can't be added to a populated table
        assert!(Reconciler::reconcile(&tx, "meds", &broken).is_err());
        tx.rollback().unwrap();

        let columns = ColumnSet::load(&conn, "meds").unwrap();
        assert!(!columns.contains("added_first"));
    }
}
