use std::collections::HashMap;

use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PillTrackError;
use crate::slug::slugify;

const SELECT_SQL: &str = "SELECT id FROM medicine_manufacturers WHERE name = ?1";

const INSERT_SQL: &str = "INSERT INTO medicine_manufacturers (name, slug, is_active)
    VALUES (?1, ?2, TRUE)
    ON CONFLICT(name) DO NOTHING
    RETURNING id";

/// Write-through cache of manufacturer name → id for one import run.
///
/// Lookups go cache → store → insert, so each distinct name costs at most one
/// SELECT and one INSERT per run no matter how many rows mention it.
#[derive(Debug, Default)]
pub struct ManufacturerCache {
    ids: HashMap<String, i64>,
    created: usize,
}

impl ManufacturerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for the manufacturer called `name`, creating it when the store has
    /// no such row. Blank names resolve to `None`.
    pub fn resolve(
        &mut self,
        conn: &Connection,
        name: Option<&str>,
    ) -> Result<Option<i64>, PillTrackError> {
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => return Ok(None),
        };

        if let Some(&id) = self.ids.get(name) {
            return Ok(Some(id));
        }

        let id = match conn
            .query_row(SELECT_SQL, [name], |row| row.get::<_, i64>(0))
            .optional()?
        {
            Some(id) => id,
            None => self.create(conn, name)?,
        };

        self.ids.insert(name.to_owned(), id);
        Ok(Some(id))
    }

    fn create(&mut self, conn: &Connection, name: &str) -> Result<i64, PillTrackError> {
        let inserted: Option<i64> = conn
            .query_row(INSERT_SQL, params![name, slugify(name)], |row| row.get(0))
            .optional()?;

        match inserted {
            Some(id) => {
                self.created += 1;
                debug!("Created manufacturer '{}' (id {})", name, id);
                Ok(id)
            }
            // Another writer got there between our SELECT and INSERT
            None => Ok(conn.query_row(SELECT_SQL, [name], |row| row.get(0))?),
        }
    }

    /// Manufacturers this run inserted.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Distinct names resolved so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn catalog_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        Schema::create(&conn, false).unwrap();
        conn
    }

    fn manufacturer_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT count(*) FROM medicine_manufacturers", [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_blank_names_resolve_to_none() {
        let conn = catalog_db();
        let mut cache = ManufacturerCache::new();

        assert_eq!(cache.resolve(&conn, None).unwrap(), None);
        assert_eq!(cache.resolve(&conn, Some("   ")).unwrap(), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(manufacturer_count(&conn), 0);
    }

    #[test]
    fn test_one_row_per_distinct_name() {
        let conn = catalog_db();
        let mut cache = ManufacturerCache::new();

        let mut ids = Vec::new();
        for _ in 0..10_000 {
            ids.push(
                cache
                    .resolve(&conn, Some("Square Pharmaceuticals"))
                    .unwrap()
                    .unwrap(),
            );
        }

        assert_eq!(manufacturer_count(&conn), 1);
        assert_eq!(cache.created(), 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
    }

    #[test]
    fn test_names_are_trimmed() {
        let conn = catalog_db();
        let mut cache = ManufacturerCache::new();

        let a = cache.resolve(&conn, Some("Beximco")).unwrap();
        let b = cache.resolve(&conn, Some("  Beximco ")).unwrap();
        assert_eq!(a, b);
        assert_eq!(manufacturer_count(&conn), 1);
    }

    #[test]
    fn test_existing_rows_are_reused() {
        let conn = catalog_db();
        conn.execute(
            "INSERT INTO medicine_manufacturers (name, slug) VALUES ('Incepta', 'incepta')",
            [],
        )
        .unwrap();
        let existing: i64 = conn.last_insert_rowid();

        let mut cache = ManufacturerCache::new();
        assert_eq!(cache.resolve(&conn, Some("Incepta")).unwrap(), Some(existing));
        assert_eq!(cache.created(), 0);
        assert_eq!(manufacturer_count(&conn), 1);
    }

    #[test]
    fn test_created_rows_carry_slug_and_active_flag() {
        let conn = catalog_db();
        let mut cache = ManufacturerCache::new();
        let id = cache
            .resolve(&conn, Some("Square Pharmaceuticals Ltd."))
            .unwrap()
            .unwrap();

        let (slug, active): (String, bool) = conn
            .query_row(
                "SELECT slug, is_active FROM medicine_manufacturers WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(slug, "square-pharmaceuticals-ltd");
        assert!(active);
    }

    #[test]
    fn test_concurrent_insert_is_tolerated() {
        let conn = catalog_db();
        let mut cache = ManufacturerCache::new();

        // Row appears after the cache decided to create it
        conn.execute(
            "INSERT INTO medicine_manufacturers (name, slug) VALUES ('Renata', 'renata')",
            [],
        )
        .unwrap();
        let theirs = conn.last_insert_rowid();

        assert_eq!(cache.create(&conn, "Renata").unwrap(), theirs);
        assert_eq!(cache.created(), 0);
        assert_eq!(manufacturer_count(&conn), 1);
    }
}
