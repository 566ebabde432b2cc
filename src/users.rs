use chrono::NaiveDate;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::error::PillTrackError;
use crate::reconciler::ColumnSet;
use crate::schema::USER_HEALTH;

const SELECT_COLUMNS: &str =
    "id, name, email, phone, address, date_of_birth, blood_type, allergies, emergency_contact";

/// A user's contact and health fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserHealth {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub emergency_contact: Option<String>,
}

/// Fields to change on one user. `None` leaves the stored value as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HealthUpdate {
    pub date_of_birth: Option<NaiveDate>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub emergency_contact: Option<String>,
}

impl HealthUpdate {
    pub fn is_empty(&self) -> bool {
        self.date_of_birth.is_none()
            && self.blood_type.is_none()
            && self.allergies.is_none()
            && self.emergency_contact.is_none()
    }

    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut sets = Vec::new();
        if let Some(dob) = self.date_of_birth {
            sets.push(("date_of_birth", Value::Text(dob.format("%Y-%m-%d").to_string())));
        }
        if let Some(blood_type) = &self.blood_type {
            sets.push(("blood_type", Value::Text(blood_type.clone())));
        }
        if let Some(allergies) = &self.allergies {
            sets.push(("allergies", Value::Text(allergies.clone())));
        }
        if let Some(contact) = &self.emergency_contact {
            sets.push(("emergency_contact", Value::Text(contact.clone())));
        }
        sets
    }
}

/// Parses a `YYYY-MM-DD` date of birth.
pub fn parse_date_of_birth(s: &str) -> Result<NaiveDate, PillTrackError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
        PillTrackError::Error(format!(
            "Invalid date of birth '{}' (expected YYYY-MM-DD): {}",
            s, e
        ))
    })
}

impl UserHealth {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(UserHealth {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            address: row.get(4)?,
            date_of_birth: row.get(5)?,
            blood_type: row.get(6)?,
            allergies: row.get(7)?,
            emergency_contact: row.get(8)?,
        })
    }

    /// Fails with a pointer to `migrate-user-health` when the health columns
    /// haven't been added yet.
    fn ensure_health_columns(conn: &Connection) -> Result<(), PillTrackError> {
        let columns = ColumnSet::load(conn, USER_HEALTH.table)?;
        let missing: Vec<&str> = USER_HEALTH
            .columns
            .iter()
            .map(|c| c.name)
            .filter(|name| !columns.contains(name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PillTrackError::Error(format!(
                "users table is missing health columns ({}); run migrate-user-health first",
                missing.join(", ")
            )))
        }
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Self>, PillTrackError> {
        Self::ensure_health_columns(conn)?;

        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", SELECT_COLUMNS),
            [id],
            Self::from_row,
        )
        .optional()
        .map_err(PillTrackError::DatabaseError)
    }

    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<Self>, PillTrackError> {
        Self::ensure_health_columns(conn)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY id ASC LIMIT ?1",
            SELECT_COLUMNS
        ))?;
        let users = stmt
            .query_map([limit as i64], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Applies `update` to user `id`. Returns the number of rows changed: 0
    /// when there is no such user or nothing to change.
    pub fn update_health(
        conn: &Connection,
        id: i64,
        update: &HealthUpdate,
    ) -> Result<usize, PillTrackError> {
        Self::ensure_health_columns(conn)?;

        let assignments = update.assignments();
        if assignments.is_empty() {
            return Ok(0);
        }

        let set_clause: Vec<String> = assignments
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE users SET {}, updated_at = CURRENT_TIMESTAMP WHERE id = ?{}",
            set_clause.join(", "),
            assignments.len() + 1
        );

        let values = assignments
            .into_iter()
            .map(|(_, value)| value)
            .chain(std::iter::once(Value::Integer(id)));
        let updated = conn.execute(&sql, params_from_iter(values))?;

        info!("Updated health info for user {} ({} rows)", id, updated);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedConfig;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;

    fn user_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        Schema::create(&conn, false).unwrap();
        Schema::seed(
            &conn,
            &SeedConfig {
                admin_name: "Admin User".into(),
                admin_email: "admin@pilltrack.com".into(),
                admin_password_hash: "$2a$10$testhash".into(),
            },
        )
        .unwrap();
        USER_HEALTH.apply(&conn).unwrap();
        conn
    }

    #[test]
    fn test_update_only_given_fields() {
        let conn = user_db();
        conn.execute("UPDATE users SET allergies = 'Dust' WHERE id = 1", [])
            .unwrap();

        let update = HealthUpdate {
            date_of_birth: Some(parse_date_of_birth("2000-01-15").unwrap()),
            blood_type: Some("O+".into()),
            ..Default::default()
        };
        assert_eq!(UserHealth::update_health(&conn, 1, &update).unwrap(), 1);

        let user = UserHealth::get_by_id(&conn, 1).unwrap().unwrap();
        assert_eq!(user.date_of_birth.as_deref(), Some("2000-01-15"));
        assert_eq!(user.blood_type.as_deref(), Some("O+"));
        assert_eq!(user.allergies.as_deref(), Some("Dust"));
        assert_eq!(user.emergency_contact, None);
    }

    #[test]
    fn test_update_unknown_user_changes_nothing() {
        let conn = user_db();
        let update = HealthUpdate {
            blood_type: Some("A-".into()),
            ..Default::default()
        };
        assert_eq!(UserHealth::update_health(&conn, 999, &update).unwrap(), 0);
        assert_eq!(UserHealth::get_by_id(&conn, 999).unwrap(), None);
    }

    #[test]
    fn test_empty_update_is_noop() {
        let conn = user_db();
        assert!(HealthUpdate::default().is_empty());
        assert_eq!(
            UserHealth::update_health(&conn, 1, &HealthUpdate::default()).unwrap(),
            0
        );
    }

    #[test]
    fn test_list_respects_limit() {
        let conn = user_db();
        for i in 0..3 {
            conn.execute(
                "INSERT INTO users (name, email, password, role_id) VALUES (?1, ?2, 'x', 2)",
                [format!("User {}", i), format!("user{}@example.com", i)],
            )
            .unwrap();
        }

        let users = UserHealth::list(&conn, 2).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "admin@pilltrack.com");
        assert_eq!(UserHealth::list(&conn, 10).unwrap().len(), 4);
    }

    #[test]
    fn test_requires_health_columns() {
        let conn = Connection::open_in_memory().unwrap();
        Schema::create(&conn, false).unwrap();

        let err = UserHealth::list(&conn, 10).unwrap_err();
        assert!(err.to_string().contains("migrate-user-health"));
    }

    #[test]
    fn test_parse_date_of_birth() {
        assert_eq!(
            parse_date_of_birth(" 2000-01-15 ").unwrap(),
            NaiveDate::from_ymd_opt(2000, 1, 15).unwrap()
        );
        assert!(parse_date_of_birth("15/01/2000").is_err());
        assert!(parse_date_of_birth("2000-02-30").is_err());
    }
}
