use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::{Identity, NewIdentity, Role};

const COLUMNS: &str = "id, fullname, phone, dob, blood_group, address, \
                       health_issues, role, created_at, last_active_at, session_id";

fn map_row(row: &Row<'_>) -> rusqlite::Result<(Identity, String)> {
    Ok((
        Identity {
            id: row.get(0)?,
            fullname: row.get(1)?,
            phone: row.get(2)?,
            dob: row.get::<_, NaiveDate>(3)?,
            blood_group: row.get(4)?,
            address: row.get(5)?,
            health_issues: row.get(6)?,
            role: Role::Patient, // replaced below from the raw string
            created_at: row.get::<_, DateTime<Utc>>(8)?,
            last_active_at: row.get::<_, Option<DateTime<Utc>>>(9)?,
            session_id: row.get(10)?,
        },
        row.get::<_, String>(7)?,
    ))
}

fn finish(pair: (Identity, String)) -> Result<Identity, DatabaseError> {
    let (mut identity, role) = pair;
    identity.role = Role::from_str(&role)?;
    Ok(identity)
}

/// Insert a new identity. Fails with `ConstraintViolation` if the phone
/// is already registered.
pub fn insert(conn: &Connection, new: &NewIdentity, now: DateTime<Utc>) -> Result<i64, DatabaseError> {
    let result = conn.execute(
        "INSERT INTO users (fullname, phone, dob, blood_group, address, health_issues, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.fullname,
            new.phone,
            new.dob,
            new.blood_group,
            new.address,
            new.health_issues,
            new.role.as_str(),
            now,
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(DatabaseError::ConstraintViolation(
                msg.unwrap_or_else(|| "users.phone unique".into()),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_phone(conn: &Connection, phone: &str) -> Result<Option<Identity>, DatabaseError> {
    let pair = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE phone = ?1"),
            params![phone],
            map_row,
        )
        .optional()?;
    pair.map(finish).transpose()
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Identity>, DatabaseError> {
    let pair = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            map_row,
        )
        .optional()?;
    pair.map(finish).transpose()
}

/// Store a freshly issued session id and stamp `last_active_at`.
/// Overwriting the prior session id is what invalidates older tokens.
pub fn start_session(
    conn: &Connection,
    user_id: i64,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE users SET session_id = ?1, last_active_at = ?2 WHERE id = ?3",
        params![session_id, now, user_id],
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::open_memory_database;

    pub(crate) fn sample(phone: &str, role: Role) -> NewIdentity {
        NewIdentity {
            fullname: "Gokul R".into(),
            phone: phone.into(),
            dob: NaiveDate::from_ymd_opt(1952, 3, 14).unwrap(),
            blood_group: "B+".into(),
            address: Some("12 Lake View Rd".into()),
            health_issues: Some("hypertension".into()),
            role,
        }
    }

    #[test]
    fn insert_and_find_by_phone() {
        let conn = open_memory_database().unwrap();
        let id = insert(&conn, &sample("1231231234", Role::Patient), Utc::now()).unwrap();
        let found = find_by_phone(&conn, "1231231234").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.fullname, "Gokul R");
        assert_eq!(found.role, Role::Patient);
        assert!(found.session_id.is_none());
        assert!(find_by_phone(&conn, "0000000000").unwrap().is_none());
    }

    #[test]
    fn duplicate_phone_is_constraint_violation() {
        let conn = open_memory_database().unwrap();
        insert(&conn, &sample("1231231234", Role::Patient), Utc::now()).unwrap();
        let err = insert(&conn, &sample("1231231234", Role::Caretaker), Utc::now());
        assert!(matches!(err, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn start_session_overwrites_prior_session() {
        let conn = open_memory_database().unwrap();
        let id = insert(&conn, &sample("1231231234", Role::Patient), Utc::now()).unwrap();

        start_session(&conn, id, "session-a", Utc::now()).unwrap();
        let first = find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(first.session_id.as_deref(), Some("session-a"));
        assert!(first.last_active_at.is_some());

        start_session(&conn, id, "session-b", Utc::now()).unwrap();
        let second = find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(second.session_id.as_deref(), Some("session-b"));
    }
}
