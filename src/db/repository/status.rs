use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::{PatientStatus, PatientStatusKind};

fn map_row(row: &Row<'_>) -> rusqlite::Result<(i64, i64, String, String, DateTime<Utc>)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get::<_, DateTime<Utc>>(4)?,
    ))
}

fn finish(raw: (i64, i64, String, String, DateTime<Utc>)) -> Result<PatientStatus, DatabaseError> {
    let (id, user_id, status, phone, last_updated) = raw;
    Ok(PatientStatus {
        id,
        user_id,
        status: PatientStatusKind::from_str(&status)?,
        phone,
        last_updated,
    })
}

/// Create-or-mutate the patient's single status row (upsert key = user_id).
pub fn upsert(
    conn: &Connection,
    user_id: i64,
    phone: &str,
    status: PatientStatusKind,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patient_status (user_id, status, phone, last_updated)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET status = ?2, last_updated = ?4",
        params![user_id, status.as_str(), phone, now],
    )?;
    Ok(())
}

pub fn find_by_user(conn: &Connection, user_id: i64) -> Result<Option<PatientStatus>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT id, user_id, status, phone, last_updated
             FROM patient_status WHERE user_id = ?1",
            params![user_id],
            map_row,
        )
        .optional()?;
    raw.map(finish).transpose()
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<PatientStatus>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT id, user_id, status, phone, last_updated
             FROM patient_status WHERE id = ?1",
            params![id],
            map_row,
        )
        .optional()?;
    raw.map(finish).transpose()
}

pub fn set_status_by_id(
    conn: &Connection,
    id: i64,
    status: PatientStatusKind,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE patient_status SET status = ?1, last_updated = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(())
}

/// Best-effort normalization by patient id; zero rows touched is fine
/// (the patient may never have reported a status).
pub fn set_status_by_user(
    conn: &Connection,
    user_id: i64,
    status: PatientStatusKind,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE patient_status SET status = ?1, last_updated = ?2 WHERE user_id = ?3",
        params![status.as_str(), now, user_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::identity;
    use crate::db::repository::identity::tests::sample;
    use crate::models::Role;

    #[test]
    fn upsert_creates_then_mutates_single_row() {
        let conn = open_memory_database().unwrap();
        let patient = identity::insert(&conn, &sample("1231231234", Role::Patient), Utc::now()).unwrap();

        assert!(find_by_user(&conn, patient).unwrap().is_none());

        upsert(&conn, patient, "1231231234", PatientStatusKind::Warning, Utc::now()).unwrap();
        let first = find_by_user(&conn, patient).unwrap().unwrap();
        assert_eq!(first.status, PatientStatusKind::Warning);
        assert_eq!(first.phone, "1231231234");

        upsert(&conn, patient, "1231231234", PatientStatusKind::Emergency, Utc::now()).unwrap();
        let second = find_by_user(&conn, patient).unwrap().unwrap();
        assert_eq!(second.status, PatientStatusKind::Emergency);
        assert_eq!(second.id, first.id, "upsert must mutate in place, not insert");

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM patient_status WHERE user_id = ?1",
                params![patient],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn set_status_by_user_is_a_noop_without_row() {
        let conn = open_memory_database().unwrap();
        let patient = identity::insert(&conn, &sample("1231231234", Role::Patient), Utc::now()).unwrap();
        set_status_by_user(&conn, patient, PatientStatusKind::Normal, Utc::now()).unwrap();
        assert!(find_by_user(&conn, patient).unwrap().is_none());
    }

    #[test]
    fn find_by_id_resolves_the_row_id() {
        let conn = open_memory_database().unwrap();
        let patient = identity::insert(&conn, &sample("1231231234", Role::Patient), Utc::now()).unwrap();
        upsert(&conn, patient, "1231231234", PatientStatusKind::Alert, Utc::now()).unwrap();

        let by_user = find_by_user(&conn, patient).unwrap().unwrap();
        let by_id = find_by_id(&conn, by_user.id).unwrap().unwrap();
        assert_eq!(by_id.user_id, patient);

        set_status_by_id(&conn, by_user.id, PatientStatusKind::Normal, Utc::now()).unwrap();
        let after = find_by_id(&conn, by_user.id).unwrap().unwrap();
        assert_eq!(after.status, PatientStatusKind::Normal);
    }
}
