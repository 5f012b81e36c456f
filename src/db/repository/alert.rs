use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::EmergencyAlert;

fn map_row(row: &Row<'_>) -> rusqlite::Result<EmergencyAlert> {
    Ok(EmergencyAlert {
        id: row.get(0)?,
        user_id: row.get(1)?,
        stage: row.get(2)?,
        is_active: row.get(3)?,
        created_at: row.get::<_, DateTime<Utc>>(4)?,
        resolved_at: row.get::<_, Option<DateTime<Utc>>>(5)?,
    })
}

/// Insert a new active alert row. The partial unique index on
/// `(user_id) WHERE is_active = 1` turns a concurrent double-trigger
/// into a `ConstraintViolation` instead of a duplicate episode.
pub fn insert_active(
    conn: &Connection,
    user_id: i64,
    stage: &str,
    now: DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    let result = conn.execute(
        "INSERT INTO emergency_alerts (user_id, stage, is_active, created_at)
         VALUES (?1, ?2, 1, ?3)",
        params![user_id, stage, now],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(DatabaseError::ConstraintViolation(
                msg.unwrap_or_else(|| "one active alert per patient".into()),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<EmergencyAlert>, DatabaseError> {
    let alert = conn
        .query_row(
            "SELECT id, user_id, stage, is_active, created_at, resolved_at
             FROM emergency_alerts WHERE id = ?1",
            params![id],
            map_row,
        )
        .optional()?;
    Ok(alert)
}

pub fn find_active_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Option<EmergencyAlert>, DatabaseError> {
    let alert = conn
        .query_row(
            "SELECT id, user_id, stage, is_active, created_at, resolved_at
             FROM emergency_alerts WHERE user_id = ?1 AND is_active = 1",
            params![user_id],
            map_row,
        )
        .optional()?;
    Ok(alert)
}

/// Deactivate an alert and stamp its resolution time.
pub fn deactivate(conn: &Connection, id: i64, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE emergency_alerts SET is_active = 0, resolved_at = ?1 WHERE id = ?2",
        params![now, id],
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
    fn active_alert_lifecycle() {
        let conn = open_memory_database().unwrap();
        let patient = identity::insert(&conn, &sample("1231231234", Role::Patient), Utc::now()).unwrap();

        assert!(find_active_for_user(&conn, patient).unwrap().is_none());

        let id = insert_active(&conn, patient, "triggered", Utc::now()).unwrap();
        let active = find_active_for_user(&conn, patient).unwrap().unwrap();
        assert_eq!(active.id, id);
        assert!(active.is_active);
        assert_eq!(active.stage, "triggered");
        assert!(active.resolved_at.is_none());

        deactivate(&conn, id, Utc::now()).unwrap();
        assert!(find_active_for_user(&conn, patient).unwrap().is_none());
        let resolved = find_by_id(&conn, id).unwrap().unwrap();
        assert!(!resolved.is_active);
        assert!(resolved.resolved_at.is_some());
    }

    #[test]
    fn second_active_insert_reports_constraint_violation() {
        let conn = open_memory_database().unwrap();
        let patient = identity::insert(&conn, &sample("1231231234", Role::Patient), Utc::now()).unwrap();

        insert_active(&conn, patient, "triggered", Utc::now()).unwrap();
        let second = insert_active(&conn, patient, "triggered", Utc::now());
        assert!(matches!(second, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn history_accumulates_after_resolution() {
        let conn = open_memory_database().unwrap();
        let patient = identity::insert(&conn, &sample("1231231234", Role::Patient), Utc::now()).unwrap();

        for _ in 0..3 {
            let id = insert_active(&conn, patient, "triggered", Utc::now()).unwrap();
            deactivate(&conn, id, Utc::now()).unwrap();
        }
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM emergency_alerts WHERE user_id = ?1",
                params![patient],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}
