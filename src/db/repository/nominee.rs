use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{Identity, Nominee, Role};

pub fn insert(
    conn: &Connection,
    user_id: i64,
    name: &str,
    relationship: &str,
    phone: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO nominees (user_id, name, relationship, phone)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, name, relationship, phone],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Nominee>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, relationship, phone
         FROM nominees WHERE user_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(Nominee {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            relationship: row.get(3)?,
            phone: row.get(4)?,
        })
    })?;

    let mut nominees = Vec::new();
    for row in rows {
        nominees.push(row?);
    }
    Ok(nominees)
}

/// Phone of the patient's first nominee, the contact shown in alert
/// payloads.
pub fn first_phone_for_user(conn: &Connection, user_id: i64) -> Result<Option<String>, DatabaseError> {
    let phone = conn
        .query_row(
            "SELECT phone FROM nominees WHERE user_id = ?1 ORDER BY id LIMIT 1",
            params![user_id],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(phone)
}

/// All identities that have named the given phone as a nominee.
/// Visibility is phone-string matching, not a typed foreign key.
pub fn patients_nominating_phone(
    conn: &Connection,
    phone: &str,
) -> Result<Vec<Identity>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT u.id, u.fullname, u.phone, u.dob, u.blood_group, u.address,
                u.health_issues, u.role, u.created_at, u.last_active_at, u.session_id
         FROM users u
         JOIN nominees n ON n.user_id = u.id
         WHERE n.phone = ?1
         ORDER BY u.id",
    )?;

    let rows = stmt.query_map(params![phone], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, NaiveDate>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, DateTime<Utc>>(8)?,
            row.get::<_, Option<DateTime<Utc>>>(9)?,
            row.get::<_, Option<String>>(10)?,
        ))
    })?;

    let mut patients = Vec::new();
    for row in rows {
        let (id, fullname, phone, dob, blood_group, address, health_issues, role,
             created_at, last_active_at, session_id) = row?;
        patients.push(Identity {
            id,
            fullname,
            phone,
            dob,
            blood_group,
            address,
            health_issues,
            role: Role::from_str(&role)?,
            created_at,
            last_active_at,
            session_id,
        });
    }
    Ok(patients)
}
