//! Caretaker visibility: which patients a caretaker may see, and the
//! merged active-alert view served for reconnect reconciliation and
//! polling fallback.
//!
//! Visibility is a phone-string edge: patient P is visible to caretaker
//! C when some nominee row of P carries C's phone. The phone may
//! predate C's registration, so the edge resolves lazily at query time.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository::{alert, nominee, status};
use crate::db::DatabaseError;
use crate::models::{Identity, PatientStatusKind, Role};

/// One elevated patient in the caretaker's merged view. `id` names the
/// row the entry came from: a status row when the patient's reported
/// status is elevated, otherwise the active alert row. Clients echo it
/// back verbatim to resolve.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveAlertView {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_phone: String,
    pub blood_group: String,
    pub address: Option<String>,
    pub health_issues: Option<String>,
    pub triggered_at: DateTime<Utc>,
    pub nominee_phone: Option<String>,
    pub status: PatientStatusKind,
}

fn view_for(
    conn: &Connection,
    patient: &Identity,
    id: i64,
    triggered_at: DateTime<Utc>,
    status: PatientStatusKind,
) -> Result<ActiveAlertView, DatabaseError> {
    Ok(ActiveAlertView {
        id,
        user_id: patient.id,
        user_name: patient.fullname.clone(),
        user_phone: patient.phone.clone(),
        blood_group: patient.blood_group.clone(),
        address: patient.address.clone(),
        health_issues: patient.health_issues.clone(),
        triggered_at,
        nominee_phone: nominee::first_phone_for_user(conn, patient.id)?,
        status,
    })
}

/// Patients that have named `viewer`'s phone as a nominee. Empty for
/// anyone whose role is not caretaker.
pub fn patients_visible_to(
    conn: &Connection,
    viewer: &Identity,
) -> Result<Vec<Identity>, DatabaseError> {
    if viewer.role != Role::Caretaker {
        return Ok(Vec::new());
    }
    nominee::patients_nominating_phone(conn, &viewer.phone)
}

/// Merged elevated view for `viewer`: one entry per visible patient
/// whose reported status is `alert`/`emergency` or who has an active
/// alert row. Status entries come first; an alert row contributes an
/// entry only when the same patient is not already covered by an
/// elevated status.
pub fn active_for(
    conn: &Connection,
    viewer: &Identity,
) -> Result<Vec<ActiveAlertView>, DatabaseError> {
    let patients = patients_visible_to(conn, viewer)?;
    if patients.is_empty() {
        return Ok(Vec::new());
    }

    let mut result = Vec::new();
    let mut covered = Vec::new();

    for patient in &patients {
        if let Some(row) = status::find_by_user(conn, patient.id)? {
            if row.status.is_elevated() {
                result.push(view_for(conn, patient, row.id, row.last_updated, row.status)?);
                covered.push(patient.id);
            }
        }
    }

    for patient in &patients {
        if covered.contains(&patient.id) {
            continue;
        }
        if let Some(active) = alert::find_active_for_user(conn, patient.id)? {
            // Bare alert rows predate status reporting; surface them as
            // full emergencies.
            result.push(view_for(
                conn,
                patient,
                active.id,
                active.created_at,
                PatientStatusKind::Emergency,
            )?);
        }
    }

    Ok(result)
}
