//! Alert lifecycle orchestration: trigger, status change, resolve.
//! Each operation mutates durable state first, then fans the event out
//! through the hub. Broadcast delivery never affects the result the
//! caller sees.

use chrono::Utc;
use rusqlite::Connection;

use crate::db::repository::{alert, nominee, status};
use crate::db::DatabaseError;
use crate::models::{EmergencyAlert, Identity, PatientStatus, PatientStatusKind};

use super::events::{BroadcastEvent, PatientSnapshot};
use super::hub::BroadcastHub;

/// Alert stage recorded on newly created alert rows.
pub const STAGE_TRIGGERED: &str = "triggered";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new alert episode was opened.
    Triggered(i64),
    /// The patient already had an open episode; its event was
    /// rebroadcast so late-joining caretakers still see it.
    AlreadyActive(i64),
}

impl TriggerOutcome {
    pub fn alert_id(&self) -> i64 {
        match self {
            Self::Triggered(id) | Self::AlreadyActive(id) => *id,
        }
    }
}

/// What a resolve id turned out to reference. Clients send back either
/// an alert row id or a status row id, so the id is classified exactly
/// once before anything is mutated.
enum ResolveTarget {
    Alert(EmergencyAlert),
    Status(PatientStatus),
    Unknown,
}

fn classify_resolve_id(conn: &Connection, id: i64) -> Result<ResolveTarget, DatabaseError> {
    if let Some(alert) = alert::find_by_id(conn, id)? {
        return Ok(ResolveTarget::Alert(alert));
    }
    if let Some(row) = status::find_by_id(conn, id)? {
        return Ok(ResolveTarget::Status(row));
    }
    Ok(ResolveTarget::Unknown)
}

/// Profile snapshot embedded in every broadcast payload.
pub fn patient_snapshot(
    conn: &Connection,
    patient: &Identity,
) -> Result<PatientSnapshot, DatabaseError> {
    Ok(PatientSnapshot {
        user_id: patient.id,
        user_name: patient.fullname.clone(),
        user_phone: patient.phone.clone(),
        blood_group: patient.blood_group.clone(),
        address: patient.address.clone(),
        health_issues: patient.health_issues.clone(),
        nominee_phone: nominee::first_phone_for_user(conn, patient.id)?,
    })
}

/// Open an alert episode for `patient`, or rebroadcast the one already
/// open. Idempotent per patient: at most one active episode exists, and
/// repeat triggers return `AlreadyActive` with the original id.
///
/// A successful trigger also forces the patient's status row to
/// `emergency` so the two representations cannot disagree.
pub fn trigger(
    conn: &Connection,
    hub: &BroadcastHub,
    patient: &Identity,
) -> Result<TriggerOutcome, DatabaseError> {
    let snapshot = patient_snapshot(conn, patient)?;

    if let Some(active) = alert::find_active_for_user(conn, patient.id)? {
        hub.broadcast(&BroadcastEvent::emergency_trigger(
            active.id,
            snapshot,
            active.created_at,
        ));
        return Ok(TriggerOutcome::AlreadyActive(active.id));
    }

    let now = Utc::now();
    let alert_id = match alert::insert_active(conn, patient.id, STAGE_TRIGGERED, now) {
        Ok(id) => id,
        // Lost a race with a concurrent trigger; the other episode wins
        Err(DatabaseError::ConstraintViolation(_)) => {
            if let Some(active) = alert::find_active_for_user(conn, patient.id)? {
                hub.broadcast(&BroadcastEvent::emergency_trigger(
                    active.id,
                    snapshot,
                    active.created_at,
                ));
                return Ok(TriggerOutcome::AlreadyActive(active.id));
            }
            return Err(DatabaseError::ConstraintViolation(
                "active alert vanished during trigger race".into(),
            ));
        }
        Err(e) => return Err(e),
    };

    status::upsert(
        conn,
        patient.id,
        &patient.phone,
        PatientStatusKind::Emergency,
        now,
    )?;

    tracing::info!(patient_id = patient.id, alert_id, "emergency triggered");
    hub.broadcast(&BroadcastEvent::emergency_trigger(alert_id, snapshot, now));

    Ok(TriggerOutcome::Triggered(alert_id))
}

/// Record a status report and broadcast it. Every accepted report is
/// broadcast, including a repeat of the current value.
pub fn set_status(
    conn: &Connection,
    hub: &BroadcastHub,
    patient: &Identity,
    new_status: PatientStatusKind,
) -> Result<(), DatabaseError> {
    let now = Utc::now();
    status::upsert(conn, patient.id, &patient.phone, new_status, now)?;

    let snapshot = patient_snapshot(conn, patient)?;
    tracing::info!(patient_id = patient.id, status = new_status.as_str(), "status updated");
    hub.broadcast(&BroadcastEvent::status_update(new_status, snapshot, now));

    Ok(())
}

/// Resolve by ambiguous id: the id may name an alert row or a status
/// row (caretaker clients echo back whichever id `active_for` gave
/// them). Whichever it is, the patient's status row is forced back to
/// `normal`. Returns the affected patient id, or `None` when the id
/// matched nothing.
pub fn resolve(conn: &Connection, id: i64) -> Result<Option<i64>, DatabaseError> {
    let now = Utc::now();

    let patient_id = match classify_resolve_id(conn, id)? {
        ResolveTarget::Alert(alert) => {
            alert::deactivate(conn, alert.id, now)?;
            alert.user_id
        }
        ResolveTarget::Status(row) => {
            status::set_status_by_id(conn, row.id, PatientStatusKind::Normal, now)?;
            row.user_id
        }
        ResolveTarget::Unknown => return Ok(None),
    };

    // The alert branch has not touched the status row yet; zero rows
    // updated is fine when the patient never reported a status.
    status::set_status_by_user(conn, patient_id, PatientStatusKind::Normal, now)?;

    tracing::info!(patient_id, resolve_id = id, "emergency resolved");
    Ok(Some(patient_id))
}
