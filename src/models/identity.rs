use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Role;

/// A patient or caretaker account.
///
/// The core only mutates `last_active_at` and `session_id`; the profile
/// fields are owned by the identity-management collaborator and read here
/// for broadcast payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub fullname: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub blood_group: String,
    pub address: Option<String>,
    pub health_issues: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
    /// Identifier of the single currently honored session. A token is
    /// valid only while its embedded session id equals this value.
    pub session_id: Option<String>,
}

/// Fields supplied at registration.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub fullname: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub blood_group: String,
    pub address: Option<String>,
    pub health_issues: Option<String>,
    pub role: Role,
}
