//! Wire shapes pushed to connected clients. Temporal values serialize
//! as ISO-8601 strings (chrono RFC 3339).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PatientStatusKind;

/// Patient profile snapshot carried by every event, plus the first
/// nominee's phone as "the" caretaker contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub user_id: i64,
    pub user_name: String,
    pub user_phone: String,
    pub blood_group: String,
    pub address: Option<String>,
    pub health_issues: Option<String>,
    pub nominee_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerData {
    #[serde(flatten)]
    pub patient: PatientSnapshot,
    pub triggered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    #[serde(flatten)]
    pub patient: PatientSnapshot,
    pub updated_at: DateTime<Utc>,
}

/// Server → client events, fanned out to every live connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BroadcastEvent {
    #[serde(rename = "EMERGENCY_TRIGGER")]
    EmergencyTrigger { alert_id: i64, data: TriggerData },
    #[serde(rename = "STATUS_UPDATE")]
    StatusUpdate {
        user_id: i64,
        status: PatientStatusKind,
        data: StatusData,
    },
}

impl BroadcastEvent {
    pub fn emergency_trigger(
        alert_id: i64,
        patient: PatientSnapshot,
        triggered_at: DateTime<Utc>,
    ) -> Self {
        Self::EmergencyTrigger {
            alert_id,
            data: TriggerData {
                patient,
                triggered_at,
            },
        }
    }

    pub fn status_update(
        status: PatientStatusKind,
        patient: PatientSnapshot,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self::StatusUpdate {
            user_id: patient.user_id,
            status,
            data: StatusData {
                patient,
                updated_at,
            },
        }
    }
}
