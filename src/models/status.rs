use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::PatientStatusKind;

/// Live health-state row, one per patient (upsert key = `user_id`).
/// Created lazily on the first status-affecting event; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientStatus {
    pub id: i64,
    pub user_id: i64,
    pub status: PatientStatusKind,
    /// Denormalized patient phone, written at row creation.
    pub phone: String,
    pub last_updated: DateTime<Utc>,
}
