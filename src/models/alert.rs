use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One triggered emergency episode (legacy representation, kept for
/// backward compatibility alongside `PatientStatus`). Deactivated rows
/// accumulate as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyAlert {
    pub id: i64,
    pub user_id: i64,
    pub stage: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
