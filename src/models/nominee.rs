use serde::{Deserialize, Serialize};

/// Directed emergency-contact edge from a patient to a phone number.
///
/// The phone may not correspond to any registered identity; a caretaker
/// gains visibility into the patient exactly when some nominee row's
/// phone equals the caretaker's own login phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nominee {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub relationship: String,
    pub phone: String,
}
