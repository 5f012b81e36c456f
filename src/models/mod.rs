pub mod alert;
pub mod enums;
pub mod identity;
pub mod nominee;
pub mod status;

pub use alert::EmergencyAlert;
pub use enums::{PatientStatusKind, Role};
pub use identity::{Identity, NewIdentity};
pub use nominee::Nominee;
pub use status::PatientStatus;
