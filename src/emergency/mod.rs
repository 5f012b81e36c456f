//! Emergency alert & real-time status subsystem: broadcast hub, event
//! shapes, the alert lifecycle orchestrator, and caretaker visibility.

pub mod events;
pub mod hub;
pub mod orchestrator;
pub mod visibility;

pub use events::{BroadcastEvent, PatientSnapshot};
pub use hub::BroadcastHub;
pub use orchestrator::TriggerOutcome;
pub use visibility::ActiveAlertView;
