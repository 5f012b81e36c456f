use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Caretaker => "caretaker",
});

// Not a strict FSM: any authenticated patient may set any of the four
// values directly. The transitions matter for when they become visible
// to caretakers, not for which value may follow which.
str_enum!(PatientStatusKind {
    Normal => "normal",
    Warning => "warning",
    Alert => "alert",
    Emergency => "emergency",
});

impl PatientStatusKind {
    /// Elevated statuses surface in the caretaker's active view.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Alert | Self::Emergency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_parses_all_four_values() {
        for (s, kind) in [
            ("normal", PatientStatusKind::Normal),
            ("warning", PatientStatusKind::Warning),
            ("alert", PatientStatusKind::Alert),
            ("emergency", PatientStatusKind::Emergency),
        ] {
            assert_eq!(PatientStatusKind::from_str(s).unwrap(), kind);
            assert_eq!(kind.as_str(), s);
        }
    }

    #[test]
    fn status_rejects_unknown_value() {
        let err = PatientStatusKind::from_str("critical");
        assert!(err.is_err());
    }

    #[test]
    fn only_alert_and_emergency_are_elevated() {
        assert!(!PatientStatusKind::Normal.is_elevated());
        assert!(!PatientStatusKind::Warning.is_elevated());
        assert!(PatientStatusKind::Alert.is_elevated());
        assert!(PatientStatusKind::Emergency.is_elevated());
    }

    #[test]
    fn role_round_trips() {
        assert_eq!(Role::from_str("caretaker").unwrap(), Role::Caretaker);
        assert_eq!(Role::Patient.as_str(), "patient");
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&PatientStatusKind::Emergency).unwrap();
        assert_eq!(json, "\"emergency\"");
    }
}
