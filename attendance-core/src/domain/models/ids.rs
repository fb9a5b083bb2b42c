use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a string-backed identifier newtype.
///
/// Every identifier in this engine is assigned by the backend and treated as an
/// opaque string, so they all share the same conversions.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id! {
    /// An employee identifier supplied by the external identity collaborator.
    EmployeeId
}

string_id! {
    /// Server-assigned identifier of an attendance record.
    AttendanceId
}

string_id! {
    /// Server-assigned identifier of a task.
    TaskId
}

string_id! {
    /// Server-assigned identifier of a leave request.
    LeaveId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = LeaveId::new("lv-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"lv-7\"");

        let back: LeaveId = serde_json::from_str("\"lv-7\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(back.to_string(), "lv-7");
    }
}
