//! Newtype domain identifiers.
//!
//! Connection identities and collection names are both strings on the wire,
//! but mixing them up silently routes requests to the wrong place. Each is a
//! distinct newtype; record keys get their own scalar type because they may be
//! numeric or textual.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Borrow<str>, Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty
            /// or only whitespace.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Names one registered connection (one logical remote database).
    ///
    /// Unique within a connection registry; used as the lookup key for every
    /// semantic call.
    ConnectionIdentity
}

string_id! {
    /// Names a collection (model) as exposed by the remote server, e.g. `"pet"`.
    ///
    /// Used both as a resource path segment and as the schema map key.
    CollectionName
}

// ---------------------------------------------------------------------------
// Record keys
// ---------------------------------------------------------------------------

/// A scalar primary-key value that addresses exactly one record.
///
/// Only numbers and non-empty strings qualify. Objects and arrays never do:
/// they express criteria on the key (`{in: [1, 2]}`) or several keys, and
/// must be routed to bulk endpoints instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// A numeric key such as `5`.
    Number(Number),
    /// A textual key such as a UUID or slug.
    Text(String),
}

impl RecordId {
    /// Converts a JSON value into a scalar key.
    ///
    /// Returns `None` for `null`, booleans, empty strings, objects and arrays.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Returns the key as a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Number(n) => Value::Number(n.clone()),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_ids_reject_blank_values() {
        assert!(ConnectionIdentity::new("").is_none());
        assert!(ConnectionIdentity::new("   ").is_none());
        assert_eq!(
            ConnectionIdentity::new("db1").map(|id| id.to_string()),
            Some("db1".to_owned())
        );
    }

    #[test]
    fn record_id_accepts_only_scalars() {
        assert_eq!(RecordId::from_value(&json!(5)), Some(RecordId::from(5)));
        assert_eq!(RecordId::from_value(&json!("abc")), Some(RecordId::from("abc")));
        assert_eq!(RecordId::from_value(&json!(null)), None);
        assert_eq!(RecordId::from_value(&json!(true)), None);
        assert_eq!(RecordId::from_value(&json!("")), None);
        assert_eq!(RecordId::from_value(&json!({"in": [1, 2]})), None);
        assert_eq!(RecordId::from_value(&json!([1, 2])), None);
    }

    #[test]
    fn record_id_displays_as_path_segment() {
        assert_eq!(RecordId::from(42).to_string(), "42");
        assert_eq!(RecordId::from("a-b").to_string(), "a-b");
        assert_eq!(RecordId::from_value(&json!(1.5)).map(|id| id.to_string()), Some("1.5".into()));
    }
}
