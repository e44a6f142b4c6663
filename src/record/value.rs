//! Record identifiers and typed field values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Opaque, globally unique identifier of a record.
///
/// Usually a UUID assigned by the log converter, but any string found as a
/// key in a fragment is accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new random RecordId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a RecordId from an existing string key
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Deterministic id derived from a name, stable across runs.
    pub fn derived(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Typed field values.
///
/// Fragments carry loosely typed JSON; anything the schema does not interpret
/// is still preserved through `Array` and `Object`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
    Null,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render the value the way it appears on a log line.
    pub fn to_log_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Array(items) => {
                let inner: Vec<String> = items.iter().map(|v| v.to_log_string()).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Object(_) => serde_json::to_string(self).unwrap_or_default(),
            Self::Null => String::new(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(f: Option<f64>) -> Self {
        f.map(Self::Float).unwrap_or(Self::Null)
    }
}

/// Field map of one record
pub type Fields = BTreeMap<String, FieldValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_values_keep_their_json_type() {
        let fields: Fields = serde_json::from_str(
            r#"{"a": 1, "b": 1.5, "c": "x", "d": true, "e": null, "f": [1, "y"]}"#,
        )
        .unwrap();

        assert_eq!(fields["a"], FieldValue::Int(1));
        assert_eq!(fields["b"], FieldValue::Float(1.5));
        assert_eq!(fields["c"], FieldValue::from("x"));
        assert_eq!(fields["d"], FieldValue::Bool(true));
        assert!(fields["e"].is_null());
        assert_eq!(
            fields["f"],
            FieldValue::Array(vec![FieldValue::Int(1), FieldValue::from("y")])
        );
    }

    #[test]
    fn nested_objects_are_preserved() {
        let fields: Fields = serde_json::from_str(r#"{"meta": {"k": 2}}"#).unwrap();
        let back = serde_json::to_string(&fields).unwrap();
        assert_eq!(back, r#"{"meta":{"k":2}}"#);
    }

    #[test]
    fn derived_ids_are_stable() {
        assert_eq!(RecordId::derived("a|b"), RecordId::derived("a|b"));
        assert_ne!(RecordId::derived("a|b"), RecordId::derived("b|a"));
    }

    #[test]
    fn log_rendering() {
        let v = FieldValue::Array(vec![FieldValue::Int(1), FieldValue::Int(2)]);
        assert_eq!(v.to_log_string(), "[1, 2]");
        assert_eq!(FieldValue::Float(0.5).to_log_string(), "0.5");
    }
}
