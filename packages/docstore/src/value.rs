//! Typed field values stored in documents.
//!
//! Documents are schemaless, but the values flowing through the client are not: every field is a
//! [`FieldValue`], so integers stay integers, floats stay floats and timestamps survive the trip
//! through the store instead of degrading into strings.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Field name to value mapping of a single document.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single stored value.
///
/// Serializes to natural JSON. Timestamps serialize as RFC 3339 strings, so a JSON round trip
/// reads them back as [`FieldValue::String`]; use [`FieldValue::parse_timestamp`] where a caller
/// knows a field holds a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Reinterpret an RFC 3339 string as a timestamp. Other values are returned unchanged.
    #[must_use]
    pub fn parse_timestamp(self) -> Self {
        match self {
            Self::String(s) => match DateTime::parse_from_rfc3339(&s) {
                Ok(ts) => Self::Timestamp(ts.with_timezone(&Utc)),
                Err(_) => Self::String(s),
            },
            other => other,
        }
    }

    /// Convert into a `serde_json::Value`. Non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::Timestamp(ts) => Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Array(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else {
                    n.as_f64().map(Self::Float).unwrap_or(Self::Null)
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Fields> for FieldValue {
    fn from(value: Fields) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(value: Vec<T>) -> Self {
        Self::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Convert a JSON object into [`Fields`]. Returns `None` for any other JSON value.
pub fn fields_from_json(value: serde_json::Value) -> Option<Fields> {
    match FieldValue::from(value) {
        FieldValue::Map(map) => Some(map),
        _ => None,
    }
}

/// Build a [`Fields`] map from `key => value` pairs.
///
/// ```
/// let item = docstore::fields! { "name" => "Haircut", "price" => 30.0 };
/// assert_eq!(item.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Fields::new();
        $( map.insert(::std::string::String::from($key), $crate::FieldValue::from($value)); )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_json_numbers_keep_their_kind() {
        assert_eq!(FieldValue::from(json!(30)), FieldValue::Integer(30));
        assert_eq!(FieldValue::from(json!(30.0)), FieldValue::Float(30.0));
        assert_eq!(FieldValue::Float(35.0).to_json(), json!(35.0));
    }

    #[test]
    fn test_nested_json_object() {
        let value = FieldValue::from(json!({
            "name": "Haircut",
            "tags": ["short", 1, null],
            "meta": { "active": true }
        }));

        let map = value.as_map().unwrap();
        assert_eq!(map["name"], FieldValue::from("Haircut"));
        assert_eq!(
            map["tags"],
            FieldValue::Array(vec!["short".into(), 1i64.into(), FieldValue::Null])
        );
        assert_eq!(map["meta"].as_map().unwrap()["active"], FieldValue::Bool(true));
    }

    #[test]
    fn test_timestamp_serializes_as_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let value = FieldValue::Timestamp(ts);
        assert_eq!(value.to_json(), json!("2024-05-01T12:30:00Z"));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!("2024-05-01T12:30:00Z"));

        let parsed = FieldValue::from("2024-05-01T12:30:00Z").parse_timestamp();
        assert_eq!(parsed, FieldValue::Timestamp(ts));
        assert_eq!(
            FieldValue::from("not a date").parse_timestamp(),
            FieldValue::from("not a date")
        );
    }

    #[test]
    fn test_untagged_deserialize() {
        let value: FieldValue = serde_json::from_value(json!({"price": 30.0, "qty": 2, "x": null})).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["price"], FieldValue::Float(30.0));
        assert_eq!(map["qty"], FieldValue::Integer(2));
        assert!(map["x"].is_null());
    }

    #[test]
    fn test_fields_macro_and_option() {
        let missing: Option<String> = None;
        let f = fields! { "name" => "Bob", "phone" => missing, "age" => 41 };
        assert_eq!(f["name"].as_str(), Some("Bob"));
        assert!(f["phone"].is_null());
        assert_eq!(f["age"].as_i64(), Some(41));
        assert!(fields!().is_empty());
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
