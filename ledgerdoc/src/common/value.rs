use crate::collection::Document;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::{Display, Formatter};

/// A field value inside a [Document].
///
/// Covers the scalar types a ledger stores natively (booleans, integers,
/// decimals, strings, timestamps, blobs) and the two container types, nested
/// documents and lists.
///
/// ```text
/// let v1: Value = 42.into();
/// let v2 = Value::from("hello");
/// let v3 = val!(true);
/// let list = val!(vec!["a", "b"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    /// A point in time, always normalized to UTC.
    Timestamp(DateTime<Utc>),
    /// A nested document.
    Document(Document),
    /// An ordered list of values. A list in a predicate selects the `IN` operator.
    Array(Vec<Value>),
    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a decimal, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            Value::I64(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Converts this value into its JSON form.
    ///
    /// Timestamps become RFC 3339 strings with millisecond precision and bytes
    /// become arrays of numbers. Non-finite decimals become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::I64(i) => serde_json::Value::from(*i),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(t) => {
                serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Document(d) => d.to_json(),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Bytes(bytes) => {
                serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
            }
        }
    }

    /// Builds a value from JSON. Integers that fit in `i64` stay integers,
    /// every other number becomes a decimal.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::I64(i),
                None => Value::F64(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Document(Document::from_json_map(map)),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I64(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::I64(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Value::from_json(value)
    }
}

/// Creates a [Value] from any expression convertible into one.
///
/// ```rust
/// use ledgerdoc::common::Value;
/// use ledgerdoc::val;
///
/// assert_eq!(val!(42), Value::I64(42));
/// assert_eq!(val!("hello"), Value::String("hello".to_string()));
/// assert!(val!(vec![1, 2]).is_array());
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use chrono::TimeZone;

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(7), Value::I64(7));
        assert_eq!(Value::from(1.5), Value::F64(1.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(
            Value::from(vec!["a", "b"]),
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(val!("x").as_string(), Some("x"));
        assert_eq!(val!(3).as_i64(), Some(3));
        assert_eq!(val!(3).as_f64(), Some(3.0));
        assert_eq!(val!(3).as_string(), None);
        assert!(val!(vec![1]).is_array());
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_timestamp_to_json() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            Value::from(instant).to_json(),
            serde_json::json!("2024-01-02T03:04:05.000Z")
        );
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from_json(&serde_json::json!(5)), Value::I64(5));
        assert_eq!(Value::from_json(&serde_json::json!(2.5)), Value::F64(2.5));
        assert_eq!(
            Value::from_json(&serde_json::json!(u64::MAX)),
            Value::F64(u64::MAX as f64)
        );
    }

    #[test]
    fn test_from_json_object_keeps_order() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"z": 1, "a": {"k": [true, null]}}"#).unwrap();
        let value = Value::from_json(&json);
        let document = value.as_document().unwrap();
        assert_eq!(document.field_names(), vec!["z", "a"]);
        assert_eq!(
            document.get("a"),
            Some(&Value::Document(doc! { k: [true, (Value::Null)] }))
        );
    }

    #[test]
    fn test_display_is_json() {
        assert_eq!(format!("{}", val!("x")), "\"x\"");
        assert_eq!(format!("{}", val!(vec![1, 2])), "[1,2]");
    }

    #[test]
    fn test_non_finite_decimal_is_null_in_json() {
        assert_eq!(Value::F64(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
