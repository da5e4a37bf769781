use indexmap::IndexMap;

use crate::common::{Value, DOC_ID};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use std::borrow::Cow;

/// A ledger document: field names mapped to [Value]s, in insertion order.
///
/// Field order matters. Statements are generated by walking the fields of a
/// document, and the bound parameters are taken from the same walk, so the
/// n-th placeholder always lines up with the n-th field.
///
/// Documents that have been persisted carry a system assigned `documentId`.
/// Callers never set it on a document they insert; the ledger does.
///
/// ```ignore
/// let mut doc = Document::new();
/// doc.put("name", "Alice")?;
/// doc.put("age", 30)?;
/// assert_eq!(doc.field_names(), vec!["name", "age"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`. An existing key keeps its position and
    /// gets the new value; a new key is appended.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFieldName` if the key is empty.
    pub fn put<'a, T: Into<Value>>(&mut self, key: impl Into<Cow<'a, str>>, value: T) -> LedgerResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(LedgerError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }
        self.data.insert(key.into_owned(), value.into());
        Ok(())
    }

    /// Sets `key` only when it is absent. Returns `true` if the value was written.
    pub fn put_if_absent<T: Into<Value>>(&mut self, key: &str, value: T) -> LedgerResult<bool> {
        if self.contains_key(key) {
            return Ok(false);
        }
        self.put(key, value)?;
        Ok(true)
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Removes `key`, keeping the relative order of the remaining fields.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.data.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Ordered `(name, value)` pairs.
    pub fn entries(&self) -> Vec<(&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    /// Returns a copy of this document with the fields of `other` laid over it.
    ///
    /// Keys already present keep their position and take `other`'s value;
    /// keys only in `other` are appended in `other`'s order.
    pub fn merge(&self, other: &Document) -> Document {
        let mut merged = self.clone();
        for (key, value) in other.iter() {
            merged.data.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Returns the `documentId` of this document if it has a string one.
    pub fn document_id(&self) -> Option<&str> {
        self.get(DOC_ID).and_then(Value::as_string)
    }

    /// Whether this row is an identity projection, i.e. `documentId` is its only field.
    pub fn is_identity_only(&self) -> bool {
        self.size() == 1 && self.contains_key(DOC_ID)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .data
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect::<serde_json::Map<String, serde_json::Value>>();
        serde_json::Value::Object(map)
    }

    /// Builds a document from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` for any JSON value other than an object.
    pub fn from_json(json: &serde_json::Value) -> LedgerResult<Document> {
        match json {
            serde_json::Value::Object(map) => Ok(Document::from_json_map(map)),
            other => {
                log::error!("Expected a JSON object, found {}", other);
                Err(LedgerError::new(
                    &format!("Expected a JSON object, found {}", other),
                    ErrorKind::MalformedInput,
                ))
            }
        }
    }

    pub fn from_json_map(map: &serde_json::Map<String, serde_json::Value>) -> Document {
        let data = map
            .iter()
            .map(|(key, value)| (key.clone(), Value::from_json(value)))
            .collect();
        Document { data }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

#[inline]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax, keeping the literal field order.
///
/// ```rust
/// use ledgerdoc::doc;
///
/// let empty = doc!{};
/// let person = doc!{
///     name: "Alice",
///     age: 30,
///     address: { city: "Lisbon" },
///     tags: ["a", "b"],
/// };
/// assert_eq!(person.field_names(), vec!["name", "age", "address", "tags"]);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
