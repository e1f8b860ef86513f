//! Runtime values captured from requests and responses
//!
//! Captured payloads arrive from several places (JSON bodies, form fields,
//! multipart uploads, query strings). They are normalised into
//! [`RuntimeValue`] so schema inference has a single tagged union to match on.

use bytes::Bytes;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

/// Metadata for an uploaded file. The file contents are never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMarker {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: usize,
}

impl FileMarker {
    pub fn new<S: Into<String>>(file_name: S) -> Self {
        Self { file_name: file_name.into(), content_type: None, size: 0 }
    }
}

/// Insertion-ordered string-keyed map of runtime values
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: IndexMap<String, RuntimeValue>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RuntimeValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RuntimeValue> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a value. An existing key keeps its position and gets the new value.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: RuntimeValue) -> Option<RuntimeValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuntimeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn first(&self) -> Option<(&str, &RuntimeValue)> {
        self.entries.first().map(|(k, v)| (k.as_str(), v))
    }
}

// Key order is part of a mapping's identity.
impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Into<String>> FromIterator<(K, RuntimeValue)> for Mapping {
    fn from_iter<T: IntoIterator<Item = (K, RuntimeValue)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut mapping = Mapping { entries: IndexMap::with_capacity(iter.size_hint().0) };
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl IntoIterator for Mapping {
    type Item = (String, RuntimeValue);
    type IntoIter = indexmap::map::IntoIter<String, RuntimeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A value observed at runtime
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<RuntimeValue>),
    Mapping(Mapping),
    /// An uploaded file
    File(FileMarker),
    /// Opaque binary or stream content
    Binary(Bytes),
}

impl RuntimeValue {
    /// Build a value from index-keyed entries, e.g. decoded `tags[1]=x` fields.
    ///
    /// Entries that include index 0 become a `Sequence` whose first element is
    /// the index-0 value; the rest follow in index order. Without index 0 the
    /// entries become a `Mapping` keyed by the decimal index, which is what
    /// makes a sparse list classify as an object.
    pub fn from_indexed<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, RuntimeValue)>,
    {
        let mut entries: Vec<(usize, RuntimeValue)> = entries.into_iter().collect();
        entries.sort_by_key(|(index, _)| *index);
        if entries.first().is_some_and(|(index, _)| *index == 0) {
            RuntimeValue::Sequence(entries.into_iter().map(|(_, v)| v).collect())
        } else {
            RuntimeValue::Mapping(entries.into_iter().map(|(i, v)| (i.to_string(), v)).collect())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RuntimeValue::Null => true,
            RuntimeValue::String(s) => s.is_empty(),
            RuntimeValue::Sequence(items) => items.is_empty(),
            RuntimeValue::Mapping(map) => map.is_empty(),
            RuntimeValue::Binary(bytes) => bytes.is_empty(),
            RuntimeValue::Bool(_) | RuntimeValue::Number(_) | RuntimeValue::File(_) => false,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            RuntimeValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// The element `gen_schema` samples for array items: index 0 of a sequence
    pub fn first_element(&self) -> Option<&RuntimeValue> {
        match self {
            RuntimeValue::Sequence(items) => items.first(),
            _ => None,
        }
    }

    /// Convert to a JSON value for use as an OpenAPI example.
    ///
    /// Files are rendered as their file name and binary content as its byte
    /// length, so example payloads never carry file contents.
    pub fn to_json(&self) -> Value {
        match self {
            RuntimeValue::Null => Value::Null,
            RuntimeValue::Bool(b) => Value::Bool(*b),
            RuntimeValue::Number(n) => Value::Number(n.clone()),
            RuntimeValue::String(s) => Value::String(s.clone()),
            RuntimeValue::Sequence(items) => {
                Value::Array(items.iter().map(Self::to_json).collect())
            }
            RuntimeValue::Mapping(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect())
            }
            RuntimeValue::File(file) => Value::String(file.file_name.clone()),
            RuntimeValue::Binary(bytes) => Value::String(format!("<{} bytes>", bytes.len())),
        }
    }
}

impl Serialize for RuntimeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RuntimeValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            RuntimeValue::Mapping(map) => map.serialize(serializer),
            other => other.to_json().serialize(serializer),
        }
    }
}

impl From<Value> for RuntimeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RuntimeValue::Null,
            Value::Bool(b) => RuntimeValue::Bool(b),
            Value::Number(n) => RuntimeValue::Number(n),
            Value::String(s) => RuntimeValue::String(s),
            Value::Array(items) => {
                RuntimeValue::Sequence(items.into_iter().map(RuntimeValue::from).collect())
            }
            Value::Object(map) => {
                let entries = map.into_iter().map(|(k, v)| (k, RuntimeValue::from(v)));
                RuntimeValue::Mapping(entries.collect())
            }
        }
    }
}

impl From<&str> for RuntimeValue {
    fn from(value: &str) -> Self {
        RuntimeValue::String(value.to_string())
    }
}

impl From<String> for RuntimeValue {
    fn from(value: String) -> Self {
        RuntimeValue::String(value)
    }
}

impl From<bool> for RuntimeValue {
    fn from(value: bool) -> Self {
        RuntimeValue::Bool(value)
    }
}

impl From<i64> for RuntimeValue {
    fn from(value: i64) -> Self {
        RuntimeValue::Number(value.into())
    }
}

impl From<i32> for RuntimeValue {
    fn from(value: i32) -> Self {
        RuntimeValue::Number(value.into())
    }
}

impl From<f64> for RuntimeValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(RuntimeValue::Null, RuntimeValue::Number)
    }
}

impl From<FileMarker> for RuntimeValue {
    fn from(value: FileMarker) -> Self {
        RuntimeValue::File(value)
    }
}

impl From<Mapping> for RuntimeValue {
    fn from(value: Mapping) -> Self {
        RuntimeValue::Mapping(value)
    }
}
