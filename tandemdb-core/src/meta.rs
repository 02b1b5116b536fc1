//! Document metadata.
//!
//! Metadata is an open JSON-like map owned by the metadata store. The core
//! treats it as opaque except for one reserved key, [`VECTOR_ID_KEY`], which
//! cross-references the document's vector in the ANN index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vector::VectorId;

/// Reserved metadata key holding a document's vector id.
pub const VECTOR_ID_KEY: &str = "vector_id";

/// Metadata attached to a document.
///
/// # Example
///
/// ```
/// use tandemdb_core::Meta;
///
/// let meta = Meta::new()
///     .with_field("source", "faq")
///     .with_field("year", 2021);
///
/// assert_eq!(meta.get_str("source"), Some("faq"));
/// assert_eq!(meta.vector_id(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meta {
    data: HashMap<String, Value>,
}

impl Meta {
    /// Creates empty metadata.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Creates metadata from a HashMap.
    #[inline]
    pub fn from_map(data: HashMap<String, Value>) -> Self {
        Self { data }
    }

    /// Adds a field. Chainable.
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Sets a field value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.data.insert(key.into(), value.into());
    }

    /// Gets a field value by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Gets a field as a string.
    #[inline]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Gets a field as an i64.
    #[inline]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_i64())
    }

    /// Removes a field and returns its value if present.
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Returns true if the metadata contains the given key.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an iterator over the fields.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Returns the underlying map.
    #[inline]
    pub fn into_inner(self) -> HashMap<String, Value> {
        self.data
    }

    /// The vector id cross-reference, if one was stamped.
    ///
    /// Accepts both a JSON number and a numeric string, since relational
    /// backends commonly store metadata values as text.
    pub fn vector_id(&self) -> Option<VectorId> {
        match self.data.get(VECTOR_ID_KEY)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Stamps the vector id cross-reference.
    pub fn set_vector_id(&mut self, id: VectorId) {
        self.data.insert(VECTOR_ID_KEY.to_string(), Value::from(id));
    }

    /// Drops the vector id cross-reference.
    pub fn clear_vector_id(&mut self) -> Option<VectorId> {
        let id = self.vector_id();
        self.data.remove(VECTOR_ID_KEY);
        id
    }
}
