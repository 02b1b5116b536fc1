//! The document type shared by both stores.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::meta::Meta;
use crate::vector::{Vector, VectorId};

/// A retrievable unit of text with metadata and an optional embedding.
///
/// Once written, the metadata store owns the text and metadata copy and the
/// vector index owns the embedding copy. The only link between the two is
/// the `vector_id` stamped into [`Document::meta`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique within a namespace.
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vector>,
    /// Raw inner-product score, set by similarity queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Bounded display confidence derived from `score`, set by similarity queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f32>,
}

impl Document {
    /// Creates a document with a random UUID id.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), text)
    }

    /// Creates a document with a specific id.
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            meta: Meta::new(),
            embedding: None,
            score: None,
            probability: None,
        }
    }

    /// Replaces the metadata. Chainable.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Attaches an embedding. Chainable.
    pub fn with_embedding<V: Into<Vector>>(mut self, embedding: V) -> Self {
        self.embedding = Some(embedding.into());
        self
    }

    /// The vector id cross-reference, if a vector was written for this document.
    #[inline]
    pub fn vector_id(&self) -> Option<VectorId> {
        self.meta.vector_id()
    }

    /// Builds a document from a JSON object.
    ///
    /// Recognised keys are `id`, `text`, `meta` and `embedding_field` (the
    /// store's configured embedding key). Any other top-level key is folded
    /// into the metadata. A missing `id` gets a fresh UUID.
    pub fn from_value(value: Value, embedding_field: &str) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(Error::config("document must be a JSON object"));
        };

        let text = match fields.remove("text") {
            Some(Value::String(s)) => s,
            Some(_) => return Err(Error::config("document `text` must be a string")),
            None => return Err(Error::config("document is missing `text`")),
        };

        let id = match fields.remove("id") {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Null) | None => Uuid::new_v4().to_string(),
            Some(_) => return Err(Error::config("document `id` must be a string")),
        };

        let embedding = match fields.remove(embedding_field) {
            Some(Value::Null) | None => None,
            Some(raw) => {
                let data: Vec<f32> = serde_json::from_value(raw).map_err(|e| {
                    Error::config(format!("field `{embedding_field}` is not a vector: {e}"))
                })?;
                Some(Vector::from_vec(data))
            }
        };

        let mut meta = match fields.remove("meta") {
            Some(Value::Object(map)) => Meta::from_map(map.into_iter().collect()),
            Some(Value::Null) | None => Meta::new(),
            Some(_) => return Err(Error::config("document `meta` must be an object")),
        };
        for (key, value) in fields {
            if key != "score" && key != "probability" {
                meta.set(key, value);
            }
        }

        Ok(Self {
            id,
            text,
            meta,
            embedding,
            score: None,
            probability: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_generates_unique_ids() {
        let a = Document::new("a");
        let b = Document::new("b");
        assert_ne!(a.id, b.id);
        assert!(a.embedding.is_none());
    }

    #[test]
    fn test_builder() {
        let doc = Document::with_id("d1", "hello")
            .with_meta(Meta::new().with_field("lang", "en"))
            .with_embedding(vec![0.5f32, 0.5]);
        assert_eq!(doc.id, "d1");
        assert_eq!(doc.meta.get_str("lang"), Some("en"));
        assert_eq!(doc.embedding.unwrap().as_slice(), &[0.5, 0.5]);
    }

    #[test]
    fn test_from_value_custom_embedding_field() {
        let doc = Document::from_value(
            json!({
                "id": "q1",
                "text": "What is an ANN index?",
                "emb": [0.1, 0.2, 0.3],
                "meta": {"topic": "search"},
                "source": "wiki"
            }),
            "emb",
        )
        .unwrap();

        assert_eq!(doc.id, "q1");
        assert_eq!(doc.embedding.as_ref().unwrap().dimension(), 3);
        assert_eq!(doc.meta.get_str("topic"), Some("search"));
        assert_eq!(doc.meta.get_str("source"), Some("wiki"));
    }

    #[test]
    fn test_from_value_requires_text() {
        let result = Document::from_value(json!({"id": "x"}), "embedding");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_from_value_generates_id() {
        let doc = Document::from_value(json!({"text": "t"}), "embedding").unwrap();
        assert!(!doc.id.is_empty());
        assert!(doc.embedding.is_none());
    }
}
