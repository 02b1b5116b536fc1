//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index::IndexParams;
use crate::registry::IndexSpec;
use crate::similarity::Similarity;

/// Configuration for a [`DocumentStore`](crate::DocumentStore).
///
/// Every field has a default, so a JSON file only needs the keys it changes.
///
/// # Example
///
/// ```
/// use tandemdb_core::StoreConfig;
///
/// let config = StoreConfig::from_json_str(r#"{"vector_dim": 4, "index": "faq"}"#).unwrap();
/// assert_eq!(config.vector_dim, 4);
/// assert_eq!(config.factory, "Flat");
/// assert_eq!(config.batch_size, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Width of every embedding.
    pub vector_dim: usize,
    /// Index factory descriptor, e.g. `Flat`, `HNSW`, `IVF256,Flat`.
    pub factory: String,
    pub index_params: IndexParams,
    pub similarity: Similarity,
    /// Whether reads attach reconstructed embeddings by default.
    pub return_embedding: bool,
    /// Rewriting a known document id overwrites it instead of failing.
    pub update_existing_documents: bool,
    /// Namespace used when an operation names none.
    pub index: String,
    /// JSON key that holds the embedding in raw documents.
    pub embedding_field: String,
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            vector_dim: 768,
            factory: "Flat".to_string(),
            index_params: IndexParams::default(),
            similarity: Similarity::DotProduct,
            return_embedding: false,
            update_existing_documents: false,
            index: "document".to_string(),
            embedding_field: "embedding".to_string(),
            batch_size: 10_000,
        }
    }
}

impl StoreConfig {
    /// Creates a config with the given dimension and defaults elsewhere.
    pub fn new(vector_dim: usize) -> Self {
        Self {
            vector_dim,
            ..Self::default()
        }
    }

    /// Parses a JSON config; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("invalid store config: {e}")))
    }

    /// Sets the factory descriptor. Chainable.
    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = factory.into();
        self
    }

    /// Sets the extra index parameters. Chainable.
    pub fn with_index_params(mut self, params: IndexParams) -> Self {
        self.index_params = params;
        self
    }

    /// Sets the similarity kind. Chainable.
    pub fn with_similarity(mut self, similarity: Similarity) -> Self {
        self.similarity = similarity;
        self
    }

    /// Sets whether reads attach embeddings by default. Chainable.
    pub fn with_return_embedding(mut self, enabled: bool) -> Self {
        self.return_embedding = enabled;
        self
    }

    /// Sets overwrite-by-id. Chainable.
    pub fn with_update_existing_documents(mut self, enabled: bool) -> Self {
        self.update_existing_documents = enabled;
        self
    }

    /// Sets the default namespace. Chainable.
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Sets the raw-document embedding key. Chainable.
    pub fn with_embedding_field(mut self, field: impl Into<String>) -> Self {
        self.embedding_field = field.into();
        self
    }

    /// Sets the default batch size. Chainable.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Checks the settings that can fail before any index is built.
    pub fn validate(&self) -> Result<()> {
        self.similarity.ensure_supported()?;
        if self.vector_dim == 0 {
            return Err(Error::config("vector_dim must be positive"));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be positive"));
        }
        if self.index.is_empty() {
            return Err(Error::config("default index name must not be empty"));
        }
        Ok(())
    }

    pub(crate) fn index_spec(&self) -> IndexSpec {
        IndexSpec {
            dimension: self.vector_dim,
            descriptor: self.factory.clone(),
            similarity: self.similarity,
            params: self.index_params.clone(),
        }
    }
}
