//! # TandemDB Core
//!
//! Core library for TandemDB, an embedded document store that keeps an
//! approximate nearest neighbor index and a metadata store in step.
//!
//! Documents carry text, open-ended metadata and an optional embedding. The
//! embedding goes into a per-namespace vector index; everything else goes to
//! a [`MetadataStore`](metadata::MetadataStore). The two are tied together by
//! the `vector_id` stamped into each document's metadata, which is the
//! position of its vector in the index.
//!
//! ## Crate Features
//!
//! - `async` - Enables `AsyncDocumentStore` for tokio-compatible async operations
//!
//! ## Core Types
//!
//! ### Store
//!
//! - [`DocumentStore`] - Writes, embeds, queries and deletes documents
//! - [`StoreConfig`] - Dimension, factory descriptor, defaults
//! - [`IndexRegistry`] - One vector index per namespace
//!
//! ### Indexes
//!
//! - [`VectorIndexHandle`] - A vector index plus the descriptor it was built from
//! - [`FlatIndex`] - Exact inner-product search
//! - [`HnswIndex`] - Approximate search over an HNSW graph
//! - [`IvfIndex`] - Inverted file over trained partitions
//!
//! ### Metadata
//!
//! - [`MemoryMetadataStore`] - In-process store
//! - [`LogMetadataStore`] - Durable store backed by a write-ahead log
//!
//! ### Types
//!
//! - [`Document`] - Text, metadata and optional embedding
//! - [`Meta`] - JSON metadata map
//! - [`Filter`] - Declarative metadata predicates
//! - [`Vector`] / [`VectorBatch`] - Owned embeddings
//! - [`VectorId`] - Position of a vector in its index (u64)

pub mod config;
pub mod document;
pub mod embedder;
pub mod error;
pub mod filter;
pub mod index;
pub mod meta;
pub mod metadata;
mod persistence;
pub mod registry;
pub mod similarity;
pub mod storage;
pub mod store;
pub mod vector;

// Re-exports for convenient access
pub use config::StoreConfig;
pub use document::Document;
pub use embedder::Embedder;
pub use error::{ConsistencyWarning, Error, Result};
pub use filter::{Filter, FilterCondition};
pub use index::{
    AnnIndex, Capabilities, FlatIndex, HnswConfig, HnswIndex, IndexParams, IvfIndex, SearchHit,
    Topology, VectorIndexHandle,
};
pub use meta::Meta;
pub use metadata::{LogMetadataStore, MemoryMetadataStore, MetadataStore};
pub use registry::{IndexRegistry, IndexSpec};
pub use similarity::Similarity;
pub use store::{score_to_probability, DocumentStore, UpdateReport, WriteReport};
#[cfg(feature = "async")]
pub use store::AsyncDocumentStore;
pub use vector::{Vector, VectorBatch, VectorId};

/// Re-export commonly used types for convenience.
///
/// # Example
///
/// ```rust
/// use tandemdb_core::prelude::*;
///
/// let mut store = DocumentStore::open(StoreConfig::new(3), "memory://").unwrap();
/// let doc = Document::new("hello")
///     .with_meta(Meta::new().with_field("lang", "en"))
///     .with_embedding(vec![1.0f32, 0.0, 0.0]);
/// store.write(vec![doc], None, None).unwrap();
/// assert_eq!(store.get_embedding_count(None), 1);
/// ```
pub mod prelude {
    pub use crate::{
        ConsistencyWarning, Document, DocumentStore, Embedder, Error, Filter, IndexParams, Meta,
        Result, Similarity, StoreConfig, Vector, VectorBatch, VectorId, VectorIndexHandle,
    };
}
