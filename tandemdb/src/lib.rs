//! # TandemDB
//!
//! **An embedded document store that keeps a vector index and a metadata store in step.**
//!
//! TandemDB is the retrieval layer of a RAG pipeline:
//!
//! - **Documents** - text plus open-ended JSON metadata
//! - **Embeddings** - written with the documents or computed later by an embedder
//! - **Similarity search** - top-k by inner product, hydrated with the full documents
//! - **Namespaces** - one independent vector index per index name
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **Index Topologies** | Flat (exact), HNSW (graph), IVF (trained partitions) |
//! | **Metadata Backends** | In-memory or WAL-backed durable store |
//! | **Metadata Filters** | Counting, listing and embedding updates by metadata |
//! | **Persistence** | Checksummed, bit-exact index files |
//! | **Async API** | Tokio-compatible async operations (feature flag) |
//!
//! ## Quick Start
//!
//! ```rust
//! use tandemdb::prelude::*;
//!
//! let mut store = DocumentStore::open(StoreConfig::new(3), "memory://").unwrap();
//!
//! store
//!     .write(
//!         vec![
//!             Document::new("Rust ownership explained").with_embedding(vec![0.9f32, 0.1, 0.0]),
//!             Document::new("Baking sourdough bread").with_embedding(vec![0.0f32, 0.2, 0.9]),
//!         ],
//!         None,
//!         None,
//!     )
//!     .unwrap();
//!
//! let hits = store.query_by_embedding(&[1.0, 0.0, 0.0], None, 1, None, None).unwrap();
//! assert_eq!(hits[0].text, "Rust ownership explained");
//! ```
//!
//! ### Embedding Later
//!
//! Documents can be written without embeddings and embedded in pages
//! afterwards. Any closure over a page of documents is an [`Embedder`]:
//!
//! ```rust
//! use tandemdb::prelude::*;
//!
//! let mut store = DocumentStore::open(StoreConfig::new(2), "memory://").unwrap();
//! store.write(vec![Document::new("short"), Document::new("much longer")], None, None).unwrap();
//!
//! let embedder = |docs: &[Document]| -> Result<Vec<Vec<f32>>> {
//!     Ok(docs.iter().map(|d| vec![d.text.len() as f32, 1.0]).collect())
//! };
//! let report = store.update_embeddings(&embedder, None, false, None, None).unwrap();
//! assert_eq!(report.documents_embedded, 2);
//! ```
//!
//! ### Durable Store
//!
//! ```no_run
//! use tandemdb::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = StoreConfig::new(384).with_factory("HNSW");
//!     let mut store = DocumentStore::open(config, "file://./faq-metadata")?;
//!
//!     store.write(vec![Document::new("hello").with_embedding(vec![0.1f32; 384])], None, None)?;
//!
//!     // The metadata log persists itself; the index is saved explicitly.
//!     store.save("./faq.tdbx", None)?;
//!     let store = DocumentStore::load("./faq.tdbx", "file://./faq-metadata", None)?;
//!     assert_eq!(store.get_embedding_count(None), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Crate Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | Enables `AsyncDocumentStore` for tokio compatibility |
//!
//! Enable features in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tandemdb = { version = "0.1", features = ["async"] }
//! ```
//!
//! ## Architecture
//!
//! TandemDB is organized into two crates:
//!
//! - **`tandemdb-core`** - Core library with no async runtime dependency
//! - **`tandemdb`** - Main crate that re-exports everything
//!
//! ### Core Components
//!
//! - [`DocumentStore`] - Keeps indexes and metadata aligned
//! - [`VectorIndexHandle`] - A vector index built from a factory descriptor
//! - [`MetadataStore`] - The metadata collaborator interface
//! - [`Filter`] - Metadata filter expressions
//! - [`Meta`] - JSON-like metadata for documents
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`](crate::Result), which uses
//! the [`Error`] enum for error types. Non-fatal conditions are reported as
//! [`ConsistencyWarning`]s, both through `tracing` and in operation reports.
//!
//! ## Thread Safety
//!
//! - [`DocumentStore`] mutates through `&mut self`; share it behind a lock
//! - [`MetadataStore`] implementations are `Send + Sync`
//! - `AsyncDocumentStore` is `Clone` and safe to share across tasks

// Re-export everything from core
pub use tandemdb_core::*;
