//! The synchronized document store.
//!
//! A [`DocumentStore`] pairs one vector index per namespace with a shared
//! [`MetadataStore`]. Neither side knows about the other; the store keeps
//! them aligned through the `vector_id` stamped into each document's
//! metadata, which is the position of the document's vector in its
//! namespace's index.
//!
//! Vector writes always happen before the matching metadata write. A failure
//! in between leaves vectors that no document references. Those are never
//! returned by queries and disappear with the next `delete_all_documents`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::StoreConfig;
use crate::document::Document;
use crate::embedder::Embedder;
use crate::error::{ConsistencyWarning, Error, Result};
use crate::filter::Filter;
use crate::index::{IndexParams, SearchHit, Topology, VectorIndexHandle};
use crate::metadata::{connect, DocumentPages, MetadataStore};
use crate::registry::IndexRegistry;
use crate::vector::{Vector, VectorBatch, VectorId};

/// Outcome of [`DocumentStore::write`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    pub documents_written: usize,
    pub vectors_added: usize,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Outcome of [`DocumentStore::update_embeddings`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub documents_embedded: usize,
    pub vectors_added: usize,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Bounded display confidence for an inner-product score: `sigmoid(score / 100)`.
///
/// This is a monotonic squashing, not a calibrated probability.
#[inline]
pub fn score_to_probability(score: f32) -> f32 {
    1.0 / (1.0 + (-score / 100.0).exp())
}

/// Document store that keeps an ANN index and a metadata store in step.
///
/// Mutating operations take `&mut self`: callers that share a store across
/// threads must serialize writers themselves (see `AsyncDocumentStore`
/// behind the `async` feature).
///
/// # Example
///
/// ```
/// use tandemdb_core::{Document, DocumentStore, StoreConfig};
///
/// let mut store = DocumentStore::open(StoreConfig::new(4), "memory://").unwrap();
/// store
///     .write(
///         vec![
///             Document::with_id("a", "first").with_embedding(vec![1.0f32, 0.0, 0.0, 0.0]),
///             Document::with_id("b", "second").with_embedding(vec![0.0f32, 1.0, 0.0, 0.0]),
///         ],
///         None,
///         None,
///     )
///     .unwrap();
///
/// let hits = store
///     .query_by_embedding(&[1.0, 0.0, 0.0, 0.0], None, 1, None, None)
///     .unwrap();
/// assert_eq!(hits[0].id, "a");
/// assert_eq!(hits[0].score, Some(1.0));
/// ```
pub struct DocumentStore {
    pub(crate) config: StoreConfig,
    pub(crate) registry: IndexRegistry,
    pub(crate) metadata: Arc<dyn MetadataStore>,
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("config", &self.config)
            .field("namespaces", &self.registry.names())
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Creates a store over `metadata`.
    ///
    /// The default namespace's index is built immediately, so an unsupported
    /// similarity or factory descriptor fails here.
    pub fn new(config: StoreConfig, metadata: Arc<dyn MetadataStore>) -> Result<Self> {
        config.validate()?;
        let mut registry = IndexRegistry::new(config.index_spec());
        registry.get_or_create(&config.index)?;
        tracing::debug!(
            index = %config.index,
            factory = %config.factory,
            dimension = config.vector_dim,
            "opened document store"
        );
        Ok(Self {
            config,
            registry,
            metadata,
        })
    }

    /// Creates a store over the metadata store named by `connection`
    /// (`memory://`, `file://<dir>` or a directory path).
    pub fn open(config: StoreConfig, connection: &str) -> Result<Self> {
        let metadata = connect(connection)?;
        Self::new(config, metadata)
    }

    /// Creates a store around an existing index, registered as the default
    /// namespace. The index's dimension and descriptor replace the ones in
    /// `config`.
    pub fn with_index(
        mut config: StoreConfig,
        handle: VectorIndexHandle,
        metadata: Arc<dyn MetadataStore>,
    ) -> Result<Self> {
        config.vector_dim = handle.dimension();
        config.factory = handle.descriptor().to_string();
        adopt_index_params(&mut config.index_params, handle.topology());
        config.validate()?;

        let mut registry = IndexRegistry::new(config.index_spec());
        registry.insert(config.index.clone(), handle);
        Ok(Self {
            config,
            registry,
            metadata,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// The vector index of `namespace`, if one exists.
    pub fn index(&self, namespace: Option<&str>) -> Option<&VectorIndexHandle> {
        self.registry.get(namespace.unwrap_or(&self.config.index))
    }

    fn resolve(&self, namespace: Option<&str>) -> String {
        namespace.unwrap_or(&self.config.index).to_string()
    }

    fn batch_size(&self, batch_size: Option<usize>) -> Result<usize> {
        match batch_size.unwrap_or(self.config.batch_size) {
            0 => Err(Error::config("batch_size must be positive")),
            size => Ok(size),
        }
    }

    fn want_embedding(&self, return_embedding: Option<bool>) -> bool {
        return_embedding.unwrap_or(self.config.return_embedding)
    }

    /// Writes documents, appending their embeddings to the namespace's index.
    ///
    /// Whether the batch carries embeddings is decided by the first document
    /// alone. If it does, every document must carry one of the index width
    /// and gets `vector_id` stamped in document order, starting at the index's
    /// current size. If it does not, embeddings on later documents are
    /// ignored.
    ///
    /// # Errors
    ///
    /// - `Configuration` for an empty batch or an embedding-bearing batch with
    ///   a document that has no embedding
    /// - `DimensionMismatch` for an embedding of the wrong width
    /// - `DuplicateDocument` for a known id while overwriting is disabled
    ///
    /// Inputs are validated before anything is written.
    pub fn write(
        &mut self,
        documents: Vec<Document>,
        namespace: Option<&str>,
        batch_size: Option<usize>,
    ) -> Result<WriteReport> {
        let namespace = self.resolve(namespace);
        let batch_size = self.batch_size(batch_size)?;
        let overwrite = self.config.update_existing_documents;
        if documents.is_empty() {
            return Err(Error::config("no documents to write"));
        }

        let handle = self.registry.get_or_create(&namespace)?;
        let with_embeddings = documents[0].embedding.is_some();
        if with_embeddings {
            for doc in &documents {
                match &doc.embedding {
                    Some(embedding) if embedding.dimension() != handle.dimension() => {
                        return Err(Error::DimensionMismatch {
                            expected: handle.dimension(),
                            got: embedding.dimension(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        return Err(Error::config(format!(
                            "document '{}' has no embedding but the batch carries embeddings",
                            doc.id
                        )));
                    }
                }
            }
        }
        if !overwrite {
            ensure_new_ids(self.metadata.as_ref(), &namespace, &documents)?;
        }

        let mut report = WriteReport::default();
        if overwrite && with_embeddings {
            report
                .warnings
                .push(ConsistencyWarning::OverwriteWithVectors.emit());
        }

        let mut vector_id = handle.next_vector_id();
        let mut remaining = documents.into_iter().peekable();
        while remaining.peek().is_some() {
            let mut chunk: Vec<Document> = remaining.by_ref().take(batch_size).collect();

            if with_embeddings {
                let rows: Vec<&[f32]> = chunk
                    .iter()
                    .filter_map(|doc| doc.embedding.as_ref().map(Vector::as_slice))
                    .collect();
                let batch = VectorBatch::from_rows(handle.dimension(), &rows)?;
                handle.add(&batch)?;
                for doc in &mut chunk {
                    doc.meta.set_vector_id(vector_id);
                    vector_id += 1;
                }
                report.vectors_added += batch.len();
            } else {
                // A vector_id is only ever assigned by this store.
                for doc in &mut chunk {
                    doc.meta.clear_vector_id();
                }
            }

            let written = chunk.len();
            self.metadata.write_documents(&namespace, chunk, overwrite)?;
            report.documents_written += written;
            tracing::debug!(
                namespace = %namespace,
                documents = written,
                with_embeddings,
                "wrote document chunk"
            );
        }

        Ok(report)
    }

    /// Writes raw JSON documents, reading embeddings from the configured
    /// `embedding_field`.
    pub fn write_values(
        &mut self,
        values: Vec<Value>,
        namespace: Option<&str>,
        batch_size: Option<usize>,
    ) -> Result<WriteReport> {
        let field = self.config.embedding_field.clone();
        let documents = values
            .into_iter()
            .map(|value| Document::from_value(value, &field))
            .collect::<Result<Vec<_>>>()?;
        self.write(documents, namespace, batch_size)
    }

    /// Embeds documents with `embedder` and appends the vectors.
    ///
    /// With `update_existing` unset only documents without a `vector_id` are
    /// embedded. With it set every matching document is re-embedded and gets
    /// a new id; its old vector stays in the index, unreferenced.
    ///
    /// # Errors
    ///
    /// - `IndexNotFound` if the namespace has no index
    /// - `EmbeddingCountMismatch` if the embedder returns the wrong number of
    ///   vectors; pages already processed stay written
    pub fn update_embeddings<E: Embedder + ?Sized>(
        &mut self,
        embedder: &E,
        namespace: Option<&str>,
        update_existing: bool,
        filter: Option<Filter>,
        batch_size: Option<usize>,
    ) -> Result<UpdateReport> {
        let namespace = self.resolve(namespace);
        let batch_size = self.batch_size(batch_size)?;
        let handle = self
            .registry
            .get_mut(&namespace)
            .ok_or_else(|| Error::IndexNotFound(namespace.clone()))?;

        let only_without_vector = !update_existing;
        let total = self
            .metadata
            .count(&namespace, filter.as_ref(), only_without_vector)?;
        let mut report = UpdateReport::default();
        if total == 0 {
            report.warnings.push(
                ConsistencyWarning::NothingToEmbed {
                    namespace: namespace.clone(),
                }
                .emit(),
            );
            return Ok(report);
        }
        tracing::info!(namespace = %namespace, total, update_existing, "updating embeddings");

        let mut pages = DocumentPages::new(
            Arc::clone(&self.metadata),
            namespace.clone(),
            filter,
            only_without_vector,
            batch_size,
        );
        while let Some(page) = pages.next_page()? {
            let embeddings = embedder.embed_passages(&page)?;
            if embeddings.len() != page.len() {
                return Err(Error::EmbeddingCountMismatch {
                    expected: page.len(),
                    got: embeddings.len(),
                });
            }

            let batch = VectorBatch::from_rows(handle.dimension(), &embeddings)?;
            let first_id = handle.next_vector_id();
            handle.add(&batch)?;

            let assignments: HashMap<String, VectorId> = page
                .iter()
                .zip(first_id..)
                .map(|(doc, vector_id)| (doc.id.clone(), vector_id))
                .collect();
            self.metadata.update_vector_ids(&namespace, &assignments)?;

            report.documents_embedded += page.len();
            report.vectors_added += batch.len();
            tracing::info!(
                namespace = %namespace,
                embedded = report.documents_embedded,
                total,
                "embedding progress"
            );
        }

        Ok(report)
    }

    /// Finds the `top_k` documents whose vectors score highest against `query`.
    ///
    /// Results are ordered by descending score and carry `score` and
    /// `probability`. Fewer than `top_k` results come back when the index holds
    /// fewer vectors. Metadata filters are not applied here; passing one logs a
    /// warning.
    pub fn query_by_embedding(
        &self,
        query: &[f32],
        namespace: Option<&str>,
        top_k: usize,
        filter: Option<&Filter>,
        return_embedding: Option<bool>,
    ) -> Result<Vec<Document>> {
        let namespace = self.resolve(namespace);
        let handle = self
            .registry
            .get(&namespace)
            .ok_or_else(|| Error::IndexNotFound(namespace.clone()))?;
        if filter.is_some() {
            ConsistencyWarning::FilterIgnored {
                operation: "query_by_embedding",
            }
            .emit();
        }

        let hits = handle.search(query, top_k)?;
        let scores: HashMap<VectorId, f32> = hits
            .iter()
            .filter_map(|hit| hit.vector_id().map(|id| (id, hit.score)))
            .collect();
        let vector_ids: Vec<VectorId> = hits.iter().filter_map(SearchHit::vector_id).collect();

        let want_embedding = self.want_embedding(return_embedding);
        let mut documents = self.metadata.get_by_vector_ids(&namespace, &vector_ids)?;
        for doc in &mut documents {
            let Some(vector_id) = doc.vector_id() else {
                continue;
            };
            if let Some(&score) = scores.get(&vector_id) {
                doc.score = Some(score);
                doc.probability = Some(score_to_probability(score));
            }
            if want_embedding {
                doc.embedding = Some(handle.reconstruct(vector_id)?);
            }
        }
        documents.sort_by(|a, b| {
            let a_score = a.score.unwrap_or(f32::NEG_INFINITY);
            let b_score = b.score.unwrap_or(f32::NEG_INFINITY);
            b_score
                .total_cmp(&a_score)
                .then_with(|| a.vector_id().cmp(&b.vector_id()))
        });
        Ok(documents)
    }

    /// Trains the namespace's index, creating the index if needed.
    ///
    /// Exactly one of `documents` (their embeddings are used) or `embeddings`
    /// must be given. Topologies that need no training accept the call and do
    /// nothing.
    pub fn train_index(
        &mut self,
        documents: Option<&[Document]>,
        embeddings: Option<&[Vec<f32>]>,
        namespace: Option<&str>,
    ) -> Result<()> {
        let namespace = self.resolve(namespace);
        let handle = self.registry.get_or_create(&namespace)?;
        let batch = match (documents, embeddings) {
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    "pass either documents or embeddings to train_index, not both",
                ))
            }
            (None, None) => {
                return Err(Error::config(
                    "train_index needs documents or embeddings to train on",
                ))
            }
            (Some(documents), None) => {
                let rows = documents
                    .iter()
                    .map(|doc| {
                        doc.embedding.as_ref().map(Vector::as_slice).ok_or_else(|| {
                            Error::config(format!(
                                "document '{}' has no embedding to train on",
                                doc.id
                            ))
                        })
                    })
                    .collect::<Result<Vec<&[f32]>>>()?;
                VectorBatch::from_rows(handle.dimension(), &rows)?
            }
            (None, Some(embeddings)) => VectorBatch::from_rows(handle.dimension(), embeddings)?,
        };

        handle.train(&batch)?;
        tracing::debug!(namespace = %namespace, points = batch.len(), "trained index");
        Ok(())
    }

    /// Empties the namespace: resets its index and deletes its documents.
    ///
    /// Filters are not supported here; passing one logs a warning and every
    /// document is still deleted. Returns the number of documents removed.
    pub fn delete_all_documents(
        &mut self,
        namespace: Option<&str>,
        filter: Option<&Filter>,
    ) -> Result<usize> {
        let namespace = self.resolve(namespace);
        if filter.is_some() {
            ConsistencyWarning::FilterIgnored {
                operation: "delete_all_documents",
            }
            .emit();
        }
        if let Some(handle) = self.registry.get_mut(&namespace) {
            handle.reset();
        }
        let removed = self.metadata.delete_all(&namespace, None)?;
        tracing::debug!(namespace = %namespace, removed, "deleted all documents");
        Ok(removed)
    }

    /// Lazily streams the namespace's documents in write order.
    ///
    /// Each call starts a fresh scan. When embeddings are requested, each
    /// document that has a `vector_id` gets its vector reconstructed as it is
    /// yielded.
    pub fn get_all_documents_generator(
        &self,
        namespace: Option<&str>,
        filter: Option<Filter>,
        return_embedding: Option<bool>,
        batch_size: Option<usize>,
    ) -> Result<impl Iterator<Item = Result<Document>> + '_> {
        let namespace = self.resolve(namespace);
        let batch_size = self.batch_size(batch_size)?;
        let handle = if self.want_embedding(return_embedding) {
            self.registry.get(&namespace)
        } else {
            None
        };

        let pages = DocumentPages::new(
            Arc::clone(&self.metadata),
            namespace,
            filter,
            false,
            batch_size,
        );
        Ok(pages.map(move |doc| {
            let mut doc = doc?;
            if let Some(handle) = handle {
                attach_embedding(handle, &mut doc)?;
            }
            Ok(doc)
        }))
    }

    /// Collects [`Self::get_all_documents_generator`] into a vector.
    pub fn get_all_documents(
        &self,
        namespace: Option<&str>,
        filter: Option<Filter>,
        return_embedding: Option<bool>,
        batch_size: Option<usize>,
    ) -> Result<Vec<Document>> {
        self.get_all_documents_generator(namespace, filter, return_embedding, batch_size)?
            .collect()
    }

    /// Looks documents up by id, skipping unknown ids. Embeddings are attached
    /// when the store returns embeddings by default.
    pub fn get_documents_by_id(
        &self,
        ids: &[String],
        namespace: Option<&str>,
    ) -> Result<Vec<Document>> {
        let namespace = self.resolve(namespace);
        let mut documents = self.metadata.get_by_ids(&namespace, ids)?;
        if self.config.return_embedding {
            if let Some(handle) = self.registry.get(&namespace) {
                for doc in &mut documents {
                    attach_embedding(handle, doc)?;
                }
            }
        }
        Ok(documents)
    }

    pub fn get_document_by_id(&self, id: &str, namespace: Option<&str>) -> Result<Option<Document>> {
        Ok(self
            .get_documents_by_id(&[id.to_string()], namespace)?
            .into_iter()
            .next())
    }

    /// Number of documents in the namespace, optionally filtered.
    pub fn get_document_count(
        &self,
        filter: Option<&Filter>,
        namespace: Option<&str>,
    ) -> Result<usize> {
        let namespace = self.resolve(namespace);
        self.metadata.count(&namespace, filter, false)
    }

    /// Number of vectors in the namespace's index; 0 without an index.
    pub fn get_embedding_count(&self, namespace: Option<&str>) -> usize {
        self.index(namespace).map_or(0, VectorIndexHandle::len)
    }
}

fn attach_embedding(handle: &VectorIndexHandle, doc: &mut Document) -> Result<()> {
    if let Some(vector_id) = doc.vector_id() {
        doc.embedding = Some(handle.reconstruct(vector_id)?);
    }
    Ok(())
}

/// Fails on the first id that repeats within `documents` or already exists.
fn ensure_new_ids(
    metadata: &dyn MetadataStore,
    namespace: &str,
    documents: &[Document],
) -> Result<()> {
    let mut seen = HashSet::with_capacity(documents.len());
    for doc in documents {
        if !seen.insert(doc.id.as_str()) {
            return Err(Error::DuplicateDocument(doc.id.clone()));
        }
    }
    let ids: Vec<String> = documents.iter().map(|doc| doc.id.clone()).collect();
    match metadata.get_by_ids(namespace, &ids)?.into_iter().next() {
        Some(existing) => Err(Error::DuplicateDocument(existing.id)),
        None => Ok(()),
    }
}

/// Copies the tuning an existing index was built with into `params`.
fn adopt_index_params(params: &mut IndexParams, topology: &Topology) {
    match topology {
        Topology::Flat(_) => {}
        Topology::Hnsw(hnsw) => {
            let graph = hnsw.config();
            params.n_links = graph.m;
            params.ef_search = graph.ef_search;
            params.ef_construction = graph.ef_construction;
        }
        Topology::Ivf(ivf) => params.nprobe = ivf.nprobe(),
    }
}

// Async API when tokio feature is enabled
#[cfg(feature = "async")]
mod async_api {
    use super::*;
    use std::path::PathBuf;

    use parking_lot::RwLock;

    /// Async wrapper for DocumentStore.
    ///
    /// Every call runs on tokio's blocking pool. Writers take the store's
    /// lock exclusively, so concurrent mutations of one namespace are
    /// serialized.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use tandemdb_core::{AsyncDocumentStore, Document, DocumentStore, StoreConfig};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let store = DocumentStore::open(StoreConfig::new(4), "memory://").unwrap();
    ///     let store = AsyncDocumentStore::from_sync(store);
    ///
    ///     let doc = Document::new("hello").with_embedding(vec![1.0f32, 0.0, 0.0, 0.0]);
    ///     store.write(vec![doc], None, None).await.unwrap();
    ///     let hits = store.query_by_embedding(vec![1.0, 0.0, 0.0, 0.0], None, 1).await.unwrap();
    /// }
    /// ```
    #[derive(Clone)]
    pub struct AsyncDocumentStore {
        inner: Arc<RwLock<DocumentStore>>,
    }

    async fn blocking<T, F>(f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| Error::Task(format!("spawn_blocking failed: {}", e)))?
    }

    impl AsyncDocumentStore {
        /// Opens a store asynchronously.
        pub async fn open(config: StoreConfig, connection: String) -> Result<Self> {
            let store = blocking(move || DocumentStore::open(config, &connection)).await?;
            Ok(Self::from_sync(store))
        }

        /// Wraps an existing DocumentStore in an async wrapper.
        pub fn from_sync(store: DocumentStore) -> Self {
            Self {
                inner: Arc::new(RwLock::new(store)),
            }
        }

        pub async fn write(
            &self,
            documents: Vec<Document>,
            namespace: Option<String>,
            batch_size: Option<usize>,
        ) -> Result<WriteReport> {
            let inner = Arc::clone(&self.inner);
            blocking(move || inner.write().write(documents, namespace.as_deref(), batch_size))
                .await
        }

        pub async fn update_embeddings<E>(
            &self,
            embedder: Arc<E>,
            namespace: Option<String>,
            update_existing: bool,
            filter: Option<Filter>,
            batch_size: Option<usize>,
        ) -> Result<UpdateReport>
        where
            E: Embedder + Send + Sync + ?Sized + 'static,
        {
            let inner = Arc::clone(&self.inner);
            blocking(move || {
                inner.write().update_embeddings(
                    &*embedder,
                    namespace.as_deref(),
                    update_existing,
                    filter,
                    batch_size,
                )
            })
            .await
        }

        pub async fn query_by_embedding(
            &self,
            query: Vec<f32>,
            namespace: Option<String>,
            top_k: usize,
        ) -> Result<Vec<Document>> {
            let inner = Arc::clone(&self.inner);
            blocking(move || {
                inner
                    .read()
                    .query_by_embedding(&query, namespace.as_deref(), top_k, None, None)
            })
            .await
        }

        pub async fn train_index(
            &self,
            embeddings: Vec<Vec<f32>>,
            namespace: Option<String>,
        ) -> Result<()> {
            let inner = Arc::clone(&self.inner);
            blocking(move || {
                inner
                    .write()
                    .train_index(None, Some(&embeddings), namespace.as_deref())
            })
            .await
        }

        pub async fn delete_all_documents(&self, namespace: Option<String>) -> Result<usize> {
            let inner = Arc::clone(&self.inner);
            blocking(move || inner.write().delete_all_documents(namespace.as_deref(), None)).await
        }

        pub async fn get_all_documents(
            &self,
            namespace: Option<String>,
            filter: Option<Filter>,
        ) -> Result<Vec<Document>> {
            let inner = Arc::clone(&self.inner);
            blocking(move || {
                inner
                    .read()
                    .get_all_documents(namespace.as_deref(), filter, None, None)
            })
            .await
        }

        pub async fn get_documents_by_id(
            &self,
            ids: Vec<String>,
            namespace: Option<String>,
        ) -> Result<Vec<Document>> {
            let inner = Arc::clone(&self.inner);
            blocking(move || inner.read().get_documents_by_id(&ids, namespace.as_deref())).await
        }

        pub async fn get_document_count(&self, namespace: Option<String>) -> Result<usize> {
            let inner = Arc::clone(&self.inner);
            blocking(move || inner.read().get_document_count(None, namespace.as_deref())).await
        }

        pub async fn get_embedding_count(&self, namespace: Option<String>) -> Result<usize> {
            let inner = Arc::clone(&self.inner);
            blocking(move || Ok(inner.read().get_embedding_count(namespace.as_deref()))).await
        }

        /// Saves the namespace's index asynchronously.
        pub async fn save(&self, path: PathBuf, namespace: Option<String>) -> Result<()> {
            let inner = Arc::clone(&self.inner);
            blocking(move || inner.read().save(&path, namespace.as_deref())).await
        }
    }
}

#[cfg(feature = "async")]
pub use async_api::AsyncDocumentStore;
