//! Saving and restoring a store's vector index.
//!
//! Only the vector index goes to disk here. The metadata store persists
//! itself (or not, for `memory://`), so a saved index is only meaningful
//! when it is loaded back against the same metadata connection it was saved
//! with. Nothing checks this; mismatched pairs silently return the wrong
//! documents.

use std::path::Path;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::index::VectorIndexHandle;
use crate::metadata::{connect, MetadataStore};
use crate::store::DocumentStore;

impl DocumentStore {
    /// Writes the vector index of `namespace` to `path`.
    ///
    /// # Errors
    ///
    /// `IndexNotFound` if the namespace has no index; `Io` if the file cannot
    /// be written.
    pub fn save<P: AsRef<Path>>(&self, path: P, namespace: Option<&str>) -> Result<()> {
        let namespace = namespace.unwrap_or(&self.config.index);
        let handle = self
            .registry
            .get(namespace)
            .ok_or_else(|| Error::IndexNotFound(namespace.to_string()))?;
        handle.save(path.as_ref())?;
        tracing::info!(
            namespace,
            path = %path.as_ref().display(),
            vectors = handle.len(),
            "saved document store index"
        );
        Ok(())
    }

    /// Restores a store from an index file and a metadata connection.
    ///
    /// The index's dimension and factory descriptor come from the file, and
    /// so does the tuning it was built with (HNSW fan-out and beam widths, IVF
    /// `nprobe`). Everything else takes [`StoreConfig::default`]. The
    /// restored index becomes the default namespace, named `namespace` when
    /// given.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tandemdb_core::DocumentStore;
    ///
    /// let store = DocumentStore::load("faq.tdbx", "file://./faq-metadata", Some("faq")).unwrap();
    /// println!("{} vectors", store.get_embedding_count(None));
    /// ```
    pub fn load<P: AsRef<Path>>(
        path: P,
        connection: &str,
        namespace: Option<&str>,
    ) -> Result<Self> {
        let metadata = connect(connection)?;
        let mut config = StoreConfig::default();
        if let Some(namespace) = namespace {
            config.index = namespace.to_string();
        }
        Self::load_with(path, config, metadata)
    }

    /// Like [`Self::load`], with a caller-supplied config and metadata store.
    ///
    /// `vector_dim`, `factory` and the matching `index_params` in `config`
    /// are replaced by the file's.
    pub fn load_with<P: AsRef<Path>>(
        path: P,
        config: StoreConfig,
        metadata: Arc<dyn MetadataStore>,
    ) -> Result<Self> {
        let handle = VectorIndexHandle::load(path.as_ref())?;
        tracing::info!(
            path = %path.as_ref().display(),
            namespace = %config.index,
            dimension = handle.dimension(),
            vectors = handle.len(),
            "loaded document store index"
        );
        Self::with_index(config, handle, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::index::IndexParams;
    use crate::metadata::MemoryMetadataStore;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join("tandemdb_test_persistence");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(format!("{}_{}_{}.tdbx", name, std::process::id(), id))
    }

    #[test]
    fn test_save_missing_namespace() {
        let store =
            DocumentStore::new(StoreConfig::new(2), Arc::new(MemoryMetadataStore::new())).unwrap();
        let path = temp_path("missing");
        assert!(matches!(
            store.save(&path, Some("nope")),
            Err(Error::IndexNotFound(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_with_shared_metadata() {
        let metadata: Arc<dyn MetadataStore> = Arc::new(MemoryMetadataStore::new());
        let config = StoreConfig::new(3).with_factory("HNSW8").with_index("faq");
        let mut store = DocumentStore::new(config, Arc::clone(&metadata)).unwrap();
        store
            .write(
                vec![
                    Document::with_id("a", "alpha").with_embedding(vec![1.0f32, 0.0, 0.0]),
                    Document::with_id("b", "beta").with_embedding(vec![0.0f32, 1.0, 0.0]),
                ],
                None,
                None,
            )
            .unwrap();
        let path = temp_path("shared");
        store.save(&path, None).unwrap();

        let restored =
            DocumentStore::load_with(&path, StoreConfig::default().with_index("faq"), metadata)
                .unwrap();
        assert_eq!(restored.config().vector_dim, 3);
        assert_eq!(restored.config().factory, "HNSW8");
        assert_eq!(restored.get_embedding_count(Some("faq")), 2);

        let hits = restored
            .query_by_embedding(&[0.0, 1.0, 0.0], None, 1, None, None)
            .unwrap();
        assert_eq!(hits[0].id, "b");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_keeps_index_tuning() {
        let params = IndexParams::default()
            .with_n_links(12)
            .with_ef_search(30)
            .with_nprobe(2);
        let config = StoreConfig::new(2).with_factory("HNSW").with_index_params(params);
        let mut store = DocumentStore::new(config, Arc::new(MemoryMetadataStore::new())).unwrap();
        store
            .write(vec![Document::new("one").with_embedding(vec![1.0f32, 0.0])], None, None)
            .unwrap();
        let path = temp_path("tuned_hnsw");
        store.save(&path, None).unwrap();

        let restored = DocumentStore::load(&path, "memory://", None).unwrap();
        let loaded = &restored.config().index_params;
        assert_eq!(loaded.n_links, 12);
        assert_eq!(loaded.ef_search, 30);
        assert_eq!(loaded.ef_construction, IndexParams::default().ef_construction);
        std::fs::remove_file(&path).unwrap();

        let config = StoreConfig::new(2)
            .with_factory("IVF2,Flat")
            .with_index_params(IndexParams::default().with_nprobe(2));
        let mut store = DocumentStore::new(config, Arc::new(MemoryMetadataStore::new())).unwrap();
        let rows = vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0], vec![0.1, 0.9]];
        store.train_index(None, Some(&rows), None).unwrap();
        let path = temp_path("tuned_ivf");
        store.save(&path, None).unwrap();

        let restored = DocumentStore::load(&path, "memory://", None).unwrap();
        assert_eq!(restored.config().index_params.nprobe, 2);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let path = temp_path("absent");
        assert!(matches!(
            DocumentStore::load(&path, "memory://", None),
            Err(Error::Io(_))
        ));
    }
}
