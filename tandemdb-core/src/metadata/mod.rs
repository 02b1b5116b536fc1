//! The metadata collaborator: text and metadata storage for documents.
//!
//! A [`MetadataStore`] keeps the text/metadata half of every document,
//! partitioned by namespace. The only field the document store interprets is
//! the reserved `vector_id` key, which points into the namespace's vector
//! index. Embeddings are never persisted here; the vector index owns them.
//!
//! Implementations:
//! - [`MemoryMetadataStore`] - in-process, lost on drop
//! - [`LogMetadataStore`] - durable, backed by a write-ahead log

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::storage::SyncMode;
use crate::vector::VectorId;

mod log;
mod memory;

pub use self::log::LogMetadataStore;
pub use self::memory::MemoryMetadataStore;

/// Position of a document in its namespace's insertion order.
pub type Cursor = u64;

/// One page of a keyset-paginated scan.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub filter: Option<Filter>,
    /// Only documents without a `vector_id`.
    pub only_without_vector: bool,
    /// Resume after this cursor. `None` starts from the beginning.
    pub after: Option<Cursor>,
    pub limit: usize,
}

/// Documents of one page plus where to resume.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub documents: Vec<Document>,
    /// Cursor to pass as `after` for the next page, or `None` when the scan
    /// is complete.
    pub next: Option<Cursor>,
}

/// Storage contract for the text/metadata half of the document store.
///
/// All methods take `&self`; implementations synchronize internally.
pub trait MetadataStore: Send + Sync {
    /// Writes documents into `namespace`.
    ///
    /// A document whose id already exists is replaced in place when
    /// `overwrite` is set, and is an error otherwise. The duplicate check
    /// runs before anything is written, so a failed call changes nothing.
    fn write_documents(&self, namespace: &str, documents: Vec<Document>, overwrite: bool)
        -> Result<()>;

    /// Returns up to `request.limit` matching documents in insertion order,
    /// strictly after `request.after`.
    fn fetch_page(&self, namespace: &str, request: &PageRequest) -> Result<Page>;

    /// Looks documents up by id. Unknown ids are skipped; the rest keep the
    /// order of `ids`.
    fn get_by_ids(&self, namespace: &str, ids: &[String]) -> Result<Vec<Document>>;

    /// Looks documents up by the vector id stamped in their metadata.
    /// Unknown ids are skipped; the rest keep the order of `vector_ids`.
    fn get_by_vector_ids(&self, namespace: &str, vector_ids: &[VectorId])
        -> Result<Vec<Document>>;

    /// Stamps `vector_id` on the listed documents. Unknown ids are ignored.
    fn update_vector_ids(&self, namespace: &str, assignments: &HashMap<String, VectorId>)
        -> Result<()>;

    /// Counts matching documents.
    fn count(&self, namespace: &str, filter: Option<&Filter>, only_without_vector: bool)
        -> Result<usize>;

    /// Deletes matching documents (all of them without a filter) and
    /// returns how many were removed.
    fn delete_all(&self, namespace: &str, filter: Option<&Filter>) -> Result<usize>;
}

/// Opens the metadata store named by a connection descriptor.
///
/// - `memory://` selects a [`MemoryMetadataStore`]
/// - `file://<dir>` or a bare directory path selects a [`LogMetadataStore`]
///
/// # Example
///
/// ```
/// use tandemdb_core::metadata::connect;
///
/// let store = connect("memory://").unwrap();
/// assert_eq!(store.count("document", None, false).unwrap(), 0);
/// ```
pub fn connect(descriptor: &str) -> Result<Arc<dyn MetadataStore>> {
    let descriptor = descriptor.trim();
    if descriptor == "memory://" || descriptor == "memory" {
        return Ok(Arc::new(MemoryMetadataStore::new()));
    }

    let dir = match descriptor.strip_prefix("file://") {
        Some(dir) => dir,
        None if descriptor.contains("://") => {
            return Err(Error::config(format!(
                "unsupported metadata connection '{descriptor}'"
            )))
        }
        None => descriptor,
    };
    if dir.is_empty() {
        return Err(Error::config("metadata connection names no directory"));
    }

    let store = LogMetadataStore::open(Path::new(dir), SyncMode::default())?;
    Ok(Arc::new(store))
}

/// A lazy, finite scan over a namespace, one page per metadata-store call.
///
/// Each `DocumentPages` is an independent cursor; building another one
/// restarts from the beginning. Keyset pagination keeps the scan stable
/// while already-visited documents are being stamped with vector ids.
pub struct DocumentPages {
    store: Arc<dyn MetadataStore>,
    namespace: String,
    request: PageRequest,
    buffer: VecDeque<Document>,
    done: bool,
}

impl DocumentPages {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        namespace: impl Into<String>,
        filter: Option<Filter>,
        only_without_vector: bool,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            request: PageRequest {
                filter,
                only_without_vector,
                after: None,
                limit: batch_size.max(1),
            },
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Pulls the next whole page. `Ok(None)` once the scan is complete.
    pub fn next_page(&mut self) -> Result<Option<Vec<Document>>> {
        if !self.buffer.is_empty() {
            return Ok(Some(self.buffer.drain(..).collect()));
        }
        if self.done {
            return Ok(None);
        }

        let page = self.store.fetch_page(&self.namespace, &self.request)?;
        match page.next {
            Some(cursor) => self.request.after = Some(cursor),
            None => self.done = true,
        }
        if page.documents.is_empty() {
            self.done = true;
            return Ok(None);
        }
        Ok(Some(page.documents))
    }
}

impl Iterator for DocumentPages {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            match self.next_page() {
                Ok(Some(documents)) => self.buffer.extend(documents),
                Ok(None) => return None,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

/// Documents as the metadata store keeps them: no embedding, no query scores.
pub(crate) fn strip_for_storage(mut document: Document) -> Document {
    document.embedding = None;
    document.score = None;
    document.probability = None;
    document
}

pub(crate) fn is_eligible(
    document: &Document,
    filter: Option<&Filter>,
    only_without_vector: bool,
) -> bool {
    if only_without_vector && document.vector_id().is_some() {
        return false;
    }
    filter.map_or(true, |f| f.matches_document(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::Meta;

    fn seeded_store(n: usize) -> Arc<dyn MetadataStore> {
        let store = MemoryMetadataStore::new();
        let docs = (0..n)
            .map(|i| {
                Document::with_id(format!("d{i}"), format!("text {i}"))
                    .with_meta(Meta::new().with_field("even", i % 2 == 0))
            })
            .collect();
        store.write_documents("ns", docs, false).unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_connect_descriptors() {
        assert!(connect("memory://").is_ok());
        assert!(matches!(
            connect("postgres://localhost/db"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(connect("file://"), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_pages_yield_everything_in_order() {
        let store = seeded_store(7);
        let ids: Vec<String> = DocumentPages::new(store, "ns", None, false, 3)
            .map(|d| d.unwrap().id)
            .collect();
        let expected: Vec<String> = (0..7).map(|i| format!("d{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_pages_are_restartable_and_filtered() {
        let store = seeded_store(6);
        let filter = Filter::field("even").eq(true);
        let first: Vec<_> = DocumentPages::new(store.clone(), "ns", Some(filter.clone()), false, 2)
            .map(|d| d.unwrap().id)
            .collect();
        let second: Vec<_> = DocumentPages::new(store, "ns", Some(filter), false, 2)
            .map(|d| d.unwrap().id)
            .collect();
        assert_eq!(first, vec!["d0", "d2", "d4"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_pages_stable_while_stamping() {
        let store = seeded_store(5);
        let mut pages = DocumentPages::new(store.clone(), "ns", None, true, 2);
        let mut seen = Vec::new();
        let mut next_id = 0;
        while let Some(page) = pages.next_page().unwrap() {
            let mut assignments = HashMap::new();
            for doc in page {
                assignments.insert(doc.id.clone(), next_id);
                next_id += 1;
                seen.push(doc.id);
            }
            store.update_vector_ids("ns", &assignments).unwrap();
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(store.count("ns", None, true).unwrap(), 0);
    }

    #[test]
    fn test_pages_over_empty_namespace() {
        let store = seeded_store(0);
        assert_eq!(DocumentPages::new(store, "missing", None, false, 10).count(), 0);
    }
}
