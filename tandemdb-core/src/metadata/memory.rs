//! In-process metadata store.

use std::collections::{BTreeMap, HashMap, HashSet};

use parking_lot::RwLock;

use super::{is_eligible, strip_for_storage, Cursor, MetadataStore, Page, PageRequest};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::vector::VectorId;

/// Documents of one namespace, in insertion order.
#[derive(Debug, Default)]
struct Namespace {
    docs: BTreeMap<Cursor, Document>,
    by_id: HashMap<String, Cursor>,
    by_vector: HashMap<VectorId, Cursor>,
    next_seq: Cursor,
}

impl Namespace {
    fn check_write(&self, documents: &[Document], overwrite: bool) -> Result<()> {
        if overwrite {
            return Ok(());
        }
        let mut batch_ids = HashSet::with_capacity(documents.len());
        for doc in documents {
            if self.by_id.contains_key(&doc.id) || !batch_ids.insert(doc.id.as_str()) {
                return Err(Error::DuplicateDocument(doc.id.clone()));
            }
        }
        Ok(())
    }

    fn insert(&mut self, document: Document) {
        let document = strip_for_storage(document);
        let seq = match self.by_id.get(&document.id) {
            Some(&seq) => {
                if let Some(old) = self.docs.get(&seq).and_then(Document::vector_id) {
                    self.unlink_vector(old, seq);
                }
                seq
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.by_id.insert(document.id.clone(), seq);
                seq
            }
        };
        if let Some(vector_id) = document.vector_id() {
            self.by_vector.insert(vector_id, seq);
        }
        self.docs.insert(seq, document);
    }

    fn unlink_vector(&mut self, vector_id: VectorId, seq: Cursor) {
        if self.by_vector.get(&vector_id) == Some(&seq) {
            self.by_vector.remove(&vector_id);
        }
    }

    fn stamp(&mut self, id: &str, vector_id: VectorId) -> bool {
        let Some(&seq) = self.by_id.get(id) else {
            return false;
        };
        let old = self.docs.get(&seq).and_then(Document::vector_id);
        if let Some(old) = old {
            self.unlink_vector(old, seq);
        }
        if let Some(doc) = self.docs.get_mut(&seq) {
            doc.meta.set_vector_id(vector_id);
        }
        self.by_vector.insert(vector_id, seq);
        true
    }

    fn delete(&mut self, filter: Option<&Filter>) -> usize {
        let Some(filter) = filter else {
            let removed = self.docs.len();
            self.docs.clear();
            self.by_id.clear();
            self.by_vector.clear();
            return removed;
        };

        let doomed: Vec<Cursor> = self
            .docs
            .iter()
            .filter(|(_, doc)| filter.matches_document(doc))
            .map(|(&seq, _)| seq)
            .collect();
        for seq in &doomed {
            if let Some(doc) = self.docs.remove(seq) {
                self.by_id.remove(&doc.id);
                if let Some(vector_id) = doc.vector_id() {
                    self.unlink_vector(vector_id, *seq);
                }
            }
        }
        doomed.len()
    }
}

/// A [`MetadataStore`] held entirely in memory.
///
/// Reads share a lock; every mutation takes it exclusively, so each call
/// is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    namespaces: RwLock<HashMap<String, Namespace>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of namespaces that hold at least one document, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let namespaces = self.namespaces.read();
        let mut names: Vec<String> = namespaces
            .iter()
            .filter(|(_, ns)| !ns.docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn check_write(
        &self,
        namespace: &str,
        documents: &[Document],
        overwrite: bool,
    ) -> Result<()> {
        match self.namespaces.read().get(namespace) {
            Some(ns) => ns.check_write(documents, overwrite),
            None => Namespace::default().check_write(documents, overwrite),
        }
    }

    /// Writes without the duplicate check.
    pub(crate) fn apply_write(&self, namespace: &str, documents: Vec<Document>) {
        let mut namespaces = self.namespaces.write();
        let ns = namespaces.entry(namespace.to_string()).or_default();
        for doc in documents {
            ns.insert(doc);
        }
    }

    pub(crate) fn apply_vector_ids(
        &self,
        namespace: &str,
        assignments: &HashMap<String, VectorId>,
    ) -> usize {
        let mut namespaces = self.namespaces.write();
        let Some(ns) = namespaces.get_mut(namespace) else {
            return 0;
        };
        let mut stamped = 0;
        for (id, &vector_id) in assignments {
            if ns.stamp(id, vector_id) {
                stamped += 1;
            }
        }
        stamped
    }

    pub(crate) fn apply_delete(&self, namespace: &str, filter: Option<&Filter>) -> usize {
        self.namespaces
            .write()
            .get_mut(namespace)
            .map_or(0, |ns| ns.delete(filter))
    }

    /// Every namespace with its documents in insertion order.
    pub(crate) fn snapshot(&self) -> Vec<(String, Vec<Document>)> {
        let namespaces = self.namespaces.read();
        let mut snapshot: Vec<(String, Vec<Document>)> = namespaces
            .iter()
            .filter(|(_, ns)| !ns.docs.is_empty())
            .map(|(name, ns)| (name.clone(), ns.docs.values().cloned().collect()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn write_documents(
        &self,
        namespace: &str,
        documents: Vec<Document>,
        overwrite: bool,
    ) -> Result<()> {
        let mut namespaces = self.namespaces.write();
        let ns = namespaces.entry(namespace.to_string()).or_default();
        ns.check_write(&documents, overwrite)?;
        for doc in documents {
            ns.insert(doc);
        }
        Ok(())
    }

    fn fetch_page(&self, namespace: &str, request: &PageRequest) -> Result<Page> {
        if request.limit == 0 {
            return Err(Error::config("page limit must be positive"));
        }
        let namespaces = self.namespaces.read();
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Page::default());
        };

        let start = request.after.map_or(0, |after| after.saturating_add(1));
        let mut documents = Vec::with_capacity(request.limit);
        let mut last = None;
        for (&seq, doc) in ns.docs.range(start..) {
            if !is_eligible(doc, request.filter.as_ref(), request.only_without_vector) {
                continue;
            }
            documents.push(doc.clone());
            last = Some(seq);
            if documents.len() == request.limit {
                break;
            }
        }

        let next = if documents.len() == request.limit {
            last
        } else {
            None
        };
        Ok(Page { documents, next })
    }

    fn get_by_ids(&self, namespace: &str, ids: &[String]) -> Result<Vec<Document>> {
        let namespaces = self.namespaces.read();
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| ns.by_id.get(id))
            .filter_map(|seq| ns.docs.get(seq))
            .cloned()
            .collect())
    }

    fn get_by_vector_ids(
        &self,
        namespace: &str,
        vector_ids: &[VectorId],
    ) -> Result<Vec<Document>> {
        let namespaces = self.namespaces.read();
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };
        Ok(vector_ids
            .iter()
            .filter_map(|vector_id| ns.by_vector.get(vector_id))
            .filter_map(|seq| ns.docs.get(seq))
            .cloned()
            .collect())
    }

    fn update_vector_ids(
        &self,
        namespace: &str,
        assignments: &HashMap<String, VectorId>,
    ) -> Result<()> {
        let stamped = self.apply_vector_ids(namespace, assignments);
        if stamped < assignments.len() {
            tracing::debug!(
                namespace,
                requested = assignments.len(),
                stamped,
                "some vector id assignments named unknown documents"
            );
        }
        Ok(())
    }

    fn count(
        &self,
        namespace: &str,
        filter: Option<&Filter>,
        only_without_vector: bool,
    ) -> Result<usize> {
        let namespaces = self.namespaces.read();
        Ok(namespaces.get(namespace).map_or(0, |ns| {
            if filter.is_none() && !only_without_vector {
                ns.docs.len()
            } else {
                ns.docs
                    .values()
                    .filter(|doc| is_eligible(doc, filter, only_without_vector))
                    .count()
            }
        }))
    }

    fn delete_all(&self, namespace: &str, filter: Option<&Filter>) -> Result<usize> {
        Ok(self.apply_delete(namespace, filter))
    }
}
