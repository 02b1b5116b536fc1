//! Durable metadata store: a write-ahead log replayed into memory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::memory::MemoryMetadataStore;
use super::{MetadataStore, Page, PageRequest};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::storage::{SyncMode, Wal};
use crate::vector::VectorId;

const LOG_FILE: &str = "metadata.wal";

/// One logged mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum LogRecord {
    Write {
        namespace: String,
        documents: Vec<Document>,
    },
    UpdateVectorIds {
        namespace: String,
        assignments: HashMap<String, VectorId>,
    },
    DeleteAll {
        namespace: String,
        filter: Option<Filter>,
    },
}

/// A [`MetadataStore`] that survives restarts.
///
/// Every mutation is appended to `<dir>/metadata.wal` before it is applied
/// to the in-memory state; opening the directory replays the log. Writes are
/// serialized by the log lock, so a duplicate check and the write it guards
/// cannot interleave with another mutation.
///
/// # Example
///
/// ```no_run
/// use tandemdb_core::metadata::{LogMetadataStore, MetadataStore};
/// use tandemdb_core::storage::SyncMode;
/// use tandemdb_core::Document;
///
/// let store = LogMetadataStore::open("./metadata", SyncMode::Immediate).unwrap();
/// store
///     .write_documents("document", vec![Document::new("hello")], false)
///     .unwrap();
/// ```
pub struct LogMetadataStore {
    dir: PathBuf,
    state: MemoryMetadataStore,
    wal: Mutex<Wal<LogRecord>>,
}

impl LogMetadataStore {
    /// Opens or creates a store in `dir`.
    pub fn open<P: AsRef<Path>>(dir: P, sync_mode: SyncMode) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if dir.exists() && !dir.is_dir() {
            return Err(Error::Metadata(format!(
                "{} exists and is not a directory",
                dir.display()
            )));
        }
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Io(format!("create dir {} failed: {}", dir.display(), e)))?;

        let path = dir.join(LOG_FILE);
        let records: Vec<LogRecord> = Wal::read_all(&path)?;
        let state = MemoryMetadataStore::new();
        let replayed = records.len();
        for record in records {
            apply(&state, record);
        }
        tracing::info!(path = %path.display(), records = replayed, "replayed metadata log");

        let wal = Wal::open(&path, sync_mode)?;
        Ok(Self {
            dir,
            state,
            wal: Mutex::new(wal),
        })
    }

    /// Directory holding the log.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rewrites the log as one write record per namespace.
    pub fn compact(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        let records: Vec<LogRecord> = self
            .state
            .snapshot()
            .into_iter()
            .map(|(namespace, documents)| LogRecord::Write {
                namespace,
                documents,
            })
            .collect();
        wal.rewrite(&records)?;
        tracing::info!(namespaces = records.len(), "compacted metadata log");
        Ok(())
    }

    /// Forces buffered log records to disk.
    pub fn sync(&self) -> Result<()> {
        self.wal.lock().sync()
    }
}

fn apply(state: &MemoryMetadataStore, record: LogRecord) -> usize {
    match record {
        LogRecord::Write {
            namespace,
            documents,
        } => {
            let written = documents.len();
            state.apply_write(&namespace, documents);
            written
        }
        LogRecord::UpdateVectorIds {
            namespace,
            assignments,
        } => state.apply_vector_ids(&namespace, &assignments),
        LogRecord::DeleteAll { namespace, filter } => {
            state.apply_delete(&namespace, filter.as_ref())
        }
    }
}

impl MetadataStore for LogMetadataStore {
    fn write_documents(
        &self,
        namespace: &str,
        documents: Vec<Document>,
        overwrite: bool,
    ) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut wal = self.wal.lock();
        self.state.check_write(namespace, &documents, overwrite)?;

        let record = LogRecord::Write {
            namespace: namespace.to_string(),
            documents: documents
                .into_iter()
                .map(super::strip_for_storage)
                .collect(),
        };
        wal.append(&record)?;
        apply(&self.state, record);
        Ok(())
    }

    fn fetch_page(&self, namespace: &str, request: &PageRequest) -> Result<Page> {
        self.state.fetch_page(namespace, request)
    }

    fn get_by_ids(&self, namespace: &str, ids: &[String]) -> Result<Vec<Document>> {
        self.state.get_by_ids(namespace, ids)
    }

    fn get_by_vector_ids(
        &self,
        namespace: &str,
        vector_ids: &[VectorId],
    ) -> Result<Vec<Document>> {
        self.state.get_by_vector_ids(namespace, vector_ids)
    }

    fn update_vector_ids(
        &self,
        namespace: &str,
        assignments: &HashMap<String, VectorId>,
    ) -> Result<()> {
        if assignments.is_empty() {
            return Ok(());
        }
        let mut wal = self.wal.lock();
        let record = LogRecord::UpdateVectorIds {
            namespace: namespace.to_string(),
            assignments: assignments.clone(),
        };
        wal.append(&record)?;
        apply(&self.state, record);
        Ok(())
    }

    fn count(
        &self,
        namespace: &str,
        filter: Option<&Filter>,
        only_without_vector: bool,
    ) -> Result<usize> {
        self.state.count(namespace, filter, only_without_vector)
    }

    fn delete_all(&self, namespace: &str, filter: Option<&Filter>) -> Result<usize> {
        let mut wal = self.wal.lock();
        let record = LogRecord::DeleteAll {
            namespace: namespace.to_string(),
            filter: filter.cloned(),
        };
        wal.append(&record)?;
        Ok(apply(&self.state, record))
    }
}
