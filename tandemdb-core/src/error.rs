//! Error and warning types for TandemDB operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using TandemDB's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during TandemDB operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid store or index configuration, or an invalid combination of arguments.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The namespace has no vector index yet.
    #[error("no vector index for namespace '{0}'")]
    IndexNotFound(String),

    /// Vector dimension mismatch between index and input.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The embedder produced a different number of vectors than documents it was given.
    #[error("embedder returned {got} embeddings for {expected} documents")]
    EmbeddingCountMismatch { expected: usize, got: usize },

    /// No vector was ever written at this position.
    #[error("vector not found: {0}")]
    VectorNotFound(u64),

    /// Partition training could not run.
    #[error("training failed: {0}")]
    Training(String),

    /// Attempted to write a document id that already exists.
    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),

    /// IO error during file operations.
    #[error("io error: {0}")]
    Io(String),

    /// A persisted file failed its format or checksum validation.
    #[error("corrupted file: {0}")]
    Corrupted(String),

    /// Failure reported by the metadata store.
    #[error("metadata store error: {0}")]
    Metadata(String),

    /// A blocking task spawned by the async wrapper panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

/// Non-fatal conditions where an operation proceeds with its documented fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyWarning {
    /// Vectors were written while overwrite-by-id is enabled. The append-only
    /// index keeps the old vectors; `update_embeddings` must be run to reconcile.
    OverwriteWithVectors,
    /// A metadata filter was passed to an operation that does not apply one.
    FilterIgnored { operation: &'static str },
    /// `update_embeddings` found no eligible documents.
    NothingToEmbed { namespace: String },
}

impl ConsistencyWarning {
    /// Logs the warning and hands it back for inclusion in an operation report.
    pub(crate) fn emit(self) -> Self {
        tracing::warn!(warning = %self, "consistency warning");
        self
    }
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyWarning::OverwriteWithVectors => write!(
                f,
                "update_existing_documents is enabled but the vector index cannot overwrite \
                 existing vectors; call update_embeddings to repopulate it"
            ),
            ConsistencyWarning::FilterIgnored { operation } => {
                write!(f, "filters are not supported by {operation} and were ignored")
            }
            ConsistencyWarning::NothingToEmbed { namespace } => {
                write!(f, "update_embeddings called on namespace '{namespace}' with no eligible documents")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DimensionMismatch {
            expected: 768,
            got: 512,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 768, got 512");

        let err = Error::IndexNotFound("faq".into());
        assert_eq!(err.to_string(), "no vector index for namespace 'faq'");
    }

    #[test]
    fn test_warning_display() {
        let w = ConsistencyWarning::FilterIgnored {
            operation: "query_by_embedding",
        };
        assert!(w.to_string().contains("query_by_embedding"));
    }
}
