//! The embedding collaborator.

use crate::document::Document;
use crate::error::Result;

/// Turns passages into embeddings for [`DocumentStore::update_embeddings`].
///
/// Implementations must return exactly one vector per input document, in
/// input order. Any other count aborts the update.
///
/// Closures implement this trait directly:
///
/// ```
/// use tandemdb_core::{Document, Embedder};
///
/// let embedder = |docs: &[Document]| -> tandemdb_core::Result<Vec<Vec<f32>>> {
///     Ok(docs.iter().map(|d| vec![d.text.len() as f32, 1.0]).collect())
/// };
/// let vectors = embedder.embed_passages(&[Document::new("abc")]).unwrap();
/// assert_eq!(vectors, vec![vec![3.0, 1.0]]);
/// ```
///
/// [`DocumentStore::update_embeddings`]: crate::DocumentStore::update_embeddings
pub trait Embedder {
    fn embed_passages(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>>;
}

impl<F> Embedder for F
where
    F: Fn(&[Document]) -> Result<Vec<Vec<f32>>>,
{
    fn embed_passages(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>> {
        self(documents)
    }
}
