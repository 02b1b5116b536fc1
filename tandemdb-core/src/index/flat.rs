//! Flat index for exact inner-product search.
//!
//! Vectors are stored contiguously by id and every search scores all of
//! them. This gives 100% recall at O(n) per query, and it is the storage
//! layer reused by the graph and inverted-file topologies.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::{float_bits, top_k, AnnIndex, Capabilities, SearchHit};
use crate::similarity::inner_product;
use crate::vector::{VectorBatch, VectorId};

/// Exact-search index over contiguous vector storage.
///
/// # Example
///
/// ```
/// use tandemdb_core::index::{AnnIndex, FlatIndex};
/// use tandemdb_core::VectorBatch;
///
/// let mut index = FlatIndex::new(3);
/// let batch = VectorBatch::from_rows(3, &[[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
/// index.add(&batch).unwrap();
///
/// let hits = index.search(&[1.0, 0.0, 0.0], 1);
/// assert_eq!(hits[0].id, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    /// Row-major vectors; row `i` is vector id `i`.
    #[serde(with = "float_bits")]
    data: Vec<f32>,
}

impl FlatIndex {
    /// Creates an empty flat index of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// The vector at `pos`. Callers guarantee `pos < len()`.
    #[inline]
    pub(crate) fn vector(&self, pos: usize) -> &[f32] {
        &self.data[pos * self.dimension..(pos + 1) * self.dimension]
    }

    /// Appends one vector and returns its position.
    pub(crate) fn push(&mut self, vector: &[f32]) -> usize {
        debug_assert_eq!(vector.len(), self.dimension);
        let pos = self.len();
        self.data.extend_from_slice(vector);
        pos
    }

    /// Scores the listed positions against `query` and keeps the best `k`.
    pub(crate) fn search_subset<I>(&self, query: &[f32], ids: I, k: usize) -> Vec<SearchHit>
    where
        I: IntoIterator<Item = VectorId>,
    {
        top_k(
            ids.into_iter()
                .map(|id| (id, inner_product(query, self.vector(id as usize)))),
            k,
        )
    }
}

impl AnnIndex for FlatIndex {
    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            requires_training: false,
            exact: true,
            remove_by_id: false,
        }
    }

    fn train(&mut self, _batch: &VectorBatch) -> Result<()> {
        Ok(())
    }

    fn add(&mut self, batch: &VectorBatch) -> Result<()> {
        batch.ensure_dimension(self.dimension)?;
        self.data.extend_from_slice(batch.as_flat());
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if query.len() != self.dimension {
            return Vec::new();
        }
        self.search_subset(query, 0..self.len() as VectorId, k)
    }

    fn reconstruct(&self, id: VectorId) -> Option<&[f32]> {
        let pos = usize::try_from(id).ok()?;
        (pos < self.len()).then(|| self.vector(pos))
    }

    fn reset(&mut self) {
        self.data.clear();
    }
}
