//! One named vector index and everything needed to rebuild it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index::factory::{build_topology, IndexParams};
use crate::index::{AnnIndex, Capabilities, SearchHit, Topology};
use crate::similarity::Similarity;
use crate::storage::index_file;
use crate::vector::{Vector, VectorBatch, VectorId};

/// A vector index together with the descriptor it was built from.
///
/// The handle validates every input width against the index dimension, so
/// topologies only ever see well-formed batches. Vector ids are positional:
/// the next vector appended gets id [`VectorIndexHandle::next_vector_id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexHandle {
    descriptor: String,
    index: Topology,
}

impl VectorIndexHandle {
    /// Builds an empty index from a factory descriptor.
    ///
    /// # Errors
    ///
    /// `Configuration` for any similarity but inner product, or for a
    /// descriptor outside the supported grammar.
    ///
    /// # Example
    ///
    /// ```
    /// use tandemdb_core::{IndexParams, Similarity, VectorIndexHandle};
    ///
    /// let handle =
    ///     VectorIndexHandle::create(4, "Flat", Similarity::DotProduct, &IndexParams::default())
    ///         .unwrap();
    /// assert_eq!(handle.dimension(), 4);
    /// assert!(handle.is_empty());
    /// ```
    pub fn create(
        dimension: usize,
        descriptor: &str,
        similarity: Similarity,
        params: &IndexParams,
    ) -> Result<Self> {
        let index = build_topology(dimension, descriptor, similarity, params)?;
        tracing::debug!(dimension, descriptor, kind = index.kind(), "created vector index");
        Ok(Self {
            descriptor: descriptor.trim().to_string(),
            index,
        })
    }

    /// The factory descriptor this index was built from.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn is_trained(&self) -> bool {
        self.index.is_trained()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.index.capabilities()
    }

    /// Id the next appended vector will receive.
    pub fn next_vector_id(&self) -> VectorId {
        self.len() as VectorId
    }

    /// The underlying topology.
    pub fn topology(&self) -> &Topology {
        &self.index
    }

    /// Trains the partitioning. Safe to call on topologies without one.
    pub fn train(&mut self, batch: &VectorBatch) -> Result<()> {
        batch.ensure_dimension(self.dimension())?;
        if !self.capabilities().requires_training {
            return Ok(());
        }
        self.index.train(batch)
    }

    /// Appends vectors in order; the first gets [`Self::next_vector_id`].
    pub fn add(&mut self, batch: &VectorBatch) -> Result<()> {
        batch.ensure_dimension(self.dimension())?;
        if batch.is_empty() {
            return Ok(());
        }
        if !self.is_trained() {
            return Err(Error::config(format!(
                "index '{}' must be trained before vectors are added",
                self.descriptor
            )));
        }
        self.index.add(batch)
    }

    /// Returns `min(k, len)` slots by descending score. Slots the topology
    /// could not fill (an inverted file probes only some lists) hold
    /// [`SearchHit::sentinel`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimension() {
            return Err(Error::DimensionMismatch {
                expected: self.dimension(),
                got: query.len(),
            });
        }
        let k = k.min(self.len());
        let mut hits = self.index.search(query, k);
        hits.resize(k, SearchHit::sentinel());
        Ok(hits)
    }

    /// The stored vector at `id`.
    pub fn reconstruct(&self, id: VectorId) -> Result<Vector> {
        self.index
            .reconstruct(id)
            .map(Vector::new)
            .ok_or(Error::VectorNotFound(id))
    }

    /// Drops every vector. Ids restart at 0; training is kept.
    pub fn reset(&mut self) {
        self.index.reset();
    }

    /// Writes the full index state to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        index_file::write(path.as_ref(), self)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            vectors = self.len(),
            "saved vector index"
        );
        Ok(())
    }

    /// Restores an index written by [`Self::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let handle: Self = index_file::read(path.as_ref())?;
        tracing::debug!(
            path = %path.as_ref().display(),
            vectors = handle.len(),
            descriptor = %handle.descriptor,
            "loaded vector index"
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir()
            .join("tandemdb_test_handle")
            .join(format!("index_{}_{}.tdbx", std::process::id(), id))
    }

    fn create(descriptor: &str, dimension: usize) -> VectorIndexHandle {
        VectorIndexHandle::create(
            dimension,
            descriptor,
            Similarity::DotProduct,
            &IndexParams::default(),
        )
        .unwrap()
    }

    fn rows(n: usize, dim: usize) -> VectorBatch {
        let rows: Vec<Vec<f32>> = (0..n)
            .map(|i| (0..dim).map(|j| ((i * 31 + j * 7) as f32).sin()).collect())
            .collect();
        VectorBatch::from_rows(dim, &rows).unwrap()
    }

    #[test]
    fn test_search_clamps_k_to_len() {
        let mut handle = create("Flat", 2);
        handle
            .add(&VectorBatch::from_rows(2, &[[1.0f32, 0.0]]).unwrap())
            .unwrap();

        let hits = handle.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 0);

        let hits = handle.search(&[1.0, 0.0], usize::MAX).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(create("Flat", 2).search(&[1.0, 0.0], usize::MAX).unwrap().is_empty());
    }

    #[test]
    fn test_search_pads_unprobed_slots_with_sentinels() {
        let params = IndexParams::default().with_nprobe(1);
        let mut handle =
            VectorIndexHandle::create(2, "IVF2,Flat", Similarity::DotProduct, &params).unwrap();
        let points =
            VectorBatch::from_rows(2, &[[1.0f32, 0.0], [0.9, 0.1], [0.0, 1.0], [0.1, 0.9]])
                .unwrap();
        handle.train(&points).unwrap();
        handle.add(&points).unwrap();

        let hits = handle.search(&[1.0, 0.0], 4).unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].vector_id(), Some(0));
        assert_eq!(hits[1].vector_id(), Some(1));
        assert!(hits[2].is_sentinel());
        assert!(hits[3].is_sentinel());
    }

    #[test]
    fn test_query_dimension_checked() {
        let handle = create("Flat", 4);
        assert!(matches!(
            handle.search(&[1.0, 0.0], 1),
            Err(Error::DimensionMismatch { expected: 4, got: 2 })
        ));
    }

    #[test]
    fn test_train_checks_dimension_even_without_training() {
        let mut handle = create("Flat", 4);
        assert!(handle.train(&rows(3, 4)).is_ok());
        assert!(matches!(
            handle.train(&rows(3, 2)),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_untrained_ivf_rejects_add() {
        let mut handle = create("IVF2,Flat", 4);
        assert!(matches!(
            handle.add(&rows(3, 4)),
            Err(Error::Configuration(_))
        ));
        handle.train(&rows(20, 4)).unwrap();
        handle.add(&rows(3, 4)).unwrap();
        assert_eq!(handle.next_vector_id(), 3);
    }

    #[test]
    fn test_reconstruct_unknown_id() {
        let handle = create("Flat", 4);
        assert!(matches!(handle.reconstruct(0), Err(Error::VectorNotFound(0))));
    }

    #[test]
    fn test_save_load_round_trip_is_bit_exact() {
        for descriptor in ["Flat", "HNSW", "HNSW8,Flat", "IVF4,Flat", "IVF4_HNSW4,Flat"] {
            let mut handle = create(descriptor, 8);
            handle.train(&rows(64, 8)).unwrap();
            handle.add(&rows(40, 8)).unwrap();

            let path = temp_path();
            handle.save(&path).unwrap();
            let loaded = VectorIndexHandle::load(&path).unwrap();

            assert_eq!(loaded.descriptor(), descriptor);
            assert_eq!(loaded.len(), handle.len());
            assert_eq!(loaded.dimension(), handle.dimension());
            assert_eq!(loaded.is_trained(), handle.is_trained());

            let query: Vec<f32> = (0..8).map(|j| (j as f32 * 0.3).cos()).collect();
            let before = handle.search(&query, 5).unwrap();
            let after = loaded.search(&query, 5).unwrap();
            for (a, b) in before.iter().zip(&after) {
                assert_eq!(a.id, b.id);
                assert_eq!(a.score.to_bits(), b.score.to_bits());
            }
            std::fs::remove_file(&path).unwrap();
        }
    }
}
