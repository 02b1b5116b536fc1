//! Inverted-file index over k-means partitions.
//!
//! Training learns `nlist` centroids and loads them into a coarse quantizer,
//! which is itself a [`Topology`]: a flat scan for `IVF<n>,Flat`, or an HNSW
//! graph for the composite `IVF<n>_HNSW<m>,Flat`. Each added vector is routed
//! to its best centroid's list. Search probes the `nprobe` best lists and
//! scores their members exactly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index::flat::FlatIndex;
use crate::index::kmeans::train_centroids;
use crate::index::{AnnIndex, Capabilities, SearchHit, Topology};
use crate::vector::{VectorBatch, VectorId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvfIndex {
    nlist: usize,
    nprobe: usize,
    quantizer: Box<Topology>,
    trained: bool,
    /// Direct map from vector id to stored vector.
    storage: FlatIndex,
    lists: Vec<Vec<VectorId>>,
}

impl IvfIndex {
    /// Creates an untrained inverted file. `quantizer` must be empty and
    /// share the index dimension.
    pub fn new(quantizer: Topology, nlist: usize, nprobe: usize) -> Self {
        let dimension = quantizer.dimension();
        Self {
            nlist,
            nprobe: nprobe.clamp(1, nlist.max(1)),
            quantizer: Box::new(quantizer),
            trained: false,
            storage: FlatIndex::new(dimension),
            lists: vec![Vec::new(); nlist],
        }
    }

    pub fn nlist(&self) -> usize {
        self.nlist
    }

    pub fn nprobe(&self) -> usize {
        self.nprobe
    }

    /// Changes how many lists a search visits.
    pub fn set_nprobe(&mut self, nprobe: usize) {
        self.nprobe = nprobe.clamp(1, self.nlist.max(1));
    }

    /// Size of each inverted list.
    pub fn list_sizes(&self) -> Vec<usize> {
        self.lists.iter().map(Vec::len).collect()
    }

    fn assign(&self, vector: &[f32]) -> Option<usize> {
        self.quantizer
            .search(vector, 1)
            .first()
            .and_then(SearchHit::vector_id)
            .map(|id| id as usize)
    }
}

impl AnnIndex for IvfIndex {
    fn dimension(&self) -> usize {
        self.storage.dimension()
    }

    fn len(&self) -> usize {
        self.storage.len()
    }

    fn is_trained(&self) -> bool {
        self.trained
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            requires_training: true,
            exact: false,
            remove_by_id: false,
        }
    }

    fn train(&mut self, batch: &VectorBatch) -> Result<()> {
        batch.ensure_dimension(self.dimension())?;
        if self.trained && !self.is_empty() {
            return Err(Error::config(
                "cannot retrain an inverted file that already holds vectors; reset it first",
            ));
        }

        let centroids = train_centroids(batch, self.nlist)?;
        let centroids = VectorBatch::from_flat(self.dimension(), centroids)?;

        self.quantizer.reset();
        self.quantizer.add(&centroids)?;
        self.trained = true;
        tracing::debug!(
            nlist = self.nlist,
            points = batch.len(),
            quantizer = self.quantizer.kind(),
            "trained inverted file"
        );
        Ok(())
    }

    fn add(&mut self, batch: &VectorBatch) -> Result<()> {
        if !self.trained {
            return Err(Error::config("inverted file must be trained before add"));
        }
        batch.ensure_dimension(self.dimension())?;

        // Route everything first so a failure leaves the index untouched.
        let mut routes = Vec::with_capacity(batch.len());
        for row in batch.rows() {
            let list = self
                .assign(row)
                .ok_or_else(|| Error::Training("coarse quantizer returned no centroid".into()))?;
            routes.push(list);
        }

        for (row, list) in batch.rows().zip(routes) {
            let id = self.storage.push(row) as VectorId;
            self.lists[list].push(id);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if !self.trained || k == 0 || query.len() != self.dimension() {
            return Vec::new();
        }

        let probes = self.quantizer.search(query, self.nprobe);
        let candidates = probes
            .iter()
            .filter_map(SearchHit::vector_id)
            .flat_map(|list| self.lists[list as usize].iter().copied());
        self.storage.search_subset(query, candidates, k)
    }

    fn reconstruct(&self, id: VectorId) -> Option<&[f32]> {
        self.storage.reconstruct(id)
    }

    fn reset(&mut self) {
        self.storage.reset();
        for list in &mut self.lists {
            list.clear();
        }
    }
}
