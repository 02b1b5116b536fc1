//! Approximate nearest neighbor index topologies.
//!
//! Every topology implements [`AnnIndex`], a capability interface of
//! train / add / search / reconstruct / reset. Topologies are append-only:
//! the position a vector is appended at is its [`VectorId`], and the only
//! way to discard vectors is a whole-index [`AnnIndex::reset`].
//!
//! - [`FlatIndex`] - exact inner-product scan
//! - [`HnswIndex`] - graph-based approximate search
//! - [`IvfIndex`] - inverted file over trained partitions; its coarse
//!   quantizer is itself a [`Topology`], which gives the composite variant

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::vector::{VectorBatch, VectorId};

pub mod factory;
pub mod flat;
pub mod handle;
pub mod hnsw;
pub mod ivf;
mod kmeans;

pub use factory::IndexParams;
pub use flat::FlatIndex;
pub use handle::VectorIndexHandle;
pub use hnsw::{HnswConfig, HnswIndex};
pub use ivf::IvfIndex;

/// Id reported for result slots that no vector filled.
pub const SENTINEL_ID: i64 = -1;

/// One ranked search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Inner product between the query and the stored vector.
    pub score: f32,
    /// Vector id, or [`SENTINEL_ID`] for an unfilled slot.
    pub id: i64,
}

impl SearchHit {
    #[inline]
    pub fn new(score: f32, id: VectorId) -> Self {
        Self {
            score,
            id: id as i64,
        }
    }

    /// An unfilled result slot.
    #[inline]
    pub fn sentinel() -> Self {
        Self {
            score: f32::NEG_INFINITY,
            id: SENTINEL_ID,
        }
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.id < 0
    }

    /// The vector id, unless this is a sentinel slot.
    #[inline]
    pub fn vector_id(&self) -> Option<VectorId> {
        u64::try_from(self.id).ok()
    }
}

/// What a topology can and cannot do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `train` must run before `add`.
    pub requires_training: bool,
    /// Search results are exact rather than approximate.
    pub exact: bool,
    /// Individual vectors can be removed. No current topology supports it.
    pub remove_by_id: bool,
}

/// Capability interface shared by all index topologies.
///
/// Implementations assume inputs were validated by [`VectorIndexHandle`]:
/// batch and query widths match [`AnnIndex::dimension`].
pub trait AnnIndex {
    fn dimension(&self) -> usize;

    /// Number of vectors appended since creation or the last reset.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_trained(&self) -> bool;

    fn capabilities(&self) -> Capabilities;

    /// Learns the partitioning. A no-op for topologies without one.
    fn train(&mut self, batch: &VectorBatch) -> Result<()>;

    /// Appends vectors in order; the first gets id `len()`.
    fn add(&mut self, batch: &VectorBatch) -> Result<()>;

    /// Up to `k` hits by descending score, ties broken by lower id.
    fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit>;

    /// The stored vector at `id`, if one was written there.
    fn reconstruct(&self, id: VectorId) -> Option<&[f32]>;

    /// Drops all vectors. Learned partitioning is kept.
    fn reset(&mut self);
}

/// The closed set of index topologies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    Flat(FlatIndex),
    Hnsw(HnswIndex),
    Ivf(IvfIndex),
}

impl Topology {
    fn inner(&self) -> &dyn AnnIndex {
        match self {
            Topology::Flat(index) => index,
            Topology::Hnsw(index) => index,
            Topology::Ivf(index) => index,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AnnIndex {
        match self {
            Topology::Flat(index) => index,
            Topology::Hnsw(index) => index,
            Topology::Ivf(index) => index,
        }
    }

    /// Short topology name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Topology::Flat(_) => "flat",
            Topology::Hnsw(_) => "hnsw",
            Topology::Ivf(_) => "ivf",
        }
    }
}

impl AnnIndex for Topology {
    fn dimension(&self) -> usize {
        self.inner().dimension()
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn is_trained(&self) -> bool {
        self.inner().is_trained()
    }

    fn capabilities(&self) -> Capabilities {
        self.inner().capabilities()
    }

    fn train(&mut self, batch: &VectorBatch) -> Result<()> {
        self.inner_mut().train(batch)
    }

    fn add(&mut self, batch: &VectorBatch) -> Result<()> {
        self.inner_mut().add(batch)
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        self.inner().search(query, k)
    }

    fn reconstruct(&self, id: VectorId) -> Option<&[f32]> {
        self.inner().reconstruct(id)
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }
}

/// A scored candidate where "greater" means "ranks worse", so a max-heap
/// keeps the current worst of the best `k` at its top.
#[derive(Debug, Clone, Copy)]
struct Ranked {
    score: f32,
    id: VectorId,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Selects the best `k` of `(id, score)` pairs, best first.
pub(crate) fn top_k<I>(scored: I, k: usize) -> Vec<SearchHit>
where
    I: IntoIterator<Item = (VectorId, f32)>,
{
    if k == 0 {
        return Vec::new();
    }

    let scored = scored.into_iter();
    let capacity = k.min(scored.size_hint().0).saturating_add(1);
    let mut heap: BinaryHeap<Ranked> = BinaryHeap::with_capacity(capacity);
    for (id, score) in scored {
        let candidate = Ranked { score, id };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|r| SearchHit::new(r.score, r.id))
        .collect()
}

/// Serializes f32 buffers as raw bit patterns so reloads are bit-exact.
pub(crate) mod float_bits {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(data.iter().map(|v| v.to_bits()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let bits = Vec::<u32>::deserialize(deserializer)?;
        Ok(bits.into_iter().map(f32::from_bits).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_orders_by_score_then_id() {
        let hits = top_k(vec![(0, 0.5), (1, 0.9), (2, 0.9), (3, 0.1)], 3);
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_top_k_fewer_candidates_than_k() {
        let hits = top_k(vec![(4, 1.0)], 10);
        assert_eq!(hits.len(), 1);
        assert!(top_k(Vec::<(VectorId, f32)>::new(), 3).is_empty());
        assert!(top_k(vec![(0, 1.0)], 0).is_empty());
    }

    #[test]
    fn test_top_k_unbounded_k() {
        let hits = top_k(vec![(0, 0.2), (1, 0.8)], usize::MAX);
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 0]);
    }

    #[test]
    fn test_sentinel() {
        let s = SearchHit::sentinel();
        assert!(s.is_sentinel());
        assert_eq!(s.vector_id(), None);
        assert_eq!(SearchHit::new(1.0, 3).vector_id(), Some(3));
    }
}
