//! HNSW (Hierarchical Navigable Small World) graph index.
//!
//! HNSW builds a multi-layer proximity graph:
//! - Layer 0 contains all vectors with dense connections
//! - Higher layers contain fewer vectors with sparser connections (like a skip list)
//! - Search starts at the top layer and greedily descends to layer 0
//!
//! Internally the graph works on distances (`-inner_product`, lower is
//! closer) so the candidate heaps read naturally. Hits are converted back to
//! inner-product scores on the way out.
//!
//! # References
//!
//! - Malkov & Yashunin (2018): "Efficient and robust approximate nearest neighbor search using HNSW graphs"

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::flat::FlatIndex;
use crate::index::{AnnIndex, Capabilities, SearchHit};
use crate::similarity::inner_product;
use crate::vector::{VectorBatch, VectorId};

/// Seed for level assignment. A node's level depends only on its position,
/// so builds are reproducible and a reloaded graph keeps growing the same way.
const LEVEL_SEED: u64 = 0x5eed_4e57;

/// Configuration for HNSW index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Maximum number of connections per node (except layer 0).
    /// Higher = better recall, more memory.
    pub m: usize,
    /// Maximum connections at layer 0 (usually 2*M).
    pub m_max0: usize,
    /// Beam width during construction. Higher = better graph quality, slower build.
    pub ef_construction: usize,
    /// Beam width during search.
    pub ef_search: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self::with_m(32)
    }
}

impl HnswConfig {
    /// Creates config with specified M parameter and the generic beam widths.
    pub fn with_m(m: usize) -> Self {
        Self {
            m,
            m_max0: m * 2,
            ef_construction: 40,
            ef_search: 16,
        }
    }
}

/// Graph links of one stored vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HnswNode {
    /// Maximum layer this node appears in.
    level: usize,
    /// Neighbors at each layer. neighbors[layer] = list of connected positions.
    neighbors: Vec<Vec<usize>>,
}

impl HnswNode {
    fn new(level: usize) -> Self {
        Self {
            level,
            neighbors: vec![Vec::new(); level + 1],
        }
    }
}

/// A candidate during search, ordered by distance (min-heap).
#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: usize,
    distance: f32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (lower distance = higher priority)
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// A candidate for max-heap (furthest first).
#[derive(Debug, Clone, Copy)]
struct FurthestCandidate {
    id: usize,
    distance: f32,
}

impl PartialEq for FurthestCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for FurthestCandidate {}

impl PartialOrd for FurthestCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FurthestCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// HNSW index for approximate inner-product search.
///
/// # Example
///
/// ```
/// use tandemdb_core::index::{AnnIndex, HnswConfig, HnswIndex};
/// use tandemdb_core::VectorBatch;
///
/// let mut index = HnswIndex::new(3, HnswConfig::with_m(8));
/// let batch = VectorBatch::from_rows(
///     3,
///     &[[1.0f32, 0.0, 0.0], [0.9, 0.1, 0.0], [0.0, 1.0, 0.0]],
/// )
/// .unwrap();
/// index.add(&batch).unwrap();
///
/// let hits = index.search(&[1.0, 0.0, 0.0], 2);
/// assert_eq!(hits[0].id, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswIndex {
    config: HnswConfig,
    /// Entry point (node with highest level).
    entry_point: Option<usize>,
    /// Current maximum level in the graph.
    max_level: usize,
    storage: FlatIndex,
    nodes: Vec<HnswNode>,
}

impl HnswIndex {
    /// Creates a new empty HNSW index. `config.m` must be at least 2.
    pub fn new(dimension: usize, config: HnswConfig) -> Self {
        Self {
            config,
            entry_point: None,
            max_level: 0,
            storage: FlatIndex::new(dimension),
            nodes: Vec::new(),
        }
    }

    /// Returns the graph configuration.
    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Draws the level of the node at position `id`.
    fn random_level(&self, id: usize) -> usize {
        let mut rng = StdRng::seed_from_u64(LEVEL_SEED ^ id as u64);
        // (0, 1]: keeps ln() finite.
        let r: f64 = 1.0 - rng.gen::<f64>();
        // Level generation multiplier is 1/ln(M).
        let ml = 1.0 / (self.config.m as f64).ln();
        (-r.ln() * ml).floor() as usize
    }

    #[inline]
    fn distance(&self, query: &[f32], node: usize) -> f32 {
        -inner_product(query, self.storage.vector(node))
    }

    /// Links one vector that was already pushed into `storage` at `id`.
    fn insert(&mut self, id: usize) {
        let query = self.storage.vector(id).to_vec();
        let new_level = self.random_level(id);
        self.nodes.push(HnswNode::new(new_level));

        // First node - make it the entry point
        let Some(entry_point) = self.entry_point else {
            self.entry_point = Some(id);
            self.max_level = new_level;
            return;
        };

        // Phase 1: Greedily traverse from top to new node's level + 1
        let mut current_ep = entry_point;
        for layer in (new_level + 1..=self.max_level).rev() {
            current_ep = self.greedy_search_single(&query, current_ep, layer);
        }

        // Phase 2: Search and connect at each layer from new_level down to 0
        let mut ep_set = vec![current_ep];
        for layer in (0..=new_level.min(self.max_level)).rev() {
            let candidates =
                self.search_layer(&query, &ep_set, self.config.ef_construction, layer);

            let m = if layer == 0 {
                self.config.m_max0
            } else {
                self.config.m
            };
            let neighbors = select_neighbors(&candidates, m);

            self.nodes[id].neighbors[layer] = neighbors.clone();

            // Connect neighbors back to new node (bidirectional)
            for &neighbor_id in &neighbors {
                self.nodes[neighbor_id].neighbors[layer].push(id);

                if self.nodes[neighbor_id].neighbors[layer].len() > m {
                    let neighbor_vec = self.storage.vector(neighbor_id);
                    let neighbor_neighbors: Vec<_> = self.nodes[neighbor_id].neighbors[layer]
                        .iter()
                        .map(|&nid| Candidate {
                            id: nid,
                            distance: -inner_product(neighbor_vec, self.storage.vector(nid)),
                        })
                        .collect();

                    let pruned = select_neighbors(&neighbor_neighbors, m);
                    self.nodes[neighbor_id].neighbors[layer] = pruned;
                }
            }

            // Use current layer's results as entry points for next layer
            ep_set = candidates.iter().map(|c| c.id).collect();
        }

        if new_level > self.max_level {
            self.entry_point = Some(id);
            self.max_level = new_level;
        }
    }

    /// Greedy search for a single nearest neighbor at a layer.
    fn greedy_search_single(&self, query: &[f32], entry: usize, layer: usize) -> usize {
        let mut current = entry;
        let mut current_dist = self.distance(query, current);

        loop {
            let mut changed = false;
            let node = &self.nodes[current];

            if layer < node.neighbors.len() {
                for &neighbor_id in &node.neighbors[layer] {
                    let dist = self.distance(query, neighbor_id);
                    if dist < current_dist {
                        current = neighbor_id;
                        current_dist = dist;
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        current
    }

    /// Search a layer with ef candidates. Results are sorted closest first.
    fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[usize],
        ef: usize,
        layer: usize,
    ) -> Vec<Candidate> {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut candidates: BinaryHeap<Candidate> = BinaryHeap::new();
        let mut results: BinaryHeap<FurthestCandidate> = BinaryHeap::new();

        for &ep in entry_points {
            if visited.insert(ep) {
                let dist = self.distance(query, ep);
                candidates.push(Candidate {
                    id: ep,
                    distance: dist,
                });
                results.push(FurthestCandidate {
                    id: ep,
                    distance: dist,
                });
            }
        }

        while let Some(closest) = candidates.pop() {
            // Stop if closest candidate is further than worst result
            if let Some(furthest) = results.peek() {
                if closest.distance > furthest.distance && results.len() >= ef {
                    break;
                }
            }

            let node = &self.nodes[closest.id];
            if layer >= node.neighbors.len() {
                continue;
            }
            for &neighbor_id in &node.neighbors[layer] {
                if !visited.insert(neighbor_id) {
                    continue;
                }
                let dist = self.distance(query, neighbor_id);
                let should_add = results.len() < ef
                    || dist < results.peek().map(|f| f.distance).unwrap_or(f32::MAX);

                if should_add {
                    candidates.push(Candidate {
                        id: neighbor_id,
                        distance: dist,
                    });
                    results.push(FurthestCandidate {
                        id: neighbor_id,
                        distance: dist,
                    });

                    while results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut result_vec: Vec<_> = results
            .into_iter()
            .map(|f| Candidate {
                id: f.id,
                distance: f.distance,
            })
            .collect();
        result_vec.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        result_vec
    }
}

/// Keeps the `m` closest candidates.
fn select_neighbors(candidates: &[Candidate], m: usize) -> Vec<usize> {
    let mut sorted: Vec<_> = candidates.to_vec();
    sorted.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
    sorted.iter().take(m).map(|c| c.id).collect()
}

impl AnnIndex for HnswIndex {
    #[inline]
    fn dimension(&self) -> usize {
        self.storage.dimension()
    }

    #[inline]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            requires_training: false,
            exact: false,
            remove_by_id: false,
        }
    }

    fn train(&mut self, _batch: &VectorBatch) -> Result<()> {
        Ok(())
    }

    fn add(&mut self, batch: &VectorBatch) -> Result<()> {
        batch.ensure_dimension(self.dimension())?;
        for row in batch.rows() {
            let id = self.storage.push(row);
            self.insert(id);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        let Some(entry_point) = self.entry_point else {
            return Vec::new();
        };
        if k == 0 || query.len() != self.dimension() {
            return Vec::new();
        }

        let ef = self.config.ef_search.max(k);

        // Phase 1: Greedy descent from top to layer 1
        let mut current_ep = entry_point;
        for layer in (1..=self.max_level).rev() {
            current_ep = self.greedy_search_single(query, current_ep, layer);
        }

        // Phase 2: Search layer 0 with ef candidates
        self.search_layer(query, &[current_ep], ef, 0)
            .into_iter()
            .take(k)
            .map(|c| SearchHit::new(-c.distance, c.id as VectorId))
            .collect()
    }

    fn reconstruct(&self, id: VectorId) -> Option<&[f32]> {
        self.storage.reconstruct(id)
    }

    fn reset(&mut self) {
        self.storage.reset();
        self.nodes.clear();
        self.entry_point = None;
        self.max_level = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows(n: usize, dim: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| (0..dim).map(|j| ((i * dim + j) as f32).sin()).collect())
            .collect()
    }

    fn create_test_index() -> HnswIndex {
        let mut index = HnswIndex::new(3, HnswConfig::with_m(4));
        let rows = vec![
            vec![1.0f32, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.7, 0.7, 0.0],
            vec![0.7, 0.0, 0.7],
        ];
        index.add(&VectorBatch::from_rows(3, &rows).unwrap()).unwrap();
        index
    }

    #[test]
    fn test_new_index() {
        let index = HnswIndex::new(128, HnswConfig::default());
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 128);
        assert_eq!(index.config().m, 32);
        assert!(!index.capabilities().exact);
    }

    #[test]
    fn test_add_single() {
        let mut index = HnswIndex::new(3, HnswConfig::default());
        let batch = VectorBatch::from_rows(3, &[vec![1.0f32, 2.0, 3.0]]).unwrap();
        index.add(&batch).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.entry_point.is_some());
    }

    #[test]
    fn test_search_exact_match() {
        let index = create_test_index();
        let hits = index.search(&[1.0, 0.0, 0.0], 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 0);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_sorted_descending() {
        let index = create_test_index();
        let hits = index.search(&[1.0, 0.0, 0.0], 5);
        assert_eq!(hits.len(), 5);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_search_empty_index() {
        let index = HnswIndex::new(3, HnswConfig::default());
        assert!(index.search(&[1.0, 0.0, 0.0], 10).is_empty());
    }

    #[test]
    fn test_reconstruct_and_reset() {
        let mut index = create_test_index();
        assert_eq!(index.reconstruct(3).unwrap(), &[0.7, 0.7, 0.0]);

        index.reset();
        assert!(index.is_empty());
        assert!(index.entry_point.is_none());
        assert!(index.reconstruct(0).is_none());
    }

    #[test]
    fn test_reproducible_builds() {
        let rows = sample_rows(100, 8);
        let batch = VectorBatch::from_rows(8, &rows).unwrap();

        let mut a = HnswIndex::new(8, HnswConfig::with_m(8));
        let mut b = HnswIndex::new(8, HnswConfig::with_m(8));
        a.add(&batch).unwrap();
        b.add(&batch).unwrap();

        let query: Vec<f32> = (0..8).map(|j| (j as f32).cos()).collect();
        assert_eq!(a.search(&query, 10), b.search(&query, 10));
    }

    #[test]
    fn test_reloaded_graph_grows_like_original() {
        let rows = sample_rows(120, 8);
        let (head, tail) = rows.split_at(60);

        let mut original = HnswIndex::new(8, HnswConfig::with_m(4));
        original.add(&VectorBatch::from_rows(8, head).unwrap()).unwrap();
        let json = serde_json::to_string(&original).unwrap();
        let mut reloaded: HnswIndex = serde_json::from_str(&json).unwrap();

        let tail = VectorBatch::from_rows(8, tail).unwrap();
        original.add(&tail).unwrap();
        reloaded.add(&tail).unwrap();

        let levels = |index: &HnswIndex| index.nodes.iter().map(|n| n.level).collect::<Vec<_>>();
        assert_eq!(levels(&original), levels(&reloaded));
        assert_eq!(original.entry_point, reloaded.entry_point);
        for q in 0..30 {
            let query: Vec<f32> = (0..8).map(|j| ((q * 5 + j) as f32).cos()).collect();
            assert_eq!(original.search(&query, 10), reloaded.search(&query, 10));
        }
    }

    #[test]
    fn test_recall_vs_flat() {
        let config = HnswConfig {
            m: 16,
            m_max0: 32,
            ef_construction: 200,
            ef_search: 100,
        };
        let mut index = HnswIndex::new(8, config);
        let mut exact = FlatIndex::new(8);

        let batch = VectorBatch::from_rows(8, &sample_rows(200, 8)).unwrap();
        index.add(&batch).unwrap();
        exact.add(&batch).unwrap();

        let k = 10;
        let num_queries = 10;
        let mut total_recall = 0.0;
        for q in 0..num_queries {
            let query: Vec<f32> = (0..8).map(|j| ((q * 7 + j) as f32).cos()).collect();
            let approx: HashSet<i64> = index.search(&query, k).iter().map(|h| h.id).collect();
            let truth: HashSet<i64> = exact.search(&query, k).iter().map(|h| h.id).collect();
            total_recall += approx.intersection(&truth).count() as f64 / k as f64;
        }

        let avg_recall = total_recall / num_queries as f64;
        assert!(
            avg_recall >= 0.7,
            "Average recall {:.2} is below threshold 0.7",
            avg_recall
        );
    }
}
