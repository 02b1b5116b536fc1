//! Builds index topologies from factory descriptor strings.
//!
//! Supported descriptors:
//!
//! | Descriptor               | Topology                                        |
//! |--------------------------|-------------------------------------------------|
//! | `Flat`                   | exact scan                                      |
//! | `HNSW`                   | graph, parameters taken from [`IndexParams`]    |
//! | `HNSW<M>` / `HNSW<M>,Flat` | graph with fan-out `M` and generic beam widths |
//! | `IVF<n>,Flat`            | inverted file, flat coarse quantizer            |
//! | `IVF<n>_HNSW<M>,Flat`    | inverted file, HNSW coarse quantizer            |

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index::flat::FlatIndex;
use crate::index::hnsw::{HnswConfig, HnswIndex};
use crate::index::ivf::IvfIndex;
use crate::index::Topology;
use crate::similarity::Similarity;

/// Extra construction parameters that the descriptor string does not carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    /// Graph fan-out for the bare `HNSW` descriptor.
    pub n_links: usize,
    /// Search beam width for the bare `HNSW` descriptor.
    pub ef_search: usize,
    /// Build beam width for the bare `HNSW` descriptor.
    pub ef_construction: usize,
    /// Lists probed per inverted-file search.
    pub nprobe: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            n_links: 64,
            ef_search: 20,
            ef_construction: 80,
            nprobe: 1,
        }
    }
}

impl IndexParams {
    pub fn with_n_links(mut self, n_links: usize) -> Self {
        self.n_links = n_links;
        self
    }

    pub fn with_ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = ef_search;
        self
    }

    pub fn with_ef_construction(mut self, ef_construction: usize) -> Self {
        self.ef_construction = ef_construction;
        self
    }

    pub fn with_nprobe(mut self, nprobe: usize) -> Self {
        self.nprobe = nprobe;
        self
    }
}

/// Builds an empty topology for `descriptor`.
///
/// # Errors
///
/// `Configuration` for a non inner-product similarity, a zero dimension, or a
/// descriptor outside the supported grammar.
pub fn build_topology(
    dimension: usize,
    descriptor: &str,
    similarity: Similarity,
    params: &IndexParams,
) -> Result<Topology> {
    similarity.ensure_supported()?;
    if dimension == 0 {
        return Err(Error::config("vector dimension must be positive"));
    }

    let descriptor = descriptor.trim();
    if descriptor == "HNSW" {
        return hnsw_inner_product(dimension, params);
    }

    let mut parts = descriptor.split(',');
    let head = parts.next().unwrap_or_default();
    let tail: Vec<&str> = parts.collect();
    let flat_tail = match tail.as_slice() {
        [] => false,
        ["Flat"] => true,
        _ => return Err(unsupported(descriptor)),
    };

    if head == "Flat" && !flat_tail {
        return Ok(Topology::Flat(FlatIndex::new(dimension)));
    }

    if let Some(m) = head.strip_prefix("HNSW") {
        let m = parse_param(m, descriptor)?;
        return Ok(Topology::Hnsw(generic_hnsw(dimension, m)?));
    }

    if let Some(rest) = head.strip_prefix("IVF") {
        // The inverted-list storage must be spelled out.
        if !flat_tail {
            return Err(unsupported(descriptor));
        }
        let (nlist, quantizer) = match rest.split_once('_') {
            None => (rest, Topology::Flat(FlatIndex::new(dimension))),
            Some((nlist, quantizer)) => {
                let m = quantizer
                    .strip_prefix("HNSW")
                    .ok_or_else(|| unsupported(descriptor))?;
                let m = parse_param(m, descriptor)?;
                (nlist, Topology::Hnsw(generic_hnsw(dimension, m)?))
            }
        };
        let nlist = parse_param(nlist, descriptor)?;
        return Ok(Topology::Ivf(IvfIndex::new(quantizer, nlist, params.nprobe)));
    }

    Err(unsupported(descriptor))
}

/// The bare `HNSW` path: parameters are applied directly so the graph is
/// built and searched on inner product.
fn hnsw_inner_product(dimension: usize, params: &IndexParams) -> Result<Topology> {
    if params.n_links < 2 || params.ef_search == 0 || params.ef_construction == 0 {
        return Err(Error::config(format!(
            "invalid HNSW parameters: n_links={}, ef_search={}, ef_construction={}",
            params.n_links, params.ef_search, params.ef_construction
        )));
    }
    tracing::info!(
        n_links = params.n_links,
        ef_search = params.ef_search,
        ef_construction = params.ef_construction,
        "building HNSW index for inner product"
    );
    let config = HnswConfig {
        m: params.n_links,
        m_max0: params.n_links * 2,
        ef_construction: params.ef_construction,
        ef_search: params.ef_search,
    };
    Ok(Topology::Hnsw(HnswIndex::new(dimension, config)))
}

fn generic_hnsw(dimension: usize, m: usize) -> Result<HnswIndex> {
    if m < 2 {
        return Err(Error::config(format!("HNSW fan-out must be at least 2, got {m}")));
    }
    Ok(HnswIndex::new(dimension, HnswConfig::with_m(m)))
}

fn parse_param(raw: &str, descriptor: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(value) if value > 0 && raw.bytes().all(|b| b.is_ascii_digit()) => Ok(value),
        _ => Err(unsupported(descriptor)),
    }
}

fn unsupported(descriptor: &str) -> Error {
    Error::config(format!("unsupported index factory descriptor '{descriptor}'"))
}
