//! Similarity kinds and the inner-product kernel.
//!
//! Only inner-product scoring is served by the vector indexes. The other
//! kinds exist so configuration files naming them parse cleanly and can be
//! rejected with a clear error at store construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Similarity function requested for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// Inner product. Higher is more similar.
    #[default]
    DotProduct,
    /// Cosine similarity (not supported by the index layer).
    Cosine,
    /// Euclidean distance (not supported by the index layer).
    Euclidean,
}

impl Similarity {
    /// Fails unless this is the inner-product kind.
    pub fn ensure_supported(self) -> Result<Self> {
        match self {
            Similarity::DotProduct => Ok(self),
            other => Err(Error::config(format!(
                "similarity '{other}' is not supported; only 'dot_product' can be indexed"
            ))),
        }
    }

    /// The canonical configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Similarity::DotProduct => "dot_product",
            Similarity::Cosine => "cosine",
            Similarity::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Similarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dot_product" | "inner_product" => Ok(Similarity::DotProduct),
            "cosine" => Ok(Similarity::Cosine),
            "euclidean" | "l2" => Ok(Similarity::Euclidean),
            other => Err(Error::config(format!("unknown similarity '{other}'"))),
        }
    }
}

/// Computes the inner product between two vectors.
///
/// Formula: sum(a[i] * b[i])
#[inline]
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
