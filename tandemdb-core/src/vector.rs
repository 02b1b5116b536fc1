//! Vector types: single embeddings and fixed-width batches.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Position of a vector inside its ANN index.
///
/// Assigned as the index size at append time; never reused.
pub type VectorId = u64;

/// A dense embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    /// Creates a new vector from a slice of f32 values.
    ///
    /// # Example
    ///
    /// ```
    /// use tandemdb_core::Vector;
    ///
    /// let v = Vector::new(&[1.0, 2.0, 3.0]);
    /// assert_eq!(v.dimension(), 3);
    /// ```
    #[inline]
    pub fn new(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Creates a vector from an owned `Vec<f32>`.
    #[inline]
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Returns the dimension (length) of the vector.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Returns a slice view of the vector data.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the vector and returns the underlying data.
    #[inline]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[f32]> for Vector {
    fn from(data: &[f32]) -> Self {
        Self::new(data)
    }
}

impl AsRef<[f32]> for Vector {
    fn as_ref(&self) -> &[f32] {
        &self.data
    }
}

impl std::ops::Index<usize> for Vector {
    type Output = f32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

/// A row-major matrix of vectors sharing one dimension.
///
/// This is the unit the index layer trains and appends on. Building one
/// validates every row, so a ragged input never reaches an index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorBatch {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorBatch {
    /// Stacks rows into a batch of the given dimension.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` for the first row whose length differs.
    pub fn from_rows<R: AsRef<[f32]>>(dimension: usize, rows: &[R]) -> Result<Self> {
        let mut data = Vec::with_capacity(dimension * rows.len());
        for row in rows {
            let row = row.as_ref();
            if row.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { dimension, data })
    }

    /// Wraps an already-flattened buffer.
    pub fn from_flat(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 || data.len() % dimension != 0 {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                got: data.len(),
            });
        }
        Ok(Self { dimension, data })
    }

    /// Width of every row.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the row at `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dimension..(i + 1) * self.dimension]
    }

    /// Iterates over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dimension.max(1))
    }

    /// The flattened row-major buffer.
    #[inline]
    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }

    /// Fails unless the batch width matches `expected`.
    pub(crate) fn ensure_dimension(&self, expected: usize) -> Result<()> {
        if self.dimension != expected {
            return Err(Error::DimensionMismatch {
                expected,
                got: self.dimension,
            });
        }
        Ok(())
    }
}
