//! Append-only flat vector index with exact k-NN search.
//!
//! Vectors are stored contiguously in insertion order; a vector's 0-based
//! position is its identity, and is the only join key to chunk metadata;
//! there is no independent vector id. The structure supports exactly two
//! operations: append and exact nearest-neighbor search by squared Euclidean
//! distance. Removal does not exist at this layer; deleting a document is a
//! metadata-level concern (see
//! [`DocumentIndex`](super::document_index::DocumentIndex)).
//!
//! Distances are plain squared L2 with no normalization of stored or query
//! vectors; callers wanting cosine ranking must normalize on both sides
//! before insert and search.

use crate::error::{Result, RetrieverError};

/// Flat store of fixed-dimension f32 vectors.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    /// Row-major vector data, `len() * dimension` floats
    data: Vec<f32>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Reconstruct an index from packed row-major data (persistence path).
    /// The data length must be a whole number of rows.
    pub(crate) fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 || data.len() % dimension != 0 {
            return Err(RetrieverError::persistence(format!(
                "vector blob length {} is not a multiple of dimension {dimension}",
                data.len()
            )));
        }
        Ok(Self { dimension, data })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors currently stored.
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Packed row-major view of every stored vector (persistence path).
    pub(crate) fn as_flat(&self) -> &[f32] {
        &self.data
    }

    /// The vector at `position`, if one was ever inserted there.
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Append vectors at the end of the index. Every vector must have
    /// exactly the index dimension; on a mismatch nothing is inserted.
    pub fn insert(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(RetrieverError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Exact k-nearest-neighbor search by squared L2 distance.
    ///
    /// Returns `(position, distance)` pairs ascending by distance, at most
    /// `min(k, len())` of them. Fails with [`RetrieverError::EmptyIndex`]
    /// when no vectors are stored; callers are expected to map that to an
    /// empty result rather than propagate it.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(RetrieverError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.is_empty() {
            return Err(RetrieverError::EmptyIndex);
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| (position, squared_l2(query, row)))
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k.min(self.len()));
        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
