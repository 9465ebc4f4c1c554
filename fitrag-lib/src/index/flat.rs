use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::embed::Embedding;
use crate::index::{normalize, Hit, VectorIndex};
use crate::persist::{decode_matrix, encode_matrix};
use crate::{Error, Result};

/// Magic bytes of a serialised [`FlatIndex`].
pub const FLAT_INDEX_MAGIC: &[u8; 4] = b"FVIX";

/// Exact inner-product index over normalised vectors.
///
/// Uses brute-force search. Suitable for the knowledge base and food table
/// sizes this crate targets (up to a few hundred thousand vectors).
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    /// Row-major normalised vectors
    vectors: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index of the given dimension.
    #[must_use]
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Stored (normalised) vector at `ordinal`.
    pub fn vector(&self, ordinal: usize) -> Option<&[f32]> {
        let start = ordinal.checked_mul(self.dimension)?;
        self.vectors.get(start..start + self.dimension)
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on zero
        self.vectors.chunks_exact(self.dimension.max(1))
    }
}

impl VectorIndex for FlatIndex {
    fn build(dimension: usize, vectors: &[Embedding]) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidInput("index dimension must be positive".to_string()));
        }

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for vector in vectors {
            if vector.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    found: vector.len(),
                });
            }
            let start = data.len();
            data.extend_from_slice(vector);
            normalize(&mut data[start..]);
        }

        Ok(Self {
            dimension,
            vectors: data,
        })
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                found: query.len(),
            });
        }

        let mut query = query.to_vec();
        normalize(&mut query);

        // min-heap holding the best k hits seen so far
        let k = k.min(self.len());
        let mut heap = BinaryHeap::with_capacity(k + 1);
        for (ordinal, vector) in self.rows().enumerate() {
            let score = inner_product(&query, vector).clamp(-1.0, 1.0);
            heap.push(Reverse(Hit { ordinal, score }));
            if heap.len() > k {
                heap.pop();
            }
        }

        Ok(heap.into_sorted_vec().into_iter().map(|Reverse(hit)| hit).collect())
    }

    fn len(&self) -> usize {
        self.vectors.len() / self.dimension.max(1)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_matrix(FLAT_INDEX_MAGIC, self.dimension, self.len(), &self.vectors)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let blob = decode_matrix(FLAT_INDEX_MAGIC, bytes)?;
        if blob.dimension == 0 {
            return Err(Error::CorruptIndex("index blob declares dimension 0".to_string()));
        }
        Ok(Self {
            dimension: blob.dimension,
            vectors: blob.values,
        })
    }
}

/// Inner product of two equal-length vectors.
fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
