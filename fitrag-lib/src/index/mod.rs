//! Vector index
//!
//! The index stores L2-normalised vectors keyed by ordinal position and
//! answers k-nearest-neighbour queries by inner product, which equals cosine
//! similarity on unit vectors. It knows nothing about chunk content: the
//! ordinal of a hit is the position of the chunk in its generation.
//!
//! There is no incremental insert or delete. An index is built once from a
//! full batch and replaced wholesale on rebuild.
//!
//! # Usage
//!
//! ```ignore
//! use fitrag_lib::index::{FlatIndex, VectorIndex};
//!
//! let index = FlatIndex::build(384, &embeddings)?;
//! let hits = index.search(&query_embedding, 5)?;
//! for hit in hits {
//!     println!("{} {:.3}", hit.ordinal, hit.score);
//! }
//! ```

use std::cmp::Ordering;

use crate::embed::Embedding;
use crate::Result;

/// A search hit: ordinal position and similarity score
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    /// Position of the matched vector in build order
    pub ordinal: usize,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

// Ranking order: higher score ranks higher, equal scores rank the lower
// ordinal higher.
impl Ord for Hit {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_score = match self.score.partial_cmp(&other.score) {
            Some(ordering) => ordering,
            // NaN ranks below every number
            None => other.score.is_nan().cmp(&self.score.is_nan()),
        };
        by_score.then_with(|| other.ordinal.cmp(&self.ordinal))
    }
}

impl PartialOrd for Hit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Hit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Hit {}

/// Trait for vector index implementations
pub trait VectorIndex: Send + Sync + Sized {
    /// Build an index over `vectors`, all of dimension `dimension`.
    fn build(dimension: usize, vectors: &[Embedding]) -> Result<Self>;

    /// Top-k hits sorted by descending score, ties by ascending ordinal.
    ///
    /// Returns all vectors when `k` exceeds the index size, and nothing for
    /// an empty index.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>>;

    /// Number of indexed vectors
    fn len(&self) -> usize;

    /// Check if index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension of indexed vectors
    fn dimension(&self) -> usize;

    /// Serialise the index, including its stored vectors.
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Restore an index written by [`VectorIndex::to_bytes`].
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left as is.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

mod flat;

pub use flat::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_ordering_prefers_score_then_lower_ordinal() {
        let a = Hit { ordinal: 3, score: 0.9 };
        let b = Hit { ordinal: 1, score: 0.5 };
        let c = Hit { ordinal: 0, score: 0.5 };
        assert!(a > b);
        assert!(c > b);

        let mut hits = vec![b, a, c];
        hits.sort_by(|x, y| y.cmp(x));
        let ordinals: Vec<_> = hits.iter().map(|h| h.ordinal).collect();
        assert_eq!(ordinals, [3, 0, 1]);
    }

    #[test]
    fn test_signed_zero_scores_tie() {
        let a = Hit { ordinal: 0, score: -0.0 };
        let b = Hit { ordinal: 1, score: 0.0 };
        assert!(a > b);
    }

    #[test]
    fn test_nan_ranks_last() {
        let a = Hit { ordinal: 0, score: f32::NAN };
        let b = Hit { ordinal: 1, score: -1.0 };
        assert!(b > a);
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, [0.0, 0.0, 0.0]);
    }
}
