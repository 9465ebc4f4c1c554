use crate::embed::{validate_batch, Embedding};
use crate::persist::{decode_matrix, encode_matrix};
use crate::{Error, Result};

/// Magic bytes of a serialised [`EmbeddingMatrix`].
pub const EMBEDDING_MATRIX_MAGIC: &[u8; 4] = b"FEMB";

/// Raw provider embeddings, one row per chunk in chunk order.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    dimension: usize,
    rows: Vec<Embedding>,
}

impl EmbeddingMatrix {
    /// Build a matrix from provider output.
    ///
    /// All rows must share `dimension`.
    pub fn new(dimension: usize, rows: Vec<Embedding>) -> Result<Self> {
        if let Some(found) = validate_batch(rows.len(), &rows)? {
            if found != dimension {
                return Err(Error::DimensionMismatch { expected: dimension, found });
            }
        }
        Ok(Self { dimension, rows })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<&Embedding> {
        self.rows.get(i)
    }

    pub fn rows(&self) -> &[Embedding] {
        &self.rows
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let flat: Vec<f32> = self.rows.iter().flatten().copied().collect();
        encode_matrix(EMBEDDING_MATRIX_MAGIC, self.dimension, self.rows.len(), &flat)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let blob = decode_matrix(EMBEDDING_MATRIX_MAGIC, bytes)?;
        if blob.dimension == 0 {
            return Err(Error::CorruptIndex("embedding blob declares dimension 0".to_string()));
        }
        let rows = blob
            .values
            .chunks_exact(blob.dimension)
            .map(<[f32]>::to_vec)
            .collect();
        Ok(Self {
            dimension: blob.dimension,
            rows,
        })
    }
}
