//! Text embedding
//!
//! The [`Embedder`] trait is the only seam between the retrieval core and
//! the embedding model. Two implementations ship with the crate:
//!
//! - [`FastEmbedder`] runs a sentence-embedding model locally through the
//!   fastembed crate (ONNX runtime). Enabled by the `fastembed` feature.
//! - [`HashEmbedder`] is a deterministic feature-hashing embedder. It needs
//!   no model download and is used for offline runs and tests.
//!
//! # Usage
//!
//! ```ignore
//! use fitrag_lib::embed::{Embedder, FastEmbedder, FastEmbedModel};
//!
//! let mut embedder = FastEmbedder::new(FastEmbedModel::AllMiniLmL6V2)?;
//!
//! // Embed documents (for indexing), one batch
//! let doc_embeddings = embedder.embed_documents(&["Food: egg...", "Nutrient iron..."])?;
//!
//! // Embed query (for searching)
//! let query_embedding = embedder.embed_query("high protein breakfast")?;
//! ```

use crate::{Error, Result};

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for indexing
    ///
    /// Called once per build with the whole chunk batch. Must return one
    /// embedding per input, in input order, or fail for the whole batch.
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    fn embed_query(&mut self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

/// Check a provider batch against its request.
///
/// Returns the shared dimension of the batch, or `None` for an empty batch.
pub fn validate_batch(expected_len: usize, embeddings: &[Embedding]) -> Result<Option<usize>> {
    if embeddings.len() != expected_len {
        return Err(Error::Embedding(format!(
            "provider returned {} embeddings for {} inputs",
            embeddings.len(),
            expected_len
        )));
    }

    let Some(first) = embeddings.first() else {
        return Ok(None);
    };
    let dimension = first.len();
    if dimension == 0 {
        return Err(Error::Embedding("provider returned zero-length embeddings".to_string()));
    }
    if let Some((i, bad)) = embeddings.iter().enumerate().find(|(_, e)| e.len() != dimension) {
        return Err(Error::Embedding(format!(
            "embedding {i} has dimension {}, expected {dimension}",
            bad.len()
        )));
    }
    if embeddings.iter().flatten().any(|x| !x.is_finite()) {
        return Err(Error::Embedding("provider returned non-finite values".to_string()));
    }
    Ok(Some(dimension))
}

#[cfg(feature = "fastembed")]
mod fastembed_embedder;
mod hashing;
mod matrix;
mod models;

#[cfg(feature = "fastembed")]
pub use fastembed_embedder::*;
pub use hashing::*;
pub use matrix::*;
pub use models::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_batch_ok() {
        let batch = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(validate_batch(2, &batch).unwrap(), Some(2));
    }

    #[test]
    fn test_validate_empty_batch() {
        assert_eq!(validate_batch(0, &[]).unwrap(), None);
    }

    #[test]
    fn test_validate_batch_wrong_length() {
        let batch = vec![vec![1.0, 0.0]];
        assert!(matches!(validate_batch(2, &batch), Err(Error::Embedding(_))));
    }

    #[test]
    fn test_validate_batch_ragged_dimension() {
        let batch = vec![vec![1.0, 0.0], vec![0.0, 1.0, 0.5]];
        let err = validate_batch(2, &batch).unwrap_err();
        assert!(matches!(err, Error::Embedding(msg) if msg.contains("embedding 1")));
    }

    #[test]
    fn test_validate_batch_non_finite() {
        let batch = vec![vec![1.0, f32::NAN]];
        assert!(matches!(validate_batch(1, &batch), Err(Error::Embedding(_))));
    }

    #[test]
    fn test_validate_batch_zero_dimension() {
        let batch = vec![vec![], vec![]];
        assert!(matches!(validate_batch(2, &batch), Err(Error::Embedding(_))));
    }
}
