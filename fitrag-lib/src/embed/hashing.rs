use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Deterministic feature-hashing embedder.
///
/// Each lowercased alphanumeric token is hashed with FNV-1a into one of
/// `dimension` buckets with a hash-derived sign. Texts sharing words get
/// similar vectors, which is enough for offline runs and tests. Output is
/// stable across processes and platforms.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    name: String,
}

impl HashEmbedder {
    /// Create a hashing embedder with the given output dimension.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidInput("embedding dimension must be positive".to_string()));
        }
        Ok(Self {
            dimension,
            name: format!("feature-hash-{dimension}"),
        })
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        vector
    }
}

impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        Ok(self.embed_one(text))
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }

    #[test]
    fn test_deterministic() {
        let mut a = HashEmbedder::new(64).unwrap();
        let mut b = HashEmbedder::new(64).unwrap();
        assert_eq!(
            a.embed_query("Frango grelhado").unwrap(),
            b.embed_query("Frango grelhado").unwrap()
        );
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let mut e = HashEmbedder::new(64).unwrap();
        assert_eq!(e.embed_query("Protein, HIGH!").unwrap(), e.embed_query("protein high").unwrap());
    }

    #[test]
    fn test_shared_words_are_closer() {
        let mut e = HashEmbedder::new(256).unwrap();
        let docs = e
            .embed_documents(&["chicken breast protein", "rest day recovery sleep"])
            .unwrap();
        let query = e.embed_query("protein chicken").unwrap();
        assert!(cosine(&query, &docs[0]) > cosine(&query, &docs[1]));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let mut e = HashEmbedder::new(16).unwrap();
        let v = e.embed_query("   ").unwrap();
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_fnv_reference_value() {
        // FNV-1a 64-bit of "a"
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
