use serde::Serialize;

use crate::chunk::{Chunk, Extractor};
use crate::embed::{validate_batch, Embedder, EmbeddingMatrix};
use crate::filter::FilterCriteria;
use crate::index::{FlatIndex, VectorIndex};
use crate::source::SourceRecord;
use crate::{Error, Result};

/// A search result: a copy of the stored chunk plus its score and rank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1]
    #[serde(rename = "similarity_score")]
    pub score: f32,
    /// 1-based position in the result list
    pub rank: usize,
}

/// One immutable snapshot of chunks, embeddings and index.
///
/// Position `i` in `chunks` is row `i` of `embeddings` and ordinal `i` of
/// `index`. A generation is never mutated; rebuilding produces a new one.
#[derive(Debug, Clone)]
pub struct Generation<I: VectorIndex = FlatIndex> {
    chunks: Vec<Chunk>,
    embeddings: EmbeddingMatrix,
    index: I,
}

impl<I: VectorIndex> Generation<I> {
    /// Run the full pipeline: extract, embed in one batch, index.
    ///
    /// Fails with [`Error::Embedding`] if the provider fails or returns a
    /// batch whose length or dimension does not match the request.
    pub fn build<E: Embedder + ?Sized>(
        records: Vec<SourceRecord>,
        extractor: &dyn Extractor,
        embedder: &mut E,
    ) -> Result<Self> {
        let chunks = extractor.extract_all(records);
        let dimension = embedder.dimension();

        let vectors = if chunks.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            let vectors = embedder.embed_documents(&texts)?;
            check_dimension(validate_batch(texts.len(), &vectors)?, dimension)?;
            vectors
        };

        let index = I::build(dimension, &vectors)?;
        let embeddings = EmbeddingMatrix::new(dimension, vectors)?;

        tracing::debug!(
            chunks = chunks.len(),
            dimension,
            model = embedder.model_name(),
            "built generation"
        );
        Ok(Self {
            chunks,
            embeddings,
            index,
        })
    }

    /// Assemble a generation from previously built parts.
    ///
    /// The three parts must agree on length and dimension.
    pub fn from_parts(chunks: Vec<Chunk>, embeddings: EmbeddingMatrix, index: I) -> Result<Self> {
        if chunks.len() != embeddings.len() || chunks.len() != index.len() {
            return Err(Error::CorruptIndex(format!(
                "{} chunks, {} embeddings and {} indexed vectors are out of step",
                chunks.len(),
                embeddings.len(),
                index.len()
            )));
        }
        if embeddings.dimension() != index.dimension() {
            return Err(Error::CorruptIndex(format!(
                "embedding dimension {} differs from index dimension {}",
                embeddings.dimension(),
                index.dimension()
            )));
        }
        Ok(Self {
            chunks,
            embeddings,
            index,
        })
    }

    /// An empty generation of the given dimension.
    pub fn empty(dimension: usize) -> Result<Self> {
        Self::from_parts(Vec::new(), EmbeddingMatrix::new(dimension, Vec::new())?, I::build(dimension, &[])?)
    }

    /// Embed `query` and return the `k` most similar chunks.
    pub fn search<E: Embedder + ?Sized>(&self, embedder: &mut E, query: &str, k: usize) -> Result<Vec<RankedChunk>> {
        let embedding = embedder.embed_query(query)?;
        check_dimension(validate_batch(1, std::slice::from_ref(&embedding))?, self.dimension())?;
        self.search_vector(&embedding, k)
    }

    /// Return the `k` chunks most similar to an already embedded query.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<RankedChunk>> {
        let hits = self.index.search(query, k)?;
        hits.into_iter()
            .enumerate()
            .map(|(i, hit)| {
                let chunk = self.chunks.get(hit.ordinal).ok_or_else(|| {
                    Error::CorruptIndex(format!("index returned ordinal {} past the last chunk", hit.ordinal))
                })?;
                Ok(RankedChunk {
                    chunk: chunk.clone(),
                    score: hit.score,
                    rank: i + 1,
                })
            })
            .collect()
    }

    /// Chunks matching `criteria`, in chunk order.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<Chunk> {
        criteria.apply(&self.chunks).into_iter().cloned().collect()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &EmbeddingMatrix {
        &self.embeddings
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

fn check_dimension(found: Option<usize>, expected: usize) -> Result<()> {
    match found {
        Some(found) if found != expected => Err(Error::Embedding(format!(
            "provider returned dimension {found}, expected {expected}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkType, TemplateExtractor};
    use crate::embed::{Embedding, HashEmbedder};
    use serde_json::Map;

    fn timing(name: &str) -> SourceRecord {
        SourceRecord::new(ChunkType::Timing, "protocol", name, Map::new())
    }

    /// Embedder returning a fixed batch regardless of input
    struct Canned {
        batch: Vec<Embedding>,
        dimension: usize,
    }

    impl Embedder for Canned {
        fn embed_documents(&mut self, _texts: &[&str]) -> Result<Vec<Embedding>> {
            Ok(self.batch.clone())
        }

        fn embed_query(&mut self, _text: &str) -> Result<Embedding> {
            Ok(self.batch.first().cloned().unwrap_or_default())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_build_keeps_lockstep() {
        let mut embedder = HashEmbedder::new(32).unwrap();
        let records = vec![timing("pre_workout"), timing("post_workout"), timing("bedtime")];
        let generation: Generation = Generation::build(records, &TemplateExtractor::default(), &mut embedder).unwrap();

        assert_eq!(generation.len(), 3);
        assert_eq!(generation.embeddings().len(), 3);
        assert_eq!(generation.index().len(), 3);
        assert_eq!(generation.dimension(), 32);
        assert_eq!(generation.chunks()[1].name, "post_workout");
    }

    #[test]
    fn test_build_rejects_short_batch() {
        let mut embedder = Canned {
            batch: vec![vec![1.0, 0.0]],
            dimension: 2,
        };
        let records = vec![timing("a"), timing("b")];
        let err = Generation::<FlatIndex>::build(records, &TemplateExtractor::default(), &mut embedder).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_build_rejects_ragged_batch() {
        let mut embedder = Canned {
            batch: vec![vec![1.0, 0.0], vec![1.0]],
            dimension: 2,
        };
        let records = vec![timing("a"), timing("b")];
        let err = Generation::<FlatIndex>::build(records, &TemplateExtractor::default(), &mut embedder).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_build_rejects_undeclared_dimension() {
        let mut embedder = Canned {
            batch: vec![vec![1.0, 0.0, 0.0]],
            dimension: 2,
        };
        let err = Generation::<FlatIndex>::build(vec![timing("a")], &TemplateExtractor::default(), &mut embedder)
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_empty_build_skips_provider() {
        let mut embedder = Canned {
            batch: vec![vec![1.0]],
            dimension: 4,
        };
        let generation: Generation = Generation::build(Vec::new(), &TemplateExtractor::default(), &mut embedder).unwrap();
        assert!(generation.is_empty());
        assert_eq!(generation.dimension(), 4);
    }

    #[test]
    fn test_search_attaches_rank_and_score() {
        let mut embedder = HashEmbedder::new(64).unwrap();
        let records = vec![timing("pre workout meal"), timing("post workout shake"), timing("bedtime casein")];
        let generation: Generation = Generation::build(records, &TemplateExtractor::default(), &mut embedder).unwrap();

        let results = generation.search(&mut embedder, "bedtime casein", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert_eq!(results[0].chunk.name, "bedtime casein");
        assert!(results[0].score >= results[1].score);
        // stored chunk is untouched
        assert_eq!(generation.chunks()[2], results[0].chunk);
    }

    #[test]
    fn test_search_rejects_wrong_query_dimension() {
        let mut embedder = HashEmbedder::new(8).unwrap();
        let generation: Generation =
            Generation::build(vec![timing("a")], &TemplateExtractor::default(), &mut embedder).unwrap();
        let mut other = HashEmbedder::new(16).unwrap();
        assert!(matches!(generation.search(&mut other, "a", 1), Err(Error::Embedding(_))));
    }

    #[test]
    fn test_from_parts_rejects_out_of_step_parts() {
        let chunks = TemplateExtractor::default().extract_all(vec![timing("a"), timing("b")]);
        let embeddings = EmbeddingMatrix::new(2, vec![vec![1.0, 0.0]]).unwrap();
        let index = FlatIndex::build(2, &[vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            Generation::from_parts(chunks, embeddings, index),
            Err(Error::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_ranked_chunk_serializes_flat() {
        let chunk = TemplateExtractor::default().extract(timing("a"));
        let ranked = RankedChunk { chunk, score: 0.5, rank: 1 };
        let value = serde_json::to_value(&ranked).unwrap();
        assert_eq!(value["type"], "timing");
        assert_eq!(value["similarity_score"], 0.5);
        assert_eq!(value["rank"], 1);
    }
}
