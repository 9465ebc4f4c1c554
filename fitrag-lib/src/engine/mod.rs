//! Retrieval engine
//!
//! Combines the extractor, the embedder and the current [`Generation`] into
//! a single API. A build or load produces a new generation which is swapped
//! in only on success; readers holding the previous [`Arc`] keep a
//! consistent view.
//!
//! # Usage
//!
//! ```ignore
//! use fitrag_lib::engine::RetrievalEngine;
//! use fitrag_lib::filter::FilterCriteria;
//!
//! let mut engine = RetrievalEngine::new(embedder)?;
//! engine.build(records)?;
//! engine.save("data/fitness")?;
//!
//! let results = engine.search("post workout protein", 5)?;
//! let foods = engine.filter(&FilterCriteria::foods(&columns).min_protein(15.0));
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::chunk::{Chunk, Extractor, TemplateExtractor};
use crate::context::{group_sections, ContextSection, SectionLimits};
use crate::embed::Embedder;
use crate::filter::FilterCriteria;
use crate::index::{FlatIndex, VectorIndex};
use crate::source::SourceRecord;
use crate::{persist, Error, Result};

mod generation;

pub use generation::*;

/// High-level engine owning the embedder and the current generation.
pub struct RetrievalEngine<E: Embedder, I: VectorIndex = FlatIndex> {
    embedder: E,
    extractor: Box<dyn Extractor>,
    generation: Arc<Generation<I>>,
}

impl<E: Embedder, I: VectorIndex> RetrievalEngine<E, I> {
    /// Create an engine with the default template extractor and an empty
    /// generation.
    pub fn new(embedder: E) -> Result<Self> {
        Self::with_extractor(embedder, Box::new(TemplateExtractor::default()))
    }

    /// Create an engine with a custom extractor.
    pub fn with_extractor(embedder: E, extractor: Box<dyn Extractor>) -> Result<Self> {
        let generation = Arc::new(Generation::empty(embedder.dimension())?);
        Ok(Self {
            embedder,
            extractor,
            generation,
        })
    }

    /// Build a new generation from `records` and install it.
    ///
    /// On failure the current generation stays installed.
    pub fn build(&mut self, records: Vec<SourceRecord>) -> Result<()> {
        let generation = Generation::build(records, self.extractor.as_ref(), &mut self.embedder)?;
        tracing::info!(
            chunks = generation.len(),
            dimension = generation.dimension(),
            extractor = self.extractor.name(),
            "built index"
        );
        self.generation = Arc::new(generation);
        Ok(())
    }

    /// Install an already built generation.
    ///
    /// Its dimension must match the embedder's.
    pub fn install(&mut self, generation: Generation<I>) -> Result<()> {
        let expected = self.embedder.dimension();
        if generation.dimension() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                found: generation.dimension(),
            });
        }
        self.generation = Arc::new(generation);
        Ok(())
    }

    /// Search for the `k` chunks most similar to `query`.
    pub fn search(&mut self, query: &str, k: usize) -> Result<Vec<RankedChunk>> {
        tracing::debug!(query, k, "search");
        self.generation.search(&mut self.embedder, query, k)
    }

    /// Chunks matching `criteria`, in chunk order, truncated to its limit.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<Chunk> {
        self.generation.filter(criteria)
    }

    /// Search `depth` results deep and group them per chunk type.
    pub fn context(&mut self, query: &str, depth: usize, limits: &SectionLimits) -> Result<Vec<ContextSection>> {
        let results = self.search(query, depth)?;
        Ok(group_sections(results, limits))
    }

    /// Persist the current generation under `prefix`.
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<()> {
        persist::save(&*self.generation, prefix)
    }

    /// Load the generation saved under `prefix` and install it.
    pub fn load(&mut self, prefix: impl AsRef<Path>) -> Result<()> {
        let generation = persist::load(prefix, self.embedder.dimension())?;
        self.generation = Arc::new(generation);
        Ok(())
    }

    /// Returns a handle to the current generation.
    #[must_use]
    pub fn generation(&self) -> Arc<Generation<I>> {
        Arc::clone(&self.generation)
    }

    /// Returns the number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generation.len()
    }

    /// Returns `true` if no chunks are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generation.is_empty()
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}
