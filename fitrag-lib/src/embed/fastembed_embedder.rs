use std::path::PathBuf;

use ::fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};

use crate::embed::{Embedder, Embedding, FastEmbedModel};
use crate::{Error, Result};

fn embedding_model(kind: FastEmbedModel) -> EmbeddingModel {
    match kind {
        FastEmbedModel::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
        FastEmbedModel::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
        FastEmbedModel::BgeLargeEnV15 => EmbeddingModel::BGELargeENV15,
        FastEmbedModel::MultilingualE5Small => EmbeddingModel::MultilingualE5Small,
        FastEmbedModel::ParaphraseMultilingualMiniLmL12V2 => EmbeddingModel::ParaphraseMLMiniLML12V2,
    }
}

/// Local sentence embedder backed by fastembed.
///
/// Models are downloaded on first use and cached by fastembed.
pub struct FastEmbedder {
    model: TextEmbedding,
    kind: FastEmbedModel,
}

impl FastEmbedder {
    /// Load an embedding model, downloading it if needed.
    pub fn new(kind: FastEmbedModel) -> Result<Self> {
        Self::with_options(kind, TextInitOptions::new(embedding_model(kind)).with_show_download_progress(true))
    }

    /// Load an embedding model using a specific model cache directory.
    pub fn with_cache_dir(kind: FastEmbedModel, cache_dir: PathBuf) -> Result<Self> {
        let opts = TextInitOptions::new(embedding_model(kind))
            .with_show_download_progress(true)
            .with_cache_dir(cache_dir);
        Self::with_options(kind, opts)
    }

    fn with_options(kind: FastEmbedModel, opts: TextInitOptions) -> Result<Self> {
        TextEmbedding::try_new(opts)
            .map(|model| Self { model, kind })
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        self.kind.name()
    }

    fn dimension(&self) -> usize {
        self.kind.dimension()
    }

    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let prefix = self.kind.document_prefix();
        let result = if prefix.is_empty() {
            self.model.embed(texts, None)
        } else {
            let prefixed: Vec<String> = texts.iter().map(|t| format!("{prefix}{t}")).collect();
            self.model.embed(prefixed, None)
        };
        result.map_err(|e| Error::Embedding(e.to_string()))
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        let query_text = format!("{}{text}", self.kind.query_prefix());

        self.model
            .embed(vec![query_text], None)
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))
    }
}
