//! Persistence of a generation as three artifacts under a path prefix
//!
//! ```text
//! <prefix>.vidx             vector index blob (FVIX)
//! <prefix>_chunks.json      chunk sequence
//! <prefix>_embeddings.bin   raw embedding matrix blob (FEMB)
//! ```
//!
//! The artifact set is all or nothing: loading a prefix where only some of
//! the files exist fails instead of loading a partial generation.

use std::ffi::OsString;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::chunk::Chunk;
use crate::embed::EmbeddingMatrix;
use crate::engine::Generation;
use crate::index::VectorIndex;
use crate::{Error, Result};

mod blob;

pub use blob::*;

/// File paths of the artifacts under one prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub index: PathBuf,
    pub chunks: PathBuf,
    pub embeddings: PathBuf,
}

impl ArtifactPaths {
    pub fn for_prefix(prefix: impl AsRef<Path>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            index: with_suffix(prefix, ".vidx"),
            chunks: with_suffix(prefix, "_chunks.json"),
            embeddings: with_suffix(prefix, "_embeddings.bin"),
        }
    }

    pub fn all(&self) -> [&Path; 3] {
        [&self.index, &self.chunks, &self.embeddings]
    }

    /// Paths of the artifacts that do not exist.
    pub fn missing(&self) -> Vec<PathBuf> {
        self.all()
            .into_iter()
            .filter(|p| !p.exists())
            .map(Path::to_path_buf)
            .collect()
    }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Check whether a complete artifact set exists under `prefix`.
pub fn exists(prefix: impl AsRef<Path>) -> bool {
    ArtifactPaths::for_prefix(prefix).missing().is_empty()
}

/// Write `generation` under `prefix`, creating parent directories.
///
/// Each artifact is written to a temporary sibling and renamed into place.
pub fn save<I: VectorIndex>(generation: &Generation<I>, prefix: impl AsRef<Path>) -> Result<()> {
    let prefix = prefix.as_ref();
    let paths = ArtifactPaths::for_prefix(prefix);
    if let Some(parent) = paths.index.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    write_atomic(&paths.index, &generation.index().to_bytes()?)?;
    write_atomic(&paths.embeddings, &generation.embeddings().to_bytes()?)?;

    let tmp = with_suffix(&paths.chunks, ".tmp");
    let mut writer = BufWriter::new(fs::File::create(&tmp)?);
    serde_json::to_writer(&mut writer, generation.chunks())?;
    writer.flush()?;
    drop(writer);
    fs::rename(&tmp, &paths.chunks)?;

    tracing::info!(
        prefix = %prefix.display(),
        chunks = generation.len(),
        dimension = generation.dimension(),
        "saved index"
    );
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = with_suffix(path, ".tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load the generation saved under `prefix`.
///
/// Both the index and the embedding matrix must have `expected_dimension`,
/// the dimension of the embedder that will query them.
pub fn load<I: VectorIndex>(prefix: impl AsRef<Path>, expected_dimension: usize) -> Result<Generation<I>> {
    let prefix = prefix.as_ref();
    let paths = ArtifactPaths::for_prefix(prefix);

    let missing = paths.missing();
    if missing.len() == paths.all().len() {
        return Err(Error::NotFound(format!("no index at '{}'", prefix.display())));
    }
    if !missing.is_empty() {
        return Err(Error::IncompleteIndex {
            prefix: prefix.display().to_string(),
            missing,
        });
    }

    let index = I::from_bytes(&fs::read(&paths.index)?)?;
    check_dimension(expected_dimension, index.dimension())?;

    let embeddings = EmbeddingMatrix::from_bytes(&fs::read(&paths.embeddings)?)?;
    check_dimension(expected_dimension, embeddings.dimension())?;

    let reader = BufReader::new(fs::File::open(&paths.chunks)?);
    let chunks: Vec<Chunk> = serde_json::from_reader(reader)
        .map_err(|e| Error::CorruptIndex(format!("{}: {e}", paths.chunks.display())))?;

    let generation = Generation::from_parts(chunks, embeddings, index)?;
    tracing::info!(
        prefix = %prefix.display(),
        chunks = generation.len(),
        dimension = generation.dimension(),
        "loaded index"
    );
    Ok(generation)
}

fn check_dimension(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::DimensionMismatch { expected, found });
    }
    Ok(())
}
