//! Error types for FitRAG

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for FitRAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in FitRAG operations
#[derive(Error, Debug)]
pub enum Error {
    /// Input records are malformed or a required column is absent
    #[error("data source error: {0}")]
    DataSource(String),

    /// The embedding provider failed or returned an inconsistent batch
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A vector's dimension disagrees with the index or provider
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// No persisted index exists under the requested prefix
    #[error("not found: {0}")]
    NotFound(String),

    /// Only part of the persisted artifact set is present
    #[error("incomplete index at '{prefix}': missing {}", display_paths(.missing))]
    IncompleteIndex {
        prefix: String,
        missing: Vec<PathBuf>,
    },

    /// Persisted artifacts exist but cannot be decoded
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// Configuration file could not be parsed
    #[error("config error: {0}")]
    Config(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
