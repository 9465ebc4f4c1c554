//! TOML configuration file loading
//!
//! Every field is optional. The file is a partial overlay on top of the
//! defaults, so an empty or missing file yields [`Config::default()`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::context::{SectionLimits, DEFAULT_CONTEXT_DEPTH};
use crate::embed::FastEmbedModel;
use crate::filter::{DecimalSeparator, FilterCriteria, DEFAULT_FILTER_LIMIT};
use crate::source::{FoodColumns, TableOptions};
use crate::{Error, Result};

/// Default number of search results.
pub const DEFAULT_K: usize = 10;

/// Top-level configuration file schema
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub sources: SourcesConfig,
    pub retrieval: RetrievalConfig,
}

/// Embedding model selection
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// fastembed model code (e.g. "all-minilm-l6-v2")
    pub model: FastEmbedModel,

    /// Where downloaded model files are cached
    pub cache_dir: Option<PathBuf>,
}

/// How the source files are read
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Food table field delimiter
    pub delimiter: char,

    /// Decimal mark of numeric food table fields
    pub decimal_separator: DecimalSeparator,

    /// Food table column names
    pub columns: FoodColumns,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let table = TableOptions::default();
        Self {
            delimiter: table.delimiter,
            decimal_separator: DecimalSeparator::default(),
            columns: table.columns,
        }
    }
}

/// Result size limits
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Number of search results when none is requested
    pub default_k: usize,

    /// Maximum number of chunks a filter returns
    pub filter_limit: usize,

    /// Search depth used to gather context sections
    pub context_depth: usize,

    /// Per-type context section limits
    pub section_limits: SectionLimits,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: DEFAULT_K,
            filter_limit: DEFAULT_FILTER_LIMIT,
            context_depth: DEFAULT_CONTEXT_DEPTH,
            section_limits: SectionLimits::default(),
        }
    }
}

impl Config {
    /// Load a config file.
    ///
    /// A missing file yields the defaults; a file that cannot be parsed is an
    /// error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Options for reading the food table.
    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            delimiter: self.sources.delimiter,
            columns: self.sources.columns.clone(),
        }
    }

    /// Food filter criteria carrying the configured columns, decimal
    /// convention and limit.
    pub fn food_filter(&self) -> FilterCriteria {
        FilterCriteria::foods(&self.sources.columns)
            .decimal(self.sources.decimal_separator)
            .limit(self.retrieval.filter_limit)
    }
}
