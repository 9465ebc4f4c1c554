//! Chunk extraction
//!
//! Every source record, whether a knowledge-base entry or a food table row,
//! becomes exactly one [`Chunk`]. The chunk's `content` is rendered from a
//! declarative [`Template`] chosen by its [`ChunkType`]; the original record
//! is kept verbatim in `data` for consumers that need exact field values.
//!
//! # Usage
//!
//! ```ignore
//! use fitrag_lib::chunk::{Extractor, TemplateExtractor};
//!
//! let extractor = TemplateExtractor::default();
//! let chunks = extractor.extract_all(records);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::source::{FoodColumns, SourceRecord};
use crate::{Error, Result};

mod template;

pub use template::*;

/// Category tag of a chunk
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Formula,
    Nutrient,
    TrainingZone,
    BodyComposition,
    Supplement,
    Timing,
    IndividualFactor,
    Food,
}

impl ChunkType {
    pub const ALL: [ChunkType; 8] = [
        ChunkType::Formula,
        ChunkType::Nutrient,
        ChunkType::TrainingZone,
        ChunkType::BodyComposition,
        ChunkType::Supplement,
        ChunkType::Timing,
        ChunkType::IndividualFactor,
        ChunkType::Food,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChunkType::Formula => "formula",
            ChunkType::Nutrient => "nutrient",
            ChunkType::TrainingZone => "training_zone",
            ChunkType::BodyComposition => "body_composition",
            ChunkType::Supplement => "supplement",
            ChunkType::Timing => "timing",
            ChunkType::IndividualFactor => "individual_factor",
            ChunkType::Food => "food",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ChunkType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown chunk type '{s}'")))
    }
}

/// The atomic searchable unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Category tag
    #[serde(rename = "type")]
    pub kind: ChunkType,
    /// Secondary classification within the type
    pub category: String,
    /// Short identifier, unique within a type
    pub name: String,
    /// Canonical text used for embedding
    pub content: String,
    /// The original structured record
    pub data: Map<String, Value>,
}

/// Trait for turning source records into chunks
///
/// Implementations must be deterministic: the same record always yields
/// the same `content`.
pub trait Extractor: Send + Sync {
    /// Convert a single record into its chunk
    fn extract(&self, record: SourceRecord) -> Chunk;

    /// Returns the name of this extraction strategy
    fn name(&self) -> &str;

    /// Convert records in order, one chunk per record
    fn extract_all(&self, records: Vec<SourceRecord>) -> Vec<Chunk> {
        records.into_iter().map(|r| self.extract(r)).collect()
    }
}

/// Extractor backed by one declarative template per chunk type
pub struct TemplateExtractor {
    templates: TemplateSet,
}

impl TemplateExtractor {
    /// Create an extractor whose food template reads the given columns.
    #[must_use]
    pub fn new(columns: &FoodColumns) -> Self {
        Self {
            templates: TemplateSet::new(columns),
        }
    }

    #[must_use]
    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }
}

impl Default for TemplateExtractor {
    fn default() -> Self {
        Self::new(&FoodColumns::default())
    }
}

impl Extractor for TemplateExtractor {
    fn name(&self) -> &str {
        "template"
    }

    fn extract(&self, record: SourceRecord) -> Chunk {
        let content = self.templates.get(record.kind).render(&record);
        Chunk {
            kind: record.kind,
            category: record.category,
            name: record.name,
            content,
            data: record.data,
        }
    }
}
