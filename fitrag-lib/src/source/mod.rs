//! Raw record sources
//!
//! Two sources feed the index:
//! - the knowledge base, a JSON document of nutrition and fitness sections
//! - the food table, a delimited file with one food per row
//!
//! Both are flattened into [`SourceRecord`]s in a fixed order: knowledge
//! sections first, then food rows in file order. That order becomes the
//! chunk order and therefore the index ordinal of every chunk.

use std::path::Path;

use serde_json::{Map, Value};

use crate::chunk::ChunkType;
use crate::Result;

mod knowledge;
mod table;

pub use knowledge::*;
pub use table::*;

/// A raw record with its declared chunk type
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub kind: ChunkType,
    pub category: String,
    pub name: String,
    pub data: Map<String, Value>,
}

impl SourceRecord {
    pub fn new(kind: ChunkType, category: impl Into<String>, name: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            kind,
            category: category.into(),
            name: name.into(),
            data,
        }
    }
}

/// Read both sources and return every record in index order.
pub fn read_all(knowledge_path: &Path, foods_path: &Path, options: &TableOptions) -> Result<Vec<SourceRecord>> {
    let mut records = read_knowledge_base(knowledge_path)?;
    let table = FoodTable::read(foods_path, options)?;
    records.extend(table.records());
    tracing::debug!(total = records.len(), "read source records");
    Ok(records)
}
