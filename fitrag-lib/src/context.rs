//! Per-type context sections
//!
//! Groups ranked search results by chunk type so an external prompt step can
//! render one section per type. Each type keeps at most its configured number
//! of results, best first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chunk::ChunkType;
use crate::engine::RankedChunk;

/// Default search depth used to gather context candidates.
pub const DEFAULT_CONTEXT_DEPTH: usize = 15;

/// Section limit for chunk types without a configured one.
pub const DEFAULT_SECTION_LIMIT: usize = 2;

/// Maximum number of results kept per chunk type
///
/// Deserialises from a table of type name to limit. Configured entries are
/// laid over the defaults, so a partial table keeps the other defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<ChunkType, usize>")]
pub struct SectionLimits {
    limits: BTreeMap<ChunkType, usize>,
}

impl SectionLimits {
    /// Limit for `kind`.
    pub fn get(&self, kind: ChunkType) -> usize {
        self.limits.get(&kind).copied().unwrap_or(DEFAULT_SECTION_LIMIT)
    }

    #[must_use]
    pub fn with_limit(mut self, kind: ChunkType, limit: usize) -> Self {
        self.limits.insert(kind, limit);
        self
    }
}

impl Default for SectionLimits {
    fn default() -> Self {
        let limits = [
            (ChunkType::Formula, 3),
            (ChunkType::Nutrient, 4),
            (ChunkType::Food, 5),
            (ChunkType::Supplement, 2),
            (ChunkType::Timing, 2),
            (ChunkType::IndividualFactor, 2),
        ];
        Self {
            limits: limits.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<ChunkType, usize>> for SectionLimits {
    fn from(overrides: BTreeMap<ChunkType, usize>) -> Self {
        let mut limits = Self::default();
        limits.limits.extend(overrides);
        limits
    }
}

/// Results of one chunk type, best first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSection {
    #[serde(rename = "type")]
    pub kind: ChunkType,
    pub results: Vec<RankedChunk>,
}

impl ContextSection {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Split ranked results into one section per chunk type.
///
/// Sections follow [`ChunkType::ALL`] order and are present even when empty.
/// Within a section results keep their ranking order and `rank` values.
pub fn group_sections(results: Vec<RankedChunk>, limits: &SectionLimits) -> Vec<ContextSection> {
    let mut sections: Vec<ContextSection> = ChunkType::ALL
        .into_iter()
        .map(|kind| ContextSection {
            kind,
            results: Vec::new(),
        })
        .collect();

    for result in results {
        let kind = result.chunk.kind;
        if let Some(section) = sections.iter_mut().find(|s| s.kind == kind) {
            if section.results.len() < limits.get(kind) {
                section.results.push(result);
            }
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use serde_json::Map;

    fn ranked(kind: ChunkType, name: &str, rank: usize) -> RankedChunk {
        RankedChunk {
            chunk: Chunk {
                kind,
                category: String::new(),
                name: name.to_string(),
                content: name.to_string(),
                data: Map::new(),
            },
            score: 1.0 - rank as f32 / 100.0,
            rank,
        }
    }

    fn names(section: &ContextSection) -> Vec<&str> {
        section.results.iter().map(|r| r.chunk.name.as_str()).collect()
    }

    #[test]
    fn test_default_limits() {
        let limits = SectionLimits::default();
        assert_eq!(limits.get(ChunkType::Formula), 3);
        assert_eq!(limits.get(ChunkType::Nutrient), 4);
        assert_eq!(limits.get(ChunkType::Food), 5);
        assert_eq!(limits.get(ChunkType::TrainingZone), DEFAULT_SECTION_LIMIT);
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let limits: SectionLimits = toml::from_str("food = 1\ntraining_zone = 7").unwrap();
        assert_eq!(limits.get(ChunkType::Food), 1);
        assert_eq!(limits.get(ChunkType::TrainingZone), 7);
        assert_eq!(limits.get(ChunkType::Nutrient), 4);
    }

    #[test]
    fn test_group_truncates_per_type() {
        let results = vec![
            ranked(ChunkType::Supplement, "creatine", 1),
            ranked(ChunkType::Food, "egg", 2),
            ranked(ChunkType::Supplement, "caffeine", 3),
            ranked(ChunkType::Supplement, "beta_alanine", 4),
            ranked(ChunkType::Food, "chicken", 5),
        ];
        let sections = group_sections(results, &SectionLimits::default());

        assert_eq!(sections.len(), ChunkType::ALL.len());
        let supplements = sections.iter().find(|s| s.kind == ChunkType::Supplement).unwrap();
        assert_eq!(names(supplements), ["creatine", "caffeine"]);
        let foods = sections.iter().find(|s| s.kind == ChunkType::Food).unwrap();
        assert_eq!(names(foods), ["egg", "chicken"]);
        assert_eq!(foods.results[1].rank, 5);
        assert!(sections.iter().find(|s| s.kind == ChunkType::Formula).unwrap().is_empty());
    }

    #[test]
    fn test_zero_limit_drops_type() {
        let limits = SectionLimits::default().with_limit(ChunkType::Food, 0);
        let sections = group_sections(vec![ranked(ChunkType::Food, "egg", 1)], &limits);
        assert!(sections.iter().all(ContextSection::is_empty));
    }
}
