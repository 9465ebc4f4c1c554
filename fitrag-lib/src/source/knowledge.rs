use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::chunk::{ChunkType, WRAPPED_VALUE_KEY};
use crate::source::SourceRecord;
use crate::{Error, Result};

/// Read and flatten a knowledge-base JSON file.
pub fn read_knowledge_base(path: &Path) -> Result<Vec<SourceRecord>> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::DataSource(format!("cannot read knowledge base {}: {e}", path.display())))?;
    let doc: Value = serde_json::from_str(&text)
        .map_err(|e| Error::DataSource(format!("invalid knowledge base {}: {e}", path.display())))?;
    let records = knowledge_records(&doc)?;
    tracing::debug!(path = %path.display(), records = records.len(), "read knowledge base");
    Ok(records)
}

/// Flatten a parsed knowledge-base document into records.
///
/// Sections are visited in a fixed order and entries within a section in
/// document order. Missing sections contribute nothing.
pub fn knowledge_records(doc: &Value) -> Result<Vec<SourceRecord>> {
    let root = as_object(doc, "knowledge base")?;
    let mut out = Vec::new();

    if let Some(formulas) = section(root, "formulas")? {
        if let Some(equations) = section(formulas, "bmr_equations")? {
            for (name, details) in equations {
                out.push(record(ChunkType::Formula, "bmr", name, details));
            }
        }
        if let Some(multipliers) = formulas.get("activity_multipliers") {
            out.push(record(ChunkType::Formula, "activity", "activity_multipliers", multipliers));
        }
        if let Some(adjustments) = section(formulas, "calorie_adjustments")? {
            for (goal, details) in adjustments {
                out.push(record(ChunkType::Formula, "calorie_adjustment", goal, details));
            }
        }
    }

    if let Some(nutrients) = section(root, "nutrients")? {
        for (name, details) in nutrients {
            out.push(record(ChunkType::Nutrient, "micronutrient", name, details));
        }
    }

    if let Some(zones) = root.get("training_zones") {
        let Value::Array(zones) = zones else {
            return Err(shape_error("training_zones", "an array"));
        };
        for zone in zones {
            let label = zone.get("zone").map(label).unwrap_or_default();
            out.push(record(ChunkType::TrainingZone, "zone", &format!("zone_{label}"), zone));
        }
    }

    if let Some(body) = section(root, "body_composition")? {
        if let Some(categories) = section(body, "body_fat_categories")? {
            for (sex, details) in categories {
                out.push(record(ChunkType::BodyComposition, "body_fat", &format!("body_fat_{sex}"), details));
            }
        }
        if let Some(adjustments) = section(body, "metabolic_adjustments")? {
            for (category, details) in adjustments {
                out.push(record(ChunkType::BodyComposition, "metabolic_adjustment", category, details));
            }
        }
    }

    if let Some(tiers) = section(root, "supplements")? {
        for (tier, supplements) in tiers {
            let supplements = as_object(supplements, &format!("supplements.{tier}"))?;
            for (name, details) in supplements {
                out.push(record(ChunkType::Supplement, tier, name, details));
            }
        }
    }

    if let Some(protocols) = section(root, "timing_protocols")? {
        for (name, details) in protocols {
            out.push(record(ChunkType::Timing, "protocol", name, details));
        }
    }

    if let Some(factors) = section(root, "individual_factors")? {
        for (factor, details) in factors {
            out.push(record(ChunkType::IndividualFactor, factor, factor, details));
        }
    }

    Ok(out)
}

fn record(kind: ChunkType, category: &str, name: &str, details: &Value) -> SourceRecord {
    let data = match details {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert(WRAPPED_VALUE_KEY.to_string(), other.clone());
            map
        }
    };
    SourceRecord::new(kind, category, name, data)
}

fn section<'a>(parent: &'a Map<String, Value>, key: &str) -> Result<Option<&'a Map<String, Value>>> {
    parent.get(key).map(|v| as_object(v, key)).transpose()
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| shape_error(what, "an object"))
}

fn shape_error(what: &str, expected: &str) -> Error {
    Error::DataSource(format!("knowledge base section '{what}' must be {expected}"))
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
