use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::chunk::ChunkType;
use crate::source::{FoodColumns, SourceRecord};

/// Rendered in place of a field the record does not carry.
pub const PLACEHOLDER: &str = "N/A";

/// Key used by sources when a non-object value is wrapped into a record.
pub const WRAPPED_VALUE_KEY: &str = "value";

/// One piece of a chunk template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text
    Text(&'static str),
    /// The record's name
    Name,
    /// The record's category
    Category,
    /// A single field of `data`
    Field(String),
    /// A list field of `data`, items joined with ", "
    List(String),
    /// The whole of `data` rendered inline
    Record,
}

/// Declarative description of how a record becomes chunk content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Render the template against a record.
    pub fn render(&self, record: &SourceRecord) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Name => out.push_str(&record.name),
                Segment::Category => out.push_str(&record.category),
                Segment::Field(key) => match record.data.get(key) {
                    Some(value) => push_scalar(&mut out, value),
                    None => out.push_str(PLACEHOLDER),
                },
                Segment::List(key) => match record.data.get(key) {
                    Some(Value::Array(items)) => {
                        for (i, item) in items.iter().enumerate() {
                            if i > 0 {
                                out.push_str(", ");
                            }
                            push_scalar(&mut out, item);
                        }
                    }
                    Some(value) => push_scalar(&mut out, value),
                    None => out.push_str(PLACEHOLDER),
                },
                Segment::Record => push_record(&mut out, &record.data),
            }
        }
        out
    }

    /// Template for any chunk type, reading food rows from `columns`.
    pub fn for_kind(kind: ChunkType, columns: &FoodColumns) -> Self {
        match kind {
            ChunkType::Food => Self::food(columns),
            _ => Self::knowledge(kind),
        }
    }

    /// Template for a knowledge-base chunk type.
    ///
    /// Food chunks depend on the table's column names, see [`Template::food`].
    pub fn knowledge(kind: ChunkType) -> Self {
        use Segment::*;

        let field = |key: &str| Field(key.to_string());
        let list = |key: &str| List(key.to_string());

        let segments = match kind {
            ChunkType::Formula => vec![Text("Formula "), Name, Text(" ("), Category, Text("): "), Record],
            ChunkType::Nutrient => vec![
                Text("Nutrient "),
                field("name"),
                Text(": male RDA "),
                field("rda_male"),
                Text(", female RDA "),
                field("rda_female"),
                Text(", sources: "),
                list("food_sources"),
                Text(", deficiency symptoms: "),
                list("deficiency_symptoms"),
                Text(", interaction notes: "),
                field("interaction_notes"),
            ],
            ChunkType::TrainingZone => vec![
                Text("Zone "),
                field("zone"),
                Text(": "),
                field("name"),
                Text(", HR: "),
                field("hr_percentage"),
                Text(", RPE: "),
                field("rpe_scale"),
                Text(", substrate: "),
                field("primary_substrate"),
                Text(", nutrition focus: "),
                list("nutrition_focus"),
                Text(", recovery time: "),
                field("recovery_time"),
            ],
            ChunkType::BodyComposition => {
                vec![Text("Body composition ("), Category, Text(") "), Name, Text(": "), Record]
            }
            ChunkType::Supplement => vec![
                Text("Supplement "),
                Name,
                Text(" (tier "),
                Category,
                Text("): dosage: "),
                field("dosage"),
                Text(", timing: "),
                field("timing"),
                Text(", benefits: "),
                list("benefits"),
                Text(", evidence: "),
                field("evidence_grade"),
            ],
            ChunkType::Timing => vec![Text("Protocol "), Name, Text(": "), Record],
            ChunkType::IndividualFactor => vec![Text("Individual factors - "), Name, Text(": "), Record],
            ChunkType::Food => return Self::food(&FoodColumns::default()),
        };
        Self::new(segments)
    }

    /// Template for food table rows with the given column names.
    pub fn food(columns: &FoodColumns) -> Self {
        use Segment::*;

        Self::new(vec![
            Text("Food: "),
            Field(columns.description.clone()),
            Text(", category: "),
            Field(columns.category.clone()),
            Text(", energy: "),
            Field(columns.energy.clone()),
            Text(" kcal, protein: "),
            Field(columns.protein.clone()),
            Text("g, carbohydrate: "),
            Field(columns.carbohydrate.clone()),
            Text("g, fat: "),
            Field(columns.fat.clone()),
            Text("g, fiber: "),
            Field(columns.fiber.clone()),
            Text("g"),
        ])
    }
}

/// One template per chunk type
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: HashMap<ChunkType, Template>,
}

impl TemplateSet {
    pub fn new(columns: &FoodColumns) -> Self {
        let templates = ChunkType::ALL
            .into_iter()
            .map(|kind| (kind, Template::for_kind(kind, columns)))
            .collect();
        Self { templates }
    }

    pub fn get(&self, kind: ChunkType) -> &Template {
        // every ChunkType is inserted by new()
        &self.templates[&kind]
    }
}

fn push_scalar(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str(PLACEHOLDER),
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                push_scalar(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => push_map(out, map),
    }
}

fn push_map(out: &mut String, map: &Map<String, Value>) {
    out.push('{');
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(key);
        out.push_str(": ");
        push_scalar(out, value);
    }
    out.push('}');
}

fn push_record(out: &mut String, data: &Map<String, Value>) {
    // wrapped leaf values render as the bare value
    match data.get(WRAPPED_VALUE_KEY) {
        Some(value) if data.len() == 1 => push_scalar(out, value),
        _ => push_map(out, data),
    }
}
