//! Criteria filtering
//!
//! A plain, non-vector selection path over the chunks of one type. Every
//! condition must hold for a chunk to match. Results keep chunk order and are
//! truncated to the criteria's limit; nothing is ranked.
//!
//! Numeric fields are parsed with an explicit [`DecimalSeparator`]. A chunk
//! whose field is absent or does not parse is excluded from the result; the
//! scan carries on with the next chunk.
//!
//! # Usage
//!
//! ```ignore
//! use fitrag_lib::filter::FilterCriteria;
//!
//! let criteria = FilterCriteria::foods(&columns)
//!     .min_protein(15.0)
//!     .category("Carnes e derivados");
//! let meats = engine.filter(&criteria);
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::chunk::{Chunk, ChunkType};
use crate::source::FoodColumns;

/// Default maximum number of chunks a filter returns.
pub const DEFAULT_FILTER_LIMIT: usize = 10;

/// Decimal mark used by numeric string fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparator {
    /// `12.5`
    Dot,
    /// `12,5`
    #[default]
    Comma,
}

impl DecimalSeparator {
    /// Parse a numeric string under this convention.
    ///
    /// Returns `None` for empty, non-numeric or non-finite input, and for
    /// input using the other convention's decimal mark.
    pub fn parse(self, raw: &str) -> Option<f64> {
        let raw = raw.trim();
        let value = match self {
            DecimalSeparator::Dot => {
                if raw.contains(',') {
                    return None;
                }
                raw.parse::<f64>().ok()?
            }
            DecimalSeparator::Comma => {
                if raw.contains('.') {
                    return None;
                }
                raw.replacen(',', ".", 1).parse::<f64>().ok()?
            }
        };
        value.is_finite().then_some(value)
    }

    /// Numeric value of a record field.
    ///
    /// JSON numbers are taken as they are; strings are parsed under this
    /// convention.
    pub fn number(self, value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => self.parse(s),
            _ => None,
        }
    }
}

/// A single filter condition on a `data` field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Numeric field is greater than or equal to the bound
    AtLeast { field: String, value: f64 },
    /// Numeric field is less than or equal to the bound
    AtMost { field: String, value: f64 },
    /// Field equals the given text exactly
    Equals { field: String, value: String },
}

impl Condition {
    fn matches(&self, data: &Map<String, Value>, decimal: DecimalSeparator) -> bool {
        let numeric = |field: &str| data.get(field).and_then(|v| decimal.number(v));
        match self {
            Condition::AtLeast { field, value } => numeric(field).is_some_and(|n| n >= *value),
            Condition::AtMost { field, value } => numeric(field).is_some_and(|n| n <= *value),
            Condition::Equals { field, value } => match data.get(field) {
                Some(Value::String(s)) => s == value,
                Some(other) => other.to_string() == *value,
                None => false,
            },
        }
    }
}

/// Named criteria over the chunks of one type
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub kind: ChunkType,
    pub conditions: Vec<Condition>,
    /// Maximum number of results
    pub limit: usize,
    pub decimal: DecimalSeparator,
    columns: FoodColumns,
}

impl FilterCriteria {
    /// Criteria over chunks of `kind` with no conditions.
    #[must_use]
    pub fn new(kind: ChunkType) -> Self {
        Self {
            kind,
            conditions: Vec::new(),
            limit: DEFAULT_FILTER_LIMIT,
            decimal: DecimalSeparator::default(),
            columns: FoodColumns::default(),
        }
    }

    /// Criteria over food chunks, with the food shortcuts resolving to
    /// `columns`.
    #[must_use]
    pub fn foods(columns: &FoodColumns) -> Self {
        Self {
            columns: columns.clone(),
            ..Self::new(ChunkType::Food)
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn at_least(self, field: impl Into<String>, value: f64) -> Self {
        self.with_condition(Condition::AtLeast { field: field.into(), value })
    }

    #[must_use]
    pub fn at_most(self, field: impl Into<String>, value: f64) -> Self {
        self.with_condition(Condition::AtMost { field: field.into(), value })
    }

    #[must_use]
    pub fn equals(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_condition(Condition::Equals {
            field: field.into(),
            value: value.into(),
        })
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn decimal(mut self, decimal: DecimalSeparator) -> Self {
        self.decimal = decimal;
        self
    }

    #[must_use]
    pub fn min_protein(self, grams: f64) -> Self {
        let field = self.columns.protein.clone();
        self.at_least(field, grams)
    }

    #[must_use]
    pub fn max_carbs(self, grams: f64) -> Self {
        let field = self.columns.carbohydrate.clone();
        self.at_most(field, grams)
    }

    #[must_use]
    pub fn max_fat(self, grams: f64) -> Self {
        let field = self.columns.fat.clone();
        self.at_most(field, grams)
    }

    #[must_use]
    pub fn min_fiber(self, grams: f64) -> Self {
        let field = self.columns.fiber.clone();
        self.at_least(field, grams)
    }

    #[must_use]
    pub fn max_energy(self, kcal: f64) -> Self {
        let field = self.columns.energy.clone();
        self.at_most(field, kcal)
    }

    #[must_use]
    pub fn category(self, category: impl Into<String>) -> Self {
        let field = self.columns.category.clone();
        self.equals(field, category)
    }

    /// Whether a chunk satisfies the type and every condition.
    pub fn matches(&self, chunk: &Chunk) -> bool {
        chunk.kind == self.kind && self.conditions.iter().all(|c| c.matches(&chunk.data, self.decimal))
    }

    /// Matching chunks in original order, at most `limit` of them.
    pub fn apply<'a>(&self, chunks: &'a [Chunk]) -> Vec<&'a Chunk> {
        chunks.iter().filter(|c| self.matches(c)).take(self.limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn food(name: &str, category: &str, protein: &str, carbs: &str) -> Chunk {
        let columns = FoodColumns::default();
        let mut data = Map::new();
        data.insert(columns.description, json!(name));
        data.insert(columns.category, json!(category));
        data.insert(columns.protein, json!(protein));
        data.insert(columns.carbohydrate, json!(carbs));
        Chunk {
            kind: ChunkType::Food,
            category: category.to_string(),
            name: name.to_string(),
            content: format!("Food: {name}"),
            data,
        }
    }

    fn names(chunks: &[&Chunk]) -> Vec<String> {
        chunks.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn test_parse_comma() {
        let d = DecimalSeparator::Comma;
        assert_eq!(d.parse("32,5"), Some(32.5));
        assert_eq!(d.parse(" 7 "), Some(7.0));
        assert_eq!(d.parse("32.5"), None);
        assert_eq!(d.parse("NA"), None);
        assert_eq!(d.parse("Tr"), None);
        assert_eq!(d.parse(""), None);
        assert_eq!(d.parse("1,2,3"), None);
    }

    #[test]
    fn test_parse_dot() {
        let d = DecimalSeparator::Dot;
        assert_eq!(d.parse("32.5"), Some(32.5));
        assert_eq!(d.parse("32,5"), None);
        assert_eq!(d.parse("inf"), None);
        assert_eq!(d.parse("NaN"), None);
    }

    #[test]
    fn test_json_numbers_ignore_convention() {
        assert_eq!(DecimalSeparator::Comma.number(&json!(12.5)), Some(12.5));
        assert_eq!(DecimalSeparator::Dot.number(&json!(3)), Some(3.0));
        assert_eq!(DecimalSeparator::Dot.number(&json!(null)), None);
    }

    #[test]
    fn test_min_protein_and_category() {
        let chunks = vec![
            food("Beef A", "Carnes e derivados", "10,0", "0"),
            food("Beef B", "Carnes e derivados", "20,0", "0"),
            food("Tofu", "Leguminosas", "30,0", "2,0"),
            food("Beef C", "Carnes e derivados", "25,0", "0"),
        ];
        let criteria = FilterCriteria::foods(&FoodColumns::default())
            .min_protein(15.0)
            .category("Carnes e derivados");

        assert_eq!(names(&criteria.apply(&chunks)), ["Beef B", "Beef C"]);
    }

    #[test]
    fn test_unparseable_value_excludes_only_that_chunk() {
        let chunks = vec![
            food("Stray", "Carnes e derivados", "lots", "0"),
            food("Trace", "Carnes e derivados", "Tr", "0"),
            food("Steak", "Carnes e derivados", "26,4", "0"),
        ];
        let criteria = FilterCriteria::foods(&FoodColumns::default()).min_protein(15.0);
        assert_eq!(names(&criteria.apply(&chunks)), ["Steak"]);
    }

    #[test]
    fn test_missing_field_excludes() {
        let mut chunk = food("Mystery", "Outros", "20", "0");
        chunk.data.remove("Proteína (g)");
        let criteria = FilterCriteria::foods(&FoodColumns::default()).min_protein(1.0);
        assert!(!criteria.matches(&chunk));
    }

    #[test]
    fn test_max_carbs_is_inclusive() {
        let chunks = vec![food("Rice", "Cereais", "2,5", "28,1"), food("Egg", "Ovos", "13,0", "1,6")];
        let criteria = FilterCriteria::foods(&FoodColumns::default()).max_carbs(1.6);
        assert_eq!(names(&criteria.apply(&chunks)), ["Egg"]);
    }

    #[test]
    fn test_limit_truncates_in_order() {
        let chunks: Vec<_> = (0..15)
            .map(|i| food(&format!("food {i}"), "Carnes e derivados", "20", "0"))
            .collect();
        let criteria = FilterCriteria::foods(&FoodColumns::default()).min_protein(15.0);
        let found = criteria.apply(&chunks);
        assert_eq!(found.len(), DEFAULT_FILTER_LIMIT);
        assert_eq!(found[0].name, "food 0");
        assert_eq!(found[9].name, "food 9");

        let found = criteria.limit(3).apply(&chunks);
        assert_eq!(names(&found), ["food 0", "food 1", "food 2"]);
    }

    #[test]
    fn test_other_types_are_skipped() {
        let mut supplement = food("Whey", "tier_1", "80", "5");
        supplement.kind = ChunkType::Supplement;
        let criteria = FilterCriteria::foods(&FoodColumns::default()).min_protein(15.0);
        assert!(criteria.apply(&[supplement]).is_empty());
    }

    #[test]
    fn test_dot_convention() {
        let chunks = vec![food("Egg", "Ovos", "13.3", "0.6"), food("Ham", "Carnes", "14,1", "0")];
        let criteria = FilterCriteria::foods(&FoodColumns::default())
            .decimal(DecimalSeparator::Dot)
            .min_protein(10.0);
        assert_eq!(names(&criteria.apply(&chunks)), ["Egg"]);
    }

    #[test]
    fn test_generic_conditions_on_knowledge_chunks() {
        let chunk = Chunk {
            kind: ChunkType::Supplement,
            category: "tier_1".to_string(),
            name: "creatine".to_string(),
            content: String::new(),
            data: json!({"evidence_grade": "A", "daily_grams": 5})
                .as_object()
                .cloned()
                .unwrap(),
        };
        let criteria = FilterCriteria::new(ChunkType::Supplement)
            .equals("evidence_grade", "A")
            .at_most("daily_grams", 5.0);
        assert!(criteria.matches(&chunk));
        assert!(!criteria.clone().at_least("daily_grams", 6.0).matches(&chunk));
    }
}
