use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::chunk::ChunkType;
use crate::source::SourceRecord;
use crate::{Error, Result};

/// Names of the food table columns the core depends on
///
/// Defaults are the headers of the TACO food composition table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FoodColumns {
    pub description: String,
    pub category: String,
    pub energy: String,
    pub protein: String,
    pub carbohydrate: String,
    pub fat: String,
    pub fiber: String,
}

impl FoodColumns {
    /// Every required column, in template order.
    pub fn required(&self) -> [&str; 7] {
        [
            self.description.as_str(),
            self.category.as_str(),
            self.energy.as_str(),
            self.protein.as_str(),
            self.carbohydrate.as_str(),
            self.fat.as_str(),
            self.fiber.as_str(),
        ]
    }
}

impl Default for FoodColumns {
    fn default() -> Self {
        Self {
            description: "Descrição dos alimentos".to_string(),
            category: "Categoria do alimento".to_string(),
            energy: "Energia (kcal)".to_string(),
            protein: "Proteína (g)".to_string(),
            carbohydrate: "Carboidrato (g)".to_string(),
            fat: "Lipídeos (g)".to_string(),
            fiber: "Fibra Alimentar (g)".to_string(),
        }
    }
}

/// How to read the food table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Field delimiter
    pub delimiter: char,
    pub columns: FoodColumns,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: ';',
            columns: FoodColumns::default(),
        }
    }
}

/// A parsed food table
///
/// Values are kept as the raw strings found in the file; the table never
/// interprets numbers.
#[derive(Debug, Clone)]
pub struct FoodTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    columns: FoodColumns,
}

impl FoodTable {
    /// Read and parse a delimited food table.
    pub fn read(path: &Path, options: &TableOptions) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::DataSource(format!("cannot read food table {}: {e}", path.display())))?;
        let table = Self::parse(&text, options)?;
        tracing::debug!(path = %path.display(), rows = table.len(), "read food table");
        Ok(table)
    }

    /// Parse delimited text whose first line is the header.
    pub fn parse(text: &str, options: &TableOptions) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.lines().enumerate();

        let Some((_, header_line)) = lines.next() else {
            return Err(Error::DataSource("food table is empty".to_string()));
        };
        let headers: Vec<String> = split_fields(header_line, options.delimiter)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let missing: Vec<&str> = options
            .columns
            .required()
            .into_iter()
            .filter(|col| !headers.iter().any(|h| h.as_str() == *col))
            .collect();
        if !missing.is_empty() {
            return Err(Error::DataSource(format!(
                "food table is missing required column(s): {}",
                missing.join(", ")
            )));
        }

        let mut rows = Vec::new();
        for (i, line) in lines {
            if line.trim().is_empty() {
                tracing::warn!(line = i + 1, "skipping blank food table line");
                continue;
            }
            let fields = split_fields(line, options.delimiter);
            if fields.len() != headers.len() {
                return Err(Error::DataSource(format!(
                    "food table line {} has {} fields, expected {}",
                    i + 1,
                    fields.len(),
                    headers.len()
                )));
            }
            rows.push(fields);
        }

        Ok(Self {
            headers,
            rows,
            columns: options.columns.clone(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One food record per row, in file order.
    pub fn records(&self) -> Vec<SourceRecord> {
        self.rows.iter().map(|row| self.record(row)).collect()
    }

    fn record(&self, row: &[String]) -> SourceRecord {
        let data: Map<String, Value> = self
            .headers
            .iter()
            .zip(row)
            .map(|(h, v)| (h.clone(), Value::String(v.clone())))
            .collect();
        let field = |col: &str| {
            data.get(col)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let category = field(&self.columns.category);
        let name = field(&self.columns.description);
        SourceRecord::new(ChunkType::Food, category, name, data)
    }
}

/// Split one line into fields, honouring double-quoted fields with `""`
/// escapes.
fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Número do Alimento;Categoria do alimento;Descrição dos alimentos;Energia (kcal);Proteína (g);Lipídeos (g);Carboidrato (g);Fibra Alimentar (g)";

    #[test]
    fn test_parse_keeps_raw_values() {
        let text = format!("{HEADER}\n1;Carnes e derivados;Frango, peito, grelhado;159;32,0;2,5;0,0;NA\n");
        let table = FoodTable::parse(&text, &TableOptions::default()).unwrap();

        assert_eq!(table.len(), 1);
        let records = table.records();
        let r = &records[0];
        assert_eq!(r.kind, ChunkType::Food);
        assert_eq!(r.category, "Carnes e derivados");
        assert_eq!(r.name, "Frango, peito, grelhado");
        assert_eq!(r.data["Proteína (g)"], "32,0");
        assert_eq!(r.data["Fibra Alimentar (g)"], "NA");
    }

    #[test]
    fn test_quoted_fields_may_contain_delimiter() {
        let text = format!("{HEADER}\n2;Cereais;\"Arroz; integral, \"\"cozido\"\"\";124;2,6;1,0;25,8;2,7\n");
        let table = FoodTable::parse(&text, &TableOptions::default()).unwrap();
        assert_eq!(table.records()[0].name, "Arroz; integral, \"cozido\"");
    }

    #[test]
    fn test_missing_required_column() {
        let text = "Descrição dos alimentos;Categoria do alimento;Energia (kcal)\nA;B;1\n";
        let err = FoodTable::parse(text, &TableOptions::default()).unwrap_err();
        let Error::DataSource(msg) = err else {
            panic!("expected data source error");
        };
        assert!(msg.contains("Proteína (g)"));
        assert!(msg.contains("Fibra Alimentar (g)"));
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let text = format!("{HEADER}\n1;Carnes;Frango;159\n");
        let err = FoodTable::parse(&text, &TableOptions::default()).unwrap_err();
        assert!(matches!(err, Error::DataSource(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_blank_lines_and_bom_are_ignored() {
        let text = format!("\u{feff}{HEADER}\r\n\r\n1;Carnes;Frango;159;32,0;2,5;0,0;0\r\n");
        let table = FoodTable::parse(&text, &TableOptions::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.headers()[0], "Número do Alimento");
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            FoodTable::parse("", &TableOptions::default()),
            Err(Error::DataSource(_))
        ));
    }

    #[test]
    fn test_custom_delimiter() {
        let options = TableOptions {
            delimiter: ',',
            columns: FoodColumns::default(),
        };
        let text = "Descrição dos alimentos,Categoria do alimento,Energia (kcal),Proteína (g),Carboidrato (g),Lipídeos (g),Fibra Alimentar (g)\nOvo,Ovos,146,13.3,0.6,9.5,0\n";
        let table = FoodTable::parse(text, &options).unwrap();
        assert_eq!(table.records()[0].data["Proteína (g)"], "13.3");
    }
}
