//! Loading tables from JSON files

use crate::error::{Result, TabwatchError};
use crate::table::{Column, DataType, Table, Value};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;

/// Reads tables from JSON, either an array of flat records or an object of column arrays
pub struct DataProcessor;

impl DataProcessor {
    /// Check if file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| {
                ["json", "jsonl", "ndjson"]
                    .iter()
                    .any(|supported| ext.eq_ignore_ascii_case(supported))
            })
    }

    /// Load a table from a file
    pub fn load_table(path: &Path) -> Result<Table> {
        if !path.is_file() {
            return Err(TabwatchError::invalid_input(format!(
                "File not found: {}",
                path.display()
            )));
        }
        if !Self::is_supported_format(path) {
            return Err(TabwatchError::invalid_input(format!(
                "Unsupported file format: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let is_lines = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| !ext.eq_ignore_ascii_case("json"));

        let table = if is_lines {
            Self::table_from_json_lines(&content)
        } else {
            let json: JsonValue = serde_json::from_str(&content).map_err(|e| {
                TabwatchError::invalid_input(format!("Malformed JSON file '{}': {}", path.display(), e))
            })?;
            Self::table_from_json(&json)
        }?;

        log::debug!(
            "Loaded {} rows x {} columns from {}",
            table.row_count(),
            table.column_count(),
            path.display()
        );
        Ok(table)
    }

    /// Build a table from a parsed JSON document
    pub fn table_from_json(json: &JsonValue) -> Result<Table> {
        match json {
            JsonValue::Array(records) => Self::table_from_records(records),
            JsonValue::Object(columns) => {
                let mut raw: IndexMap<String, Vec<JsonValue>> = IndexMap::new();
                for (name, values) in columns {
                    let values = values.as_array().ok_or_else(|| {
                        TabwatchError::invalid_input(format!("Column '{}' is not an array", name))
                    })?;
                    raw.insert(name.clone(), values.clone());
                }
                let mut lengths = raw.iter().map(|(name, values)| (name, values.len()));
                if let Some((first_name, first_len)) = lengths.next() {
                    if let Some((name, len)) = lengths.find(|&(_, len)| len != first_len) {
                        return Err(TabwatchError::data_processing(format!(
                            "Column '{}' has {} values but column '{}' has {}",
                            name, len, first_name, first_len
                        )));
                    }
                }
                Self::build_table(raw)
            }
            _ => Err(TabwatchError::invalid_input(
                "Expected a JSON array of records or an object of column arrays",
            )),
        }
    }

    /// Build a table from newline-delimited JSON records
    pub fn table_from_json_lines(content: &str) -> Result<Table> {
        let records = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|e| {
                    TabwatchError::invalid_input(format!("Malformed JSON on line {}: {}", idx + 1, e))
                })
            })
            .collect::<Result<Vec<JsonValue>>>()?;
        Self::table_from_records(&records)
    }

    fn table_from_records(records: &[JsonValue]) -> Result<Table> {
        // Column order is the order in which keys are first seen.
        let mut raw: IndexMap<String, Vec<JsonValue>> = IndexMap::new();
        for (row_idx, record) in records.iter().enumerate() {
            let fields = record.as_object().ok_or_else(|| {
                TabwatchError::invalid_input(format!("Record {} is not a JSON object", row_idx))
            })?;
            for name in fields.keys() {
                raw.entry(name.clone())
                    .or_insert_with(|| vec![JsonValue::Null; row_idx]);
            }
            for (name, values) in raw.iter_mut() {
                values.push(fields.get(name).cloned().unwrap_or(JsonValue::Null));
            }
        }
        Self::build_table(raw)
    }

    fn build_table(raw: IndexMap<String, Vec<JsonValue>>) -> Result<Table> {
        let columns = raw
            .into_iter()
            .map(|(name, values)| Self::convert_column(name, &values))
            .collect::<Result<Vec<_>>>()?;
        Table::new(columns)
    }

    fn convert_column(name: String, values: &[JsonValue]) -> Result<Column> {
        if let Some(nested) = values.iter().find(|v| v.is_object() || v.is_array()) {
            return Err(TabwatchError::invalid_input(format!(
                "Column '{}' holds a nested value ({}); only scalar columns are supported",
                name, nested
            )));
        }

        let data_type = Self::infer_column_type(values);
        let converted = values
            .iter()
            .map(|v| Self::convert_value(v, data_type))
            .collect();
        Column::with_type(name, data_type, converted)
    }

    /// Infer the column type from its non-null values
    fn infer_column_type(values: &[JsonValue]) -> DataType {
        let non_null: Vec<&JsonValue> = values.iter().filter(|v| !v.is_null()).collect();
        if non_null.is_empty() {
            return DataType::Text;
        }

        if non_null.iter().all(|v| v.is_boolean()) {
            DataType::Boolean
        } else if non_null.iter().all(|v| v.is_i64()) {
            DataType::Integer
        } else if non_null.iter().all(|v| v.is_number()) {
            DataType::Float
        } else if non_null.iter().all(|v| v.as_str().map_or(false, |s| parse_date(s).is_some())) {
            DataType::Date
        } else if non_null.iter().all(|v| v.as_str().map_or(false, |s| parse_timestamp(s).is_some())) {
            DataType::Timestamp
        } else {
            DataType::Text
        }
    }

    fn convert_value(value: &JsonValue, data_type: DataType) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        match data_type {
            DataType::Boolean => value.as_bool().map_or(Value::Null, Value::Boolean),
            DataType::Integer => value.as_i64().map_or(Value::Null, Value::Integer),
            DataType::Float => value.as_f64().map_or(Value::Null, Value::Float),
            DataType::Date => value
                .as_str()
                .and_then(parse_date)
                .map_or(Value::Null, Value::Date),
            DataType::Timestamp => value
                .as_str()
                .and_then(parse_timestamp)
                .map_or(Value::Null, Value::Timestamp),
            DataType::Text => match value {
                JsonValue::String(s) => Value::Text(s.clone()),
                other => Value::Text(other.to_string()),
            },
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
}
