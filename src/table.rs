//! In-memory table model shared by the hasher, the snapshot store and the diff engine

use crate::error::{Result, TabwatchError};
use crate::hash::Fingerprint;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::mem::size_of;

/// A single cell value. `Null` is the NA marker and may appear in any column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// Logical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    Text,
    Date,
    Timestamp,
}

/// Hashable identity of a value, used to align rows by key.
///
/// Floats are reduced to their canonical bit pattern, so `-0.0` and `0.0`
/// share an identity and every NaN maps to the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAtom<'a> {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(u64),
    Text(&'a str),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// Bit pattern used for both hashing and key identity of a float
pub fn canonical_float_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Logical type of this value, `None` for the NA marker
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Integer(_) => Some(DataType::Integer),
            Value::Float(_) => Some(DataType::Float),
            Value::Text(_) => Some(DataType::Text),
            Value::Date(_) => Some(DataType::Date),
            Value::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    /// NA-safe equality: both null is equal, exactly one null is unequal,
    /// otherwise the natural equality of the type. Floats compare exactly,
    /// with NaN treated as equal to NaN.
    pub fn na_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (a, b) => a == b,
        }
    }

    pub fn key_atom(&self) -> KeyAtom<'_> {
        match self {
            Value::Null => KeyAtom::Null,
            Value::Boolean(b) => KeyAtom::Boolean(*b),
            Value::Integer(i) => KeyAtom::Integer(*i),
            Value::Float(f) => KeyAtom::Float(canonical_float_bits(*f)),
            Value::Text(s) => KeyAtom::Text(s.as_str()),
            Value::Date(d) => KeyAtom::Date(*d),
            Value::Timestamp(ts) => KeyAtom::Timestamp(*ts),
        }
    }

    fn heap_size(&self) -> usize {
        match self {
            Value::Text(s) => s.len(),
            _ => 0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NA"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(_) | Value::Timestamp(_) => serializer.collect_str(self),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Text => "TEXT",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
        };
        f.write_str(name)
    }
}

/// A named, single-typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub values: Vec<Value>,
}

impl Column {
    /// Create a column, inferring its type from the first non-null value.
    /// All-null columns default to `TEXT`.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        let data_type = values
            .iter()
            .find_map(Value::data_type)
            .unwrap_or(DataType::Text);
        Self::with_type(name, data_type, values)
    }

    /// Create a column with a declared type; every non-null value must match it
    pub fn with_type(name: impl Into<String>, data_type: DataType, values: Vec<Value>) -> Result<Self> {
        let name = name.into();
        if let Some((row, value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| v.data_type().map_or(false, |t| t != data_type))
        {
            return Err(TabwatchError::invalid_input(format!(
                "Column '{}' is {} but row {} holds {:?}",
                name, data_type, row, value
            )));
        }

        Ok(Self {
            name,
            data_type,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}

/// Bookkeeping the surrounding pipeline attaches to a table.
///
/// None of it is content: fingerprints never see these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableMeta {
    /// Ordered key columns, empty when the table is not keyed
    pub key_columns: Vec<String>,
    /// Fingerprint of the snapshot this table should be compared against
    pub reference: Option<Fingerprint>,
    /// Whether the pipeline should snapshot this table before each transformation
    pub watched: bool,
}

/// An ordered set of equally long columns plus bookkeeping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    meta: TableMeta,
}

impl Table {
    /// Build a table, rejecting duplicate column names and ragged columns
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TabwatchError::invalid_input(format!(
                    "Duplicate column name: {}",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            if let Some(ragged) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(TabwatchError::invalid_input(format!(
                    "Column '{}' has {} rows but column '{}' has {}",
                    ragged.name,
                    ragged.len(),
                    first.name,
                    first.len()
                )));
            }
        }

        Ok(Self {
            columns,
            meta: TableMeta::default(),
        })
    }

    /// Build a table from row-major data
    pub fn from_rows(names: &[&str], rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut buffers: Vec<Vec<Value>> = names.iter().map(|_| Vec::with_capacity(rows.len())).collect();
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(TabwatchError::invalid_input(format!(
                    "Row {} has {} values, expected {}",
                    row_idx,
                    row.len(),
                    names.len()
                )));
            }
            for (buffer, value) in buffers.iter_mut().zip(row) {
                buffer.push(value);
            }
        }

        let columns = names
            .iter()
            .zip(buffers)
            .map(|(name, values)| Column::new(*name, values))
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns)
    }

    pub fn with_key_columns<I, S>(mut self, key_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.key_columns = key_columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reference(mut self, reference: Option<Fingerprint>) -> Self {
        self.meta.reference = reference;
        self
    }

    pub fn with_watched(mut self, watched: bool) -> Self {
        self.meta.watched = watched;
        self
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut TableMeta {
        &mut self.meta
    }

    /// True when the bookkeeping names at least one key column
    pub fn has_key(&self) -> bool {
        !self.meta.key_columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Cell at (row, column index)
    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.columns.get(column)?.values.get(row)
    }

    /// Full row in column order
    pub fn row(&self, row: usize) -> Option<Vec<Value>> {
        if row >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[row].clone()).collect())
    }

    /// Approximate payload size in bytes: inline value slots plus text and name bytes.
    /// Deterministic for a given content, independent of allocator slack.
    pub fn estimated_size_bytes(&self) -> u64 {
        let mut total = size_of::<Table>();
        for column in &self.columns {
            total += size_of::<Column>() + column.name.len();
            total += column.values.len() * size_of::<Value>();
            total += column.values.iter().map(Value::heap_size).sum::<usize>();
        }
        total as u64
    }
}
