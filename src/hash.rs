//! Content fingerprints for tables

use crate::error::{Result, TabwatchError};
use crate::table::{canonical_float_bits, Column, Table, Value};
use blake3::Hasher;
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const TAG_NULL: u8 = 0;
const TAG_BOOLEAN: u8 = 1;
const TAG_INTEGER: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_TEXT: u8 = 4;
const TAG_DATE: u8 = 5;
const TAG_TIMESTAMP: u8 = 6;

/// 64-bit content fingerprint, displayed as 16 hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = TabwatchError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.len() > 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TabwatchError::invalid_input(format!(
                "Invalid fingerprint: '{}'",
                s
            )));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| TabwatchError::invalid_input(format!("Invalid fingerprint: '{}'", s)))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Streams a table's canonical serialization into blake3.
///
/// Layout: column count, each name (length-prefixed), row count, then the
/// cells column-major as tag + fixed-width or length-prefixed payload.
struct HashComputer {
    hasher: Hasher,
}

impl HashComputer {
    fn new() -> Self {
        Self {
            hasher: Hasher::new(),
        }
    }

    fn write_u64(&mut self, value: u64) {
        self.hasher.update(&value.to_le_bytes());
    }

    fn write_str(&mut self, value: &str) {
        self.write_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => {
                self.hasher.update(&[TAG_NULL]);
            }
            Value::Boolean(b) => {
                self.hasher.update(&[TAG_BOOLEAN, *b as u8]);
            }
            Value::Integer(i) => {
                self.hasher.update(&[TAG_INTEGER]);
                self.hasher.update(&i.to_le_bytes());
            }
            Value::Float(f) => {
                self.hasher.update(&[TAG_FLOAT]);
                self.write_u64(canonical_float_bits(*f));
            }
            Value::Text(s) => {
                self.hasher.update(&[TAG_TEXT]);
                self.write_str(s);
            }
            Value::Date(d) => {
                self.hasher.update(&[TAG_DATE]);
                self.hasher.update(&d.num_days_from_ce().to_le_bytes());
            }
            Value::Timestamp(ts) => {
                self.hasher.update(&[TAG_TIMESTAMP]);
                self.hasher.update(&ts.date().num_days_from_ce().to_le_bytes());
                self.hasher.update(&ts.time().num_seconds_from_midnight().to_le_bytes());
                self.hasher.update(&ts.time().nanosecond().to_le_bytes());
            }
        }
    }

    fn write_columns(&mut self, columns: &[&Column], row_count: usize) {
        self.write_u64(columns.len() as u64);
        for column in columns {
            self.write_str(&column.name);
        }
        self.write_u64(row_count as u64);
        for column in columns {
            for value in &column.values {
                self.write_value(value);
            }
        }
    }

    fn finish(self) -> Fingerprint {
        let digest = self.hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        Fingerprint(u64::from_le_bytes(prefix))
    }
}

/// Fingerprint of a table's content: column names, their order and every cell.
/// Bookkeeping in [`crate::table::TableMeta`] is never included.
pub fn fingerprint_of(table: &Table) -> Fingerprint {
    let columns: Vec<&Column> = table.columns().iter().collect();
    let mut computer = HashComputer::new();
    computer.write_columns(&columns, table.row_count());
    computer.finish()
}

/// Fingerprint restricted to the given columns, in the given order.
///
/// Hashing every column in table order gives the same value as [`fingerprint_of`].
pub fn fingerprint_of_columns<S: AsRef<str>>(table: &Table, column_names: &[S]) -> Result<Fingerprint> {
    let columns = column_names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            table
                .column(name)
                .ok_or_else(|| TabwatchError::missing_column(name, "table being fingerprinted"))
        })
        .collect::<Result<Vec<&Column>>>()?;

    let mut computer = HashComputer::new();
    computer.write_columns(&columns, table.row_count());
    Ok(computer.finish())
}
