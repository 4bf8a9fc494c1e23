use std::collections::HashMap;
use std::fmt;
use rusqlite::types::{Null, ToSql, ToSqlOutput, ValueRef};
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl RecordId {
    pub fn new(id: i64) -> Self {
        RecordId(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Zero means "not inserted yet".
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Null,
}

impl FieldValue {
    /// Zero, empty, false and NULL all count as "no value".
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Integer(i) => *i == 0,
            FieldValue::Real(f) => *f == 0.0,
            FieldValue::Boolean(b) => !b,
            FieldValue::Null => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Real(_) => "real",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Null => "null",
        }
    }

    /// Decode a cell read from the store. NULL surfaces as an empty string.
    pub fn from_cell(cell: ValueRef<'_>) -> Self {
        match cell {
            ValueRef::Null => FieldValue::Text(String::new()),
            ValueRef::Integer(i) => FieldValue::Integer(i),
            ValueRef::Real(f) => FieldValue::Real(f),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                FieldValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<RecordId> for FieldValue {
    fn from(value: RecordId) -> Self {
        FieldValue::Integer(value.0)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Text(s) => ToSqlOutput::from(s.as_str()),
            FieldValue::Integer(i) => ToSqlOutput::from(*i),
            FieldValue::Real(f) => ToSqlOutput::from(*f),
            FieldValue::Boolean(b) => ToSqlOutput::from(*b as i64),
            FieldValue::Null => ToSqlOutput::from(Null),
        })
    }
}

/// One row as read from the store, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub fields: HashMap<String, FieldValue>,
}

impl Row {
    pub fn new() -> Self {
        Row {
            fields: HashMap::new(),
        }
    }

    pub fn add_field(&mut self, name: String, value: FieldValue) {
        self.fields.insert(name, value);
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn id(&self) -> Result<RecordId> {
        self.get_i64("id").map(RecordId)
    }

    pub fn get_i64(&self, name: &str) -> Result<i64> {
        match self.fields.get(name) {
            Some(FieldValue::Integer(i)) => Ok(*i),
            other => Err(decode_error(name, "integer", other)),
        }
    }

    pub fn get_text(&self, name: &str) -> Result<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => Ok(s),
            other => Err(decode_error(name, "text", other)),
        }
    }

    /// Booleans are stored as 0/1 integers.
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.fields.get(name) {
            Some(FieldValue::Integer(i)) => Ok(*i == 1),
            Some(FieldValue::Boolean(b)) => Ok(*b),
            other => Err(decode_error(name, "0/1 integer", other)),
        }
    }
}

fn decode_error(column: &str, expected: &str, found: Option<&FieldValue>) -> Error {
    let found = found.map(|v| format!("{:?}", v)).unwrap_or_else(|| "missing".to_string());
    Error::new(
        ErrorKind::Decode,
        format!("cannot convert {} to {}: {}", column, expected, found),
    )
}
