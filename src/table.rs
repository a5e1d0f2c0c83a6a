//! In-memory tabular values.
//!
//! Tables arrive with whatever columns their source had. Consumers resolve
//! the columns they need up front with [`Table::require_columns`] and then
//! read cells by index.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Borrow the text of a `String` cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the cell. Numeric text is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Error type for table access
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    /// One or more columns are absent from a table
    MissingColumns {
        table: String,
        columns: Vec<String>,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::MissingColumns { table, columns } => {
                write!(f, "Table '{}' is missing columns: {}", table, columns.join(", "))
            }
        }
    }
}

impl std::error::Error for TableError {}

/// A named, column-ordered snapshot of rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<FieldValue>>,
}

impl Table {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builder form of [`Table::push_row`].
    pub fn with_row<I, V>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.push_row(cells);
        self
    }

    pub fn push_row<I, V>(&mut self, cells: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Resolve every requested column to its index.
    ///
    /// Fails with all absent names, not just the first one.
    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>, TableError> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();

        for name in names {
            match self.column_index(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(TableError::MissingColumns {
                table: self.name.clone(),
                columns: missing,
            });
        }

        Ok(indices)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[FieldValue]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Cell at `(row, col)`. Short rows read as `Null` past their end.
    pub fn get(&self, row: usize, col: usize) -> Option<&FieldValue> {
        static NULL: FieldValue = FieldValue::Null;
        let cells = self.rows.get(row)?;
        if col >= self.columns.len() {
            return None;
        }
        Some(cells.get(col).unwrap_or(&NULL))
    }
}

/// Hashable form of an identifier cell used for equality joins.
///
/// Integers and integral floats compare equal, text compares exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Int(i64),
    Text(String),
}

impl JoinKey {
    /// `None` for cells that can never match: nulls, booleans, and floats
    /// that are not integers within the `i64` range.
    pub fn from_value(value: &FieldValue) -> Option<Self> {
        // 2^63; `i64::MAX as f64` rounds up to it.
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        match value {
            FieldValue::Int(i) => Some(JoinKey::Int(*i)),
            FieldValue::Float(f) if f.fract() == 0.0 && (-LIMIT..LIMIT).contains(f) => {
                Some(JoinKey::Int(*f as i64))
            }
            FieldValue::String(s) => Some(JoinKey::Text(s.clone())),
            FieldValue::Date(d) => Some(JoinKey::Text(d.format("%Y-%m-%d").to_string())),
            FieldValue::Float(_) | FieldValue::Bool(_) | FieldValue::Null => None,
        }
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKey::Int(i) => write!(f, "{}", i),
            JoinKey::Text(s) => write!(f, "{}", s),
        }
    }
}
