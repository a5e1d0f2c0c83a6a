//! CSV loading for fact, dimension, and catalog tables.
//!
//! Headers become column names. Cells are trimmed and typed by inference:
//! empty cells load as `Null`, integers as `Int`, other numbers as `Float`,
//! everything else as text. Dates stay textual and are normalized by the
//! transform.

use crate::table::{FieldValue, Table};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Errors that can occur when loading CSV files.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Csv(err)
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "Failed to open file: {}", e),
            LoadError::Csv(e) => write!(f, "Failed to parse CSV: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

/// Infer a cell value from its CSV text.
pub fn infer_value(raw: &str) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return FieldValue::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return FieldValue::Float(f);
        }
    }
    FieldValue::String(trimmed.to_string())
}

/// Read a table from any CSV source with a header row.
pub fn read_csv_table<R: Read>(reader: R, name: &str) -> Result<Table, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut table = Table::new(name, headers.iter());

    for result in csv_reader.records() {
        let record = result?;
        table.push_row(record.iter().map(infer_value));
    }

    tracing::debug!("Loaded {} rows into table '{}'", table.len(), name);
    Ok(table)
}

/// Load a table from a CSV file.
///
/// # Arguments
/// * `path` - Path to the CSV file
/// * `name` - Table name used in error messages
pub fn load_csv_table(path: &Path, name: &str) -> Result<Table, LoadError> {
    let file = File::open(path)?;
    read_csv_table(BufReader::new(file), name)
}

/// Load a metadata catalog, typically an export of `INFORMATION_SCHEMA.COLUMNS`.
///
/// Every cell stays textual so identifiers such as `2021` keep their exact spelling.
pub fn load_catalog(path: &Path) -> Result<Table, LoadError> {
    let file = File::open(path)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = csv_reader.headers()?.clone();
    let mut table = Table::new("catalog", headers.iter());

    for result in csv_reader.records() {
        let record = result?;
        table.push_row(record.iter().map(|cell| {
            if cell.is_empty() {
                FieldValue::Null
            } else {
                FieldValue::from(cell)
            }
        }));
    }

    tracing::debug!("Loaded {} catalog rows from {}", table.len(), path.display());
    Ok(table)
}
