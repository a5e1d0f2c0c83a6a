//! Record output for summaries.
//!
//! [`RecordWriter`] streams any `Serialize` row as CSV, a JSON array, or
//! NDJSON. The CSV header is taken from the caller, so an empty summary
//! still names its columns.

use serde::Serialize;
use std::io::Write;

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    IoError(std::io::Error),
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<csv::Error> for SerializationError {
    fn from(err: csv::Error) -> Self {
        SerializationError::CsvError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::CsvError(e) => write!(f, "CSV error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SerializationError {}

/// Machine-readable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// Header line, then one record per row
    Csv,
    /// A single JSON array, `[]` when empty
    Json,
    /// One JSON object per line
    Ndjson,
}

enum Sink<W: Write> {
    Csv(csv::Writer<W>),
    Json { writer: W, first: bool },
    Ndjson(W),
}

/// Row writer for one [`RecordFormat`].
pub struct RecordWriter<W: Write> {
    sink: Sink<W>,
}

impl<W: Write> RecordWriter<W> {
    /// Open a writer, emitting the CSV header or the opening bracket up front.
    pub fn new(
        mut writer: W,
        format: RecordFormat,
        header: &[&str],
    ) -> Result<Self, SerializationError> {
        let sink = match format {
            RecordFormat::Csv => {
                let mut csv_writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(writer);
                csv_writer.write_record(header)?;
                Sink::Csv(csv_writer)
            }
            RecordFormat::Json => {
                write!(writer, "[")?;
                Sink::Json {
                    writer,
                    first: true,
                }
            }
            RecordFormat::Ndjson => Sink::Ndjson(writer),
        };
        Ok(Self { sink })
    }

    pub fn write<T: Serialize>(&mut self, row: &T) -> Result<(), SerializationError> {
        match &mut self.sink {
            Sink::Csv(writer) => writer.serialize(row)?,
            Sink::Json { writer, first } => {
                if !*first {
                    write!(writer, ",")?;
                }
                *first = false;
                serde_json::to_writer(&mut *writer, row)?;
            }
            Sink::Ndjson(writer) => {
                serde_json::to_writer(&mut *writer, row)?;
                writeln!(writer)?;
            }
        }
        Ok(())
    }

    pub fn write_all<'a, T, I>(&mut self, rows: I) -> Result<(), SerializationError>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for row in rows {
            self.write(row)?;
        }
        Ok(())
    }

    /// Close the JSON array if any, and flush.
    pub fn finish(self) -> Result<(), SerializationError> {
        match self.sink {
            Sink::Csv(mut writer) => writer.flush()?,
            Sink::Json { mut writer, .. } => {
                writeln!(writer, "]")?;
                writer.flush()?;
            }
            Sink::Ndjson(mut writer) => writer.flush()?,
        }
        Ok(())
    }
}
