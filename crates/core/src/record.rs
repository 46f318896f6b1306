//! Flat input records and typed column access.
//!
//! Readers produce one ordered sequence of flat key/value records per record
//! kind (spreadsheet rows or flattened JSON-schema properties). The core only
//! ever reads them through [`Row`], which attaches the record kind and the
//! row's position in its source stream for error reporting.

use crate::error::BuildError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One flat record: column name -> cell value.
pub type Record = Map<String, Value>;

/// Column names shared by all readers and writers.
pub mod columns {
    pub const LAYER: &str = "Layer";
    pub const OBJECT: &str = "Object";
    pub const PROCEDURE: &str = "Procedure";
    pub const RESOURCE: &str = "Resource";
    pub const DESCRIPTION: &str = "Description";
    pub const ARGUMENTS: &str = "Arguments";
    pub const SAMPLE: &str = "Sample";
    pub const FIELD: &str = "Field";
    pub const TYPE: &str = "Type";
    pub const RIGHTS: &str = "Rights";
    pub const SECTION: &str = "Section";
    pub const REQUIRED: &str = "Required";
    pub const DEFAULT_VALUE: &str = "Default Value";
    pub const POSSIBLE_VALUES: &str = "Possible Values";
    pub const FORMAT: &str = "Format";
    pub const CODE: &str = "Code";
    pub const NAME: &str = "Name";
    pub const INSTANCE: &str = "Instance";
    pub const RAISED_BY: &str = "Raised By";
    pub const NUMBER: &str = "Number";
    pub const DATE: &str = "Date";
    pub const CHANGES: &str = "Changes";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Procedure,
    Field,
    Event,
    Instance,
    ResponseCode,
    Version,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Procedure => "procedure",
            RecordKind::Field => "field",
            RecordKind::Event => "event",
            RecordKind::Instance => "instance",
            RecordKind::ResponseCode => "response code",
            RecordKind::Version => "version",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All record streams of one specification, as handed over by a reader.
/// Stream order is irrelevant; the normalizer sorts each stream.
#[derive(Debug, Clone, Default)]
pub struct RecordStreams {
    pub procedures: Vec<Record>,
    pub fields: Vec<Record>,
    pub events: Vec<Record>,
    pub instances: Vec<Record>,
    pub response_codes: Vec<Record>,
    pub versions: Vec<Record>,
}

/// Read-only view over one record, tagged with its kind and source position.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    kind: RecordKind,
    index: usize,
    record: &'a Record,
}

impl<'a> Row<'a> {
    pub fn new(kind: RecordKind, index: usize, record: &'a Record) -> Self {
        Row {
            kind,
            index,
            record,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Zero-based position of the record in its source stream.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self, column: &str) -> Option<&'a Value> {
        self.record.get(column)
    }

    /// Cell text; missing and null cells read as the empty string and
    /// numbers are rendered in their JSON form.
    pub fn text(&self, column: &str) -> String {
        match self.record.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Cell text that must be present and non-blank.
    pub fn required_text(&self, column: &str) -> Result<String, BuildError> {
        let text = self.text(column);
        if text.trim().is_empty() {
            return Err(self.malformed(column, "is missing"));
        }
        Ok(text)
    }

    /// Integer cell. Accepts JSON integers, integral floats and numeric strings.
    pub fn integer(&self, column: &str) -> Result<i64, BuildError> {
        match self.record.get(column) {
            None | Some(Value::Null) => Err(self.malformed(column, "is missing")),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .ok_or_else(|| self.malformed(column, "is not an integer")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| self.malformed(column, "is not an integer")),
            Some(_) => Err(self.malformed(column, "is not an integer")),
        }
    }

    pub fn malformed(&self, column: &str, message: &str) -> BuildError {
        BuildError::MalformedRecord {
            kind: self.kind,
            row: self.index,
            column: column.to_string(),
            message: message.to_string(),
        }
    }
}

/// Tag every record of a stream with its kind and index.
pub fn rows(kind: RecordKind, records: &[Record]) -> impl Iterator<Item = Row<'_>> {
    records
        .iter()
        .enumerate()
        .map(move |(index, record)| Row::new(kind, index, record))
}
