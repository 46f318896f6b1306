//! Sheet directory reader.
//!
//! Each record kind lives in its own CSV file whose first row names the
//! columns. Rows with an empty first cell are padding and are skipped. Only
//! `objects.csv` is mandatory.

use hlapi_core::{columns, Record, RecordStreams};
use serde_json::{json, Value};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::error::ReadError;

pub const OBJECTS: &str = "objects.csv";
pub const FIELDS: &str = "fields.csv";
pub const EVENTS: &str = "events.csv";
pub const INSTANCES: &str = "toc.csv";
pub const RESPONSE_CODES: &str = "response_codes.csv";
pub const CHANGE_LOG: &str = "change_log.csv";

/// Change-log columns. One row per change entry; rows of one version are
/// consecutive.
pub mod change_log {
    pub const VERSION: &str = "Version";
    pub const DATE: &str = "Date";
    pub const CHANGE: &str = "Change";
    pub const DESCRIPTION: &str = "Description";

    pub const HEADERS: &[&str] = &[VERSION, DATE, CHANGE, DESCRIPTION];
}

/// Column layouts, in the order they are written.
pub mod headers {
    use hlapi_core::columns::*;

    pub const OBJECTS: &[&str] = &[
        LAYER,
        OBJECT,
        PROCEDURE,
        RESOURCE,
        DESCRIPTION,
        ARGUMENTS,
        SAMPLE,
    ];
    pub const FIELDS: &[&str] = &[
        LAYER,
        OBJECT,
        PROCEDURE,
        FIELD,
        DESCRIPTION,
        TYPE,
        RIGHTS,
        REQUIRED,
        DEFAULT_VALUE,
        POSSIBLE_VALUES,
        FORMAT,
    ];
    pub const EVENTS: &[&str] = &[LAYER, OBJECT, CODE, NAME, DESCRIPTION, SAMPLE];
    pub const INSTANCES: &[&str] = &[LAYER, OBJECT, INSTANCE, DESCRIPTION];
    pub const RESPONSE_CODES: &[&str] = &[CODE, NAME, DESCRIPTION, SAMPLE, RAISED_BY];
}

/// Read every sheet of `dir`.
pub fn read_sheets(dir: &Path) -> Result<RecordStreams, ReadError> {
    let streams = RecordStreams {
        procedures: read_sheet(&dir.join(OBJECTS))?,
        fields: read_optional(&dir.join(FIELDS))?,
        events: read_optional(&dir.join(EVENTS))?,
        instances: read_optional(&dir.join(INSTANCES))?,
        response_codes: read_optional(&dir.join(RESPONSE_CODES))?,
        versions: group_change_log(read_optional(&dir.join(CHANGE_LOG))?),
    };
    debug!(
        dir = %dir.display(),
        procedures = streams.procedures.len(),
        fields = streams.fields.len(),
        "sheets read"
    );
    Ok(streams)
}

fn read_optional(path: &Path) -> Result<Vec<Record>, ReadError> {
    if !path.exists() {
        debug!(path = %path.display(), "optional sheet absent");
        return Ok(Vec::new());
    }
    read_sheet(path)
}

fn read_sheet(path: &Path) -> Result<Vec<Record>, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(file, path)
}

/// Parse CSV text into records keyed by the header row. `origin` is only
/// used for error messages.
pub fn read_records<R: io::Read>(input: R, origin: &Path) -> Result<Vec<Record>, ReadError> {
    let csv_error = |source| ReadError::Csv {
        path: origin.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);
    let header_row = reader.headers().map_err(csv_error)?.clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(csv_error)?;
        if row.get(0).map_or(true, |cell| cell.trim().is_empty()) {
            continue;
        }
        let record: Record = header_row
            .iter()
            .zip(row.iter())
            .filter(|(header, _)| !header.trim().is_empty())
            .map(|(header, cell)| (header.trim().to_string(), Value::String(cell.to_string())))
            .collect();
        records.push(record);
    }
    debug!(path = %origin.display(), rows = records.len(), "read sheet");
    Ok(records)
}

/// Fold one-row-per-change entries into version records carrying a
/// `Changes` list of `[number, description]` pairs.
fn group_change_log(rows: Vec<Record>) -> Vec<Record> {
    let mut versions: Vec<Record> = Vec::new();
    for row in rows {
        let number = cell(&row, change_log::VERSION);
        let continues = versions
            .last()
            .and_then(|v| v.get(columns::NUMBER))
            .and_then(Value::as_str)
            .is_some_and(|n| n == number);
        if !continues {
            let mut version = Record::new();
            version.insert(columns::NUMBER.into(), Value::String(number.clone()));
            version.insert(
                columns::DATE.into(),
                Value::String(cell(&row, change_log::DATE)),
            );
            version.insert(columns::CHANGES.into(), Value::Array(Vec::new()));
            versions.push(version);
        }

        let change = cell(&row, change_log::CHANGE);
        if change.trim().is_empty() {
            continue;
        }
        let entry = json!([change.trim(), cell(&row, change_log::DESCRIPTION)]);
        if let Some(Value::Array(changes)) = versions
            .last_mut()
            .and_then(|v| v.get_mut(columns::CHANGES))
        {
            changes.push(entry);
        }
    }
    versions
}

fn cell(record: &Record, column: &str) -> String {
    match record.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<Record> {
        read_records(text.as_bytes(), Path::new("test.csv")).unwrap()
    }

    #[test]
    fn test_rows_are_keyed_by_header() {
        let records = parse("Layer,Object,Procedure\n1,User.Accounts,Add\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Object"], "User.Accounts");
        assert_eq!(records[0]["Layer"], "1");
    }

    #[test]
    fn test_rows_with_empty_first_cell_are_skipped() {
        let records = parse("Layer,Object\n1,A\n,B\n\n2,C\n");
        let objects: Vec<&str> = records
            .iter()
            .map(|r| r["Object"].as_str().unwrap())
            .collect();
        assert_eq!(objects, vec!["A", "C"]);
    }

    #[test]
    fn test_quoted_cells_keep_newlines_and_commas() {
        let records = parse("Name,Sample\nOK,\"{\n  \"\"a\"\": 1, \"\"b\"\": 2\n}\"\n");
        assert_eq!(records[0]["Sample"], "{\n  \"a\": 1, \"b\": 2\n}");
    }

    #[test]
    fn test_change_log_rows_group_by_version() {
        let rows = parse(
            "Version,Date,Change,Description\n\
             3.5.2,2021-02-01,1,Fixed typo\n\
             3.5.1,2021-01-01,1,Initial\n\
             3.5.1,2021-01-01,2,Added events\n\
             3.0,2020-06-01,,\n",
        );
        let versions = group_change_log(rows);
        assert_eq!(versions.len(), 3);
        assert_eq!(versions[1]["Number"], "3.5.1");
        assert_eq!(
            versions[1]["Changes"],
            json!([["1", "Initial"], ["2", "Added events"]])
        );
        assert_eq!(versions[2]["Changes"], json!([]));
    }
}
