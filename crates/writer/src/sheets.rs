//! CSV sheet directory, the inverse of `hlapi_reader::sheets`.
//!
//! Nested fields are written one row per path segment (`Hash`, then
//! `Hash.Salt`) so the container keeps its own attributes on re-read.
//! Response codes are numbered by their position.

use hlapi_core::model::flatten_fields;
use hlapi_core::{sample, Api, Field};
use hlapi_reader::sheets::{self as layout, change_log, headers};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{self, WriteError};

/// One CSV file: name, header row and data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub file: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new(file: &'static str, headers: &'static [&'static str]) -> Self {
        Sheet {
            file,
            headers,
            rows: Vec::new(),
        }
    }
}

pub fn sheet_tables(api: &Api) -> Vec<Sheet> {
    let mut objects = Sheet::new(layout::OBJECTS, headers::OBJECTS);
    let mut fields = Sheet::new(layout::FIELDS, headers::FIELDS);
    let mut events = Sheet::new(layout::EVENTS, headers::EVENTS);
    let mut instances = Sheet::new(layout::INSTANCES, headers::INSTANCES);

    for object in api.objects() {
        let layer = object.layer.to_string();
        for procedure in &object.procedures {
            objects.rows.push(vec![
                layer.clone(),
                object.name.clone(),
                procedure.name.clone(),
                object.resource.clone(),
                procedure.description.clone(),
                or_placeholder(sample::compact(&procedure.sample_request)),
                or_placeholder(sample::compact(&procedure.sample_response)),
            ]);
            for (path, field) in flatten_fields(&procedure.fields) {
                fields.rows.push(vec![
                    layer.clone(),
                    object.name.clone(),
                    procedure.name.clone(),
                    path,
                    field.description.clone(),
                    field.field_type.to_string(),
                    field.rights().to_string(),
                    required_cell(field).to_string(),
                    field.default_value.clone(),
                    field.possible_values.clone(),
                    field.format.clone(),
                ]);
            }
        }
        for event in &object.events {
            events.rows.push(vec![
                layer.clone(),
                object.name.clone(),
                event.code.to_string(),
                event.name.clone(),
                event.description.clone(),
                or_placeholder(sample::compact(&event.sample)),
            ]);
        }
        for instance in &object.instances {
            instances.rows.push(vec![
                layer.clone(),
                object.name.clone(),
                instance.name.clone(),
                instance.description.clone(),
            ]);
        }
    }

    let mut codes = Sheet::new(layout::RESPONSE_CODES, headers::RESPONSE_CODES);
    for (index, code) in api.response_codes().iter().enumerate() {
        codes.rows.push(vec![
            index.to_string(),
            code.name.clone(),
            code.description.clone(),
            or_placeholder(sample::compact(&code.sample)),
            code.raised_by.clone().unwrap_or_default(),
        ]);
    }

    let mut changes = Sheet::new(layout::CHANGE_LOG, change_log::HEADERS);
    for version in api.versions() {
        if version.changes.is_empty() {
            changes.rows.push(vec![
                version.number.clone(),
                version.date.clone(),
                String::new(),
                String::new(),
            ]);
        }
        for change in &version.changes {
            changes.rows.push(vec![
                version.number.clone(),
                version.date.clone(),
                change.number.to_string(),
                change.description.clone(),
            ]);
        }
    }

    vec![objects, fields, events, instances, codes, changes]
}

pub fn write_sheets(api: &Api, dir: &Path) -> Result<Vec<PathBuf>, WriteError> {
    let mut written = Vec::new();
    for sheet in sheet_tables(api) {
        let path = dir.join(sheet.file);
        write_sheet(&sheet, &path)?;
        debug!(path = %path.display(), rows = sheet.rows.len(), "wrote sheet");
        written.push(path);
    }
    Ok(written)
}

fn write_sheet(sheet: &Sheet, path: &Path) -> Result<(), WriteError> {
    let csv_error = |source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(sheet.headers).map_err(csv_error)?;
    for row in &sheet.rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    writer.flush().map_err(error::io(path))
}

/// Output-only fields carry no designation.
fn required_cell(field: &Field) -> &'static str {
    match (field.is_required, field.is_input) {
        (true, _) => "Required",
        (false, true) => "Optional",
        (false, false) => "",
    }
}

fn or_placeholder(text: String) -> String {
    if text.trim().is_empty() {
        "-".into()
    } else {
        text
    }
}
