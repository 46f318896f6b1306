//! Object graph builder.
//!
//! Thin orchestrator: normalize the four linked streams, run the linker,
//! attach the independently parsed response codes and versions, and return
//! the immutable [`Api`]. Any error aborts the whole build.

use serde_json::Value;
use tracing::{debug, info, Span};

use crate::api::Api;
use crate::error::BuildError;
use crate::linker::{LinkInput, LinkStats, Linker};
use crate::model::{Change, ResponseCode, Version};
use crate::normalize::{normalize, ResponseCodeKey};
use crate::record::{columns, rows, Record, RecordKind, RecordStreams, Row};

pub struct ObjectFactory<'a> {
    streams: &'a RecordStreams,
    span: Span,
}

impl<'a> ObjectFactory<'a> {
    pub fn new(streams: &'a RecordStreams) -> Self {
        ObjectFactory {
            streams,
            span: Span::none(),
        }
    }

    /// Parent every build diagnostic under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn build(self) -> Result<Api, BuildError> {
        self.build_with_stats().map(|(api, _)| api)
    }

    /// Build and also report how many records each stream contributed.
    pub fn build_with_stats(self) -> Result<(Api, LinkStats), BuildError> {
        let _entered = self.span.enter();
        let streams = self.streams;

        // Sort every linked stream; the linker only accepts sorted input
        let input = LinkInput {
            procedures: normalize(&streams.procedures)?,
            fields: normalize(&streams.fields)?,
            events: normalize(&streams.events)?,
            instances: normalize(&streams.instances)?,
        };

        // Single sort-merge pass
        let linked = Linker::new(&input).in_span(self.span.clone()).link()?;

        // Global records
        let response_codes = parse_response_codes(&streams.response_codes)?;
        let versions = parse_versions(&streams.versions)?;

        let api = Api::new(linked.objects, response_codes, versions);
        info!(
            version = api.current_version().unwrap_or("-"),
            objects = api.objects().len(),
            procedures = linked.stats.procedures,
            fields = linked.stats.fields,
            "API built"
        );
        Ok((api, linked.stats))
    }
}

/// Build an API with no tracing span.
pub fn build_api(streams: &RecordStreams) -> Result<Api, BuildError> {
    ObjectFactory::new(streams).build()
}

fn parse_response_codes(records: &[Record]) -> Result<Vec<ResponseCode>, BuildError> {
    normalize::<ResponseCodeKey>(records)?
        .as_slice()
        .iter()
        .map(|k| -> Result<ResponseCode, BuildError> {
            let row = &k.row;
            let raised_by = row.text(columns::RAISED_BY);
            let code = ResponseCode {
                name: row.required_text(columns::NAME)?,
                description: row.text(columns::DESCRIPTION),
                sample: row.text(columns::SAMPLE),
                raised_by: if raised_by.trim().is_empty() {
                    None
                } else {
                    Some(raised_by)
                },
            };
            debug!(code = %code.name, "added response code");
            Ok(code)
        })
        .collect()
}

fn parse_versions(records: &[Record]) -> Result<Vec<Version>, BuildError> {
    rows(RecordKind::Version, records)
        .map(|row| -> Result<Version, BuildError> {
            let version = Version {
                number: row.required_text(columns::NUMBER)?.trim().to_string(),
                date: row.text(columns::DATE),
                changes: parse_changes(&row)?,
            };
            debug!(version = %version.number, changes = version.changes.len(), "added version");
            Ok(version)
        })
        .collect()
}

/// Change entries are `[n, "text"]` pairs or `{"Number": n, "Description": "text"}`.
fn parse_changes(row: &Row<'_>) -> Result<Vec<Change>, BuildError> {
    let entries = match row.value(columns::CHANGES) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(row.malformed(columns::CHANGES, "is not a list")),
    };
    entries
        .iter()
        .map(|entry| -> Result<Change, BuildError> {
            let (number, description) = match entry {
                Value::Array(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
                Value::Object(map) => match (map.get("Number"), map.get("Description")) {
                    (Some(n), Some(d)) => (n, d),
                    _ => return Err(row.malformed(columns::CHANGES, "has an incomplete entry")),
                },
                _ => return Err(row.malformed(columns::CHANGES, "has an unreadable entry")),
            };
            Ok(Change {
                number: change_number(number)
                    .ok_or_else(|| row.malformed(columns::CHANGES, "has a non-integer entry number"))?,
                description: match description {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
        })
        .collect()
}

fn change_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
