//! Schema tree reader.
//!
//! `api.json` lists the versions and references one document per object
//! root. Each object document carries the root component schema (layer,
//! events), one path per procedure (`"<object>.<procedure>"`) and optionally
//! the known instances. Request-body and success-response properties are
//! flattened into field records with dotted names.

use hlapi_core::{columns, FieldType, Record, RecordStreams};
use regex::Regex;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::ReadError;

pub const API_FILE: &str = "api.json";
/// Response key of a successful call.
pub const SUCCESS: &str = "99";
pub const JSON_CONTENT: &str = "application/json";

pub const SECTION_REQUEST: &str = "request";
pub const SECTION_RESPONSE: &str = "response";

static PLACEHOLDER_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}\s?").expect("placeholder pattern is valid"));

/// Read `api.json` and every object document it references.
pub fn read_tree(dir: &Path) -> Result<RecordStreams, ReadError> {
    let api_path = dir.join(API_FILE);
    let api = read_json(&api_path)?;

    let mut streams = RecordStreams {
        versions: read_versions(&api),
        ..Default::default()
    };

    let paths = api
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| ReadError::missing(&api_path, "paths"))?;
    for (root, reference) in paths {
        let target = reference
            .get("$ref")
            .and_then(Value::as_str)
            .ok_or_else(|| ReadError::missing(&api_path, format!("paths.{}.$ref", root)))?;
        let file = target.split('#').next().unwrap_or(target);
        let doc_path = dir.join(file);
        let doc = read_json(&doc_path)?;
        ObjectDocument::new(root, &doc, &doc_path)?.read_into(&mut streams);
    }

    debug!(
        dir = %dir.display(),
        procedures = streams.procedures.len(),
        fields = streams.fields.len(),
        "schema tree read"
    );
    Ok(streams)
}

fn read_json(path: &Path) -> Result<Value, ReadError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ReadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_versions(api: &Value) -> Vec<Record> {
    let Some(versions) = api.get("versions").and_then(Value::as_object) else {
        return Vec::new();
    };
    versions
        .iter()
        .map(|(number, v)| {
            record([
                (columns::NUMBER, Value::String(number.clone())),
                (columns::DATE, text(v.get("date"))),
                (
                    columns::CHANGES,
                    v.get("changes").cloned().unwrap_or(Value::Array(Vec::new())),
                ),
            ])
        })
        .collect()
}

/// One parsed object document.
struct ObjectDocument<'d> {
    root: &'d str,
    layer: Value,
    schema: &'d Value,
    operations: &'d Map<String, Value>,
    instances: Option<&'d Map<String, Value>>,
}

impl<'d> ObjectDocument<'d> {
    fn new(root: &'d str, doc: &'d Value, path: &Path) -> Result<Self, ReadError> {
        let schema = doc
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get(root))
            .ok_or_else(|| ReadError::missing(path, format!("components.schemas.{}", root)))?;
        let layer = schema
            .get("layer")
            .cloned()
            .ok_or_else(|| ReadError::missing(path, format!("components.schemas.{}.layer", root)))?;
        let operations = doc
            .get("paths")
            .and_then(Value::as_object)
            .ok_or_else(|| ReadError::missing(path, "paths"))?;
        Ok(ObjectDocument {
            root,
            layer,
            schema,
            operations,
            instances: doc.get("instances").and_then(Value::as_object),
        })
    }

    /// Object that owns events and instances without an explicit `object`.
    fn default_object(&self) -> String {
        self.operations
            .values()
            .next()
            .and_then(operation_object)
            .unwrap_or(self.root)
            .to_string()
    }

    fn read_into(&self, streams: &mut RecordStreams) {
        for (key, op) in self.operations {
            let object = operation_object(op)
                .or_else(|| key.rsplit_once('.').map(|(o, _)| o))
                .unwrap_or(self.root);
            let procedure = key
                .strip_prefix(object)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or_else(|| key.rsplit('.').next().unwrap_or(key));
            let resource = op
                .get("x-resource")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| resource_label(object));

            streams.procedures.push(record([
                (columns::LAYER, self.layer.clone()),
                (columns::OBJECT, object.into()),
                (columns::PROCEDURE, procedure.into()),
                (columns::RESOURCE, resource.into()),
                (columns::DESCRIPTION, text(op.get("summary"))),
                (columns::ARGUMENTS, example_or_placeholder(op.get("requestBody"))),
                (
                    columns::SAMPLE,
                    example_or_placeholder(op.get("responses").and_then(|r| r.get(SUCCESS))),
                ),
            ]));

            let owner = FieldOwner {
                layer: &self.layer,
                object,
                procedure,
            };
            if let Some(schema) = body_schema(op.get("requestBody")) {
                owner.collect(schema, "", SECTION_REQUEST, &mut streams.fields);
            }
            if let Some(schema) = body_schema(op.get("responses").and_then(|r| r.get(SUCCESS))) {
                owner.collect(schema, "", SECTION_RESPONSE, &mut streams.fields);
            }

            // Global codes are repeated on every operation; the first one wins.
            if streams.response_codes.is_empty() {
                if let Some(responses) = op.get("responses").and_then(Value::as_object) {
                    streams.response_codes.extend(
                        responses
                            .iter()
                            .filter(|(name, _)| name.as_str() != SUCCESS)
                            .map(|(name, r)| response_code(name, r)),
                    );
                }
            }
        }

        let default_object = self.default_object();
        let prefix = event_prefix(self.root);
        if let Some(events) = self.schema.get("events").and_then(Value::as_object) {
            for (code, e) in events {
                let full = e.get("code").and_then(Value::as_str).unwrap_or_default();
                streams.events.push(record([
                    (columns::LAYER, self.layer.clone()),
                    (columns::OBJECT, owner_of(e, &default_object)),
                    (columns::CODE, code.as_str().into()),
                    (columns::NAME, full.strip_prefix(&prefix).unwrap_or(full).into()),
                    (columns::DESCRIPTION, text(e.get("description"))),
                    (columns::SAMPLE, example(Some(e))),
                ]));
            }
        }
        for (name, i) in self.instances.into_iter().flatten() {
            streams.instances.push(record([
                (columns::LAYER, self.layer.clone()),
                (columns::OBJECT, owner_of(i, &default_object)),
                (columns::INSTANCE, name.as_str().into()),
                (columns::DESCRIPTION, text(i.get("description"))),
            ]));
        }
        debug!(root = self.root, "object document read");
    }
}

/// The (layer, object, procedure) every field record of one body carries.
struct FieldOwner<'o> {
    layer: &'o Value,
    object: &'o str,
    procedure: &'o str,
}

impl FieldOwner<'_> {
    /// Flatten `schema.properties` into field records, parents first.
    fn collect(&self, schema: &Value, prefix: &str, section: &str, out: &mut Vec<Record>) {
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return;
        };
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        for (name, property) in properties {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            let required_flag = if required.contains(&name.as_str()) {
                "Required"
            } else {
                "Optional"
            };
            out.push(record([
                (columns::LAYER, self.layer.clone()),
                (columns::OBJECT, self.object.into()),
                (columns::PROCEDURE, self.procedure.into()),
                (columns::FIELD, path.as_str().into()),
                (columns::DESCRIPTION, text(property.get("description"))),
                (columns::TYPE, field_type(property).into()),
                (columns::SECTION, section.into()),
                (columns::REQUIRED, required_flag.into()),
                (columns::DEFAULT_VALUE, text(property.get("default_value"))),
                (columns::POSSIBLE_VALUES, text(property.get("possible_values"))),
                (columns::FORMAT, text(property.get("format"))),
            ]));

            // Lists nest their element properties under `items`.
            let nested = match property.get("items") {
                Some(items) if items.get("properties").is_some() => items,
                _ => property,
            };
            self.collect(nested, &path, section, out);
        }
    }
}

fn operation_object(op: &Value) -> Option<&str> {
    op.get("tags")?.get(0)?.as_str()
}

fn owner_of(entry: &Value, default_object: &str) -> Value {
    entry
        .get("object")
        .and_then(Value::as_str)
        .unwrap_or(default_object)
        .into()
}

/// Prefix carried by the full event codes of an object root,
/// e.g. `USER_ACCOUNTS_`.
pub fn event_prefix(root: &str) -> String {
    format!("{}_", root.to_uppercase().replace('.', "_"))
}

/// `User.Accounts.{AccountId}` -> `User Accounts`.
pub fn resource_label(object: &str) -> String {
    PLACEHOLDER_SEGMENT
        .replace_all(&object.replace('.', " "), "")
        .trim()
        .to_string()
}

fn field_type(property: &Value) -> String {
    let declared = property
        .get("x-type")
        .or_else(|| property.get("type"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    if declared.is_empty() {
        return String::new();
    }
    FieldType::parse(declared).to_string()
}

fn body_schema(body: Option<&Value>) -> Option<&Value> {
    body?.get("content")?.get(JSON_CONTENT)?.get("schema")
}

fn example(body: Option<&Value>) -> Value {
    text(
        body.and_then(|b| b.get("content"))
            .and_then(|c| c.get(JSON_CONTENT))
            .and_then(|j| j.get("example")),
    )
}

fn example_or_placeholder(body: Option<&Value>) -> Value {
    match body {
        Some(_) => example(body),
        None => Value::String("-".into()),
    }
}

fn response_code(name: &str, response: &Value) -> Record {
    let mut code = record([
        (columns::NAME, name.into()),
        (columns::DESCRIPTION, text(response.get("description"))),
        (columns::SAMPLE, example(Some(response))),
        (columns::RAISED_BY, text(response.get("raised_by"))),
    ]);
    if let Some(order) = response.get("x-order") {
        code.insert(columns::CODE.into(), order.clone());
    }
    code
}

/// Text cell from an optional JSON member. Non-string members are
/// re-serialized so examples stored as objects survive.
fn text(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(other) => Value::String(other.to_string()),
    }
}

fn record<const N: usize>(cells: [(&str, Value); N]) -> Record {
    cells
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}
