//! HL-API entity types.
//!
//! These types are produced by the linker and consumed by every output
//! writer. They are built once per build pass and never mutated afterwards:
//! the [`Api`](crate::api::Api) aggregate only hands out shared references.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Nested field collection, keyed by the (leaf) field name.
pub type FieldMap = BTreeMap<String, Field>;

// ──────────────────────────────────────────────
// Codes
// ──────────────────────────────────────────────

/// An event or response code. Spreadsheets mix numeric and textual codes,
/// so both are kept. Numbers order before text; numbers compare numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Code {
    Number(i64),
    Text(String),
}

impl Code {
    /// Interpret a raw cell value. Numeric strings become `Code::Number`.
    pub fn from_value(value: &serde_json::Value) -> Code {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Code::Number(i),
                None => Code::Text(n.to_string()),
            },
            serde_json::Value::String(s) => Code::parse(s),
            serde_json::Value::Null => Code::Text(String::new()),
            other => Code::Text(other.to_string()),
        }
    }

    pub fn parse(text: &str) -> Code {
        let trimmed = text.trim();
        match trimmed.parse::<i64>() {
            Ok(i) => Code::Number(i),
            Err(_) => Code::Text(trimmed.to_string()),
        }
    }
}

impl Ord for Code {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Code::Number(a), Code::Number(b)) => a.cmp(b),
            (Code::Number(_), Code::Text(_)) => Ordering::Less,
            (Code::Text(_), Code::Number(_)) => Ordering::Greater,
            (Code::Text(a), Code::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Code {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Number(n) => write!(f, "{}", n),
            Code::Text(s) => f.write_str(s),
        }
    }
}

// ──────────────────────────────────────────────
// Change history
// ──────────────────────────────────────────────

/// One numbered entry of a version's change list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub number: i64,
    pub description: String,
}

/// A dated release marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    pub number: String,
    pub date: String,
    /// Authoring order is preserved.
    pub changes: Vec<Change>,
}

impl Version {
    /// Render the change list as `"<n>. <description>"` lines.
    pub fn changes_text(&self) -> String {
        self.changes
            .iter()
            .map(|c| format!("{}. {}", c.number, c.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number, self.date)
    }
}

/// Compare two version numbers segment by segment.
///
/// Numeric segments compare numerically (`3.10 > 3.9`); a numeric segment
/// that meets a textual one falls back to string comparison.
pub fn compare_version_numbers(a: &str, b: &str) -> Ordering {
    let mut left = a.trim().split('.');
    let mut right = b.trim().split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(m), Ok(n)) => m.cmp(&n),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

// ──────────────────────────────────────────────
// Global and per-object records
// ──────────────────────────────────────────────

/// Object-independent outcome of any procedure call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseCode {
    pub name: String,
    pub description: String,
    pub sample: String,
    pub raised_by: Option<String>,
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Asynchronous notification raised by an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub code: Code,
    pub name: String,
    pub description: String,
    pub sample: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.name)
    }
}

/// A known, concrete occurrence of a parameterized object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub name: String,
    pub description: String,
}

// ──────────────────────────────────────────────
// Fields
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Boolean,
    Integer,
    Float,
    List,
    Object,
    Other(String),
}

impl FieldType {
    /// Case-insensitive parse; unknown spellings are kept verbatim.
    pub fn parse(text: &str) -> FieldType {
        let trimmed = text.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "string" => FieldType::String,
            "boolean" | "bool" => FieldType::Boolean,
            "integer" | "int" => FieldType::Integer,
            "float" | "number" => FieldType::Float,
            "list" | "array" => FieldType::List,
            "object" => FieldType::Object,
            _ => FieldType::Other(trimmed.to_string()),
        }
    }

    /// Object and List fields may own nested properties.
    pub fn is_container(&self) -> bool {
        matches!(self, FieldType::Object | FieldType::List)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "String",
            FieldType::Boolean => "Boolean",
            FieldType::Integer => "Integer",
            FieldType::Float => "Float",
            FieldType::List => "List",
            FieldType::Object => "Object",
            FieldType::Other(s) => s,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An input and/or output attribute of a procedure.
///
/// `name` is always the leaf segment; the dotted path of a nested field is
/// recovered by walking `properties` (see [`Field::flatten`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub is_input: bool,
    pub is_required: bool,
    pub default_value: String,
    pub is_output: bool,
    pub possible_values: String,
    pub format: String,
    pub notes: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: FieldMap,
}

impl Field {
    /// An object-typed container synthesized for a dotted path segment.
    pub fn container(name: &str) -> Field {
        Field {
            name: name.to_string(),
            description: String::new(),
            field_type: FieldType::Object,
            is_input: false,
            is_required: false,
            default_value: String::new(),
            is_output: false,
            possible_values: String::new(),
            format: String::new(),
            notes: "-".to_string(),
            properties: FieldMap::new(),
        }
    }

    pub fn is_container(&self) -> bool {
        !self.properties.is_empty() || self.field_type.is_container()
    }

    /// Spreadsheet rights marker: `R`, `W`, `RW`, or `-`.
    pub fn rights(&self) -> &'static str {
        match (self.is_output, self.is_input) {
            (true, true) => "RW",
            (true, false) => "R",
            (false, true) => "W",
            (false, false) => "-",
        }
    }

    /// Depth-first listing of this field and its nested properties with
    /// their dotted paths, parents before children.
    pub fn flatten(&self) -> Vec<(String, &Field)> {
        let mut out = Vec::new();
        flatten_into(&self.name, self, &mut out);
        out
    }
}

fn flatten_into<'f>(path: &str, field: &'f Field, out: &mut Vec<(String, &'f Field)>) {
    out.push((path.to_string(), field));
    for (name, child) in &field.properties {
        flatten_into(&format!("{}.{}", path, name), child, out);
    }
}

/// Flatten a whole field map (see [`Field::flatten`]).
pub fn flatten_fields(fields: &FieldMap) -> Vec<(String, &Field)> {
    fields.values().flat_map(Field::flatten).collect()
}

// ──────────────────────────────────────────────
// Procedures and objects
// ──────────────────────────────────────────────

/// A callable operation scoped to one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Procedure {
    pub name: String,
    pub description: String,
    pub sample_request: String,
    pub sample_response: String,
    pub fields: FieldMap,
}

impl Procedure {
    /// Top-level fields that are part of the request body.
    pub fn inputs(&self) -> impl Iterator<Item = &Field> {
        self.fields.values().filter(|f| f.is_input)
    }

    /// Top-level fields that are part of the response body.
    pub fn outputs(&self) -> impl Iterator<Item = &Field> {
        self.fields.values().filter(|f| f.is_output)
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Root container for one addressable API resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Object {
    /// 1 (User), 2 (Services), 3 (Interfaces), 4 (System). Sort order only.
    pub layer: i64,
    pub name: String,
    pub resource: String,
    pub procedures: Vec<Procedure>,
    pub events: Vec<Event>,
    pub instances: Vec<Instance>,
}

impl Object {
    pub fn new(layer: i64, name: impl Into<String>, resource: impl Into<String>) -> Self {
        Object {
            layer,
            name: name.into(),
            resource: resource.into(),
            procedures: Vec::new(),
            events: Vec::new(),
            instances: Vec::new(),
        }
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.name == name)
    }

    /// Object name with a trailing `.{Placeholder}` segment removed, e.g.
    /// `User.Accounts.{AccountId}` -> `User.Accounts`.
    pub fn root_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((head, last)) if is_placeholder(last) => head,
            _ => &self.name,
        }
    }

    /// Names of all `{Placeholder}` segments, in path order.
    pub fn placeholders(&self) -> Vec<&str> {
        self.name
            .split('.')
            .filter(|s| is_placeholder(s))
            .map(|s| &s[1..s.len() - 1])
            .collect()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn is_placeholder(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}')
}
