//! JSON-Schema bundle writer.
//!
//! The bundle is an OpenAPI-style `api.json` plus one document per object
//! root. Objects whose names differ only by a trailing `{Placeholder}`
//! segment share a root and therefore a document. The layout is the one
//! `hlapi_reader::tree` reads back.

use hlapi_core::field::PLACEHOLDER;
use hlapi_core::{sample, Api, Field, FieldMap, FieldType, Object, Procedure};
use hlapi_reader::tree::{event_prefix, API_FILE, JSON_CONTENT, SUCCESS};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{self, WriteError};

pub const OPENAPI_VERSION: &str = "3.0.0";

/// Procedures with this name enumerate instances and do not describe the
/// object's own properties.
const LIST_PROCEDURE: &str = "List";

const SUCCESS_DESCRIPTION: &str =
    "A well-formed call was performed to a valid object with valid arguments.";

/// A rendered bundle: the root document and one document per object root.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaBundle {
    pub api: Value,
    pub documents: BTreeMap<String, Value>,
}

impl SchemaBundle {
    pub fn document(&self, root: &str) -> Option<&Value> {
        self.documents.get(root)
    }

    /// The component schema of one object root.
    pub fn component(&self, root: &str) -> Option<&Value> {
        self.document(root)?
            .get("components")?
            .get("schemas")?
            .get(root)
    }
}

/// File name of the document holding `root`.
pub fn document_file(root: &str) -> String {
    format!("{}.json", root)
}

pub fn schema_bundle(api: &Api, title: &str) -> SchemaBundle {
    let codes = response_codes(api);

    let mut schemas = Map::new();
    schemas.insert("Error".into(), error_schema());
    let mut paths = Map::new();
    let mut documents = BTreeMap::new();

    for (root, objects) in group_by_root(api.objects()) {
        let file = document_file(&root);
        schemas.insert(
            root.clone(),
            json!({"$ref": format!("{}#/components/schemas/{}", file, root)}),
        );
        paths.insert(root.clone(), json!({"$ref": format!("{}#/paths", file)}));
        let document = object_document(&root, &objects, &codes);
        debug!(root = %root, objects = objects.len(), "rendered object document");
        documents.insert(root, document);
    }

    let versions: Map<String, Value> = api
        .versions()
        .iter()
        .map(|v| {
            let changes: Vec<Value> = v
                .changes
                .iter()
                .map(|c| json!([c.number, c.description]))
                .collect();
            (
                v.number.clone(),
                json!({"date": v.date, "changes": changes}),
            )
        })
        .collect();

    let root_document = json!({
        "openapi": OPENAPI_VERSION,
        "info": {
            "title": title,
            "version": api.current_version().unwrap_or_default(),
        },
        "versions": versions,
        "components": {"schemas": schemas},
        "paths": paths,
    });

    SchemaBundle {
        api: root_document,
        documents,
    }
}

/// Render and write the bundle into `dir`.
pub fn write_schema(api: &Api, title: &str, dir: &Path) -> Result<Vec<PathBuf>, WriteError> {
    let bundle = schema_bundle(api, title);
    let mut written = vec![write_json(&dir.join(API_FILE), &bundle.api)?];
    for (root, document) in &bundle.documents {
        written.push(write_json(&dir.join(document_file(root)), document)?);
    }
    Ok(written)
}

fn write_json(path: &Path, value: &Value) -> Result<PathBuf, WriteError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| WriteError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text + "\n").map_err(error::io(path))?;
    debug!(path = %path.display(), "wrote schema document");
    Ok(path.to_path_buf())
}

fn group_by_root(objects: &[Object]) -> BTreeMap<String, Vec<&Object>> {
    let mut roots: BTreeMap<String, Vec<&Object>> = BTreeMap::new();
    for object in objects {
        roots
            .entry(object.root_name().to_string())
            .or_default()
            .push(object);
    }
    roots
}

fn error_schema() -> Value {
    json!({
        "type": "object",
        "required": ["code", "message"],
        "properties": {
            "code": {"type": "integer"},
            "message": {"type": "string"}
        }
    })
}

// ── Object documents ─────────────────────────────────────────────────

fn object_document(root: &str, objects: &[&Object], codes: &Map<String, Value>) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut events = Map::new();
    let mut operations = Map::new();
    let mut instances = Map::new();
    let prefix = event_prefix(root);

    for object in objects {
        for procedure in &object.procedures {
            if procedure.name != LIST_PROCEDURE {
                for field in procedure.fields.values() {
                    merge_property(&mut properties, &mut required, field);
                }
            }
            operations.insert(
                format!("{}.{}", object.name, procedure.name),
                operation(object, procedure, codes),
            );
        }
        for event in &object.events {
            let code = if event.name.starts_with(&prefix) {
                event.name.clone()
            } else {
                format!("{}{}", prefix, event.name)
            };
            events.insert(
                event.code.to_string(),
                json!({
                    "code": code,
                    "object": object.name,
                    "description": event.description,
                    "content": json_content(json!({"example": example_text(&event.sample)})),
                }),
            );
        }
        for instance in &object.instances {
            instances.insert(
                instance.name.clone(),
                json!({"description": instance.description, "object": object.name}),
            );
        }
    }

    let component = json!({
        "description": format!("{} Object", root),
        "title": root,
        "type": "object",
        "layer": objects.first().map_or(0, |o| o.layer),
        "required": required,
        "properties": properties,
        "events": events,
    });

    let mut schemas = Map::new();
    schemas.insert(root.to_string(), component);
    let mut document = json!({
        "components": {"schemas": schemas},
        "paths": operations,
    });
    if !instances.is_empty() {
        document["instances"] = Value::Object(instances);
    }
    document
}

/// Merge `field` into a component property map. A property seen with both
/// directions loses its `writeOnly`/`readOnly` marker.
fn merge_property(properties: &mut Map<String, Value>, required: &mut Vec<Value>, field: &Field) {
    match properties.get_mut(&field.name).and_then(Value::as_object_mut) {
        None => {
            properties.insert(field.name.clone(), component_property(field));
        }
        Some(existing) => {
            if field.is_output {
                existing.remove("writeOnly");
            }
            if field.is_input {
                existing.remove("readOnly");
            }
            if !field.properties.is_empty() {
                match existing.get_mut("items") {
                    Some(Value::Object(items)) => merge_children(items, field),
                    _ => merge_children(existing, field),
                }
            }
        }
    }
    if field.is_required && !required.iter().any(|r| r.as_str() == Some(field.name.as_str())) {
        required.push(Value::String(field.name.clone()));
    }
}

fn merge_children(target: &mut Map<String, Value>, field: &Field) {
    let mut properties = take_object(target, "properties");
    let mut required = take_array(target, "required");
    for child in field.properties.values() {
        merge_property(&mut properties, &mut required, child);
    }
    target.insert("properties".into(), Value::Object(properties));
    target.insert("required".into(), Value::Array(required));
}

fn component_property(field: &Field) -> Value {
    let mut property = base_property(field);
    if field.is_input && !field.is_output {
        property.insert("writeOnly".into(), Value::Bool(true));
    } else if field.is_output && !field.is_input {
        property.insert("readOnly".into(), Value::Bool(true));
    }
    if field.is_container() {
        let mut children = Map::new();
        let mut required = Vec::new();
        for child in field.properties.values() {
            merge_property(&mut children, &mut required, child);
        }
        attach_children(&mut property, field, children, required);
    }
    Value::Object(property)
}

fn base_property(field: &Field) -> Map<String, Value> {
    let mut property = Map::new();
    match json_type(&field.field_type) {
        Some(t) => {
            property.insert("type".into(), t.into());
        }
        None => {
            let declared = field.field_type.as_str();
            if !declared.is_empty() {
                property.insert("x-type".into(), declared.into());
            }
        }
    }
    property.insert("description".into(), field.description.as_str().into());
    for (key, value) in [
        ("default_value", &field.default_value),
        ("possible_values", &field.possible_values),
        ("format", &field.format),
    ] {
        if !value.is_empty() {
            property.insert(key.into(), value.as_str().into());
        }
    }
    property
}

/// Lists nest their element properties under `items`; objects directly.
fn attach_children(
    property: &mut Map<String, Value>,
    field: &Field,
    children: Map<String, Value>,
    required: Vec<Value>,
) {
    match field.field_type {
        FieldType::List if children.is_empty() => {}
        FieldType::List => {
            property.insert(
                "items".into(),
                json!({"type": "object", "required": required, "properties": children}),
            );
        }
        _ => {
            property.insert("properties".into(), Value::Object(children));
            property.insert("required".into(), Value::Array(required));
        }
    }
}

fn json_type(field_type: &FieldType) -> Option<&'static str> {
    match field_type {
        FieldType::String => Some("string"),
        FieldType::Boolean => Some("boolean"),
        FieldType::Integer => Some("integer"),
        FieldType::Float => Some("number"),
        FieldType::List => Some("array"),
        FieldType::Object => Some("object"),
        FieldType::Other(_) => None,
    }
}

fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    }
}

fn take_array(map: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match map.remove(key) {
        Some(Value::Array(inner)) => inner,
        _ => Vec::new(),
    }
}

// ── Operations ───────────────────────────────────────────────────────

fn operation(object: &Object, procedure: &Procedure, codes: &Map<String, Value>) -> Value {
    let mut op = Map::new();
    op.insert(
        "operationId".into(),
        format!("{}.{}", object.name, procedure.name).into(),
    );
    op.insert("summary".into(), procedure.description.as_str().into());
    op.insert("tags".into(), json!([object.name]));
    op.insert("x-resource".into(), object.resource.as_str().into());

    let has_request = procedure.inputs().next().is_some()
        || !sample::compact(&procedure.sample_request).is_empty();
    if has_request {
        op.insert(
            "requestBody".into(),
            json_content(json!({
                "schema": body_schema(&procedure.fields, |f| f.is_input),
                "example": example_text(&procedure.sample_request),
            })),
        );
    }

    let mut responses = Map::new();
    let mut success = json_content(json!({
        "schema": body_schema(&procedure.fields, |f| f.is_output),
        "example": example_text(&procedure.sample_response),
    }));
    success["description"] = SUCCESS_DESCRIPTION.into();
    responses.insert(SUCCESS.into(), success);
    responses.extend(codes.clone());
    op.insert("responses".into(), Value::Object(responses));

    let placeholders = object.placeholders();
    if !placeholders.is_empty() {
        let parameters: Vec<Value> = placeholders
            .iter()
            .map(|name| {
                json!({
                    "in": "path",
                    "name": name,
                    "required": true,
                    "description": format!("ID of a(n) {}", name.strip_suffix("Id").unwrap_or(*name)),
                    "schema": {"type": "integer"},
                })
            })
            .collect();
        op.insert("parameters".into(), Value::Array(parameters));
    }
    Value::Object(op)
}

/// Request or response body holding the fields selected by `pick`.
fn body_schema(fields: &FieldMap, pick: fn(&Field) -> bool) -> Value {
    let (properties, required) = body_members(fields, pick);
    json!({"type": "object", "required": required, "properties": properties})
}

fn body_members(fields: &FieldMap, pick: fn(&Field) -> bool) -> (Map<String, Value>, Vec<Value>) {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields.values().filter(|f| pick(f)) {
        let mut property = base_property(field);
        if field.is_container() {
            let (children, child_required) = body_members(&field.properties, pick);
            attach_children(&mut property, field, children, child_required);
        }
        if field.is_required {
            required.push(Value::String(field.name.clone()));
        }
        properties.insert(field.name.clone(), Value::Object(property));
    }
    (properties, required)
}

fn response_codes(api: &Api) -> Map<String, Value> {
    api.response_codes()
        .iter()
        .enumerate()
        .map(|(order, code)| {
            let mut response = json_content(json!({
                "example": example_text(&code.sample),
                "schema": {"$ref": format!("{}#/components/schemas/Error", API_FILE)},
            }));
            response["description"] = code.description.as_str().into();
            response["x-order"] = order.into();
            if let Some(raised_by) = &code.raised_by {
                response["raised_by"] = raised_by.as_str().into();
            }
            (code.name.clone(), response)
        })
        .collect()
}

/// `{"content": {"application/json": media}}`
fn json_content(media: Value) -> Value {
    let mut content = Map::new();
    content.insert(JSON_CONTENT.into(), media);
    json!({ "content": content })
}

/// Compact sample, or the placeholder when there is nothing to show.
fn example_text(sample: &str) -> String {
    let compact = sample::compact(sample);
    if compact.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        compact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlapi_core::{Event, Instance, ResponseCode, Version};

    fn field(name: &str, field_type: FieldType, input: bool, output: bool) -> Field {
        Field {
            name: name.into(),
            description: format!("{} field.", name),
            field_type,
            is_input: input,
            is_required: false,
            default_value: String::new(),
            is_output: output,
            possible_values: String::new(),
            format: String::new(),
            notes: PLACEHOLDER.into(),
            properties: FieldMap::new(),
        }
    }

    fn procedure(name: &str, fields: Vec<Field>) -> Procedure {
        Procedure {
            name: name.into(),
            description: format!("{} procedure.", name),
            sample_request: "-".into(),
            sample_response: "{ \"Id\": 1 }".into(),
            fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }

    fn sample_api() -> Api {
        let mut accounts = Object::new(1, "User.Accounts", "User Account");
        let mut name = field("Name", FieldType::String, true, false);
        name.is_required = true;
        accounts.procedures.push(procedure(
            "Add",
            vec![name, field("Id", FieldType::Integer, false, true)],
        ));
        accounts.procedures.push(procedure(
            "List",
            vec![field("Offset", FieldType::Integer, true, false)],
        ));
        accounts.events.push(Event {
            code: hlapi_core::Code::Number(1),
            name: "ADDED".into(),
            description: "Added.".into(),
            sample: "-".into(),
        });

        let mut account = Object::new(1, "User.Accounts.{AccountId}", "User Account");
        account.procedures.push(procedure(
            "Get",
            vec![field("Id", FieldType::Integer, true, false)],
        ));
        account.instances.push(Instance {
            name: "admin".into(),
            description: "Built-in.".into(),
        });

        Api::new(
            vec![accounts, account],
            vec![ResponseCode {
                name: "INVALID_ARGUMENT".into(),
                description: "Bad input.".into(),
                sample: "{bad".into(),
                raised_by: None,
            }],
            vec![Version {
                number: "1.0".into(),
                date: "2021-01-01".into(),
                changes: Vec::new(),
            }],
        )
    }

    #[test]
    fn test_objects_sharing_a_root_share_a_document() {
        let bundle = schema_bundle(&sample_api(), "HL-API");
        assert_eq!(bundle.documents.len(), 1);
        let doc = bundle.document("User.Accounts").unwrap();
        let paths = doc["paths"].as_object().unwrap();
        assert!(paths.contains_key("User.Accounts.Add"));
        assert!(paths.contains_key("User.Accounts.{AccountId}.Get"));
        assert_eq!(bundle.api["info"]["version"], "1.0");
        assert_eq!(
            bundle.api["paths"]["User.Accounts"]["$ref"],
            "User.Accounts.json#/paths"
        );
    }

    #[test]
    fn test_component_merges_directions_and_skips_list() {
        let bundle = schema_bundle(&sample_api(), "HL-API");
        let component = bundle.component("User.Accounts").unwrap();
        let properties = component["properties"].as_object().unwrap();
        assert!(!properties.contains_key("Offset"));
        assert_eq!(properties["Name"]["writeOnly"], true);
        // Output on Add, input on Get.
        assert!(properties["Id"].get("readOnly").is_none());
        assert!(properties["Id"].get("writeOnly").is_none());
        assert_eq!(component["required"], json!(["Name"]));
        assert_eq!(component["events"]["1"]["code"], "USER_ACCOUNTS_ADDED");
    }

    #[test]
    fn test_operation_layout() {
        let bundle = schema_bundle(&sample_api(), "HL-API");
        let doc = bundle.document("User.Accounts").unwrap();
        let add = &doc["paths"]["User.Accounts.Add"];
        assert_eq!(add["tags"], json!(["User.Accounts"]));
        assert_eq!(
            add["requestBody"]["content"]["application/json"]["schema"]["required"],
            json!(["Name"])
        );
        let success = &add["responses"]["99"]["content"]["application/json"];
        assert_eq!(success["example"], "{\"Id\":1}");
        assert!(success["schema"]["properties"].get("Id").is_some());
        // Malformed samples fall back to the placeholder.
        assert_eq!(
            add["responses"]["INVALID_ARGUMENT"]["content"]["application/json"]["example"],
            "-"
        );
        let get = &doc["paths"]["User.Accounts.{AccountId}.Get"];
        assert_eq!(get["parameters"][0]["name"], "AccountId");
        assert_eq!(get["parameters"][0]["description"], "ID of a(n) Account");
        assert_eq!(doc["instances"]["admin"]["object"], "User.Accounts.{AccountId}");
    }

    #[test]
    fn test_parameter_description_drops_only_the_id_suffix() {
        let mut object = Object::new(2, "Users.{IdentityId}", "Identity");
        object.procedures.push(procedure("Get", Vec::new()));
        let api = Api::new(vec![object], Vec::new(), Vec::new());

        let bundle = schema_bundle(&api, "HL-API");
        let doc = bundle.document("Users").unwrap();
        let parameters = &doc["paths"]["Users.{IdentityId}.Get"]["parameters"];
        assert_eq!(parameters[0]["description"], "ID of a(n) Identity");
    }

    #[test]
    fn test_nested_list_properties_live_under_items() {
        let mut hosts = field("Hosts", FieldType::List, false, true);
        hosts.properties.insert(
            "Name".into(),
            field("Name", FieldType::String, false, true),
        );
        let mut object = Object::new(3, "Interfaces.LAN", "LAN");
        object.procedures.push(procedure("Get", vec![hosts]));
        let api = Api::new(vec![object], Vec::new(), Vec::new());

        let bundle = schema_bundle(&api, "HL-API");
        let component = bundle.component("Interfaces.LAN").unwrap();
        assert_eq!(component["properties"]["Hosts"]["type"], "array");
        assert_eq!(
            component["properties"]["Hosts"]["items"]["properties"]["Name"]["type"],
            "string"
        );
        assert_eq!(bundle.api["info"]["version"], "");
    }
}
