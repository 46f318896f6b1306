//! Writers against the readers: an API written out and read back must link
//! into the same aggregate.

use hlapi_core::{build_api, Api};
use hlapi_reader::{read, read_sheets, read_tree, SourceFormat};
use hlapi_writer::{schema_bundle, write, OutputFormat, DEFAULT_TITLE};
use serde_json::json;
use std::fs;
use std::path::Path;

fn write_file(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

/// Samples are already compact and empty cells are spelled `-`, so the
/// sheets survive a write without normalization.
fn fixture_api() -> Api {
    let dir = tempfile::tempdir().unwrap();
    let dir = dir.path();
    write_file(
        dir,
        "objects.csv",
        "Layer,Object,Procedure,Resource,Description,Arguments,Sample\n\
         1,User.Accounts,Add,User Account,Adds an account.,\"{\"\"Name\"\":\"\"guest\"\"}\",-\n\
         1,User.Accounts,List,User Account,Lists accounts.,-,\"[\"\"guest\"\"]\"\n\
         4,System.Buttons.{ButtonId},Get,Button,Reads a button.,-,-\n",
    );
    write_file(
        dir,
        "fields.csv",
        "Layer,Object,Procedure,Field,Description,Type,Rights,Required,Default Value,Possible Values,Format\n\
         1,User.Accounts,Add,Name,Login name.,String,W,Required,-,-,-\n\
         1,User.Accounts,Add,Description,Free text.,String,W,Optional,-,-,-\n\
         1,User.Accounts,Add,Hash.Salt,Salt.,String,W,Optional,-,-,hex\n\
         1,User.Accounts,Add,Enabled,Account state.,Boolean,RW,Required,true,-,-\n\
         1,User.Accounts,Add,Id,Account id.,Integer,R,,-,-,-\n\
         1,User.Accounts,List,Count,Number of accounts.,Integer,R,Required,-,-,-\n\
         4,System.Buttons.{ButtonId},Get,State,Button state.,String,R,,-,\"Pressed, Released\",-\n",
    );
    write_file(
        dir,
        "events.csv",
        "Layer,Object,Code,Name,Description,Sample\n\
         4,System.Buttons.{ButtonId},1,PRESSED,A button was pressed.,-\n",
    );
    write_file(
        dir,
        "toc.csv",
        "Layer,Object,Instance,Description\n\
         4,System.Buttons.{ButtonId},WPS,Physical WPS button.\n",
    );
    write_file(
        dir,
        "response_codes.csv",
        "Code,Name,Description,Sample,Raised By\n\
         0,OK,Success.,-,\n\
         1,INVALID_ARGUMENT,Bad input.,-,\n",
    );
    write_file(
        dir,
        "change_log.csv",
        "Version,Date,Change,Description\n\
         1.1,2021-03-01,1,Added buttons\n\
         1.1,2021-03-01,2,Added hashes\n\
         1.0,2021-01-01,1,Initial release\n",
    );
    build_api(&read_sheets(dir).unwrap()).unwrap()
}

#[test]
fn sheets_round_trip() {
    let api = fixture_api();
    let out = tempfile::tempdir().unwrap();
    let written = write(&api, OutputFormat::Sheets, DEFAULT_TITLE, out.path()).unwrap();
    assert_eq!(written.len(), 6);

    let rebuilt = build_api(&read_sheets(out.path()).unwrap()).unwrap();
    assert_eq!(rebuilt, api);
}

#[test]
fn schema_tree_round_trip() {
    let api = fixture_api();
    let out = tempfile::tempdir().unwrap();
    let written = write(&api, OutputFormat::Schema, DEFAULT_TITLE, out.path()).unwrap();
    assert!(written.iter().any(|p| p.ends_with("api.json")));
    assert!(written.iter().any(|p| p.ends_with("System.Buttons.json")));

    assert_eq!(SourceFormat::detect(out.path()), SourceFormat::Tree);
    let rebuilt = build_api(&read(out.path(), SourceFormat::Tree).unwrap()).unwrap();
    assert_eq!(rebuilt, api);
}

#[test]
fn schema_tree_feeds_sheets() {
    let api = fixture_api();
    let tree = tempfile::tempdir().unwrap();
    let sheets = tempfile::tempdir().unwrap();
    write(&api, OutputFormat::Schema, DEFAULT_TITLE, tree.path()).unwrap();

    let from_tree = build_api(&read_tree(tree.path()).unwrap()).unwrap();
    write(&from_tree, OutputFormat::Sheets, DEFAULT_TITLE, sheets.path()).unwrap();
    let from_sheets = build_api(&read_sheets(sheets.path()).unwrap()).unwrap();
    assert_eq!(from_sheets, api);
}

#[test]
fn markdown_is_written_into_a_new_directory() {
    let api = fixture_api();
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("docs");
    let written = write(&api, OutputFormat::Markdown, "Gateway API", &target).unwrap();
    assert_eq!(written, vec![target.join("hl-api.md")]);

    let text = fs::read_to_string(&written[0]).unwrap();
    assert!(text.starts_with("# Gateway API v1.1"));
    assert!(text.contains("| Hash.Salt | Salt. | String | No | Format is hex. |"));
    assert!(text.contains("| State | Button state. | String | Possible values are \"Pressed, Released\". |"));
}

#[test]
fn component_schema_validates_objects() {
    let bundle = schema_bundle(&fixture_api(), DEFAULT_TITLE);
    let component = bundle.component("User.Accounts").unwrap();
    let validator = jsonschema::validator_for(component).unwrap();

    assert!(validator.is_valid(&json!({
        "Name": "guest",
        "Enabled": true,
        "Hash": {"Salt": "00ff"},
        "Id": 3
    })));
    assert!(!validator.is_valid(&json!({"Name": "guest"})));
    assert!(!validator.is_valid(&json!({"Name": 7, "Enabled": true})));
    assert!(!validator.is_valid(&json!({
        "Name": "guest",
        "Enabled": true,
        "Hash": "not an object"
    })));
}

#[test]
fn error_schema_validates_response_bodies() {
    let bundle = schema_bundle(&fixture_api(), DEFAULT_TITLE);
    let error = &bundle.api["components"]["schemas"]["Error"];
    let validator = jsonschema::validator_for(error).unwrap();
    assert!(validator.is_valid(&json!({"code": 1, "message": "Bad input."})));
    assert!(!validator.is_valid(&json!({"code": "1"})));
}

#[test]
fn root_document_references_every_object_root() {
    let bundle = schema_bundle(&fixture_api(), DEFAULT_TITLE);
    assert_eq!(bundle.api["info"]["version"], "1.1");
    assert_eq!(
        bundle.api["paths"]["System.Buttons"]["$ref"],
        "System.Buttons.json#/paths"
    );
    assert_eq!(
        bundle.api["versions"]["1.1"]["changes"],
        json!([[1, "Added buttons"], [2, "Added hashes"]])
    );
    let buttons = bundle.document("System.Buttons").unwrap();
    assert_eq!(
        buttons["components"]["schemas"]["System.Buttons"]["events"]["1"]["code"],
        "SYSTEM_BUTTONS_PRESSED"
    );
    assert_eq!(buttons["instances"]["WPS"]["object"], "System.Buttons.{ButtonId}");
}
