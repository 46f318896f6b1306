//! Readers feeding the core, using on-disk fixtures.

use hlapi_core::{build_api, BuildError};
use hlapi_reader::{read, read_sheets, read_tree, ReadError, SourceFormat};
use std::fs;
use std::path::Path;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn sheet_fixture(dir: &Path) {
    write(
        dir,
        "objects.csv",
        "Layer,Object,Procedure,Resource,Description,Arguments,Sample\n\
         1,User.Accounts,List,User Account,Lists accounts.,-,-\n\
         1,User.Accounts,Add,User Account,Adds an account.,\"{\"\"Name\"\":\"\"guest\"\"}\",-\n\
         4,System.Buttons.{ButtonId},Get,Button,Reads a button.,-,-\n",
    );
    write(
        dir,
        "fields.csv",
        "Layer,Object,Procedure,Field,Description,Type,Rights,Required,Default Value,Possible Values,Format\n\
         1,User.Accounts,Add,Name,Login name.,String,W,Required,-,-,-\n\
         1,User.Accounts,Add,Hash.Salt,Salt.,String,W,Optional,-,-,hex\n\
         1,User.Accounts,Add,Id,Account id.,Integer,R,,-,-,-\n\
         4,System.Buttons.{ButtonId},Get,State,Button state.,String,R,,-,\"Pressed, Released\",-\n",
    );
    write(
        dir,
        "events.csv",
        "Layer,Object,Code,Name,Description,Sample\n\
         4,System.Buttons.{ButtonId},1,PRESSED,A button was pressed.,-\n",
    );
    write(
        dir,
        "toc.csv",
        "Layer,Object,Instance,Description\n\
         4,System.Buttons.{ButtonId},WPS,Physical WPS button.\n",
    );
    write(
        dir,
        "response_codes.csv",
        "Code,Name,Description,Sample,Raised By\n\
         1,INVALID_ARGUMENT,Bad input.,-,\n\
         0,OK,Success.,-,\n",
    );
    write(
        dir,
        "change_log.csv",
        "Version,Date,Change,Description\n\
         1.1,2021-03-01,1,Added buttons\n\
         1.0,2021-01-01,1,Initial release\n",
    );
}

#[test]
fn sheet_directory_builds_an_api() {
    let dir = tempfile::tempdir().unwrap();
    sheet_fixture(dir.path());

    let streams = read_sheets(dir.path()).unwrap();
    let api = build_api(&streams).unwrap();

    assert_eq!(api.current_version(), Some("1.1"));
    assert_eq!(api.objects().len(), 2);
    let accounts = api.object("User.Accounts").unwrap();
    let names: Vec<&str> = accounts.procedures.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Add", "List"]);

    let add = accounts.procedure("Add").unwrap();
    assert_eq!(add.sample_request, "{\"Name\":\"guest\"}");
    assert!(add.fields["Name"].is_required);
    assert!(add.fields["Hash"].properties.contains_key("Salt"));
    assert!(add.fields["Id"].is_output);

    let buttons = api.object("System.Buttons.{ButtonId}").unwrap();
    assert_eq!(buttons.events.len(), 1);
    assert_eq!(buttons.instances[0].name, "WPS");
    assert_eq!(
        buttons.procedures[0].fields["State"].notes,
        "Possible values are \"Pressed, Released\"."
    );

    let codes: Vec<&str> = api.response_codes().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(codes, vec!["OK", "INVALID_ARGUMENT"]);
}

#[test]
fn optional_sheets_may_be_absent() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "objects.csv",
        "Layer,Object,Procedure\n1,User.Accounts,Add\n",
    );
    let streams = read(dir.path(), SourceFormat::detect(dir.path())).unwrap();
    assert!(streams.fields.is_empty());
    assert!(streams.versions.is_empty());
    assert_eq!(build_api(&streams).unwrap().objects().len(), 1);
}

#[test]
fn missing_objects_sheet_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    match read_sheets(dir.path()).unwrap_err() {
        ReadError::Io { path, .. } => assert!(path.ends_with("objects.csv")),
        other => panic!("expected Io, got {:?}", other),
    }
}

#[test]
fn field_for_unknown_procedure_fails_the_build() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "objects.csv",
        "Layer,Object,Procedure\n1,User.Accounts,Add\n",
    );
    write(
        dir.path(),
        "fields.csv",
        "Layer,Object,Procedure,Field,Type,Rights,Required\n\
         1,User.Accounts,Remove,Id,Integer,W,Required\n",
    );
    let streams = read_sheets(dir.path()).unwrap();
    assert!(matches!(
        build_api(&streams),
        Err(BuildError::UnlinkedRecord { .. })
    ));
}

#[test]
fn schema_tree_builds_an_api() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "api.json",
        r#"{
          "openapi": "3.0.0",
          "versions": {
            "3.5.1": {"date": "2020-01-01", "changes": [[1, "Initial"]]},
            "3.5.2": {"date": "2020-02-01", "changes": [[1, "Fixed typo"]]}
          },
          "paths": {"User.Accounts": {"$ref": "User.Accounts.json#/paths"}}
        }"#,
    );
    write(
        dir.path(),
        "User.Accounts.json",
        r#"{
          "components": {"schemas": {"User.Accounts": {"layer": 1, "events": {}}}},
          "paths": {
            "User.Accounts.Set": {
              "summary": "Updates an account.",
              "tags": ["User.Accounts"],
              "requestBody": {"content": {"application/json": {
                "example": "{}",
                "schema": {"type": "object", "required": [], "properties": {
                  "Enabled": {"type": "boolean", "default_value": "true"}
                }}
              }}},
              "responses": {"99": {"description": "OK", "content": {"application/json": {
                "example": "{}",
                "schema": {"type": "object", "required": ["Enabled"], "properties": {
                  "Enabled": {"type": "boolean"}
                }}
              }}}}
            }
          }
        }"#,
    );

    assert_eq!(SourceFormat::detect(dir.path()), SourceFormat::Tree);
    let api = build_api(&read_tree(dir.path()).unwrap()).unwrap();
    assert_eq!(api.current_version(), Some("3.5.2"));
    let set = api.find_procedure("User.Accounts", "Set").unwrap();
    assert_eq!(set.fields.len(), 1);
    let enabled = &set.fields["Enabled"];
    assert!(enabled.is_input && enabled.is_output);
    assert!(enabled.is_required);
    assert_eq!(enabled.notes, "Default value is \"true\".");
}

#[test]
fn broken_object_document_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "api.json",
        r#"{"paths": {"A": {"$ref": "A.json#/paths"}}}"#,
    );
    write(dir.path(), "A.json", "{ not json");
    match read_tree(dir.path()).unwrap_err() {
        ReadError::Json { path, .. } => assert!(path.ends_with("A.json")),
        other => panic!("expected Json, got {:?}", other),
    }
}
