//! Markdown reference document.

use hlapi_core::model::flatten_fields;
use hlapi_core::{sample, Api, Field, FieldMap, Object, Procedure};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{self, WriteError};

pub const DOCUMENT_FILE: &str = "hl-api.md";

const NOT_APPLICABLE: &str = "N/A.";

pub fn markdown_document(api: &Api, title: &str) -> String {
    let mut out = String::new();
    match api.current_version() {
        Some(version) => line(&mut out, &format!("# {} v{}", title, version)),
        None => line(&mut out, &format!("# {}", title)),
    }
    out.push('\n');

    change_log(&mut out, api);
    response_codes(&mut out, api);

    line(&mut out, "## Procedures");
    out.push('\n');
    for object in api.objects() {
        object_section(&mut out, object);
    }

    let with_events: Vec<&Object> = api.objects().iter().filter(|o| !o.events.is_empty()).collect();
    if !with_events.is_empty() {
        line(&mut out, "## Events");
        out.push('\n');
        for object in with_events {
            line(&mut out, &format!("### {}", object.name));
            out.push('\n');
            table(
                &mut out,
                &["Code", "Name", "Description", "Sample"],
                object.events.iter().map(|e| {
                    vec![
                        e.code.to_string(),
                        e.name.clone(),
                        e.description.clone(),
                        inline_code(&sample::compact(&e.sample)),
                    ]
                }),
            );
        }
    }
    out
}

pub fn write_markdown(api: &Api, title: &str, dir: &Path) -> Result<PathBuf, WriteError> {
    let path = dir.join(DOCUMENT_FILE);
    std::fs::write(&path, markdown_document(api, title)).map_err(error::io(&path))?;
    debug!(path = %path.display(), "wrote markdown document");
    Ok(path)
}

fn change_log(out: &mut String, api: &Api) {
    line(out, "## Change Log");
    out.push('\n');
    table(
        out,
        &["Version", "Date", "Changes"],
        api.versions().iter().map(|v| {
            vec![
                v.number.clone(),
                v.date.clone(),
                v.changes_text().replace('\n', "<br>"),
            ]
        }),
    );
}

fn response_codes(out: &mut String, api: &Api) {
    line(out, "## Response Codes");
    out.push('\n');
    line(
        out,
        "The following response codes apply to all objects and procedures.",
    );
    out.push('\n');
    table(
        out,
        &["Name", "Description", "Raised By", "Sample"],
        api.response_codes().iter().map(|c| {
            vec![
                c.name.clone(),
                c.description.clone(),
                c.raised_by.clone().unwrap_or_else(|| "-".into()),
                inline_code(&sample::compact(&c.sample)),
            ]
        }),
    );
}

fn object_section(out: &mut String, object: &Object) {
    line(out, &format!("### {}", object.name));
    out.push('\n');
    line(
        out,
        &format!("Layer {}. Resource: {}.", object.layer, object.resource),
    );
    out.push('\n');

    for procedure in &object.procedures {
        procedure_section(out, object, procedure);
    }

    if !object.instances.is_empty() {
        line(out, "#### Instances");
        out.push('\n');
        table(
            out,
            &["Instance", "Description"],
            object
                .instances
                .iter()
                .map(|i| vec![i.name.clone(), i.description.clone()]),
        );
    }
}

fn procedure_section(out: &mut String, object: &Object, procedure: &Procedure) {
    line(out, &format!("#### {}", procedure.name));
    out.push('\n');
    if !procedure.description.is_empty() {
        line(out, &procedure.description);
        out.push('\n');
    }

    line(out, "Usage:");
    out.push('\n');
    let request = sample::compact(&procedure.sample_request);
    let usage = if request.is_empty() {
        format!("ubus call {} {}", object.name, procedure.name)
    } else {
        format!("ubus call {} {} '{}'", object.name, procedure.name, request)
    };
    fenced(out, "sh", &usage);

    line(out, "Input:");
    out.push('\n');
    let inputs = flattened(&procedure.fields, |f| f.is_input);
    if inputs.is_empty() {
        line(out, NOT_APPLICABLE);
        out.push('\n');
    } else {
        table(
            out,
            &["Name", "Description", "Type", "Required", "Notes"],
            inputs.iter().map(|(path, f)| {
                vec![
                    path.clone(),
                    f.description.clone(),
                    f.field_type.to_string(),
                    required_label(f).into(),
                    f.notes.clone(),
                ]
            }),
        );
    }

    line(out, "Output:");
    out.push('\n');
    let outputs = flattened(&procedure.fields, |f| f.is_output);
    if outputs.is_empty() {
        line(out, NOT_APPLICABLE);
        out.push('\n');
    } else {
        table(
            out,
            &["Name", "Description", "Type", "Notes"],
            outputs.iter().map(|(path, f)| {
                vec![
                    path.clone(),
                    f.description.clone(),
                    f.field_type.to_string(),
                    f.notes.clone(),
                ]
            }),
        );
    }

    for (label, text) in [
        ("Sample request:", &procedure.sample_request),
        ("Sample response:", &procedure.sample_response),
    ] {
        let pretty = sample::pretty(text);
        if !pretty.is_empty() {
            line(out, label);
            out.push('\n');
            fenced(out, "json", &pretty);
        }
    }
}

fn flattened(fields: &FieldMap, pick: fn(&Field) -> bool) -> Vec<(String, &Field)> {
    flatten_fields(fields)
        .into_iter()
        .filter(|(_, f)| pick(f))
        .collect()
}

fn required_label(field: &Field) -> &'static str {
    if field.is_required {
        "Yes"
    } else {
        "No"
    }
}

fn line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

fn fenced(out: &mut String, lang: &str, body: &str) {
    let _ = writeln!(out, "```{}\n{}\n```\n", lang, body);
}

fn inline_code(text: &str) -> String {
    if text.is_empty() {
        "-".into()
    } else {
        format!("`{}`", text)
    }
}

/// GitHub-flavored table. Pipes and line breaks inside cells are escaped.
fn table<I>(out: &mut String, headers: &[&str], rows: I)
where
    I: IntoIterator<Item = Vec<String>>,
{
    let _ = writeln!(out, "| {} |", headers.join(" | "));
    let _ = writeln!(
        out,
        "|{}",
        headers.iter().map(|_| "---|").collect::<String>()
    );
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }
    out.push('\n');
}

fn escape_cell(cell: &str) -> String {
    let escaped = cell.replace('|', "\\|").replace('\n', " ");
    if escaped.trim().is_empty() {
        "-".into()
    } else {
        escaped
    }
}
