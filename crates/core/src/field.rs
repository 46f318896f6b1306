//! Field reconciler: turn the raw field rows of one procedure into a
//! consistent field map.
//!
//! Reconciliation is a two-phase fold. Every row becomes an [`Occurrence`];
//! input occurrences fold into one map and output-only occurrences into
//! another, then the output map is merged into the input map by key. Merging
//! never overwrites a captured scalar attribute: it only switches on the
//! missing input/output flag, ORs the required flag and fills blanks.
//!
//! Dotted names (`Hash.Salt`) descend into object-typed containers, which are
//! synthesized on first use.

use crate::error::BuildError;
use crate::model::{Field, FieldMap, FieldType};
use crate::record::{columns, Row};

/// Placeholder meaning "no value" in authored specifications.
pub const PLACEHOLDER: &str = "-";

/// The (object, procedure) a field set belongs to, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'k> {
    pub object: &'k str,
    pub procedure: &'k str,
}

/// Tri-state required designation as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requiredness {
    Required,
    Optional,
    Unspecified,
}

impl Requiredness {
    pub fn parse(text: &str) -> Requiredness {
        match text.trim().to_ascii_lowercase().as_str() {
            "required" | "true" | "yes" => Requiredness::Required,
            "optional" | "false" | "no" => Requiredness::Optional,
            _ => Requiredness::Unspecified,
        }
    }
}

/// Input/output visibility of one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Access {
    pub input: bool,
    pub output: bool,
}

impl Access {
    /// Rights encoding: a write marker means input, a read marker output.
    pub fn from_rights(rights: &str) -> Access {
        let upper = rights.to_ascii_uppercase();
        Access {
            input: upper.contains('W'),
            output: upper.contains('R'),
        }
    }

    /// Schema-section encoding: request body means input, response body output.
    pub fn from_section(section: &str) -> Access {
        match section.trim().to_ascii_lowercase().as_str() {
            "request" => Access {
                input: true,
                output: false,
            },
            "response" => Access {
                input: false,
                output: true,
            },
            _ => Access::default(),
        }
    }

    /// Prefer an explicit `Rights` cell, fall back to `Section`.
    pub fn from_row(row: &Row<'_>) -> Access {
        let rights = row.text(columns::RIGHTS);
        if !rights.trim().is_empty() {
            return Access::from_rights(&rights);
        }
        Access::from_section(&row.text(columns::SECTION))
    }
}

/// One raw field row, converted but not yet merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Full dotted name as written in the source.
    pub path: String,
    /// The converted field; `name` holds the leaf segment.
    pub field: Field,
}

/// Build the human-readable notes: default value, possible values and
/// format, each as one sentence, or `-` when none apply.
pub fn compose_notes(default_value: &str, possible_values: &str, format: &str) -> String {
    let mut sentences = Vec::new();
    if has_value(default_value) {
        sentences.push(format!("Default value is \"{}\".", default_value.trim()));
    }
    if has_value(possible_values) {
        sentences.push(format!("Possible values are \"{}\".", possible_values.trim()));
    }
    if has_value(format) {
        sentences.push(format!("Format is {}.", format.trim()));
    }
    if sentences.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        sentences.join(" ")
    }
}

fn has_value(text: &str) -> bool {
    let t = text.trim();
    !t.is_empty() && t != PLACEHOLDER
}

/// Convert one field row.
///
/// Fails with [`BuildError::MissingRequiredFlag`] when an input field has no
/// Required/Optional designation. Output-only fields default to optional.
pub fn occurrence_from_row(row: &Row<'_>, ctx: FieldContext<'_>) -> Result<Occurrence, BuildError> {
    let path = row.required_text(columns::FIELD)?.trim().to_string();
    if path.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(row.malformed(columns::FIELD, "has an empty path segment"));
    }
    let access = Access::from_row(row);
    let is_required = match Requiredness::parse(&row.text(columns::REQUIRED)) {
        Requiredness::Required => true,
        Requiredness::Optional => false,
        Requiredness::Unspecified if access.input => {
            return Err(BuildError::MissingRequiredFlag {
                row: row.index(),
                object: ctx.object.to_string(),
                procedure: ctx.procedure.to_string(),
                field: path,
            });
        }
        Requiredness::Unspecified => false,
    };
    if !access.input && !access.output {
        tracing::warn!(
            object = ctx.object,
            procedure = ctx.procedure,
            field = %path,
            "field is neither input nor output"
        );
    }

    let default_value = row.text(columns::DEFAULT_VALUE);
    let possible_values = row.text(columns::POSSIBLE_VALUES);
    let format = row.text(columns::FORMAT);
    let notes = compose_notes(&default_value, &possible_values, &format);
    let leaf = path.rsplit('.').next().unwrap_or(&path).to_string();

    Ok(Occurrence {
        field: Field {
            name: leaf,
            description: row.text(columns::DESCRIPTION),
            field_type: FieldType::parse(&row.text(columns::TYPE)),
            is_input: access.input,
            is_required,
            default_value,
            is_output: access.output,
            possible_values,
            format,
            notes,
            properties: FieldMap::new(),
        },
        path,
    })
}

/// Reconcile all occurrences of one procedure into its field map.
pub fn reconcile(occurrences: Vec<Occurrence>, ctx: FieldContext<'_>) -> Result<FieldMap, BuildError> {
    let (inputs, outputs): (Vec<_>, Vec<_>) =
        occurrences.into_iter().partition(|o| o.field.is_input);
    let input_map = fold(inputs, ctx)?;
    let output_map = fold(outputs, ctx)?;
    merge_maps(input_map, output_map, &[], ctx)
}

fn fold(occurrences: Vec<Occurrence>, ctx: FieldContext<'_>) -> Result<FieldMap, BuildError> {
    occurrences.into_iter().try_fold(FieldMap::new(), |map, o| {
        let segments: Vec<&str> = o.path.split('.').collect();
        insert_path(map, &segments, &[], o.field, ctx)
    })
}

/// Insert `field` under the dotted path `segments`, creating containers for
/// every ancestor segment. `prefix` is the already-consumed path.
fn insert_path(
    mut map: FieldMap,
    segments: &[&str],
    prefix: &[&str],
    field: Field,
    ctx: FieldContext<'_>,
) -> Result<FieldMap, BuildError> {
    match segments {
        [] => Ok(map),
        [leaf] => {
            let merged = match map.remove(*leaf) {
                Some(existing) => merge(existing, field, prefix, ctx)?,
                None => field,
            };
            map.insert(leaf.to_string(), merged);
            Ok(map)
        }
        [head, rest @ ..] => {
            let mut container = match map.remove(*head) {
                Some(existing) if existing.is_container() => existing,
                Some(existing) => {
                    let parent = [prefix, &[*head][..]].concat();
                    let field_path = [prefix, segments].concat();
                    return Err(non_container(&parent, &field_path, &existing, ctx));
                }
                None => Field::container(head),
            };
            container.is_input |= field.is_input;
            container.is_output |= field.is_output;
            let mut path = prefix.to_vec();
            path.push(*head);
            let children = std::mem::take(&mut container.properties);
            container.properties = insert_path(children, rest, &path, field, ctx)?;
            map.insert(head.to_string(), container);
            Ok(map)
        }
    }
}

/// Merge a second occurrence of the same field into the first.
fn merge(
    mut existing: Field,
    incoming: Field,
    prefix: &[&str],
    ctx: FieldContext<'_>,
) -> Result<Field, BuildError> {
    if let Some(child) = incoming.properties.keys().next() {
        if !existing.is_container() {
            let parent = [prefix, &[existing.name.as_str()][..]].concat();
            let field_path = [&parent[..], &[child.as_str()][..]].concat();
            return Err(non_container(&parent, &field_path, &existing, ctx));
        }
    }
    if let Some(child) = existing.properties.keys().next() {
        if !incoming.is_container() {
            let parent = [prefix, &[incoming.name.as_str()][..]].concat();
            let field_path = [&parent[..], &[child.as_str()][..]].concat();
            return Err(non_container(&parent, &field_path, &incoming, ctx));
        }
    }

    existing.is_input |= incoming.is_input;
    existing.is_output |= incoming.is_output;
    existing.is_required |= incoming.is_required;

    fill_blank(&mut existing.description, incoming.description);
    fill_blank(&mut existing.default_value, incoming.default_value);
    fill_blank(&mut existing.possible_values, incoming.possible_values);
    fill_blank(&mut existing.format, incoming.format);
    if existing.notes == PLACEHOLDER {
        existing.notes = incoming.notes;
    }

    let mut path = prefix.to_vec();
    path.push(&existing.name);
    let mine = std::mem::take(&mut existing.properties);
    existing.properties = merge_maps(mine, incoming.properties, &path, ctx)?;
    Ok(existing)
}

fn merge_maps(
    mut base: FieldMap,
    other: FieldMap,
    prefix: &[&str],
    ctx: FieldContext<'_>,
) -> Result<FieldMap, BuildError> {
    for (name, field) in other {
        let merged = match base.remove(&name) {
            Some(existing) => merge(existing, field, prefix, ctx)?,
            None => field,
        };
        base.insert(name, merged);
    }
    Ok(base)
}

fn fill_blank(slot: &mut String, value: String) {
    if slot.trim().is_empty() {
        *slot = value;
    }
}

fn non_container(
    parent: &[&str],
    field: &[&str],
    declared: &Field,
    ctx: FieldContext<'_>,
) -> BuildError {
    BuildError::NonContainerParent {
        object: ctx.object.to_string(),
        procedure: ctx.procedure.to_string(),
        field: field.join("."),
        parent: parent.join("."),
        parent_type: match declared.field_type.as_str().trim() {
            "" => "an untyped field".to_string(),
            declared_type => declared_type.to_string(),
        },
    }
}
