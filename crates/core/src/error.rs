use crate::record::RecordKind;

/// A build error. Every variant aborts the build; no partial API is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A record was left over after the single linking pass: it references
    /// an object or procedure that no procedure record declares.
    #[error(
        "{kind} '{name}' on {} (row {row}) could not be linked; review the specification for errors",
        location(.object, .procedure.as_deref())
    )]
    UnlinkedRecord {
        kind: RecordKind,
        row: usize,
        object: String,
        procedure: Option<String>,
        name: String,
    },

    /// An input (writable) field has no Required/Optional designation.
    #[error(
        "input field '{field}' on {} (row {row}) has no required flag descriptor",
        location(.object, Some(.procedure.as_str()))
    )]
    MissingRequiredFlag {
        row: usize,
        object: String,
        procedure: String,
        field: String,
    },

    /// A mandatory column is missing or holds an unusable value.
    #[error("{kind} row {row}: column '{column}' {message}")]
    MalformedRecord {
        kind: RecordKind,
        row: usize,
        column: String,
        message: String,
    },

    /// Two records claim the same identity.
    #[error("duplicate {kind} '{name}' on object '{object}' (row {row})")]
    DuplicateRecord {
        kind: RecordKind,
        row: usize,
        object: String,
        name: String,
    },

    /// A dotted field name descends into a field with a scalar type.
    #[error(
        "field '{field}' on {} nests under '{parent}', which is declared as {parent_type}",
        location(.object, Some(.procedure.as_str()))
    )]
    NonContainerParent {
        object: String,
        procedure: String,
        field: String,
        parent: String,
        parent_type: String,
    },
}

fn location(object: &str, procedure: Option<&str>) -> String {
    match procedure {
        Some(p) => format!("object '{}' procedure '{}'", object, p),
        None => format!("object '{}'", object),
    }
}

impl BuildError {
    /// Stable machine-readable error category.
    pub fn category(&self) -> &'static str {
        match self {
            BuildError::UnlinkedRecord { .. } => "unlinked_record",
            BuildError::MissingRequiredFlag { .. } => "missing_required_flag",
            BuildError::MalformedRecord { .. } => "malformed_record",
            BuildError::DuplicateRecord { .. } => "duplicate_record",
            BuildError::NonContainerParent { .. } => "non_container_parent",
        }
    }

    /// Serialize to JSON for `--output json`. All keys are always present
    /// (null when not applicable).
    pub fn to_json_value(&self) -> serde_json::Value {
        let (kind, row, object, procedure, name) = match self {
            BuildError::UnlinkedRecord {
                kind,
                row,
                object,
                procedure,
                name,
            } => (
                Some(kind.to_string()),
                Some(*row),
                Some(object.as_str()),
                procedure.as_deref(),
                Some(name.as_str()),
            ),
            BuildError::MissingRequiredFlag {
                row,
                object,
                procedure,
                field,
            } => (
                Some(RecordKind::Field.to_string()),
                Some(*row),
                Some(object.as_str()),
                Some(procedure.as_str()),
                Some(field.as_str()),
            ),
            BuildError::MalformedRecord {
                kind, row, column, ..
            } => (
                Some(kind.to_string()),
                Some(*row),
                None,
                None,
                Some(column.as_str()),
            ),
            BuildError::DuplicateRecord {
                kind,
                row,
                object,
                name,
            } => (
                Some(kind.to_string()),
                Some(*row),
                Some(object.as_str()),
                None,
                Some(name.as_str()),
            ),
            BuildError::NonContainerParent {
                object,
                procedure,
                field,
                ..
            } => (
                Some(RecordKind::Field.to_string()),
                None,
                Some(object.as_str()),
                Some(procedure.as_str()),
                Some(field.as_str()),
            ),
        };
        serde_json::json!({
            "error":     self.category(),
            "kind":      kind,
            "message":   self.to_string(),
            "name":      name,
            "object":    object,
            "procedure": procedure,
            "row":       row,
        })
    }
}
