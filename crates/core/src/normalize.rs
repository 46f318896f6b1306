//! Record normalizer: put every record stream into canonical order.
//!
//! The linker makes a single forward sort-merge pass over all streams and
//! decides that a group has ended at the first non-matching record. That is
//! only correct on sorted input, so the linker accepts [`Sorted`] streams
//! exclusively, and a [`Sorted`] can only be produced by [`normalize`].

use crate::error::BuildError;
use crate::model::Code;
use crate::record::{columns, rows, Record, RecordKind, Row};

/// A composite sort key that can be extracted from one record.
pub trait SortKey: Ord + Sized {
    const KIND: RecordKind;

    fn extract(row: &Row<'_>) -> Result<Self, BuildError>;
}

/// A record paired with its extracted sort key.
#[derive(Debug, Clone)]
pub struct Keyed<'a, K> {
    pub key: K,
    pub row: Row<'a>,
}

/// A stream sorted by its key. Ties keep their source order.
#[derive(Debug, Clone)]
pub struct Sorted<'a, K> {
    rows: Vec<Keyed<'a, K>>,
}

impl<'a, K> Sorted<'a, K> {
    pub fn as_slice(&self) -> &[Keyed<'a, K>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Extract keys from every record of a stream and sort by them.
pub fn normalize<K: SortKey>(records: &[Record]) -> Result<Sorted<'_, K>, BuildError> {
    let mut keyed = rows(K::KIND, records)
        .map(|row| K::extract(&row).map(|key| Keyed { key, row }))
        .collect::<Result<Vec<_>, _>>()?;
    keyed.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(Sorted { rows: keyed })
}

// ──────────────────────────────────────────────
// Keys
// ──────────────────────────────────────────────

/// (layer, object): the identity of the object a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectKey {
    pub layer: i64,
    pub object: String,
}

impl ObjectKey {
    fn extract(row: &Row<'_>) -> Result<Self, BuildError> {
        Ok(ObjectKey {
            layer: row.integer(columns::LAYER)?,
            object: row.required_text(columns::OBJECT)?,
        })
    }
}

/// Procedures: (layer, object, procedure).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProcedureKey {
    pub owner: ObjectKey,
    pub procedure: String,
}

impl SortKey for ProcedureKey {
    const KIND: RecordKind = RecordKind::Procedure;

    fn extract(row: &Row<'_>) -> Result<Self, BuildError> {
        Ok(ProcedureKey {
            owner: ObjectKey::extract(row)?,
            procedure: row.required_text(columns::PROCEDURE)?,
        })
    }
}

/// Fields: (layer, object, procedure, field).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldKey {
    pub owner: ObjectKey,
    pub procedure: String,
    pub field: String,
}

impl FieldKey {
    pub fn belongs_to(&self, procedure: &ProcedureKey) -> bool {
        self.owner == procedure.owner && self.procedure == procedure.procedure
    }
}

impl SortKey for FieldKey {
    const KIND: RecordKind = RecordKind::Field;

    fn extract(row: &Row<'_>) -> Result<Self, BuildError> {
        Ok(FieldKey {
            owner: ObjectKey::extract(row)?,
            procedure: row.required_text(columns::PROCEDURE)?,
            field: row.required_text(columns::FIELD)?,
        })
    }
}

/// Events: (layer, object, code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventKey {
    pub owner: ObjectKey,
    pub code: Code,
}

impl SortKey for EventKey {
    const KIND: RecordKind = RecordKind::Event;

    fn extract(row: &Row<'_>) -> Result<Self, BuildError> {
        let code = row
            .value(columns::CODE)
            .map(Code::from_value)
            .ok_or_else(|| row.malformed(columns::CODE, "is missing"))?;
        Ok(EventKey {
            owner: ObjectKey::extract(row)?,
            code,
        })
    }
}

/// Instances: (layer, object, instance).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstanceKey {
    pub owner: ObjectKey,
    pub instance: String,
}

impl SortKey for InstanceKey {
    const KIND: RecordKind = RecordKind::Instance;

    fn extract(row: &Row<'_>) -> Result<Self, BuildError> {
        Ok(InstanceKey {
            owner: ObjectKey::extract(row)?,
            instance: row.required_text(columns::INSTANCE)?,
        })
    }
}

/// Response codes: the `Code` column, falling back to `Name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResponseCodeKey {
    pub code: Code,
}

impl SortKey for ResponseCodeKey {
    const KIND: RecordKind = RecordKind::ResponseCode;

    fn extract(row: &Row<'_>) -> Result<Self, BuildError> {
        let code = match row.value(columns::CODE) {
            Some(v) if !v.is_null() && !row.text(columns::CODE).trim().is_empty() => {
                Code::from_value(v)
            }
            _ => Code::Text(row.required_text(columns::NAME)?),
        };
        Ok(ResponseCodeKey { code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(m) => m,
                _ => panic!("record fixture must be an object"),
            })
            .collect()
    }

    #[test]
    fn test_procedures_sort_by_layer_then_object_then_name() {
        let recs = records(vec![
            json!({"Layer": 4, "Object": "System.Buttons", "Procedure": "Set"}),
            json!({"Layer": 1, "Object": "User.Accounts", "Procedure": "List"}),
            json!({"Layer": "1", "Object": "User.Accounts", "Procedure": "Add"}),
        ]);
        let sorted = normalize::<ProcedureKey>(&recs).unwrap();
        let order: Vec<(i64, &str, &str)> = sorted
            .as_slice()
            .iter()
            .map(|k| {
                (
                    k.key.owner.layer,
                    k.key.owner.object.as_str(),
                    k.key.procedure.as_str(),
                )
            })
            .collect();
        assert_eq!(
            order,
            vec![
                (1, "User.Accounts", "Add"),
                (1, "User.Accounts", "List"),
                (4, "System.Buttons", "Set"),
            ]
        );
        // Source position survives sorting.
        assert_eq!(sorted.as_slice()[0].row.index(), 2);
    }

    #[test]
    fn test_event_codes_sort_numerically() {
        let recs = records(vec![
            json!({"Layer": 1, "Object": "A", "Code": 10}),
            json!({"Layer": 1, "Object": "A", "Code": "2"}),
            json!({"Layer": 1, "Object": "A", "Code": 1}),
        ]);
        let sorted = normalize::<EventKey>(&recs).unwrap();
        let codes: Vec<String> = sorted
            .as_slice()
            .iter()
            .map(|k| k.key.code.to_string())
            .collect();
        assert_eq!(codes, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_response_codes_fall_back_to_name() {
        let recs = records(vec![
            json!({"Name": "INVALID_ARGUMENT"}),
            json!({"Name": "OK", "Code": ""}),
            json!({"Name": "ZZZ", "Code": 0}),
        ]);
        let sorted = normalize::<ResponseCodeKey>(&recs).unwrap();
        let names: Vec<String> = sorted
            .as_slice()
            .iter()
            .map(|k| k.key.code.to_string())
            .collect();
        assert_eq!(names, vec!["0", "INVALID_ARGUMENT", "OK"]);
    }

    #[test]
    fn test_missing_layer_is_malformed() {
        let recs = records(vec![json!({"Object": "A", "Procedure": "Get"})]);
        match normalize::<ProcedureKey>(&recs).unwrap_err() {
            BuildError::MalformedRecord { kind, column, .. } => {
                assert_eq!(kind, RecordKind::Procedure);
                assert_eq!(column, "Layer");
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }
}
