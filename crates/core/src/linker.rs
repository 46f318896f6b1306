//! Relation linker: a single forward sort-merge pass over the procedure,
//! field, event and instance streams.
//!
//! The procedure stream drives the pass. Every stream is an immutable sorted
//! slice with its own cursor; a group is "peeled from the front" by advancing
//! the cursor while the front record matches the current owner, and stops at
//! the first mismatch. When the procedure stream is exhausted every other
//! cursor must be exhausted too; a leftover record references an object or
//! procedure that no procedure record declares.

use tracing::{debug, Span};

use crate::error::BuildError;
use crate::field::{self, FieldContext};
use crate::model::{Event, Instance, Object, Procedure};
use crate::normalize::{EventKey, FieldKey, InstanceKey, Keyed, ObjectKey, ProcedureKey, Sorted};
use crate::record::{columns, RecordKind};

/// The four sorted streams consumed by one linking pass.
pub struct LinkInput<'a> {
    pub procedures: Sorted<'a, ProcedureKey>,
    pub fields: Sorted<'a, FieldKey>,
    pub events: Sorted<'a, EventKey>,
    pub instances: Sorted<'a, InstanceKey>,
}

/// Number of records claimed from each stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub objects: usize,
    pub procedures: usize,
    pub fields: usize,
    pub events: usize,
    pub instances: usize,
}

/// Result of a successful linking pass.
#[derive(Debug, Clone)]
pub struct Linked {
    pub objects: Vec<Object>,
    pub stats: LinkStats,
}

/// Forward-only cursor over a sorted slice.
struct Cursor<'s, 'a, K> {
    rows: &'s [Keyed<'a, K>],
    pos: usize,
}

impl<'s, 'a, K> Cursor<'s, 'a, K> {
    fn new(rows: &'s [Keyed<'a, K>]) -> Self {
        Cursor { rows, pos: 0 }
    }

    fn next(&mut self) -> Option<&'s Keyed<'a, K>> {
        let item = self.rows.get(self.pos)?;
        self.pos += 1;
        Some(item)
    }

    /// Claim the run of front records matching `pred`.
    fn take_while(&mut self, pred: impl Fn(&K) -> bool) -> &'s [Keyed<'a, K>] {
        let start = self.pos;
        while self.pos < self.rows.len() && pred(&self.rows[self.pos].key) {
            self.pos += 1;
        }
        &self.rows[start..self.pos]
    }

    fn peek(&self) -> Option<&'s Keyed<'a, K>> {
        self.rows.get(self.pos)
    }

    fn consumed(&self) -> usize {
        self.pos
    }
}

pub struct Linker<'s, 'a> {
    procedures: Cursor<'s, 'a, ProcedureKey>,
    fields: Cursor<'s, 'a, FieldKey>,
    events: Cursor<'s, 'a, EventKey>,
    instances: Cursor<'s, 'a, InstanceKey>,
    span: Span,
}

impl<'s, 'a> Linker<'s, 'a> {
    pub fn new(input: &'s LinkInput<'a>) -> Self {
        Linker {
            procedures: Cursor::new(input.procedures.as_slice()),
            fields: Cursor::new(input.fields.as_slice()),
            events: Cursor::new(input.events.as_slice()),
            instances: Cursor::new(input.instances.as_slice()),
            span: Span::none(),
        }
    }

    /// Emit all linking diagnostics inside `span`.
    pub fn in_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn link(mut self) -> Result<Linked, BuildError> {
        let span = self.span.clone();
        let _entered = span.enter();

        let mut objects: Vec<Object> = Vec::new();
        while let Some(p) = self.procedures.next() {
            let owner = &p.key.owner;
            let continues = objects
                .last()
                .is_some_and(|o| o.layer == owner.layer && o.name == owner.object);
            if !continues {
                let object = self.open_object(p)?;
                debug!(object = %object.name, "created object");
                objects.push(object);
            }

            let procedure = self.link_procedure(p)?;
            if let Some(object) = objects.last_mut() {
                if object.procedures.last().is_some_and(|q| q.name == procedure.name) {
                    return Err(BuildError::DuplicateRecord {
                        kind: RecordKind::Procedure,
                        row: p.row.index(),
                        object: object.name.clone(),
                        name: procedure.name,
                    });
                }
                debug!(
                    object = %object.name,
                    procedure = %procedure.name,
                    fields = procedure.fields.len(),
                    "added procedure"
                );
                object.procedures.push(procedure);
            }
        }
        debug!("all objects and procedures linked");

        self.ensure_exhausted()?;

        let stats = LinkStats {
            objects: objects.len(),
            procedures: self.procedures.consumed(),
            fields: self.fields.consumed(),
            events: self.events.consumed(),
            instances: self.instances.consumed(),
        };
        Ok(Linked { objects, stats })
    }

    /// Create the object owning procedure `p` and claim its events and
    /// instances.
    fn open_object(&mut self, p: &Keyed<'a, ProcedureKey>) -> Result<Object, BuildError> {
        let owner = &p.key.owner;
        let mut object = Object::new(owner.layer, owner.object.clone(), p.row.text(columns::RESOURCE));

        for e in self.events.take_while(|k| owns(owner, &k.owner)) {
            let event = Event {
                code: e.key.code.clone(),
                name: e.row.text(columns::NAME),
                description: e.row.text(columns::DESCRIPTION),
                sample: e.row.text(columns::SAMPLE),
            };
            debug!(object = %owner.object, event = %event.name, "added event");
            object.events.push(event);
        }

        for i in self.instances.take_while(|k| owns(owner, &k.owner)) {
            let instance = Instance {
                name: i.key.instance.clone(),
                description: i.row.text(columns::DESCRIPTION),
            };
            debug!(object = %owner.object, instance = %instance.name, "added instance");
            object.instances.push(instance);
        }

        Ok(object)
    }

    fn link_procedure(&mut self, p: &Keyed<'a, ProcedureKey>) -> Result<Procedure, BuildError> {
        let ctx = FieldContext {
            object: &p.key.owner.object,
            procedure: &p.key.procedure,
        };
        let occurrences = self
            .fields
            .take_while(|k| k.belongs_to(&p.key))
            .iter()
            .map(|f| field::occurrence_from_row(&f.row, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        for o in &occurrences {
            debug!(field = %o.path, r#type = %o.field.field_type, "parsed field");
        }
        let fields = field::reconcile(occurrences, ctx)?;

        Ok(Procedure {
            name: p.key.procedure.clone(),
            description: p.row.text(columns::DESCRIPTION),
            sample_request: p.row.text(columns::ARGUMENTS),
            sample_response: p.row.text(columns::SAMPLE),
            fields,
        })
    }

    /// Report the first record of the first non-exhausted stream, in the
    /// order fields, events, instances.
    fn ensure_exhausted(&self) -> Result<(), BuildError> {
        if let Some(f) = self.fields.peek() {
            return Err(BuildError::UnlinkedRecord {
                kind: RecordKind::Field,
                row: f.row.index(),
                object: f.key.owner.object.clone(),
                procedure: Some(f.key.procedure.clone()),
                name: f.key.field.clone(),
            });
        }
        debug!("all fields linked");
        if let Some(e) = self.events.peek() {
            let name = e.row.text(columns::NAME);
            return Err(BuildError::UnlinkedRecord {
                kind: RecordKind::Event,
                row: e.row.index(),
                object: e.key.owner.object.clone(),
                procedure: None,
                name: if name.is_empty() {
                    e.key.code.to_string()
                } else {
                    name
                },
            });
        }
        debug!("all events linked");
        if let Some(i) = self.instances.peek() {
            return Err(BuildError::UnlinkedRecord {
                kind: RecordKind::Instance,
                row: i.row.index(),
                object: i.key.owner.object.clone(),
                procedure: None,
                name: i.key.instance.clone(),
            });
        }
        debug!("all instances linked");
        Ok(())
    }
}

fn owns(owner: &ObjectKey, candidate: &ObjectKey) -> bool {
    owner == candidate
}
