#![allow(clippy::result_large_err)]
//! hlapi-core: HL-API object model and record-linking factory.
//!
//! Turns the flat record streams of an HL-API specification (procedures,
//! fields, events, instances, response codes, versions) into one immutable
//! [`Api`] aggregate.
//!
//! # Pipeline
//!
//! - [`normalize`] -- sort each stream by its typed composite key
//! - [`linker`] -- single forward sort-merge pass attaching children to objects
//! - [`field`] -- field reconciliation (input/output merge, nesting, notes)
//! - [`factory`] -- orchestration, response codes and versions
//!
//! Key types are re-exported at the crate root for convenience.

pub mod api;
pub mod error;
pub mod factory;
pub mod field;
pub mod linker;
pub mod model;
pub mod normalize;
pub mod record;
pub mod sample;

// ── Convenience re-exports: key types ────────────────────────────────

pub use api::Api;
pub use error::BuildError;
pub use linker::LinkStats;
pub use model::{
    Change, Code, Event, Field, FieldMap, FieldType, Instance, Object, Procedure, ResponseCode,
    Version,
};
pub use record::{columns, Record, RecordKind, RecordStreams};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use factory::{build_api, ObjectFactory};
