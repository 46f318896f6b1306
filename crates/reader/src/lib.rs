//! hlapi-reader: load an HL-API specification into record streams.
//!
//! Two on-disk layouts are supported:
//!
//! - a sheet directory: one CSV file per record kind ([`sheets`])
//! - a schema tree: `api.json` plus one JSON document per object root ([`tree`])
//!
//! Both produce the same [`RecordStreams`], which `hlapi-core` links into an
//! API. Readers never validate relations; that is the core's job.

pub mod error;
pub mod sheets;
pub mod tree;

use hlapi_core::RecordStreams;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use error::ReadError;
pub use sheets::read_sheets;
pub use tree::read_tree;

/// On-disk layout of a specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Sheets,
    Tree,
}

impl SourceFormat {
    /// A directory holding `api.json` is a schema tree; anything else is
    /// read as a sheet directory.
    pub fn detect(dir: &Path) -> SourceFormat {
        if dir.join(tree::API_FILE).is_file() {
            SourceFormat::Tree
        } else {
            SourceFormat::Sheets
        }
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sheets" => Ok(SourceFormat::Sheets),
            "tree" => Ok(SourceFormat::Tree),
            other => Err(format!(
                "unknown input format '{}' (expected sheets or tree)",
                other
            )),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Sheets => f.write_str("sheets"),
            SourceFormat::Tree => f.write_str("tree"),
        }
    }
}

/// Read `dir` in the given layout.
pub fn read(dir: &Path, format: SourceFormat) -> Result<RecordStreams, ReadError> {
    match format {
        SourceFormat::Sheets => read_sheets(dir),
        SourceFormat::Tree => read_tree(dir),
    }
}
