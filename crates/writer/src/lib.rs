//! hlapi-writer: render a built [`Api`] into output artifacts.
//!
//! Every writer is a pure function from `&Api` to an in-memory artifact,
//! plus a `write_*` helper that persists it into an output directory and
//! returns the written paths:
//!
//! - [`schema`] -- JSON-Schema bundle (`api.json` + one document per object root)
//! - [`markdown`] -- human-readable reference document
//! - [`sheets`] -- CSV sheet directory, readable by `hlapi-reader`

pub mod error;
pub mod markdown;
pub mod schema;
pub mod sheets;

use hlapi_core::Api;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use error::WriteError;
pub use markdown::{markdown_document, write_markdown};
pub use schema::{schema_bundle, write_schema, SchemaBundle};
pub use sheets::{sheet_tables, write_sheets, Sheet};

pub const DEFAULT_TITLE: &str = "HL-API";

/// Artifact kind produced by [`write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Schema,
    Markdown,
    Sheets,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "schema" => Ok(OutputFormat::Schema),
            "markdown" => Ok(OutputFormat::Markdown),
            "sheets" => Ok(OutputFormat::Sheets),
            other => Err(format!(
                "unknown output format '{}' (expected schema, markdown or sheets)",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Schema => f.write_str("schema"),
            OutputFormat::Markdown => f.write_str("markdown"),
            OutputFormat::Sheets => f.write_str("sheets"),
        }
    }
}

/// Write `api` as `format` into `dir`, creating the directory if needed.
pub fn write(
    api: &Api,
    format: OutputFormat,
    title: &str,
    dir: &Path,
) -> Result<Vec<PathBuf>, WriteError> {
    std::fs::create_dir_all(dir).map_err(error::io(dir))?;
    match format {
        OutputFormat::Schema => write_schema(api, title, dir),
        OutputFormat::Markdown => write_markdown(api, title, dir).map(|p| vec![p]),
        OutputFormat::Sheets => write_sheets(api, dir),
    }
}
