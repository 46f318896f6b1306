//! Optional project configuration for `hlapi`.
//!
//! Looked up at `--config <path>`, else `hlapi.toml` in the current
//! directory. Every key is optional; command-line flags win over the file.
//!
//! # Example
//!
//! ```toml
//! [input]
//! format = "sheets"
//!
//! [output]
//! format = "schema"
//! dir = "generated"
//!
//! [document]
//! title = "HL-API"
//!
//! [log]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use hlapi_reader::SourceFormat;
use hlapi_writer::OutputFormat as ArtifactFormat;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "hlapi.toml";

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub document: DocumentSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// `[input]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InputSettings {
    /// `"sheets"` or `"tree"`. Detected from the input directory when unset.
    pub format: Option<String>,
}

/// `[output]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputSettings {
    /// `"schema"`, `"markdown"` or `"sheets"`.
    pub format: Option<String>,
    pub dir: Option<PathBuf>,
}

/// `[document]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentSettings {
    pub title: Option<String>,
}

/// `[log]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    /// Any `tracing` filter directive, e.g. `"info"` or `"hlapi_core=debug"`.
    pub level: Option<String>,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse a config file.
///
/// Returns a human-readable error string on failure.
pub fn read_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

/// An explicit path must exist; the default file is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, String> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                read_config(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

impl Config {
    /// `flag`, else `[input] format`, else detection on `input`.
    pub fn source_format(
        &self,
        flag: Option<SourceFormat>,
        input: &Path,
    ) -> Result<SourceFormat, String> {
        if let Some(format) = flag {
            return Ok(format);
        }
        match &self.input.format {
            Some(name) => name
                .parse()
                .map_err(|e| format!("[input] format: {}", e)),
            None => Ok(SourceFormat::detect(input)),
        }
    }

    /// `flag`, else `[output] format`, else the schema bundle.
    pub fn artifact_format(&self, flag: Option<ArtifactFormat>) -> Result<ArtifactFormat, String> {
        if let Some(format) = flag {
            return Ok(format);
        }
        match &self.output.format {
            Some(name) => name
                .parse()
                .map_err(|e| format!("[output] format: {}", e)),
            None => Ok(ArtifactFormat::Schema),
        }
    }

    /// `flag`, else `[output] dir`, else `./generated`.
    pub fn output_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.output.dir.clone())
            .unwrap_or_else(|| PathBuf::from("generated"))
    }

    pub fn title(&self) -> &str {
        self.document
            .title
            .as_deref()
            .unwrap_or(hlapi_writer::DEFAULT_TITLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Config {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = parse("");
        assert_eq!(config, Config::default());
        assert_eq!(config.title(), "HL-API");
        assert_eq!(config.output_dir(None), PathBuf::from("generated"));
        assert_eq!(config.artifact_format(None), Ok(ArtifactFormat::Schema));
    }

    #[test]
    fn sections_are_read() {
        let config = parse(
            r#"
            [input]
            format = "tree"

            [output]
            format = "markdown"
            dir = "docs"

            [document]
            title = "Gateway API"

            [log]
            level = "debug"
            "#,
        );
        assert_eq!(
            config.source_format(None, Path::new(".")),
            Ok(SourceFormat::Tree)
        );
        assert_eq!(config.artifact_format(None), Ok(ArtifactFormat::Markdown));
        assert_eq!(config.output_dir(None), PathBuf::from("docs"));
        assert_eq!(config.title(), "Gateway API");
        assert_eq!(config.log.level.as_deref(), Some("debug"));
    }

    #[test]
    fn flags_override_file() {
        let config = parse("[output]\nformat = \"markdown\"\ndir = \"docs\"\n");
        assert_eq!(
            config.artifact_format(Some(ArtifactFormat::Sheets)),
            Ok(ArtifactFormat::Sheets)
        );
        assert_eq!(
            config.output_dir(Some(Path::new("out"))),
            PathBuf::from("out")
        );
    }

    #[test]
    fn bad_format_name_is_reported() {
        let config = parse("[output]\nformat = \"pdf\"\n");
        let err = config.artifact_format(None).unwrap_err();
        assert!(err.starts_with("[output] format:"), "{}", err);
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(toml::from_str::<Config>("[server]\nport = 1\n").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.contains("could not read"));
    }
}
