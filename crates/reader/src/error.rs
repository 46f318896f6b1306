use std::path::PathBuf;

/// Errors raised while loading a specification from disk.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: invalid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON document lacks a member the layout requires.
    #[error("{}: missing member '{member}'", .path.display())]
    MissingMember { path: PathBuf, member: String },
}

impl ReadError {
    pub(crate) fn missing(path: &std::path::Path, member: impl Into<String>) -> Self {
        ReadError::MissingMember {
            path: path.to_path_buf(),
            member: member.into(),
        }
    }
}
