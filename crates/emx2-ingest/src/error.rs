//! Error types for ODM ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or querying an ODM document.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input path missing or not a regular file.
    #[error("no file: {path}")]
    NoFile { path: PathBuf },

    #[error("failed to read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === XML Errors ===
    /// Content is not well-formed XML.
    #[error("failed to parse XML {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: roxmltree::Error,
    },

    /// Root tag has no `{uri}` namespace.
    #[error("failed to retrieve namespace from root tag '{tag}'")]
    Namespace { tag: String },

    // === Query Errors ===
    /// Query expression outside the supported path subset.
    #[error("invalid query path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unknown namespace prefix '{prefix}' in query path '{path}'")]
    UnknownPrefix { path: String, prefix: String },

    /// Required ODM attribute absent.
    #[error("<{element}> is missing required attribute {attribute}")]
    MissingAttribute { element: String, attribute: String },
}

impl IngestError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_attribute(element: &str, attribute: &str) -> Self {
        Self::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
