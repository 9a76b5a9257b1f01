//! Error types for output generation.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OutputError {
    /// Output folder could not be created or cleared.
    #[error("failed to prepare output folder {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing CSV {path}: {source}")]
    ErrorWritingCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl OutputError {
    pub(crate) fn csv(path: &std::path::Path, source: impl Into<csv::Error>) -> Self {
        Self::ErrorWritingCsv {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OutputError>;
