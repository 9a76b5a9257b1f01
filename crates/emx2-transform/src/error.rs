//! Error types for the transformation stage.

use emx2_ingest::IngestError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransformError {
    /// EDC selector outside the supported set.
    #[error("no valid EDC system: '{0}' (expected REDCap or Castor)")]
    NoValidEdc(String),

    /// EDC recognized but without an implementation.
    #[error("EDC system {edc} is not supported yet")]
    NotSupported { edc: String },

    /// Metadata-only export; there is nothing to convert.
    #[error("document contains no ClinicalData")]
    NoClinicalData,

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

pub type Result<T> = std::result::Result<T, TransformError>;
