//! ODM to EMX2 transformation.
//!
//! - **types**: REDCap type triple to EMX2 column type
//! - **schema**: table and column rows from `FormDef`/`ItemGroupDef`/`ItemDef`
//! - **clinical**: subject data flattened into a sparse cell map
//! - **projection**: the cell map pivoted into one table per instrument
//! - **codebook**: variables and value labels from `Question` and `CodeList`
//! - **normalize**: `0`/`1` to `FALSE`/`TRUE` for yes/no and true/false fields
//! - **edc**: per-EDC extraction behind [`EdcAdapter`]

pub mod clinical;
pub mod codebook;
pub mod edc;
mod error;
pub mod normalize;
pub mod pipeline;
pub mod projection;
pub mod schema;
pub mod types;

pub use clinical::collect_clinical_data;
pub use codebook::build_codebook;
pub use edc::{CastorAdapter, Edc, EdcAdapter, RedcapAdapter, StudySchema, ensure_clinical_data};
pub use error::{Result, TransformError};
pub use normalize::normalize_booleans;
pub use pipeline::{Conversion, codebook_document, convert_document};
pub use projection::project_instruments;
pub use schema::{StudyMetadata, build_schema};
pub use types::{TYPE_RULES, TypeRule, apply_types, map_type};
