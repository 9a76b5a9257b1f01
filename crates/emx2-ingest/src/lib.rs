//! ODM ingestion: loads a CDISC ODM export into memory and answers the
//! attribute queries the schema builder and clinical data extractor need.

pub mod document;
pub mod error;
pub mod odm;
pub mod path;
pub mod query;

pub use document::{OdmDocument, OdmSource, namespace_from_tag};
pub use error::{IngestError, Result};
pub use odm::{DEFAULT_FORM_REPEAT_KEY, DataLayout};
pub use path::QueryPath;
pub use query::{AttributeRow, AttributeRows};
