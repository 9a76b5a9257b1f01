//! Shared data model for converting REDCap CDISC ODM exports into
//! Molgenis EMX2 tables.

pub mod clinical;
pub mod codebook;
pub mod instrument;
pub mod options;
pub mod records;
pub mod schema;

pub use clinical::{CellKey, ClinicalData, RowKey};
pub use codebook::{
    CodeList, CodeListItem, Codebook, VARIABLE_VALUES_HEADER, VARIABLES_HEADER, VariableRow,
    VariableValueRow, parse_checkbox_choices,
};
pub use instrument::{InstrumentRow, InstrumentTable, row_key};
pub use options::{
    ConversionOptions, DEFAULT_OUTPUT_FOLDER, DEFAULT_SCHEMA_FILE, DEFAULT_SUBJECT_FILE,
    DEFAULT_VARIABLE_VALUES_FILE, DEFAULT_VARIABLES_FILE, GroupMatching, REDCAP_NAMESPACE,
};
pub use records::{FormData, FormDef, ItemData, ItemDef, ItemGroupDef, SourceType, SubjectData};
pub use schema::{
    Emx2Type, FORM_REPEAT_KEY_COLUMN, INDEX_COLUMNS, KEY_COLUMN, SCHEMA_HEADER,
    SUBJECT_DATA_TABLE, SUBJECT_KEY_COLUMN, SchemaRow, SchemaTable, collapse_multiple_choice,
    split_multiple_choice,
};
