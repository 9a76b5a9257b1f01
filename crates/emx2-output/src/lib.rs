//! EMX2 output generation.
//!
//! Writes the `molgenis.csv` table definitions, the `SubjectData.csv` index
//! and one CSV per instrument into the configured output folder. The codebook
//! goes to `Variables.csv` and `VariableValues.csv`.

mod csv_writer;
mod error;
mod folder;

pub use csv_writer::{
    WrittenFile, subject_table_rows, write_codebook, write_instrument, write_schema,
    write_subject_index,
};
pub use error::{OutputError, Result};
pub use folder::prepare_output_dir;
