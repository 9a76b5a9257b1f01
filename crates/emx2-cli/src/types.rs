use std::path::PathBuf;

use serde::Serialize;

use emx2_output::WrittenFile;

/// Outcome of one `convert` run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub edc: String,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub subject_count: usize,
    pub tables: Vec<TableSummary>,
    /// Empty for dry runs.
    pub files: Vec<WrittenFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub columns: usize,
    pub rows: usize,
    pub repeating: bool,
    pub file: Option<PathBuf>,
}

/// One instrument as reported by `inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentSummary {
    pub table: String,
    pub form_oid: String,
    pub columns: usize,
    pub repeating: bool,
}

/// Outcome of one `codelist` run.
#[derive(Debug, Clone, Serialize)]
pub struct CodebookSummary {
    pub input: PathBuf,
    pub edc: String,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub variables: usize,
    pub values: usize,
    /// `Variables.csv` then `VariableValues.csv`; empty for dry runs.
    pub files: Vec<WrittenFile>,
}
