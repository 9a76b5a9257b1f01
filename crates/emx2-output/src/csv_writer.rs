//! CSV emitters with append-if-exists semantics.
//!
//! A file that does not exist yet is created with a header row. An existing
//! file only receives new rows, so several input files can accumulate into one
//! output folder. No deduplication is done across runs.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use emx2_model::{
    ClinicalData, Codebook, ConversionOptions, FORM_REPEAT_KEY_COLUMN, InstrumentTable,
    KEY_COLUMN, SCHEMA_HEADER, SUBJECT_KEY_COLUMN, SchemaRow, SchemaTable, VARIABLE_VALUES_HEADER,
    VARIABLES_HEADER, row_key,
};

use crate::error::{OutputError, Result};

/// A file written by one of the emitters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub table: String,
    pub path: PathBuf,
    pub rows: usize,
    /// Rows went to a file that already existed.
    pub appended: bool,
}

struct CsvFile {
    path: PathBuf,
    writer: csv::Writer<File>,
    appended: bool,
    rows: usize,
}

impl CsvFile {
    fn open<I, S>(path: &Path, header: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let appended = path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| OutputError::csv(path, source))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if !appended {
            writer
                .write_record(header)
                .map_err(|source| OutputError::csv(path, source))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            appended,
            rows: 0,
        })
    }

    fn write<I, S>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.writer
            .write_record(record)
            .map_err(|source| OutputError::csv(&self.path, source))?;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self, table: &str) -> Result<WrittenFile> {
        self.writer
            .flush()
            .map_err(|source| OutputError::csv(&self.path, source))?;
        debug!(
            table,
            path = %self.path.display(),
            rows = self.rows,
            appended = self.appended,
            "wrote csv"
        );
        Ok(WrittenFile {
            table: table.to_string(),
            path: self.path,
            rows: self.rows,
            appended: self.appended,
        })
    }
}

/// Writes `molgenis.csv`.
///
/// The per-instrument `SubjectKey` and `FormRepeatKey` rows are left out, since
/// instrument files carry `key` instead, and the subject index table is declared
/// after all instruments.
pub fn write_schema(schema: &SchemaTable, options: &ConversionOptions) -> Result<WrittenFile> {
    let path = options.schema_path();
    let mut file = CsvFile::open(&path, SCHEMA_HEADER)?;
    let subject_table = options.subject_table();
    let emitted = schema
        .rows
        .iter()
        .filter(|row| !row.is_index_column() || row.column_name() == Some(KEY_COLUMN))
        .cloned()
        .chain(subject_table_rows(subject_table));
    for row in emitted {
        file.write(row.to_record())?;
    }
    file.finish("molgenis")
}

/// Declaration of the table every instrument `key` references.
pub fn subject_table_rows(table: &str) -> [SchemaRow; 4] {
    [
        SchemaRow::table(table),
        SchemaRow::column(table, KEY_COLUMN)
            .with_key(1)
            .with_required(true),
        SchemaRow::column(table, SUBJECT_KEY_COLUMN).with_required(true),
        SchemaRow::column(table, FORM_REPEAT_KEY_COLUMN).with_required(true),
    ]
}

/// Writes `SubjectData.csv`: every subject paired with every occurrence seen.
pub fn write_subject_index(
    clinical: &ClinicalData,
    options: &ConversionOptions,
) -> Result<WrittenFile> {
    let path = options.subject_path();
    let header = [KEY_COLUMN, SUBJECT_KEY_COLUMN, FORM_REPEAT_KEY_COLUMN];
    let mut file = CsvFile::open(&path, header)?;
    for subject in clinical.subject_keys() {
        for repeat in clinical.form_repeat_keys() {
            file.write([row_key(subject, repeat, true).as_str(), subject, repeat])?;
        }
    }
    file.finish(options.subject_table())
}

/// Writes `<FormName>.csv` with `key` followed by the data columns.
///
/// Rows without any non-empty cell are dropped; absent cells become empty strings.
pub fn write_instrument(
    table: &InstrumentTable,
    options: &ConversionOptions,
) -> Result<WrittenFile> {
    let path = options.instrument_path(&table.name);
    let header = std::iter::once(KEY_COLUMN).chain(table.columns.iter().map(String::as_str));
    let mut file = CsvFile::open(&path, header)?;
    for row in table.non_empty_rows() {
        let key = row.key(table.repeating);
        let cells = row
            .cells
            .iter()
            .map(|cell| cell.as_deref().unwrap_or_default());
        file.write(std::iter::once(key.as_str()).chain(cells))?;
    }
    file.finish(&table.name)
}

/// Writes `Variables.csv` and `VariableValues.csv`, in that order.
pub fn write_codebook(codebook: &Codebook, options: &ConversionOptions) -> Result<[WrittenFile; 2]> {
    let mut variables = CsvFile::open(&options.variables_path(), VARIABLES_HEADER)?;
    for row in &codebook.variables {
        variables.write(row.to_record())?;
    }
    let variables = variables.finish("Variables")?;

    let mut values = CsvFile::open(&options.variable_values_path(), VARIABLE_VALUES_HEADER)?;
    for row in &codebook.values {
        values.write(row.to_record())?;
    }
    Ok([variables, values.finish("VariableValues")?])
}
