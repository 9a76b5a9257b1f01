//! The EMX2 table-definition table (`molgenis.csv`) as built in memory.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::records::SourceType;

/// Column order of the emitted schema file.
pub const SCHEMA_HEADER: [&str; 12] = [
    "tableName",
    "columnName",
    "columnType",
    "tableExtends",
    "refBack",
    "description",
    "semantics",
    "refLink",
    "refTable",
    "key",
    "required",
    "validation",
];

/// Name of the table holding every `SubjectKey_FormRepeatKey` combination.
pub const SUBJECT_DATA_TABLE: &str = "SubjectData";
pub const KEY_COLUMN: &str = "key";
pub const SUBJECT_KEY_COLUMN: &str = "SubjectKey";
pub const FORM_REPEAT_KEY_COLUMN: &str = "FormRepeatKey";

/// Columns every instrument declares before its data columns.
pub const INDEX_COLUMNS: [&str; 3] = [KEY_COLUMN, SUBJECT_KEY_COLUMN, FORM_REPEAT_KEY_COLUMN];

/// EMX2 column types produced by the type mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emx2Type {
    Text,
    String,
    Int,
    Decimal,
    Date,
    Datetime,
    Bool,
    File,
    Ref,
    RefArray,
}

impl Emx2Type {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::String => "string",
            Self::Int => "int",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Bool => "bool",
            Self::File => "file",
            Self::Ref => "ref",
            Self::RefArray => "ref_array",
        }
    }
}

impl fmt::Display for Emx2Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `molgenis.csv`.
///
/// A row without `column_name` declares a table; every other row declares a
/// column of `table_name`. `source` is only used for type mapping and boolean
/// normalization and is never written out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRow {
    pub table_name: String,
    pub column_name: Option<String>,
    pub column_type: Option<Emx2Type>,
    pub table_extends: Option<String>,
    pub ref_back: Option<String>,
    pub description: Option<String>,
    pub semantics: Option<String>,
    pub ref_link: Option<String>,
    pub ref_table: Option<String>,
    pub key: Option<u8>,
    pub required: bool,
    pub validation: Option<String>,
    pub source: SourceType,
}

impl SchemaRow {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table_name: name.into(),
            ..Self::default()
        }
    }

    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table_name: table.into(),
            column_name: Some(column.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, column_type: Emx2Type) -> Self {
        self.column_type = Some(column_type);
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: u8) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn with_ref_table(mut self, table: impl Into<String>) -> Self {
        self.ref_table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceType) -> Self {
        self.source = source;
        self
    }

    pub fn is_table(&self) -> bool {
        self.column_name.is_none()
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column_name.as_deref()
    }

    /// True for `key`, `SubjectKey` and `FormRepeatKey`.
    pub fn is_index_column(&self) -> bool {
        self.column_name()
            .is_some_and(|name| INDEX_COLUMNS.contains(&name))
    }

    /// Values in [`SCHEMA_HEADER`] order; missing values become empty strings.
    pub fn to_record(&self) -> [String; 12] {
        let opt = |value: &Option<String>| value.clone().unwrap_or_default();
        [
            self.table_name.clone(),
            opt(&self.column_name),
            self.column_type
                .map(|column_type| column_type.as_str().to_string())
                .unwrap_or_default(),
            opt(&self.table_extends),
            opt(&self.ref_back),
            opt(&self.description),
            opt(&self.semantics),
            opt(&self.ref_link),
            opt(&self.ref_table),
            self.key.map(|key| key.to_string()).unwrap_or_default(),
            if self.required {
                "TRUE".to_string()
            } else {
                String::new()
            },
            opt(&self.validation),
        ]
    }
}

/// Ordered schema rows. Column rows always follow their table's declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTable {
    pub rows: Vec<SchemaRow>,
}

impl SchemaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: SchemaRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Declared table names in declaration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter(|row| row.is_table())
            .map(|row| row.table_name.as_str())
    }

    /// All column rows of `table`, index columns included.
    pub fn columns<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a SchemaRow> + 'a {
        self.rows
            .iter()
            .filter(move |row| !row.is_table() && row.table_name == table)
    }

    /// Column rows of `table` that hold item values.
    pub fn data_columns<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a SchemaRow> + 'a {
        self.columns(table).filter(|row| !row.is_index_column())
    }

    pub fn column<'a>(&'a self, table: &'a str, column: &str) -> Option<&'a SchemaRow> {
        self.columns(table)
            .find(|row| row.column_name() == Some(column))
    }

    /// Removes repeated `(tableName, columnName)` column rows, keeping the first.
    ///
    /// Checkbox sub-options collapse to the same column name, so one logical
    /// column can be declared several times. Returns the number of rows removed.
    pub fn dedup_columns(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
        self.rows.retain(|row| match row.column_name() {
            None => true,
            Some(column) => seen.insert((row.table_name.clone(), column.to_string())),
        });
        before - self.rows.len()
    }
}

/// Splits a REDCap checkbox sub-option `<base>___<digits>` into base and code.
pub fn split_multiple_choice(item_oid: &str) -> Option<(&str, &str)> {
    let idx = item_oid.rfind("___")?;
    let (base, rest) = item_oid.split_at(idx);
    let code = &rest[3..];
    if base.is_empty() || code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, code))
}

/// Maps a checkbox sub-option to its column name; other OIDs pass through.
pub fn collapse_multiple_choice(item_oid: &str) -> &str {
    split_multiple_choice(item_oid).map_or(item_oid, |(base, _)| base)
}
