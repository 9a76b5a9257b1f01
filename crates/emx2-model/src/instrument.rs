//! Per-instrument tables projected from [`crate::ClinicalData`].

use indexmap::IndexMap;

/// Builds the `key` value shared by an instrument row and `SubjectData`.
///
/// Non-repeating instruments have one row per subject, so their key always
/// uses occurrence `1`.
pub fn row_key(subject_key: &str, form_repeat_key: &str, repeating: bool) -> String {
    if repeating {
        format!("{subject_key}_{form_repeat_key}")
    } else {
        format!("{subject_key}_1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentRow {
    pub subject_key: String,
    pub form_repeat_key: String,
    /// One entry per [`InstrumentTable::columns`]; `None` when no `ItemData` matched.
    pub cells: Vec<Option<String>>,
}

impl InstrumentRow {
    pub fn key(&self, repeating: bool) -> String {
        row_key(&self.subject_key, &self.form_repeat_key, repeating)
    }

    /// True when no cell holds a non-empty value.
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|cell| cell.as_deref().is_none_or(str::is_empty))
    }
}

/// Data rows of one instrument, columns in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentTable {
    /// `redcap:FormName`; also the output file stem.
    pub name: String,
    pub form_oid: String,
    pub repeating: bool,
    pub columns: Vec<String>,
    pub rows: Vec<InstrumentRow>,
}

impl InstrumentTable {
    pub fn new(
        name: impl Into<String>,
        form_oid: impl Into<String>,
        repeating: bool,
        columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            form_oid: form_oid.into(),
            repeating,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Rows that carry at least one value.
    pub fn non_empty_rows(&self) -> impl Iterator<Item = &InstrumentRow> {
        self.rows.iter().filter(|row| !row.is_empty())
    }

    /// Keys shared by more than one written row, in first-seen order.
    ///
    /// Only happens for non-repeating instruments whose rows carry different
    /// `FormRepeatKey`s, since all of them collapse to `<SubjectKey>_1`.
    pub fn duplicate_keys(&self) -> Vec<String> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for row in self.non_empty_rows() {
            *counts.entry(row.key(self.repeating)).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, _)| key)
            .collect()
    }

    /// Applies `f` to every present cell of `column`.
    pub fn map_column(&mut self, column: &str, mut f: impl FnMut(&mut String)) -> bool {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        for row in &mut self.rows {
            if let Some(value) = row.cells[idx].as_mut() {
                f(value);
            }
        }
        true
    }
}
