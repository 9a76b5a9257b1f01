//! Sparse clinical data keyed by subject, form occurrence, form and item.

use indexmap::{IndexMap, IndexSet};

/// Identifies one output row: a subject's occurrence of a form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub subject_key: String,
    pub form_repeat_key: String,
}

impl RowKey {
    pub fn new(subject_key: impl Into<String>, form_repeat_key: impl Into<String>) -> Self {
        Self {
            subject_key: subject_key.into(),
            form_repeat_key: form_repeat_key.into(),
        }
    }
}

/// `(SubjectKey, FormRepeatKey, FormOID, ItemOID)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub row: RowKey,
    pub form_oid: String,
    pub item_oid: String,
}

impl CellKey {
    pub fn new(
        subject_key: impl Into<String>,
        form_repeat_key: impl Into<String>,
        form_oid: impl Into<String>,
        item_oid: impl Into<String>,
    ) -> Self {
        Self {
            row: RowKey::new(subject_key, form_repeat_key),
            form_oid: form_oid.into(),
            item_oid: item_oid.into(),
        }
    }
}

/// Every `ItemData` value of a document, in document order.
///
/// Only cells with a matching `ItemData` exist; nothing is defaulted here.
#[derive(Debug, Clone, Default)]
pub struct ClinicalData {
    cells: IndexMap<CellKey, String>,
    subject_keys: IndexSet<String>,
    form_repeat_keys: IndexSet<String>,
}

impl ClinicalData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value. A repeated key overwrites the earlier value in place.
    pub fn insert(&mut self, key: CellKey, value: impl Into<String>) {
        self.subject_keys.insert(key.row.subject_key.clone());
        self.form_repeat_keys.insert(key.row.form_repeat_key.clone());
        self.cells.insert(key, value.into());
    }

    /// Registers a subject even if it has no item values.
    pub fn register_subject(&mut self, subject_key: &str) {
        if !self.subject_keys.contains(subject_key) {
            self.subject_keys.insert(subject_key.to_string());
        }
    }

    pub fn get(&self, key: &CellKey) -> Option<&str> {
        self.cells.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &str)> {
        self.cells.iter().map(|(key, value)| (key, value.as_str()))
    }

    /// Cells belonging to one form, in document order.
    pub fn form_cells<'a>(
        &'a self,
        form_oid: &'a str,
    ) -> impl Iterator<Item = (&'a CellKey, &'a str)> + 'a {
        self.iter().filter(move |(key, _)| key.form_oid == form_oid)
    }

    /// Distinct subject keys in the order they were first seen.
    pub fn subject_keys(&self) -> impl Iterator<Item = &str> {
        self.subject_keys.iter().map(String::as_str)
    }

    /// Distinct form repeat keys in the order they were first seen.
    pub fn form_repeat_keys(&self) -> impl Iterator<Item = &str> {
        self.form_repeat_keys.iter().map(String::as_str)
    }
}
