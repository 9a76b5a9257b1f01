//! Variable and value-label listings derived from ODM code lists.

use crate::schema::Emx2Type;

/// Column order of `Variables.csv`.
pub const VARIABLES_HEADER: [&str; 5] = ["table", "name", "label", "format", "description"];

/// Column order of `VariableValues.csv`.
pub const VARIABLE_VALUES_HEADER: [&str; 5] = ["table", "variable", "value", "label", "order"];

/// `<CodeList>` with its items in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeList {
    pub oid: String,
    pub items: Vec<CodeListItem>,
    /// `redcap:CheckboxChoices`, e.g. `1, Fever | 2, Cough`.
    pub checkbox_choices: Option<String>,
}

impl CodeList {
    /// Label of one checkbox option code.
    pub fn checkbox_label(&self, code: &str) -> Option<String> {
        self.checkbox_choices
            .as_deref()
            .map(parse_checkbox_choices)?
            .into_iter()
            .find(|(value, _)| value == code)
            .map(|(_, label)| label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeListItem {
    pub coded_value: String,
    /// `Decode/TranslatedText`.
    pub decode: Option<String>,
}

/// Splits `code, label | code, label`. Entries without a comma are skipped.
pub fn parse_checkbox_choices(raw: &str) -> Vec<(String, String)> {
    raw.split('|')
        .filter_map(|choice| choice.split_once(','))
        .map(|(code, label)| (code.trim().to_string(), label.trim().to_string()))
        .filter(|(code, _)| !code.is_empty())
        .collect()
}

/// One row of `Variables.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRow {
    pub table: String,
    pub name: String,
    /// Question text.
    pub label: Option<String>,
    pub format: Option<Emx2Type>,
    /// `redcap:FieldNote`.
    pub description: Option<String>,
}

impl VariableRow {
    pub fn to_record(&self) -> [String; 5] {
        [
            self.table.clone(),
            self.name.clone(),
            self.label.clone().unwrap_or_default(),
            self.format
                .map(|format| format.as_str().to_string())
                .unwrap_or_default(),
            self.description.clone().unwrap_or_default(),
        ]
    }
}

/// One row of `VariableValues.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableValueRow {
    pub table: String,
    pub variable: String,
    pub value: String,
    pub label: Option<String>,
    /// 1-based position within the variable.
    pub order: usize,
}

impl VariableValueRow {
    pub fn to_record(&self) -> [String; 5] {
        [
            self.table.clone(),
            self.variable.clone(),
            self.value.clone(),
            self.label.clone().unwrap_or_default(),
            self.order.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Codebook {
    pub variables: Vec<VariableRow>,
    pub values: Vec<VariableValueRow>,
}
