//! Conversion settings shared by every pipeline stage.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Namespace of REDCap's ODM extension attributes (`redcap:FormName`, ...).
pub const REDCAP_NAMESPACE: &str = "https://projectredcap.org";

pub const DEFAULT_OUTPUT_FOLDER: &str = "data/output";
pub const DEFAULT_SCHEMA_FILE: &str = "molgenis.csv";
pub const DEFAULT_SUBJECT_FILE: &str = "SubjectData.csv";
pub const DEFAULT_VARIABLES_FILE: &str = "Variables.csv";
pub const DEFAULT_VARIABLE_VALUES_FILE: &str = "VariableValues.csv";

/// How an `ItemGroupDef` is assigned to a `FormDef`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMatching {
    /// The FormName occurs anywhere in the ItemGroupDef OID.
    ///
    /// Ambiguous when one FormName is contained in another.
    #[default]
    Substring,
    /// The OID equals the FormName or starts with `<FormName>.`.
    Prefix,
}

impl GroupMatching {
    pub fn matches(self, form_name: &str, group_oid: &str) -> bool {
        match self {
            Self::Substring => group_oid.contains(form_name),
            Self::Prefix => {
                group_oid == form_name
                    || group_oid
                        .strip_prefix(form_name)
                        .is_some_and(|rest| rest.starts_with('.'))
            }
        }
    }
}

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Root that relative input paths are resolved against.
    pub input_folder: Option<PathBuf>,
    pub output_folder: PathBuf,
    pub schema_file: String,
    pub subject_file: String,
    /// Codebook outputs, written by the `codelist` command only.
    pub variables_file: String,
    pub variable_values_file: String,
    pub redcap_namespace: String,
    pub group_matching: GroupMatching,
    /// Delete existing files in `output_folder` before writing.
    pub clear_output: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            input_folder: None,
            output_folder: PathBuf::from(DEFAULT_OUTPUT_FOLDER),
            schema_file: DEFAULT_SCHEMA_FILE.to_string(),
            subject_file: DEFAULT_SUBJECT_FILE.to_string(),
            variables_file: DEFAULT_VARIABLES_FILE.to_string(),
            variable_values_file: DEFAULT_VARIABLE_VALUES_FILE.to_string(),
            redcap_namespace: REDCAP_NAMESPACE.to_string(),
            group_matching: GroupMatching::default(),
            clear_output: true,
        }
    }
}

impl ConversionOptions {
    #[must_use]
    pub fn with_output_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.output_folder = folder.into();
        self
    }

    #[must_use]
    pub fn with_clear_output(mut self, clear: bool) -> Self {
        self.clear_output = clear;
        self
    }

    #[must_use]
    pub fn with_group_matching(mut self, matching: GroupMatching) -> Self {
        self.group_matching = matching;
        self
    }

    /// Joins relative paths onto `input_folder` when one is configured.
    pub fn resolve_input(&self, path: &Path) -> PathBuf {
        match &self.input_folder {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn schema_path(&self) -> PathBuf {
        self.output_folder.join(&self.schema_file)
    }

    pub fn subject_path(&self) -> PathBuf {
        self.output_folder.join(&self.subject_file)
    }

    pub fn variables_path(&self) -> PathBuf {
        self.output_folder.join(&self.variables_file)
    }

    pub fn variable_values_path(&self) -> PathBuf {
        self.output_folder.join(&self.variable_values_file)
    }

    pub fn instrument_path(&self, instrument: &str) -> PathBuf {
        self.output_folder.join(format!("{instrument}.csv"))
    }

    /// Table name used for the subject index, taken from `subject_file`.
    pub fn subject_table(&self) -> &str {
        Path::new(&self.subject_file)
            .file_stem()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or(crate::schema::SUBJECT_DATA_TABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_matching_is_containment() {
        let matching = GroupMatching::Substring;
        assert!(matching.matches("visit", "visit.visit_date"));
        assert!(matching.matches("visit", "follow_up_visit.a"));
        assert!(!matching.matches("visit", "baseline.a"));
    }

    #[test]
    fn prefix_matching_needs_boundary() {
        let matching = GroupMatching::Prefix;
        assert!(matching.matches("visit", "visit.visit_date"));
        assert!(matching.matches("visit", "visit"));
        assert!(!matching.matches("visit", "visit_2.a"));
        assert!(!matching.matches("visit", "follow_up_visit.a"));
    }

    #[test]
    fn paths_derive_from_output_folder() {
        let options = ConversionOptions::default().with_output_folder("/tmp/out");
        assert_eq!(options.schema_path(), PathBuf::from("/tmp/out/molgenis.csv"));
        assert_eq!(options.subject_path(), PathBuf::from("/tmp/out/SubjectData.csv"));
        assert_eq!(
            options.instrument_path("demographics"),
            PathBuf::from("/tmp/out/demographics.csv")
        );
        assert_eq!(options.subject_table(), "SubjectData");
    }

    #[test]
    fn relative_inputs_resolve_against_input_folder() {
        let options = ConversionOptions {
            input_folder: Some(PathBuf::from("/data/input")),
            ..ConversionOptions::default()
        };
        assert_eq!(
            options.resolve_input(Path::new("study.xml")),
            PathBuf::from("/data/input/study.xml")
        );
        assert_eq!(
            options.resolve_input(Path::new("/abs/study.xml")),
            PathBuf::from("/abs/study.xml")
        );
    }
}
