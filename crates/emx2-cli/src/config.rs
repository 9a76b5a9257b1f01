//! Run configuration loaded from TOML.
//!
//! Lookup order: `--config PATH`, then `$ODM2EMX2_CONFIG`, then built-in
//! defaults. Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use emx2_model::ConversionOptions;
use emx2_transform::Edc;

pub const CONFIG_ENV: &str = "ODM2EMX2_CONFIG";

/// Source system assumed when neither the file nor `--edc` names one.
pub const DEFAULT_EDC: &str = "REDCap";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// EDC selector, validated when the run starts.
    pub edc: String,
    #[serde(flatten)]
    pub conversion: ConversionOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            edc: DEFAULT_EDC.to_string(),
            conversion: ConversionOptions::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn edc(&self) -> Result<Edc> {
        self.edc
            .parse()
            .with_context(|| format!("select EDC '{}'", self.edc))
    }
}

/// Explicit path wins over the environment variable.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

pub fn load_config(explicit: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = config_path(explicit) else {
        return Ok(RunConfig::default());
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config = RunConfig::from_toml(&text)
        .with_context(|| format!("parse config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use emx2_model::GroupMatching;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(RunConfig::from_toml("").unwrap(), RunConfig::default());
    }

    #[test]
    fn conversion_fields_sit_at_top_level() {
        let config = RunConfig::from_toml(
            r#"
            edc = "Castor"
            output_folder = "out"
            group_matching = "prefix"
            clear_output = false
            "#,
        )
        .unwrap();
        assert_eq!(config.edc().unwrap(), Edc::Castor);
        assert_eq!(config.conversion.output_folder, PathBuf::from("out"));
        assert_eq!(config.conversion.group_matching, GroupMatching::Prefix);
        assert!(!config.conversion.clear_output);
        assert_eq!(config.conversion.schema_file, "molgenis.csv");
    }

    #[test]
    fn unknown_edc_fails_on_use() {
        let config = RunConfig::from_toml(r#"edc = "OpenClinica""#).unwrap();
        let error = config.edc().unwrap_err();
        assert!(format!("{error:#}").contains("no valid EDC"));
    }
}
