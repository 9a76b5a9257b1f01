//! EDC systems and the extraction capabilities each one provides.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use tracing::debug;

use emx2_ingest::OdmDocument;
use emx2_model::{ClinicalData, Codebook, ConversionOptions, FormDef, SchemaTable};

use crate::clinical::collect_clinical_data;
use crate::codebook::build_codebook;
use crate::error::{Result, TransformError};
use crate::schema::{StudyMetadata, build_schema};

/// Source system of an ODM export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edc {
    Redcap,
    Castor,
}

impl Edc {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redcap => "REDCap",
            Self::Castor => "Castor",
        }
    }

    pub fn adapter(self) -> Box<dyn EdcAdapter> {
        match self {
            Self::Redcap => Box::new(RedcapAdapter),
            Self::Castor => Box::new(CastorAdapter),
        }
    }
}

impl fmt::Display for Edc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: `REDCap`, `redcap` and `Castor` are accepted.
impl FromStr for Edc {
    type Err = TransformError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redcap" => Ok(Self::Redcap),
            "castor" => Ok(Self::Castor),
            _ => Err(TransformError::NoValidEdc(value.to_string())),
        }
    }
}

/// Instruments and their schema rows.
#[derive(Debug, Clone, Default)]
pub struct StudySchema {
    pub forms: Vec<FormDef>,
    /// FormNames whose rows are keyed per occurrence.
    pub repeating: IndexSet<String>,
    pub schema: SchemaTable,
}

impl StudySchema {
    pub fn is_repeating(&self, form_name: &str) -> bool {
        self.repeating.contains(form_name)
    }
}

pub trait EdcAdapter {
    fn edc(&self) -> Edc;

    fn extract_schema(
        &self,
        doc: &OdmDocument<'_>,
        options: &ConversionOptions,
    ) -> Result<StudySchema>;

    /// Fails with [`TransformError::NoClinicalData`] on metadata-only exports.
    fn extract_clinical_data(&self, doc: &OdmDocument<'_>) -> Result<ClinicalData>;

    /// Variables with their labels and coded values.
    fn extract_codebook(
        &self,
        doc: &OdmDocument<'_>,
        options: &ConversionOptions,
    ) -> Result<Codebook>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RedcapAdapter;

impl EdcAdapter for RedcapAdapter {
    fn edc(&self) -> Edc {
        Edc::Redcap
    }

    fn extract_schema(
        &self,
        doc: &OdmDocument<'_>,
        options: &ConversionOptions,
    ) -> Result<StudySchema> {
        let metadata = read_metadata(doc)?;
        let schema = build_schema(&metadata, options);
        let repeating = doc.repeating_instruments()?;
        debug!(
            forms = metadata.forms.len(),
            repeating = repeating.len(),
            "extracted REDCap schema"
        );
        Ok(StudySchema {
            forms: metadata.forms,
            repeating,
            schema,
        })
    }

    fn extract_clinical_data(&self, doc: &OdmDocument<'_>) -> Result<ClinicalData> {
        ensure_clinical_data(doc)?;
        let layout = doc.data_layout()?;
        debug!(?layout, "reading subject data");
        let subjects = doc.subject_data(layout)?;
        Ok(collect_clinical_data(&subjects))
    }

    fn extract_codebook(
        &self,
        doc: &OdmDocument<'_>,
        options: &ConversionOptions,
    ) -> Result<Codebook> {
        let metadata = read_metadata(doc)?;
        let schema = build_schema(&metadata, options);
        let code_lists = doc.code_lists()?;
        Ok(build_codebook(&metadata, &schema, &code_lists, options))
    }
}

fn read_metadata(doc: &OdmDocument<'_>) -> Result<StudyMetadata> {
    Ok(StudyMetadata {
        forms: doc.form_defs()?,
        item_groups: doc.item_group_defs()?,
        items: doc.item_defs()?,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CastorAdapter;

impl EdcAdapter for CastorAdapter {
    fn edc(&self) -> Edc {
        Edc::Castor
    }

    fn extract_schema(
        &self,
        _doc: &OdmDocument<'_>,
        _options: &ConversionOptions,
    ) -> Result<StudySchema> {
        Err(not_supported(Edc::Castor))
    }

    fn extract_clinical_data(&self, _doc: &OdmDocument<'_>) -> Result<ClinicalData> {
        Err(not_supported(Edc::Castor))
    }

    fn extract_codebook(
        &self,
        _doc: &OdmDocument<'_>,
        _options: &ConversionOptions,
    ) -> Result<Codebook> {
        Err(not_supported(Edc::Castor))
    }
}

fn not_supported(edc: Edc) -> TransformError {
    TransformError::NotSupported {
        edc: edc.to_string(),
    }
}

/// Gate shared by every adapter; runs before anything is written.
pub fn ensure_clinical_data(doc: &OdmDocument<'_>) -> Result<()> {
    if doc.has_clinical_data()? {
        Ok(())
    } else {
        Err(TransformError::NoClinicalData)
    }
}
