//! Runs every transformation step over one parsed document.

use std::time::Instant;

use tracing::{info, info_span};

use emx2_ingest::OdmDocument;
use emx2_model::{ClinicalData, Codebook, ConversionOptions, InstrumentTable};

use crate::edc::{EdcAdapter, StudySchema, ensure_clinical_data};
use crate::error::Result;
use crate::normalize::normalize_booleans;
use crate::projection::project_instruments;

/// Everything the emitters need for one input file.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub study: StudySchema,
    pub clinical: ClinicalData,
    pub instruments: Vec<InstrumentTable>,
}

impl Conversion {
    /// Instrument rows that will be written, summed over all instruments.
    pub fn row_count(&self) -> usize {
        self.instruments
            .iter()
            .map(|table| table.non_empty_rows().count())
            .sum()
    }
}

/// Gate, schema, clinical data, projection and boolean normalization.
pub fn convert_document(
    adapter: &dyn EdcAdapter,
    doc: &OdmDocument<'_>,
    options: &ConversionOptions,
) -> Result<Conversion> {
    ensure_clinical_data(doc)?;

    let study = info_span!("schema").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let study = adapter.extract_schema(doc, options)?;
        info!(
            edc = %adapter.edc(),
            table_count = study.forms.len(),
            row_count = study.schema.len(),
            duration_ms = start.elapsed().as_millis(),
            "schema complete"
        );
        Ok(study)
    })?;

    let (clinical, instruments) = info_span!("clinical").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let clinical = adapter.extract_clinical_data(doc)?;
        let mut instruments =
            project_instruments(&study.schema, &clinical, &study.forms, &study.repeating);
        for table in &mut instruments {
            normalize_booleans(table, &study.schema);
        }
        info!(
            subject_count = clinical.subject_keys().count(),
            cell_count = clinical.len(),
            instrument_count = instruments.len(),
            duration_ms = start.elapsed().as_millis(),
            "clinical data complete"
        );
        Ok((clinical, instruments))
    })?;

    Ok(Conversion {
        study,
        clinical,
        instruments,
    })
}

/// Gate then codebook. Metadata-only exports are refused like conversions.
pub fn codebook_document(
    adapter: &dyn EdcAdapter,
    doc: &OdmDocument<'_>,
    options: &ConversionOptions,
) -> Result<Codebook> {
    ensure_clinical_data(doc)?;
    info_span!("codebook").in_scope(|| {
        let start = Instant::now();
        let codebook = adapter.extract_codebook(doc, options)?;
        info!(
            edc = %adapter.edc(),
            variable_count = codebook.variables.len(),
            value_count = codebook.values.len(),
            duration_ms = start.elapsed().as_millis(),
            "codebook complete"
        );
        Ok(codebook)
    })
}
