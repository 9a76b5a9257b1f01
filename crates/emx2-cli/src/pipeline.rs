//! Conversion stages: ingest, transform and output.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, trace};

use emx2_ingest::OdmSource;
use emx2_model::{ConversionOptions, InstrumentTable};
use emx2_output::{
    WrittenFile, prepare_output_dir, write_codebook, write_instrument, write_schema,
    write_subject_index,
};
use emx2_transform::{Conversion, Edc, codebook_document, convert_document};

use crate::logging::redact_value;
use crate::types::{CodebookSummary, InstrumentSummary, RunSummary, TableSummary};

/// Reads `input`, converts it and, unless `dry_run`, writes every output file.
///
/// Nothing is written when any earlier stage fails. The output folder is
/// prepared only once the whole document has been converted in memory.
pub fn run_conversion(
    input: &Path,
    edc: Edc,
    options: &ConversionOptions,
    dry_run: bool,
) -> Result<RunSummary> {
    let input = options.resolve_input(input);
    let convert_span = info_span!("convert", file = %input.display(), edc = %edc);
    let _convert_guard = convert_span.enter();
    let start = Instant::now();

    let source = info_span!("ingest").in_scope(|| -> Result<_> {
        let start = Instant::now();
        let source = OdmSource::open(&input)?;
        info!(
            bytes = source.text.len(),
            duration_ms = start.elapsed().as_millis(),
            "ingest complete"
        );
        Ok(source)
    })?;
    let doc = source
        .parse(&options.redcap_namespace)
        .with_context(|| format!("parse {}", input.display()))?;

    let adapter = edc.adapter();
    let conversion = convert_document(adapter.as_ref(), &doc, options)
        .with_context(|| format!("convert {}", input.display()))?;
    for table in &conversion.instruments {
        trace_rows(table);
    }

    let files = if dry_run {
        Vec::new()
    } else {
        info_span!("output", folder = %options.output_folder.display())
            .in_scope(|| write_outputs(&conversion, options))?
    };

    let tables = table_summaries(&conversion, &files);
    info!(
        table_count = tables.len(),
        file_count = files.len(),
        row_count = conversion.row_count(),
        duration_ms = start.elapsed().as_millis(),
        "conversion complete"
    );
    Ok(RunSummary {
        input,
        edc: edc.to_string(),
        output_dir: options.output_folder.clone(),
        dry_run,
        subject_count: conversion.clinical.subject_keys().count(),
        tables,
        files,
    })
}

fn write_outputs(
    conversion: &Conversion,
    options: &ConversionOptions,
) -> Result<Vec<WrittenFile>> {
    let start = Instant::now();
    prepare_output_dir(&options.output_folder, options.clear_output)?;

    let mut files = Vec::with_capacity(conversion.instruments.len() + 2);
    files.push(write_schema(&conversion.study.schema, options)?);
    for table in &conversion.instruments {
        files.push(write_instrument(table, options)?);
    }
    files.push(write_subject_index(&conversion.clinical, options)?);
    info!(
        file_count = files.len(),
        duration_ms = start.elapsed().as_millis(),
        "output complete"
    );
    Ok(files)
}

fn trace_rows(table: &InstrumentTable) {
    for row in table.non_empty_rows() {
        let values: Vec<&str> = row
            .cells
            .iter()
            .map(|cell| redact_value(cell.as_deref().unwrap_or_default()))
            .collect();
        trace!(
            instrument = %table.name,
            key = %row.key(table.repeating),
            values = ?values,
            "instrument row"
        );
    }
}

fn table_summaries(conversion: &Conversion, files: &[WrittenFile]) -> Vec<TableSummary> {
    conversion
        .instruments
        .iter()
        .map(|table| TableSummary {
            table: table.name.clone(),
            columns: table.columns.len(),
            rows: table.non_empty_rows().count(),
            repeating: table.repeating,
            file: files
                .iter()
                .find(|file| file.table == table.name)
                .map(|file| file.path.clone()),
        })
        .collect()
}

/// Reads `input` and, unless `dry_run`, writes the two codebook files.
///
/// Refuses metadata-only exports like [`run_conversion`] and prepares the
/// output folder the same way, honouring `clear_output`.
pub fn run_codebook(
    input: &Path,
    edc: Edc,
    options: &ConversionOptions,
    dry_run: bool,
) -> Result<CodebookSummary> {
    let input = options.resolve_input(input);
    let _codelist_guard =
        info_span!("codelist", file = %input.display(), edc = %edc).entered();
    let source = OdmSource::open(&input)?;
    let doc = source
        .parse(&options.redcap_namespace)
        .with_context(|| format!("parse {}", input.display()))?;
    let codebook = codebook_document(edc.adapter().as_ref(), &doc, options)
        .with_context(|| format!("build codebook for {}", input.display()))?;

    let files = if dry_run {
        Vec::new()
    } else {
        info_span!("output", folder = %options.output_folder.display()).in_scope(
            || -> Result<_> {
                prepare_output_dir(&options.output_folder, options.clear_output)?;
                Ok(write_codebook(&codebook, options)?.to_vec())
            },
        )?
    };

    Ok(CodebookSummary {
        input,
        edc: edc.to_string(),
        output_dir: options.output_folder.clone(),
        dry_run,
        variables: codebook.variables.len(),
        values: codebook.values.len(),
        files,
    })
}

/// Schema extraction only: no ClinicalData gate and no writes.
pub fn inspect_document(
    input: &Path,
    edc: Edc,
    options: &ConversionOptions,
) -> Result<Vec<InstrumentSummary>> {
    let input = options.resolve_input(input);
    let _inspect_guard = info_span!("inspect", file = %input.display()).entered();
    let source = OdmSource::open(&input)?;
    let doc = source
        .parse(&options.redcap_namespace)
        .with_context(|| format!("parse {}", input.display()))?;
    let study = edc
        .adapter()
        .extract_schema(&doc, options)
        .with_context(|| format!("extract schema from {}", input.display()))?;

    Ok(study
        .forms
        .iter()
        .map(|form| InstrumentSummary {
            table: form.form_name.clone(),
            form_oid: form.oid.clone(),
            columns: study.schema.data_columns(&form.form_name).count(),
            repeating: study.is_repeating(&form.form_name),
        })
        .collect())
}
