use std::path::Path;

use anyhow::Result;
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;

use emx2_cli::types::{CodebookSummary, InstrumentSummary, RunSummary};

pub fn print_summary(result: &RunSummary) {
    println!("Input: {}", result.input.display());
    println!("EDC: {}", result.edc);
    if result.dry_run {
        println!("Output: (dry run, nothing written)");
    } else {
        println!("Output: {}", result.output_dir.display());
    }
    println!("Subjects: {}", result.subject_count);

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Columns"),
        header_cell("Rows"),
        header_cell("Repeating"),
        header_cell("File"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);

    let mut total_rows = 0usize;
    for summary in &result.tables {
        total_rows += summary.rows;
        table.add_row(vec![
            Cell::new(&summary.table).add_attribute(Attribute::Bold),
            Cell::new(summary.columns),
            Cell::new(summary.rows),
            flag_cell(summary.repeating),
            file_cell(summary.file.as_deref()),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell(format!("{} files", result.files.len())),
    ]);
    println!("{table}");
}

pub fn print_instruments(instruments: &[InstrumentSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("FormOID"),
        header_cell("Columns"),
        header_cell("Repeating"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    for instrument in instruments {
        table.add_row(vec![
            Cell::new(&instrument.table).add_attribute(Attribute::Bold),
            Cell::new(&instrument.form_oid),
            Cell::new(instrument.columns),
            flag_cell(instrument.repeating),
        ]);
    }
    println!("{table}");
}

pub fn print_codebook(result: &CodebookSummary) {
    println!("Input: {}", result.input.display());
    println!("EDC: {}", result.edc);
    let mut table = Table::new();
    table.set_header(vec![header_cell("File"), header_cell("Rows")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    if result.dry_run {
        table.add_row(vec![dim_cell("Variables (dry run)"), Cell::new(result.variables)]);
        table.add_row(vec![dim_cell("VariableValues (dry run)"), Cell::new(result.values)]);
    }
    for file in &result.files {
        table.add_row(vec![file_cell(Some(file.path.as_path())), Cell::new(file.rows)]);
    }
    println!("{table}");
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn flag_cell(value: bool) -> Cell {
    if value {
        Cell::new("yes").fg(Color::Green)
    } else {
        dim_cell("no")
    }
}

fn file_cell(path: Option<&Path>) -> Cell {
    match path.and_then(Path::file_name) {
        Some(name) => Cell::new(name.to_string_lossy()),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
