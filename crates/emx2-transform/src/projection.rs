//! Pivots clinical data into one table per instrument.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace, warn};

use emx2_model::{
    ClinicalData, FormDef, InstrumentRow, InstrumentTable, RowKey, SchemaTable,
    split_multiple_choice,
};

/// One [`InstrumentTable`] per form, columns in schema order.
///
/// Rows appear in the order their first cell was recorded. Items without a
/// schema column are skipped. Checkbox options (`q1___2`) fold into their
/// base column as a comma-separated list of the codes whose value is `1`.
pub fn project_instruments(
    schema: &SchemaTable,
    clinical: &ClinicalData,
    forms: &[FormDef],
    repeating: &IndexSet<String>,
) -> Vec<InstrumentTable> {
    forms
        .iter()
        .map(|form| {
            let columns = schema
                .data_columns(&form.form_name)
                .filter_map(|row| row.column_name().map(str::to_string))
                .collect();
            let mut table = InstrumentTable::new(
                &form.form_name,
                &form.oid,
                repeating.contains(&form.form_name),
                columns,
            );
            fill_rows(&mut table, clinical);
            let duplicates = table.duplicate_keys();
            if !duplicates.is_empty() {
                warn!(
                    instrument = %table.name,
                    keys = ?duplicates,
                    "non-repeating instrument has several occurrences per subject"
                );
            }
            debug!(
                instrument = %table.name,
                repeating = table.repeating,
                rows = table.rows.len(),
                "projected instrument"
            );
            table
        })
        .collect()
}

fn fill_rows(table: &mut InstrumentTable, clinical: &ClinicalData) {
    let width = table.columns.len();
    let mut rows: IndexMap<RowKey, Vec<Option<String>>> = IndexMap::new();

    for (key, value) in clinical.form_cells(&table.form_oid) {
        let (column, code) = match split_multiple_choice(&key.item_oid) {
            Some((base, code)) => (base, Some(code)),
            None => (key.item_oid.as_str(), None),
        };
        let Some(idx) = table.column_index(column) else {
            trace!(item_oid = %key.item_oid, "item has no column");
            continue;
        };
        let cells = rows
            .entry(key.row.clone())
            .or_insert_with(|| vec![None; width]);
        match code {
            Some(code) => fold_option(&mut cells[idx], code, value),
            None => cells[idx] = Some(value.to_string()),
        }
    }

    table.rows = rows
        .into_iter()
        .map(|(key, cells)| InstrumentRow {
            subject_key: key.subject_key,
            form_repeat_key: key.form_repeat_key,
            cells,
        })
        .collect();
}

fn fold_option(cell: &mut Option<String>, code: &str, value: &str) {
    let selected = cell.get_or_insert_with(String::new);
    if value == "1" {
        if !selected.is_empty() {
            selected.push(',');
        }
        selected.push_str(code);
    }
}

#[cfg(test)]
mod tests {
    use emx2_model::{CellKey, SchemaRow};

    use super::*;

    fn schema() -> SchemaTable {
        let mut schema = SchemaTable::new();
        schema.push(SchemaRow::table("visit"));
        schema.push(SchemaRow::column("visit", "key"));
        schema.push(SchemaRow::column("visit", "SubjectKey"));
        schema.push(SchemaRow::column("visit", "FormRepeatKey"));
        schema.push(SchemaRow::column("visit", "weight"));
        schema.push(SchemaRow::column("visit", "symptoms"));
        schema
    }

    fn forms() -> Vec<FormDef> {
        vec![FormDef {
            oid: "Form.visit".into(),
            form_name: "visit".into(),
        }]
    }

    #[test]
    fn pivots_items_into_schema_columns() {
        let mut data = ClinicalData::new();
        data.insert(CellKey::new("1", "2", "Form.visit", "weight"), "70");
        data.insert(CellKey::new("1", "1", "Form.visit", "weight"), "71");
        data.insert(CellKey::new("1", "1", "Form.other", "weight"), "99");

        let repeating = IndexSet::from(["visit".to_string()]);
        let tables = project_instruments(&schema(), &data, &forms(), &repeating);
        let table = &tables[0];
        assert_eq!(table.columns, vec!["weight", "symptoms"]);
        assert!(table.repeating);
        let keys: Vec<_> = table.rows.iter().map(|row| row.key(true)).collect();
        assert_eq!(keys, vec!["1_2", "1_1"]);
        assert_eq!(table.rows[1].cells, vec![Some("71".to_string()), None]);
    }

    #[test]
    fn checkbox_options_fold_to_selected_codes() {
        let mut data = ClinicalData::new();
        data.insert(CellKey::new("1", "1", "Form.visit", "symptoms___1"), "1");
        data.insert(CellKey::new("1", "1", "Form.visit", "symptoms___2"), "0");
        data.insert(CellKey::new("1", "1", "Form.visit", "symptoms___3"), "1");
        data.insert(CellKey::new("2", "1", "Form.visit", "symptoms___1"), "0");

        let tables = project_instruments(&schema(), &data, &forms(), &IndexSet::new());
        let table = &tables[0];
        assert!(!table.repeating);
        assert_eq!(table.rows[0].cells[1].as_deref(), Some("1,3"));
        assert_eq!(table.rows[1].cells[1].as_deref(), Some(""));
        assert!(table.rows[1].is_empty());
    }

    #[test]
    fn unknown_items_are_skipped() {
        let mut data = ClinicalData::new();
        data.insert(CellKey::new("1", "1", "Form.visit", "visit_complete"), "2");
        let tables = project_instruments(&schema(), &data, &forms(), &IndexSet::new());
        assert!(tables[0].rows.is_empty());
    }
}
