//! Variables and their value labels, read from ODM code lists.

use indexmap::IndexMap;
use tracing::{debug, warn};

use emx2_model::{
    CodeList, Codebook, ConversionOptions, ItemDef, SchemaTable, VariableRow, VariableValueRow,
    collapse_multiple_choice, split_multiple_choice,
};

use crate::schema::StudyMetadata;

/// One variable per schema column and one value row per code.
///
/// Variables follow the same form/group assignment and checkbox collapse as
/// the schema, and take their `format` from it. Checkbox options contribute
/// one value each, labelled from the code list's `redcap:CheckboxChoices`.
/// Other items list the `CodeListItem`s of their referenced code list.
pub fn build_codebook(
    metadata: &StudyMetadata,
    schema: &SchemaTable,
    code_lists: &IndexMap<String, CodeList>,
    options: &ConversionOptions,
) -> Codebook {
    let mut codebook = Codebook::default();
    let mut value_counts: IndexMap<(String, String), usize> = IndexMap::new();

    for form in &metadata.forms {
        let table = form.form_name.as_str();
        for item_oid in metadata.form_item_refs(form, options.group_matching) {
            let Some(def) = metadata.items.get(item_oid) else {
                continue;
            };
            let name = collapse_multiple_choice(item_oid);
            let variable = (table.to_string(), name.to_string());
            if !value_counts.contains_key(&variable) {
                codebook.variables.push(VariableRow {
                    table: table.to_string(),
                    name: name.to_string(),
                    label: def.question.clone(),
                    format: schema.column(table, name).and_then(|row| row.column_type),
                    description: def.field_note.clone(),
                });
            }
            let order = value_counts.entry(variable).or_default();

            for (value, label) in value_labels(def, code_lists) {
                let duplicate = codebook.values.iter().any(|row| {
                    row.table == table && row.variable == name && row.value == value
                });
                if duplicate {
                    continue;
                }
                *order += 1;
                codebook.values.push(VariableValueRow {
                    table: table.to_string(),
                    variable: name.to_string(),
                    value,
                    label,
                    order: *order,
                });
            }
        }
    }
    debug!(
        variables = codebook.variables.len(),
        values = codebook.values.len(),
        "built codebook"
    );
    codebook
}

fn value_labels(
    def: &ItemDef,
    code_lists: &IndexMap<String, CodeList>,
) -> Vec<(String, Option<String>)> {
    let code_list = def.code_list_oid.as_deref().and_then(|oid| {
        let found = code_lists.get(oid);
        if found.is_none() {
            warn!(item_oid = %def.oid, code_list_oid = oid, "CodeListRef without matching CodeList");
        }
        found
    });

    if def.source.is_checkbox() {
        return split_multiple_choice(&def.oid)
            .map(|(_, code)| {
                let label = code_list.and_then(|list| list.checkbox_label(code));
                vec![(code.to_string(), label)]
            })
            .unwrap_or_default();
    }
    code_list
        .map(|list| {
            list.items
                .iter()
                .map(|item| (item.coded_value.clone(), item.decode.clone()))
                .collect()
        })
        .unwrap_or_default()
}
