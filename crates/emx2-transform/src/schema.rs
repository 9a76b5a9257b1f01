//! Builds the EMX2 schema table from ODM metadata.

use indexmap::IndexMap;
use tracing::{debug, warn};

use emx2_model::{
    ConversionOptions, Emx2Type, FORM_REPEAT_KEY_COLUMN, FormDef, GroupMatching, ItemDef,
    ItemGroupDef, KEY_COLUMN, SUBJECT_KEY_COLUMN, SchemaRow, SchemaTable,
    collapse_multiple_choice,
};

use crate::types::apply_types;

/// Metadata read from the `MetaDataVersion` section.
#[derive(Debug, Clone, Default)]
pub struct StudyMetadata {
    pub forms: Vec<FormDef>,
    pub item_groups: Vec<ItemGroupDef>,
    pub items: IndexMap<String, ItemDef>,
}

impl StudyMetadata {
    /// `ItemRef` OIDs of every item group assigned to `form`, in document order.
    pub fn form_item_refs<'a>(
        &'a self,
        form: &'a FormDef,
        matching: GroupMatching,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.item_groups
            .iter()
            .filter(move |group| matching.matches(&form.form_name, &group.oid))
            .flat_map(|group| group.item_refs.iter().map(String::as_str))
    }
}

/// Table declaration, index columns and item columns for every form.
///
/// Columns are deduplicated per table and typed before returning. A form
/// without item groups still gets its declaration and index columns.
pub fn build_schema(metadata: &StudyMetadata, options: &ConversionOptions) -> SchemaTable {
    let mut schema = SchemaTable::new();
    for form in &metadata.forms {
        push_index_rows(&mut schema, &form.form_name, options.subject_table());

        for item_oid in metadata.form_item_refs(form, options.group_matching) {
            schema.push(item_row(&form.form_name, item_oid, metadata.items.get(item_oid)));
        }
    }

    let removed = schema.dedup_columns();
    let untyped = apply_types(&mut schema);
    debug!(rows = schema.len(), removed, untyped, "built schema");
    schema
}

fn push_index_rows(schema: &mut SchemaTable, table: &str, subject_table: &str) {
    schema.push(SchemaRow::table(table));
    schema.push(
        SchemaRow::column(table, KEY_COLUMN)
            .with_type(Emx2Type::Ref)
            .with_ref_table(subject_table)
            .with_key(1)
            .with_required(true),
    );
    schema.push(SchemaRow::column(table, SUBJECT_KEY_COLUMN).with_required(true));
    schema.push(SchemaRow::column(table, FORM_REPEAT_KEY_COLUMN));
}

fn item_row(table: &str, item_oid: &str, def: Option<&ItemDef>) -> SchemaRow {
    let row = SchemaRow::column(table, collapse_multiple_choice(item_oid));
    match def {
        Some(def) => row
            .with_description(def.field_note.clone())
            .with_source(def.source.clone()),
        None => {
            warn!(table, item_oid, "ItemRef without matching ItemDef");
            row
        }
    }
}
