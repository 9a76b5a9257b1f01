//! Tests for emx2-model types.

use emx2_model::{
    ConversionOptions, GroupMatching, InstrumentRow, InstrumentTable, SchemaRow, SchemaTable,
    collapse_multiple_choice, row_key,
};
use proptest::prelude::*;

#[test]
fn options_deserialize_with_defaults() {
    let options: ConversionOptions = toml::from_str(
        r#"
output_folder = "out"
group_matching = "prefix"
"#,
    )
    .expect("parse options");
    assert_eq!(options.output_folder, std::path::PathBuf::from("out"));
    assert_eq!(options.group_matching, GroupMatching::Prefix);
    assert_eq!(options.schema_file, "molgenis.csv");
    assert!(options.clear_output);
}

#[test]
fn options_round_trip_through_json() {
    let options = ConversionOptions::default().with_clear_output(false);
    let json = serde_json::to_string(&options).expect("serialize options");
    let round: ConversionOptions = serde_json::from_str(&json).expect("deserialize options");
    assert_eq!(round, options);
}

#[test]
fn schema_dedup_keeps_first_checkbox_row() {
    let mut schema = SchemaTable::new();
    schema.push(SchemaRow::table("survey"));
    for (oid, note) in [("q1___1", "one"), ("q1___2", "two"), ("q1___3", "three")] {
        schema.push(
            SchemaRow::column("survey", collapse_multiple_choice(oid))
                .with_description(Some(note.to_string())),
        );
    }
    schema.dedup_columns();
    let q1: Vec<_> = schema.columns("survey").collect();
    assert_eq!(q1.len(), 1);
    assert_eq!(q1[0].description.as_deref(), Some("one"));
}

#[test]
fn map_column_touches_present_cells_only() {
    let mut table = InstrumentTable::new("a", "Form.a", false, vec!["flag".into()]);
    table.rows.push(InstrumentRow {
        subject_key: "1".into(),
        form_repeat_key: "1".into(),
        cells: vec![Some("1".into())],
    });
    table.rows.push(InstrumentRow {
        subject_key: "2".into(),
        form_repeat_key: "1".into(),
        cells: vec![None],
    });
    assert!(table.map_column("flag", |value| value.push('!')));
    assert!(!table.map_column("missing", |_| {}));
    assert_eq!(table.rows[0].cells[0].as_deref(), Some("1!"));
    assert_eq!(table.rows[1].cells[0], None);
    assert_eq!(table.non_empty_rows().count(), 1);
}

proptest! {
    #[test]
    fn collapse_strips_any_numeric_suffix(base in "[a-z][a-z0-9_]{0,12}[a-z0-9]", code in 0u32..10_000) {
        let oid = format!("{base}___{code}");
        prop_assert_eq!(collapse_multiple_choice(&oid), base.as_str());
    }

    #[test]
    fn collapse_leaves_plain_names(name in "[a-z][a-z0-9]{0,16}") {
        prop_assert_eq!(collapse_multiple_choice(&name), name.as_str());
    }

    #[test]
    fn key_synthesis(subject in "[0-9]{1,4}", repeat in "[0-9]{1,3}") {
        prop_assert_eq!(row_key(&subject, &repeat, true), format!("{subject}_{repeat}"));
        prop_assert_eq!(row_key(&subject, &repeat, false), format!("{subject}_1"));
    }
}
