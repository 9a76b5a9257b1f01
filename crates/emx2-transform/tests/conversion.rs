//! End-to-end transformation tests over REDCap exports.

use emx2_ingest::OdmDocument;
use emx2_model::{
    ConversionOptions, Emx2Type, InstrumentTable, REDCAP_NAMESPACE, SchemaRow, SchemaTable,
    SourceType,
};
use emx2_transform::{
    Edc, EdcAdapter, RedcapAdapter, TYPE_RULES, TransformError, apply_types, codebook_document,
    convert_document,
};
use proptest::prelude::*;

const FLAT: &str = include_str!("fixtures/redcap_flat.xml");
const EVENTS: &str = include_str!("fixtures/redcap_events.xml");

fn flat() -> OdmDocument<'static> {
    OdmDocument::parse(FLAT, REDCAP_NAMESPACE).expect("parse fixture")
}

fn events() -> OdmDocument<'static> {
    OdmDocument::parse(EVENTS, REDCAP_NAMESPACE).expect("parse fixture")
}

fn cell<'a>(table: &'a InstrumentTable, row: usize, column: &str) -> Option<&'a str> {
    let idx = table.column_index(column)?;
    table.rows[row].cells[idx].as_deref()
}

#[test]
fn schema_types_and_collapses_columns() {
    let study = RedcapAdapter
        .extract_schema(&flat(), &ConversionOptions::default())
        .expect("schema");
    let schema = &study.schema;

    let demographics: Vec<_> = schema
        .data_columns("demographics")
        .map(|row| (row.column_name().unwrap_or_default(), row.column_type))
        .collect();
    assert_eq!(
        demographics,
        vec![
            ("record_id", Some(Emx2Type::Text)),
            ("email", Some(Emx2Type::Text)),
            ("dob", Some(Emx2Type::Date)),
            ("smoker", Some(Emx2Type::Bool)),
            ("diet", Some(Emx2Type::Text)),
            ("id_scan", Some(Emx2Type::File)),
        ]
    );
    let diet = schema.column("demographics", "diet").expect("diet");
    assert_eq!(diet.description.as_deref(), Some("Select all that apply"));

    assert_eq!(
        schema.table_names().collect::<Vec<_>>(),
        vec!["demographics", "medications", "consent_scan"]
    );
    assert!(study.is_repeating("medications"));
    assert!(!study.is_repeating("demographics"));
}

#[test]
fn schema_extraction_is_repeatable() {
    let doc = flat();
    let options = ConversionOptions::default();
    let first = RedcapAdapter.extract_schema(&doc, &options).expect("first");
    let second = RedcapAdapter.extract_schema(&doc, &options).expect("second");
    assert_eq!(first.schema, second.schema);
}

#[test]
fn converts_flat_export() {
    let conversion =
        convert_document(&RedcapAdapter, &flat(), &ConversionOptions::default()).expect("convert");
    let demographics = &conversion.instruments[0];
    assert_eq!(demographics.name, "demographics");
    assert!(!demographics.repeating);

    let first = &demographics.rows[0];
    assert_eq!(first.key(demographics.repeating), "101_1");
    let cell = |row: &emx2_model::InstrumentRow, column: &str| {
        demographics
            .column_index(column)
            .and_then(|idx| row.cells[idx].clone())
    };
    assert_eq!(cell(first, "smoker").as_deref(), Some("FALSE"));
    assert_eq!(cell(first, "diet").as_deref(), Some("1,3"));
    assert_eq!(cell(first, "id_scan").as_deref(), Some(""));
    assert_eq!(cell(&demographics.rows[1], "smoker").as_deref(), Some("TRUE"));
    assert_eq!(cell(&demographics.rows[1], "email"), None);

    let medications = &conversion.instruments[1];
    assert!(medications.repeating);
    let keys: Vec<_> = medications.rows.iter().map(|row| row.key(true)).collect();
    assert_eq!(keys, vec!["101_1", "101_2"]);
    let ongoing = medications.column_index("med_ongoing").expect("column");
    assert_eq!(medications.rows[1].cells[ongoing].as_deref(), Some("FALSE"));

    let scan = &conversion.instruments[2];
    assert!(scan.columns.is_empty());
    assert!(scan.rows.is_empty());

    assert_eq!(
        conversion.clinical.subject_keys().collect::<Vec<_>>(),
        vec!["101", "102"]
    );
    assert_eq!(conversion.row_count(), 4);
}

#[test]
fn converts_event_export() {
    let conversion = convert_document(&RedcapAdapter, &events(), &ConversionOptions::default())
        .expect("convert");
    let enrollment = &conversion.instruments[0];
    assert_eq!(enrollment.name, "enrollment");
    assert!(!enrollment.repeating);
    let keys: Vec<_> = enrollment.rows.iter().map(|row| row.key(false)).collect();
    assert_eq!(keys, vec!["1_1", "2_1"]);
    assert_eq!(cell(enrollment, 0, "consent"), Some("TRUE"));
    assert_eq!(cell(enrollment, 1, "consent"), Some("FALSE"));
    assert_eq!(cell(enrollment, 0, "symptoms"), Some("1"));
    assert_eq!(cell(enrollment, 1, "symptoms"), None);
    assert!(enrollment.duplicate_keys().is_empty());

    let vitals = &conversion.instruments[1];
    assert!(vitals.repeating);
    let keys: Vec<_> = vitals.rows.iter().map(|row| row.key(true)).collect();
    assert_eq!(keys, vec!["1_1", "1_2"]);
    assert_eq!(cell(vitals, 0, "weight"), Some("71.5"));
    assert_eq!(cell(vitals, 0, "ecg_upload"), None);
    assert_eq!(cell(vitals, 1, "ecg_upload"), Some(""));

    assert_eq!(conversion.row_count(), 4);
}

#[test]
fn second_occurrence_of_single_form_shares_its_key() {
    let second_event = r#"<StudyEventData StudyEventOID="Event.visit_arm_1" StudyEventRepeatKey="1" redcap:UniqueEventName="visit_arm_1">
			<FormData FormOID="Form.enrollment" FormRepeatKey="2">
				<ItemGroupData ItemGroupOID="enrollment.record_id" ItemGroupRepeatKey="1">
					<ItemData ItemOID="consent" Value="1"/>
				</ItemGroupData>
			</FormData>
		</StudyEventData>
	</SubjectData>
</ClinicalData>"#;
    let xml = EVENTS.replace("</SubjectData>\n</ClinicalData>", second_event);
    assert_ne!(xml, EVENTS);
    let doc = OdmDocument::parse(&xml, REDCAP_NAMESPACE).expect("parse");
    let conversion =
        convert_document(&RedcapAdapter, &doc, &ConversionOptions::default()).expect("convert");
    let enrollment = &conversion.instruments[0];
    assert_eq!(enrollment.rows.len(), 3);
    assert_eq!(enrollment.duplicate_keys(), vec!["2_1"]);
}

#[test]
fn codebook_lists_questions_and_codes() {
    let codebook = codebook_document(&RedcapAdapter, &events(), &ConversionOptions::default())
        .expect("codebook");
    let variables: Vec<_> = codebook
        .variables
        .iter()
        .map(|row| {
            format!(
                "{}.{} [{}] {}",
                row.table,
                row.name,
                row.format.map(Emx2Type::as_str).unwrap_or("-"),
                row.label.as_deref().unwrap_or("-")
            )
        })
        .collect();
    insta::assert_snapshot!(variables.join("\n"), @r"
    enrollment.record_id [text] Record ID
    enrollment.consent [bool] Consent given?
    enrollment.symptoms [text] Symptoms
    enrollment.enrollment_complete [text] Complete?
    vitals.weight [decimal] Weight (kg)
    vitals.ecg_upload [file] ECG tracing
    ");
    assert_eq!(
        codebook.variables[1].description.as_deref(),
        Some("Signed consent on file")
    );

    let values: Vec<_> = codebook
        .values
        .iter()
        .map(|row| {
            format!(
                "{}={} {} #{}",
                row.variable,
                row.value,
                row.label.as_deref().unwrap_or("-"),
                row.order
            )
        })
        .collect();
    insta::assert_snapshot!(values.join("\n"), @r"
    consent=1 Yes #1
    consent=0 No #2
    symptoms=1 Fever #1
    symptoms=2 Cough #2
    ");
}

#[test]
fn codebook_requires_clinical_data() {
    let start = EVENTS.find("<ClinicalData").expect("clinical start");
    let end = EVENTS.find("</ClinicalData>").expect("clinical end") + "</ClinicalData>".len();
    let metadata_only = format!("{}{}", &EVENTS[..start], &EVENTS[end..]);
    let doc = OdmDocument::parse(&metadata_only, REDCAP_NAMESPACE).expect("parse");
    assert!(matches!(
        codebook_document(&RedcapAdapter, &doc, &ConversionOptions::default()),
        Err(TransformError::NoClinicalData)
    ));
}

#[test]
fn metadata_only_export_has_no_clinical_data() {
    let start = FLAT.find("<ClinicalData").expect("clinical start");
    let end = FLAT.find("</ClinicalData>").expect("clinical end") + "</ClinicalData>".len();
    let metadata_only = format!("{}{}", &FLAT[..start], &FLAT[end..]);
    let doc = OdmDocument::parse(&metadata_only, REDCAP_NAMESPACE).expect("parse");

    let study = RedcapAdapter
        .extract_schema(&doc, &ConversionOptions::default())
        .expect("schema still builds");
    assert_eq!(study.forms.len(), 3);

    assert!(matches!(
        convert_document(&RedcapAdapter, &doc, &ConversionOptions::default()),
        Err(TransformError::NoClinicalData)
    ));
    assert!(matches!(
        RedcapAdapter.extract_clinical_data(&doc),
        Err(TransformError::NoClinicalData)
    ));
}

#[test]
fn castor_adapter_fails_explicitly() {
    let adapter = "Castor".parse::<Edc>().expect("castor").adapter();
    assert!(matches!(
        convert_document(adapter.as_ref(), &flat(), &ConversionOptions::default()),
        Err(TransformError::NotSupported { .. })
    ));
}

#[test]
fn type_rule_targets() {
    let targets: Vec<_> = TYPE_RULES
        .iter()
        .map(|rule| {
            format!(
                "{}/{}/{} -> {}",
                rule.data_type,
                rule.field_type,
                rule.text_validation_type.unwrap_or("*"),
                rule.target
            )
        })
        .collect();
    insta::assert_snapshot!(targets.join("\n"), @r"
    text/text/email -> text
    date/text/* -> date
    partialDatetime/text/* -> datetime
    datetime/text/* -> datetime
    text/text/* -> text
    integer/text/* -> int
    float/text/* -> decimal
    partialTime/text/* -> string
    text/textarea/* -> text
    float/calc/* -> decimal
    text/select/* -> text
    text/radio/* -> text
    boolean/checkbox/* -> text
    boolean/yesno/* -> bool
    boolean/truefalse/* -> bool
    text/file/* -> file
    integer/slider/* -> int
    text/descriptive/* -> text
    ");
}

proptest! {
    #[test]
    fn type_mapping_ignores_row_order(order in Just((0..TYPE_RULES.len()).collect::<Vec<_>>()).prop_shuffle()) {
        let mut schema = SchemaTable::new();
        schema.push(SchemaRow::table("t"));
        for idx in &order {
            let rule = &TYPE_RULES[*idx];
            schema.push(
                SchemaRow::column("t", format!("c{idx}")).with_source(SourceType::new(
                    rule.data_type,
                    rule.field_type,
                    rule.text_validation_type,
                )),
            );
        }
        prop_assert_eq!(apply_types(&mut schema), 0);
        for idx in order {
            let row = schema.column("t", &format!("c{idx}")).expect("column");
            prop_assert_eq!(row.column_type, Some(TYPE_RULES[idx].target));
        }
    }
}
