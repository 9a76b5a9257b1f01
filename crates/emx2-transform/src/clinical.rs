//! Flattens subject data into the sparse `(subject, occurrence, form, item)` map.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use emx2_model::{CellKey, ClinicalData, SubjectData};

/// Records every `ItemData` value. A missing `Value` (file and signature
/// fields) becomes an empty string.
///
/// A form occurrence seen again for the same subject (one form in several
/// events) shares its cells with the first; later values win.
pub fn collect_clinical_data(subjects: &[SubjectData]) -> ClinicalData {
    let mut data = ClinicalData::new();
    for subject in subjects {
        data.register_subject(&subject.subject_key);
        let mut occurrences = BTreeSet::new();
        for form in &subject.forms {
            if !occurrences.insert((form.form_oid.as_str(), form.form_repeat_key.as_str())) {
                warn!(
                    subject_key = %subject.subject_key,
                    form_oid = %form.form_oid,
                    form_repeat_key = %form.form_repeat_key,
                    "form occurrence repeated; later values overwrite earlier ones"
                );
            }
            for item in &form.items {
                let key = CellKey::new(
                    &subject.subject_key,
                    &form.form_repeat_key,
                    &form.form_oid,
                    &item.item_oid,
                );
                data.insert(key, item.value.clone().unwrap_or_default());
            }
        }
    }
    debug!(
        subjects = subjects.len(),
        cells = data.len(),
        "collected clinical data"
    );
    data
}
