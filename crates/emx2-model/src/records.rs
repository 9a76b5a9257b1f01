//! Typed views of the ODM elements the conversion reads.

/// `<FormDef>`: one REDCap instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDef {
    pub oid: String,
    /// `redcap:FormName`, used as the EMX2 table name.
    pub form_name: String,
}

/// `<ItemGroupDef>` with its `ItemRef/@ItemOID` children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGroupDef {
    pub oid: String,
    pub item_refs: Vec<String>,
}

/// `<ItemDef>`: one REDCap field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDef {
    pub oid: String,
    /// `redcap:FieldNote`.
    pub field_note: Option<String>,
    /// `Question/TranslatedText`.
    pub question: Option<String>,
    /// `CodeListRef/@CodeListOID`.
    pub code_list_oid: Option<String>,
    pub source: SourceType,
}

/// The REDCap type triple that decides the EMX2 column type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceType {
    /// ODM `DataType`.
    pub data_type: Option<String>,
    /// `redcap:FieldType`.
    pub field_type: Option<String>,
    /// `redcap:TextValidationType`.
    pub text_validation_type: Option<String>,
}

impl SourceType {
    pub fn new(
        data_type: impl Into<String>,
        field_type: impl Into<String>,
        text_validation_type: Option<&str>,
    ) -> Self {
        Self {
            data_type: Some(data_type.into()),
            field_type: Some(field_type.into()),
            text_validation_type: text_validation_type.map(str::to_string),
        }
    }

    pub fn data_type(&self) -> Option<&str> {
        self.data_type.as_deref()
    }

    pub fn field_type(&self) -> Option<&str> {
        self.field_type.as_deref()
    }

    pub fn text_validation_type(&self) -> Option<&str> {
        self.text_validation_type.as_deref()
    }

    /// REDCap stores yes/no and true/false answers as `0`/`1`.
    pub fn is_boolean_flag(&self) -> bool {
        self.data_type() == Some("boolean")
            && matches!(self.field_type(), Some("yesno" | "truefalse"))
    }

    pub fn is_checkbox(&self) -> bool {
        self.data_type() == Some("boolean") && self.field_type() == Some("checkbox")
    }
}

/// `<SubjectData>` with the form occurrences found beneath it.
///
/// When the study uses events the forms are collected from every
/// `<StudyEventData>` child in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectData {
    pub subject_key: String,
    pub forms: Vec<FormData>,
}

/// One occurrence of a form for a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    pub form_oid: String,
    pub form_repeat_key: String,
    pub items: Vec<ItemData>,
}

/// `<ItemData>`; file and signature fields carry no `Value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemData {
    pub item_oid: String,
    pub value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_flag_requires_boolean_data_type() {
        assert!(SourceType::new("boolean", "yesno", None).is_boolean_flag());
        assert!(SourceType::new("boolean", "truefalse", None).is_boolean_flag());
        assert!(!SourceType::new("boolean", "checkbox", None).is_boolean_flag());
        assert!(!SourceType::new("text", "yesno", None).is_boolean_flag());
        assert!(!SourceType::default().is_boolean_flag());
    }
}
