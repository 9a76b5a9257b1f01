//! REDCap type triple to EMX2 column type.
//!
//! Rules are applied in table order as unconditional overwrites, so when
//! several rules match one column the last one wins. A column that matches no
//! rule keeps whatever type it already had (none for item columns).

use emx2_model::{Emx2Type, SchemaTable, SourceType};

/// One row of the mapping table. `None` for the validation type matches any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRule {
    pub data_type: &'static str,
    pub field_type: &'static str,
    pub text_validation_type: Option<&'static str>,
    pub target: Emx2Type,
}

impl TypeRule {
    const fn new(
        data_type: &'static str,
        field_type: &'static str,
        text_validation_type: Option<&'static str>,
        target: Emx2Type,
    ) -> Self {
        Self {
            data_type,
            field_type,
            text_validation_type,
            target,
        }
    }

    pub fn matches(&self, source: &SourceType) -> bool {
        source.data_type() == Some(self.data_type)
            && source.field_type() == Some(self.field_type)
            && self
                .text_validation_type
                .is_none_or(|validation| source.text_validation_type() == Some(validation))
    }
}

pub const TYPE_RULES: [TypeRule; 18] = [
    TypeRule::new("text", "text", Some("email"), Emx2Type::Text),
    TypeRule::new("date", "text", None, Emx2Type::Date),
    TypeRule::new("partialDatetime", "text", None, Emx2Type::Datetime),
    TypeRule::new("datetime", "text", None, Emx2Type::Datetime),
    TypeRule::new("text", "text", None, Emx2Type::Text),
    TypeRule::new("integer", "text", None, Emx2Type::Int),
    TypeRule::new("float", "text", None, Emx2Type::Decimal),
    TypeRule::new("partialTime", "text", None, Emx2Type::String),
    TypeRule::new("text", "textarea", None, Emx2Type::Text),
    TypeRule::new("float", "calc", None, Emx2Type::Decimal),
    TypeRule::new("text", "select", None, Emx2Type::Text),
    TypeRule::new("text", "radio", None, Emx2Type::Text),
    // Folded into a comma-separated list of option codes.
    TypeRule::new("boolean", "checkbox", None, Emx2Type::Text),
    TypeRule::new("boolean", "yesno", None, Emx2Type::Bool),
    TypeRule::new("boolean", "truefalse", None, Emx2Type::Bool),
    TypeRule::new("text", "file", None, Emx2Type::File),
    TypeRule::new("integer", "slider", None, Emx2Type::Int),
    TypeRule::new("text", "descriptive", None, Emx2Type::Text),
];

/// Target type of the last matching rule.
pub fn map_type(source: &SourceType) -> Option<Emx2Type> {
    TYPE_RULES
        .iter()
        .rev()
        .find(|rule| rule.matches(source))
        .map(|rule| rule.target)
}

/// Sets `column_type` on every column row with a matching rule.
///
/// Returns the number of item columns left without a type.
pub fn apply_types(schema: &mut SchemaTable) -> usize {
    let mut untyped = 0;
    for row in schema.rows.iter_mut().filter(|row| !row.is_table()) {
        match map_type(&row.source) {
            Some(target) => row.column_type = Some(target),
            None if !row.is_index_column() => untyped += 1,
            None => {}
        }
    }
    untyped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_and_plain_text_agree() {
        assert_eq!(
            map_type(&SourceType::new("text", "text", Some("email"))),
            Some(Emx2Type::Text)
        );
        assert_eq!(
            map_type(&SourceType::new("text", "text", None)),
            Some(Emx2Type::Text)
        );
    }

    #[test]
    fn validation_type_is_a_wildcard_for_most_rules() {
        assert_eq!(
            map_type(&SourceType::new("date", "text", Some("date_dmy"))),
            Some(Emx2Type::Date)
        );
        assert_eq!(
            map_type(&SourceType::new("float", "text", Some("number"))),
            Some(Emx2Type::Decimal)
        );
    }

    #[test]
    fn unknown_triple_has_no_type() {
        assert_eq!(map_type(&SourceType::new("text", "sql", None)), None);
        assert_eq!(map_type(&SourceType::default()), None);
    }
}
