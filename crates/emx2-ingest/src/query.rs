//! Attribute query facade over a parsed [`OdmDocument`].

use std::collections::{BTreeMap, BTreeSet};

use roxmltree::Node;

use crate::document::OdmDocument;
use crate::error::{IngestError, Result};
use crate::path::{Axis, NameTest, Predicate, QName, QueryPath, Step};

/// Attribute name to value for one element.
pub type AttributeRow = BTreeMap<String, String>;

/// Attributes of every element a path matched.
///
/// `columns` is the attribute set of the first match; rows only carry those
/// attributes, and a row lacking one simply has no entry for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRows {
    pub columns: Vec<String>,
    pub rows: Vec<AttributeRow>,
}

impl AttributeRows {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Values of one column; empty when the column is not in the set.
    pub fn values(&self, name: &str) -> Vec<String> {
        if !self.has_column(name) {
            return Vec::new();
        }
        self.rows
            .iter()
            .filter_map(|row| row.get(name).cloned())
            .collect()
    }
}

impl<'input> OdmDocument<'input> {
    /// Elements matching `path`, in document order.
    pub fn iterate<'a>(
        &'a self,
        path: &str,
    ) -> Result<impl Iterator<Item = Node<'a, 'input>> + use<'a, 'input>> {
        Ok(self.select(path)?.into_iter())
    }

    /// One row per matching element; empty when nothing matches.
    pub fn find_all_attributes(&self, path: &str) -> Result<AttributeRows> {
        let nodes = self.select(path)?;
        let Some(first) = nodes.first() else {
            return Ok(AttributeRows::default());
        };
        let columns: Vec<String> = first
            .attributes()
            .map(|attribute| self.attribute_key(&attribute))
            .collect();
        let wanted: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
        let rows = nodes
            .iter()
            .map(|node| {
                node.attributes()
                    .map(|attribute| (self.attribute_key(&attribute), attribute.value()))
                    .filter(|(key, _)| wanted.contains(key.as_str()))
                    .map(|(key, value)| (key, value.to_string()))
                    .collect()
            })
            .collect();
        Ok(AttributeRows { columns, rows })
    }

    /// Attributes of the first matching element.
    pub fn find_one_attributes(&self, path: &str) -> Result<Option<AttributeRow>> {
        Ok(self.iterate(path)?.next().map(|node| {
            node.attributes()
                .map(|attribute| (self.attribute_key(&attribute), attribute.value().to_string()))
                .collect()
        }))
    }

    /// One attribute across all matches; empty if the first match lacks it.
    pub fn values_of(&self, path: &str, attribute: &str) -> Result<Vec<String>> {
        Ok(self.find_all_attributes(path)?.values(attribute))
    }

    pub fn value_of(&self, path: &str, attribute: &str) -> Result<Option<String>> {
        Ok(self.values_of(path, attribute)?.into_iter().next())
    }

    fn select<'a>(&'a self, path: &str) -> Result<Vec<Node<'a, 'input>>> {
        let query = QueryPath::parse(path)?;
        if let Some(prefix) = query
            .prefixes()
            .find(|prefix| self.resolve_prefix(Some(*prefix)).is_none())
        {
            return Err(IngestError::UnknownPrefix {
                path: path.to_string(),
                prefix: prefix.to_string(),
            });
        }

        let mut current = vec![self.root()];
        for step in &query.steps {
            let mut seen: BTreeSet<u32> = BTreeSet::new();
            let mut next = Vec::new();
            for context in &current {
                let candidates: Box<dyn Iterator<Item = Node<'a, 'input>> + 'a> = match step.axis {
                    Axis::Child => Box::new(context.children()),
                    Axis::Descendant => Box::new(context.descendants().skip(1)),
                };
                for node in candidates {
                    if node.is_element()
                        && self.step_matches(step, node)
                        && seen.insert(node.id().get())
                    {
                        next.push(node);
                    }
                }
            }
            next.sort_by_key(|node| node.id().get());
            current = next;
            if current.is_empty() {
                break;
            }
        }
        Ok(current)
    }

    fn step_matches(&self, step: &Step, node: Node<'_, '_>) -> bool {
        let name_matches = match &step.name {
            NameTest::Any => true,
            NameTest::Name(qname) => {
                node.tag_name().name() == qname.local
                    && node.tag_name().namespace() == self.resolve_prefix(qname.prefix.as_deref())
            }
        };
        name_matches
            && step
                .predicates
                .iter()
                .all(|predicate| self.predicate_matches(predicate, node))
    }

    fn predicate_matches(&self, predicate: &Predicate, node: Node<'_, '_>) -> bool {
        self.attribute(node, &predicate.attribute) == Some(predicate.value.as_str())
    }

    /// Un-prefixed attribute names refer to attributes without a namespace.
    fn attribute<'a>(&self, node: Node<'a, '_>, name: &QName) -> Option<&'a str> {
        match name.prefix.as_deref() {
            None => node.attribute(name.local.as_str()),
            Some(prefix) => {
                let ns = self.resolve_prefix(Some(prefix))?;
                node.attribute((ns, name.local.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ODM xmlns="http://www.cdisc.org/ns/odm/v1.3" xmlns:redcap="https://projectredcap.org">
  <Study OID="Project.Test">
    <MetaDataVersion OID="Metadata.Test">
      <FormDef OID="Form.demographics" Name="Demographics" redcap:FormName="demographics"/>
      <FormDef OID="Form.visit" Name="Visit" redcap:FormName="visit" Repeating="No"/>
      <ItemGroupDef OID="demographics.record_id" Name="Demographics">
        <ItemRef ItemOID="record_id" Mandatory="No"/>
        <ItemRef ItemOID="age" Mandatory="No"/>
      </ItemGroupDef>
    </MetaDataVersion>
  </Study>
</ODM>"#;

    fn doc() -> OdmDocument<'static> {
        OdmDocument::parse(XML, "https://projectredcap.org").expect("parse")
    }

    #[test]
    fn find_all_uses_first_match_columns() {
        let rows = doc().find_all_attributes(".//odm:FormDef").unwrap();
        assert_eq!(rows.columns, vec!["OID", "Name", "redcap:FormName"]);
        assert_eq!(rows.len(), 2);
        assert!(!rows.rows[1].contains_key("Repeating"));
        assert_eq!(rows.rows[1]["redcap:FormName"], "visit");
    }

    #[test]
    fn no_match_is_empty() {
        let doc = doc();
        assert!(doc.find_all_attributes(".//odm:ClinicalData").unwrap().is_empty());
        assert_eq!(doc.find_one_attributes(".//odm:ClinicalData").unwrap(), None);
        assert!(doc.values_of(".//odm:ClinicalData", "StudyOID").unwrap().is_empty());
    }

    #[test]
    fn values_of_missing_attribute_is_empty() {
        let doc = doc();
        assert!(doc.values_of(".//odm:FormDef", "Repeating").unwrap().is_empty());
        assert_eq!(
            doc.values_of(".//odm:FormDef", "redcap:FormName").unwrap(),
            vec!["demographics", "visit"]
        );
        assert_eq!(
            doc.value_of(".//odm:FormDef", "OID").unwrap().as_deref(),
            Some("Form.demographics")
        );
    }

    #[test]
    fn predicate_and_children_select_item_refs() {
        let refs = doc()
            .values_of(".//odm:ItemGroupDef[@OID='demographics.record_id']/", "ItemOID")
            .unwrap();
        assert_eq!(refs, vec!["record_id", "age"]);
    }

    #[test]
    fn redcap_predicate_matches_extension_attribute() {
        let row = doc()
            .find_one_attributes(".//odm:FormDef[@redcap:FormName='visit']")
            .unwrap()
            .expect("visit form");
        assert_eq!(row["OID"], "Form.visit");
    }

    #[test]
    fn child_path_starts_at_root() {
        let doc = doc();
        assert_eq!(doc.iterate("odm:Study").unwrap().count(), 1);
        assert_eq!(doc.iterate("odm:FormDef").unwrap().count(), 0);
        assert_eq!(doc.iterate("./odm:Study//odm:ItemRef").unwrap().count(), 2);
    }

    #[test]
    fn nested_contexts_yield_each_element_once() {
        let doc = doc();
        let refs: Vec<_> = doc
            .iterate(".//*//odm:ItemRef")
            .unwrap()
            .filter_map(|node| node.attribute("ItemOID"))
            .collect();
        assert_eq!(refs, vec!["record_id", "age"]);
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        assert!(matches!(
            doc().iterate(".//foo:FormDef").map(Iterator::count),
            Err(IngestError::UnknownPrefix { .. })
        ));
    }
}
