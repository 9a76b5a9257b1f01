//! Typed readers for the ODM elements the conversion needs.

use indexmap::{IndexMap, IndexSet};
use roxmltree::Node;
use tracing::debug;

use emx2_model::{
    CodeList, CodeListItem, FormData, FormDef, ItemData, ItemDef, ItemGroupDef, SourceType,
    SubjectData,
};

use crate::document::OdmDocument;
use crate::error::{IngestError, Result};

/// Where `FormData` sits beneath `SubjectData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLayout {
    /// `SubjectData/FormData`.
    Flat,
    /// `SubjectData/StudyEventData/FormData`, used by longitudinal projects.
    Events,
}

/// Default occurrence when `FormData` carries no `FormRepeatKey`.
pub const DEFAULT_FORM_REPEAT_KEY: &str = "1";

impl<'input> OdmDocument<'input> {
    /// `FormDef` elements in document order.
    pub fn form_defs(&self) -> Result<Vec<FormDef>> {
        self.iterate(".//odm:FormDef")?
            .map(|node| {
                Ok(FormDef {
                    oid: required(node, "OID", node.attribute("OID"))?,
                    form_name: required(
                        node,
                        "redcap:FormName",
                        self.redcap_attribute(node, "FormName"),
                    )?,
                })
            })
            .collect()
    }

    /// `ItemGroupDef` elements with their `ItemRef` OIDs.
    pub fn item_group_defs(&self) -> Result<Vec<ItemGroupDef>> {
        self.iterate(".//odm:ItemGroupDef")?
            .map(|node| {
                let oid = required(node, "OID", node.attribute("OID"))?;
                let item_refs = self
                    .children(node, "ItemRef")
                    .map(|item_ref| required(item_ref, "ItemOID", item_ref.attribute("ItemOID")))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ItemGroupDef { oid, item_refs })
            })
            .collect()
    }

    /// `ItemDef` elements keyed by OID. A repeated OID keeps its first definition.
    pub fn item_defs(&self) -> Result<IndexMap<String, ItemDef>> {
        let mut defs = IndexMap::new();
        for node in self.iterate(".//odm:ItemDef")? {
            let oid = required(node, "OID", node.attribute("OID"))?;
            let source = SourceType {
                data_type: node.attribute("DataType").map(str::to_string),
                field_type: self.redcap_attribute(node, "FieldType").map(str::to_string),
                text_validation_type: self
                    .redcap_attribute(node, "TextValidationType")
                    .map(str::to_string),
            };
            let field_note = self.redcap_attribute(node, "FieldNote").map(str::to_string);
            let code_list_oid = self
                .children(node, "CodeListRef")
                .find_map(|code_list| code_list.attribute("CodeListOID"))
                .map(str::to_string);
            defs.entry(oid.clone()).or_insert(ItemDef {
                oid,
                field_note,
                question: self.translated_text(node, "Question"),
                code_list_oid,
                source,
            });
        }
        debug!(count = defs.len(), "read item definitions");
        Ok(defs)
    }

    /// `CodeList` elements keyed by OID. A repeated OID keeps its first definition.
    pub fn code_lists(&self) -> Result<IndexMap<String, CodeList>> {
        let mut lists = IndexMap::new();
        for node in self.iterate(".//odm:CodeList")? {
            let oid = required(node, "OID", node.attribute("OID"))?;
            let items = self
                .children(node, "CodeListItem")
                .map(|item| {
                    Ok(CodeListItem {
                        coded_value: required(item, "CodedValue", item.attribute("CodedValue"))?,
                        decode: self.translated_text(item, "Decode"),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let checkbox_choices = self
                .redcap_attribute(node, "CheckboxChoices")
                .map(str::to_string);
            lists.entry(oid.clone()).or_insert(CodeList {
                oid,
                items,
                checkbox_choices,
            });
        }
        debug!(count = lists.len(), "read code lists");
        Ok(lists)
    }

    /// True when a `ClinicalData` element with a non-empty `StudyOID` exists.
    pub fn has_clinical_data(&self) -> Result<bool> {
        Ok(self
            .value_of(".//odm:ClinicalData", "StudyOID")?
            .is_some_and(|study_oid| !study_oid.is_empty()))
    }

    pub fn data_layout(&self) -> Result<DataLayout> {
        let events = self
            .iterate(".//odm:SubjectData/odm:StudyEventData")?
            .next()
            .is_some();
        Ok(if events {
            DataLayout::Events
        } else {
            DataLayout::Flat
        })
    }

    /// FormNames declared as repeating instruments.
    pub fn repeating_instruments(&self) -> Result<IndexSet<String>> {
        Ok(self
            .values_of(".//redcap:RepeatingInstrument", "redcap:RepeatInstrument")?
            .into_iter()
            .collect())
    }

    /// Every `SubjectData` under `ClinicalData`, read with the given layout.
    pub fn subject_data(&self, layout: DataLayout) -> Result<Vec<SubjectData>> {
        self.iterate(".//odm:ClinicalData/odm:SubjectData")?
            .map(|node| self.read_subject(node, layout))
            .collect()
    }

    fn read_subject(&self, node: Node<'_, 'input>, layout: DataLayout) -> Result<SubjectData> {
        let subject_key = required(node, "SubjectKey", node.attribute("SubjectKey"))?;
        let forms = match layout {
            DataLayout::Flat => self
                .children(node, "FormData")
                .map(|form| self.read_form(form))
                .collect::<Result<Vec<_>>>()?,
            DataLayout::Events => self
                .children(node, "StudyEventData")
                .flat_map(|event| self.children(event, "FormData"))
                .map(|form| self.read_form(form))
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(SubjectData { subject_key, forms })
    }

    /// `ItemData` may sit inside `ItemGroupData` or directly under `FormData`.
    fn read_form(&self, node: Node<'_, 'input>) -> Result<FormData> {
        let form_oid = required(node, "FormOID", node.attribute("FormOID"))?;
        let form_repeat_key = node
            .attribute("FormRepeatKey")
            .unwrap_or(DEFAULT_FORM_REPEAT_KEY)
            .to_string();
        let mut items = Vec::new();
        for child in node.children().filter(Node::is_element) {
            if self.is_element(child, "ItemGroupData") {
                for item in self.children(child, "ItemData") {
                    items.push(read_item(item)?);
                }
            } else if self.is_element(child, "ItemData") {
                items.push(read_item(child)?);
            }
        }
        Ok(FormData {
            form_oid,
            form_repeat_key,
            items,
        })
    }
}

fn read_item(node: Node<'_, '_>) -> Result<ItemData> {
    Ok(ItemData {
        item_oid: required(node, "ItemOID", node.attribute("ItemOID"))?,
        value: node.attribute("Value").map(str::to_string),
    })
}

fn required(node: Node<'_, '_>, attribute: &str, value: Option<&str>) -> Result<String> {
    value
        .map(str::to_string)
        .ok_or_else(|| IngestError::missing_attribute(node.tag_name().name(), attribute))
}
