//! Loads an ODM file and discovers its default namespace.

use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Raw text of an ODM export. The parsed [`OdmDocument`] borrows from it.
#[derive(Debug, Clone)]
pub struct OdmSource {
    pub path: PathBuf,
    pub text: String,
}

impl OdmSource {
    /// Reads `path` fully into memory.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(IngestError::NoFile {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = text.len(), "read ODM file");
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    pub fn parse(&self, redcap_namespace: &str) -> Result<OdmDocument<'_>> {
        OdmDocument::parse_named(
            &self.text,
            &self.path.display().to_string(),
            redcap_namespace,
        )
    }
}

/// A parsed ODM document with its namespace map.
///
/// The default namespace is taken from the root tag and bound to the `odm`
/// prefix; the REDCap extension namespace is always bound to `redcap`.
pub struct OdmDocument<'input> {
    doc: Document<'input>,
    namespace: String,
    redcap_namespace: String,
}

impl<'input> OdmDocument<'input> {
    pub fn parse(text: &'input str, redcap_namespace: &str) -> Result<Self> {
        Self::parse_named(text, "<input>", redcap_namespace)
    }

    fn parse_named(text: &'input str, origin: &str, redcap_namespace: &str) -> Result<Self> {
        let doc = Document::parse(text).map_err(|source| IngestError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        let namespace = namespace_from_tag(&clark_name(doc.root_element()))?.to_string();
        debug!(namespace = %namespace, "resolved ODM namespace");
        Ok(Self {
            doc,
            namespace,
            redcap_namespace: redcap_namespace.to_string(),
        })
    }

    /// Default namespace URI of the document.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn redcap_namespace(&self) -> &str {
        &self.redcap_namespace
    }

    pub fn root<'a>(&'a self) -> Node<'a, 'input> {
        self.doc.root_element()
    }

    /// Resolves a query prefix; `None` and `odm` both mean the default namespace.
    pub fn resolve_prefix(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            None | Some("odm") => Some(&self.namespace),
            Some("redcap") => Some(&self.redcap_namespace),
            Some(_) => None,
        }
    }

    /// True when `node` is an element `local` in the default namespace.
    pub fn is_element(&self, node: Node<'_, '_>, local: &str) -> bool {
        node.is_element()
            && node.tag_name().name() == local
            && node.tag_name().namespace() == Some(self.namespace.as_str())
    }

    /// Element children of `node` named `local` in the default namespace.
    pub fn children<'a>(
        &'a self,
        node: Node<'a, 'input>,
        local: &'a str,
    ) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
        node.children()
            .filter(move |child| self.is_element(*child, local))
    }

    /// Trimmed `<container><TranslatedText>` text of the first `container` child.
    pub fn translated_text(&self, node: Node<'_, 'input>, container: &str) -> Option<String> {
        let container = self.children(node, container).next()?;
        self.children(container, "TranslatedText")
            .next()
            .and_then(|text| text.text())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// Attribute in the REDCap extension namespace.
    pub fn redcap_attribute<'a>(&self, node: Node<'a, 'input>, name: &str) -> Option<&'a str> {
        node.attribute((self.redcap_namespace.as_str(), name))
    }

    /// Row key for an attribute: bare for un-namespaced attributes,
    /// `redcap:`/`odm:` for bound namespaces, `{uri}name` otherwise.
    pub fn attribute_key(&self, attribute: &roxmltree::Attribute<'_, '_>) -> String {
        match attribute.namespace() {
            None => attribute.name().to_string(),
            Some(ns) if ns == self.redcap_namespace => format!("redcap:{}", attribute.name()),
            Some(ns) if ns == self.namespace => format!("odm:{}", attribute.name()),
            Some(ns) => format!("{{{ns}}}{}", attribute.name()),
        }
    }
}

/// `{uri}local` form of an element name.
fn clark_name(node: Node<'_, '_>) -> String {
    let tag = node.tag_name();
    match tag.namespace() {
        Some(ns) => format!("{{{ns}}}{}", tag.name()),
        None => tag.name().to_string(),
    }
}

/// Extracts `uri` from a qualified tag `{uri}local`.
pub fn namespace_from_tag(tag: &str) -> Result<&str> {
    tag.strip_prefix('{')
        .and_then(|rest| rest.rfind('}').map(|end| &rest[..end]))
        .filter(|uri| !uri.is_empty())
        .ok_or_else(|| IngestError::Namespace {
            tag: tag.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_namespace_from_qualified_tag() {
        assert_eq!(
            namespace_from_tag("{http://www.cdisc.org/ns/odm/v1.3}ODM").unwrap(),
            "http://www.cdisc.org/ns/odm/v1.3"
        );
    }

    #[test]
    fn rejects_unqualified_tag() {
        assert!(matches!(
            namespace_from_tag("ODM"),
            Err(IngestError::Namespace { .. })
        ));
        assert!(matches!(
            namespace_from_tag("{}ODM"),
            Err(IngestError::Namespace { .. })
        ));
    }

    #[test]
    fn document_without_namespace_fails() {
        let result = OdmDocument::parse("<ODM><Study/></ODM>", "https://projectredcap.org");
        assert!(matches!(result, Err(IngestError::Namespace { .. })));
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let result = OdmDocument::parse("<ODM><Study></ODM>", "https://projectredcap.org");
        assert!(matches!(result, Err(IngestError::Parse { .. })));
    }

    #[test]
    fn redcap_namespace_is_fixed_regardless_of_document() {
        let xml = r#"<ODM xmlns="urn:other" xmlns:redcap="https://projectredcap.org"/>"#;
        let doc = OdmDocument::parse(xml, "https://projectredcap.org").unwrap();
        assert_eq!(doc.namespace(), "urn:other");
        assert_eq!(doc.resolve_prefix(Some("redcap")), Some("https://projectredcap.org"));
        assert_eq!(doc.resolve_prefix(Some("odm")), Some("urn:other"));
        assert_eq!(doc.resolve_prefix(Some("x")), None);
    }
}
