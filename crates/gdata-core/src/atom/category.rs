use crate::error::ParseError;
use crate::parsable::{Parsable, expect_element, required_attr};
use crate::xml::{Node, ns};

/// An `atom:category`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    term: String,
    scheme: Option<String>,
    label: Option<String>,
}

impl Category {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            scheme: None,
            label: None,
        }
    }

    /// The category identifying an entry's kind.
    pub fn kind(term: impl Into<String>) -> Self {
        Self::new(term).with_scheme(ns::KIND_SCHEME)
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_kind(&self) -> bool {
        self.scheme.as_deref() == Some(ns::KIND_SCHEME)
    }
}

impl Parsable for Category {
    const ELEMENT: &'static str = "category";

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        expect_element(node, ns::ATOM, Self::ELEMENT)?;
        Ok(Self {
            term: required_attr(node, "term")?.to_string(),
            scheme: node.attr("scheme").map(str::to_string),
            label: node.attr("label").map(str::to_string),
        })
    }

    fn to_node(&self) -> Node {
        let mut node = Node::new(ns::ATOM, Self::ELEMENT);
        if let Some(scheme) = &self.scheme {
            node.set_attr("scheme", scheme);
        }
        node.set_attr("term", &self.term);
        if let Some(label) = &self.label {
            node.set_attr("label", label);
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_category() {
        let xml = r#"<category xmlns="http://www.w3.org/2005/Atom" scheme="http://schemas.google.com/g/2005#kind" term="http://schemas.google.com/docs/2007#folder" label="folder"/>"#;
        let category = Category::from_xml(xml).unwrap();
        assert!(category.is_kind());
        assert_eq!(category.term(), "http://schemas.google.com/docs/2007#folder");
        assert_eq!(category.label(), Some("folder"));
    }

    #[test]
    fn term_is_required() {
        let xml = r#"<category xmlns="http://www.w3.org/2005/Atom" label="x"/>"#;
        assert_eq!(
            Category::from_xml(xml),
            Err(ParseError::missing("category", "term"))
        );
    }
}
