use crate::error::ParseError;
use crate::parsable::{Parsable, expect_element, set_once, text_element};
use crate::xml::{Node, ns};

/// An `atom:author` person construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    name: String,
    uri: Option<String>,
    email: Option<String>,
    extensions: Vec<Node>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: None,
            email: None,
            extensions: Vec::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Child elements other than `name`, `uri` and `email`, such as
    /// `gphoto:user`.
    pub fn extensions(&self) -> &[Node] {
        &self.extensions
    }

    pub fn push_extension(&mut self, node: Node) {
        self.extensions.push(node);
    }
}

impl Parsable for Author {
    const ELEMENT: &'static str = "author";

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        expect_element(node, ns::ATOM, Self::ELEMENT)?;

        let mut name = None;
        let mut uri = None;
        let mut email = None;
        let mut extensions = Vec::new();
        for child in node.elements() {
            match (child.namespace(), child.name()) {
                (Some(ns::ATOM), "name") => set_once(&mut name, child.text(), "name")?,
                (Some(ns::ATOM), "uri") => set_once(&mut uri, child.text(), "uri")?,
                (Some(ns::ATOM), "email") => set_once(&mut email, child.text(), "email")?,
                _ => extensions.push(child.clone()),
            }
        }

        let name = name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ParseError::missing(Self::ELEMENT, "name"))?;

        Ok(Self {
            name,
            uri,
            email,
            extensions,
        })
    }

    fn to_node(&self) -> Node {
        let mut node = Node::new(ns::ATOM, Self::ELEMENT);
        node.push_child(text_element(ns::ATOM, "name", &self.name));
        if let Some(uri) = &self.uri {
            node.push_child(text_element(ns::ATOM, "uri", uri));
        }
        if let Some(email) = &self.email {
            node.push_child(text_element(ns::ATOM, "email", email));
        }
        for extension in &self.extensions {
            node.push_child(extension.clone());
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        let xml = r#"<author xmlns="http://www.w3.org/2005/Atom"><email>a@b.c</email></author>"#;
        assert_eq!(
            Author::from_xml(xml),
            Err(ParseError::missing("author", "name"))
        );
    }

    #[test]
    fn parses_all_fields() {
        let xml = r#"<author xmlns="http://www.w3.org/2005/Atom"><name>Ann</name><uri>http://a</uri><email>ann@example.com</email></author>"#;
        let author = Author::from_xml(xml).unwrap();
        assert_eq!(
            author,
            Author::new("Ann")
                .with_uri("http://a")
                .with_email("ann@example.com")
        );
        assert_eq!(Author::from_node(&author.to_node()).unwrap(), author);
    }

    #[test]
    fn extension_children_survive() {
        let xml = r#"<author xmlns="http://www.w3.org/2005/Atom" xmlns:gphoto="http://schemas.google.com/photos/2007"
                xmlns:gd="http://schemas.google.com/g/2005">
            <name>Ann</name><gphoto:user>ann123</gphoto:user><gd:email address="ann@example.com"/>
        </author>"#;
        let author = Author::from_xml(xml).unwrap();
        assert_eq!(author.extensions().len(), 2);
        assert_eq!(author.extensions()[0].text(), "ann123");

        let out = author.to_xml();
        assert!(out.contains(r#"<gphoto:user xmlns:gphoto="http://schemas.google.com/photos/2007">ann123</gphoto:user>"#));
        assert_eq!(Author::from_xml(&out).unwrap(), author);
    }
}
