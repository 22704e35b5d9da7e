//! Namespaced element tree.

use super::ns;

/// An attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI; `None` for plain attributes.
    pub namespace: Option<String>,
    /// Prefix the attribute was read with, or should be written with.
    pub prefix: Option<String>,
    /// Local name.
    pub name: String,
    /// Unescaped value.
    pub value: String,
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Element(Node),
    Text(String),
}

/// An XML element with its namespace, attributes and children.
///
/// Elements this library does not understand are kept as `Node`s so they
/// survive a parse/serialize round trip untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    namespace: Option<String>,
    prefix: Option<String>,
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Child>,
}

impl Node {
    /// Create an element in `namespace`, using the namespace's conventional prefix.
    pub fn new(namespace: &str, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            prefix: ns::preferred_prefix(namespace).map(str::to_string),
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element with an explicit prefix (used by the reader).
    pub fn with_prefix(
        namespace: Option<String>,
        prefix: Option<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace,
            prefix,
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if this element is `name` in `namespace`.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.name == name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Iterate over child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| match c {
            Child::Element(n) => Some(n),
            Child::Text(_) => None,
        })
    }

    /// First child element matching `namespace` and `name`.
    pub fn child(&self, namespace: &str, name: &str) -> Option<&Node> {
        self.elements().find(|n| n.is(namespace, name))
    }

    /// Concatenated text content of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Child::Text(t) => Some(t.as_str()),
                Child::Element(_) => None,
            })
            .collect()
    }

    /// Value of an un-namespaced attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Value of a namespaced attribute.
    pub fn ns_attr(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn push_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.push_attribute(Attribute {
            namespace: None,
            prefix: None,
            name: name.to_string(),
            value: value.into(),
        });
    }

    pub fn set_ns_attr(&mut self, namespace: &str, name: &str, value: impl Into<String>) {
        self.push_attribute(Attribute {
            namespace: Some(namespace.to_string()),
            prefix: ns::preferred_prefix(namespace).map(str::to_string),
            name: name.to_string(),
            value: value.into(),
        });
    }

    pub fn push_child(&mut self, node: Node) {
        self.children.push(Child::Element(node));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Child::Text(text.into()));
    }

    pub fn extend_children(&mut self, children: impl IntoIterator<Item = Child>) {
        self.children.extend(children);
    }

    /// Keep only the child elements `keep` accepts. Text is untouched.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Node) -> bool) {
        self.children.retain(|c| match c {
            Child::Element(n) => keep(n),
            Child::Text(_) => true,
        });
    }

    /// Drop whitespace-only text if the element also has child elements;
    /// that text is layout, not content.
    pub(crate) fn trim_layout_text(&mut self) {
        if self.elements().next().is_some() {
            self.children
                .retain(|c| !matches!(c, Child::Text(t) if t.trim().is_empty()));
        }
    }

    /// Builder form of [`Node::set_attr`].
    pub fn attr_value(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder form of [`Node::push_text`].
    pub fn text_value(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    /// Builder form of [`Node::push_child`].
    pub fn child_node(mut self, node: Node) -> Self {
        self.push_child(node);
        self
    }
}
