//! The generic entry model.

mod kind;
mod property;

pub use kind::{EntryType, kind_of};
pub(crate) use kind::json_kind_of;
pub use property::{Properties, Property, Visibility};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::atom::{Author, Category, Link, rel};
use crate::error::ParseError;
use crate::parsable::{
    JsonParsable, Parsable, expect_element, format_time, json_object, json_str, parse_time,
    set_once, text_element, unknown_members,
};
use crate::xml::{Attribute, Child, Node, ns};

/// Body of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Html(String),
    /// Inline XHTML; normally a single `div` in the [`ns::XHTML`] namespace.
    Xhtml(Vec<Node>),
    /// Inline content of any other media type, kept as read.
    Inline {
        content_type: String,
        children: Vec<Child>,
    },
    /// Out-of-line content referenced by URI.
    Source {
        src: String,
        content_type: Option<String>,
    },
}

impl Content {
    /// Inline text, or `None` for markup and out-of-line content.
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(t) | Content::Html(t) => Some(t),
            Content::Xhtml(_) | Content::Inline { .. } | Content::Source { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Content::Text(t) | Content::Html(t) => t.trim().is_empty(),
            Content::Xhtml(nodes) => nodes.is_empty(),
            Content::Inline { children, .. } => children
                .iter()
                .all(|c| matches!(c, Child::Text(t) if t.trim().is_empty())),
            Content::Source { src, .. } => src.is_empty(),
        }
    }

    fn from_node(node: &Node) -> Self {
        if let Some(src) = node.attr("src") {
            return Content::Source {
                src: src.to_string(),
                content_type: node.attr("type").map(str::to_string),
            };
        }
        match node.attr("type") {
            None | Some("text") => Content::Text(node.text()),
            Some("html") => Content::Html(node.text()),
            Some("xhtml") => Content::Xhtml(node.elements().cloned().collect()),
            Some(other) => Content::Inline {
                content_type: other.to_string(),
                children: node.children().to_vec(),
            },
        }
    }

    fn to_node(&self) -> Node {
        let mut node = Node::new(ns::ATOM, "content");
        match self {
            Content::Text(t) => node.attr_value("type", "text").text_value(t),
            Content::Html(t) => node.attr_value("type", "html").text_value(t),
            Content::Xhtml(nodes) => {
                node.set_attr("type", "xhtml");
                node.extend_children(nodes.iter().cloned().map(Child::Element));
                node
            }
            Content::Inline {
                content_type,
                children,
            } => {
                node.set_attr("type", content_type);
                node.extend_children(children.iter().cloned());
                node
            }
            Content::Source { src, content_type } => {
                if let Some(t) = content_type {
                    node.set_attr("type", t);
                }
                node.attr_value("src", src)
            }
        }
    }
}

/// A single remote resource.
///
/// `id`, `etag` and the timestamps are assigned by the server and are only
/// ever filled in by parsing a response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    id: Option<String>,
    etag: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    rights: Option<String>,
    content: Option<Content>,
    updated: Option<DateTime<Utc>>,
    published: Option<DateTime<Utc>>,
    authors: Vec<Author>,
    categories: Vec<Category>,
    links: Vec<Link>,
    properties: Properties,
    extensions: Vec<Node>,
    attributes: Vec<Attribute>,
    json_extra: Map<String, Value>,
}

const JSON_MEMBERS: &[&str] = &[
    "id",
    "etag",
    "title",
    "description",
    "updated",
    "published",
    "selfLink",
    "kind",
    "properties",
];

impl Entry {
    /// A new, uninserted entry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.set_title(title);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Drop the ETag; used by kinds whose service never supports one.
    pub(crate) fn clear_etag(&mut self) {
        self.etag = None;
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn set_summary(&mut self, summary: Option<String>) {
        self.summary = summary;
    }

    pub fn rights(&self) -> Option<&str> {
        self.rights.as_deref()
    }

    pub fn set_rights(&mut self, rights: Option<String>) {
        self.rights = rights;
    }

    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    pub fn set_content(&mut self, content: Option<Content>) {
        self.content = content;
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// Add `author` unless one with the same name is already present.
    pub fn add_author(&mut self, author: Author) {
        if !self.authors.iter().any(|a| a.name() == author.name()) {
            self.authors.push(author);
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Add `category` unless one with the same term is present. A kind
    /// category replaces the current kind.
    pub fn add_category(&mut self, category: Category) {
        if category.is_kind() {
            self.categories.retain(|c| !c.is_kind());
        } else if self.categories.iter().any(|c| c.term() == category.term()) {
            return;
        }
        self.categories.push(category);
    }

    /// Term of the kind category, if any.
    pub fn kind(&self) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.is_kind())
            .map(Category::term)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Add `link` unless one with the same relation and href is present.
    pub fn add_link(&mut self, link: Link) {
        if !self
            .links
            .iter()
            .any(|l| l.rel() == link.rel() && l.href() == link.href())
        {
            self.links.push(link);
        }
    }

    /// Remove links with the same relation and href. Returns whether any was removed.
    pub fn remove_link(&mut self, link: &Link) -> bool {
        let before = self.links.len();
        self.links
            .retain(|l| !(l.rel() == link.rel() && l.href() == link.href()));
        self.links.len() != before
    }

    /// First link with relation `rel`.
    pub fn look_up_link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.has_rel(rel))
    }

    pub fn look_up_links<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| l.has_rel(rel))
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Insert a property, or update the value of the one with the same key
    /// and visibility.
    pub fn add_property(&mut self, property: Property) {
        self.properties.add(property);
    }

    /// Remove the property matching `property`'s key and visibility. Absent
    /// properties are ignored.
    pub fn remove_property(&mut self, property: &Property) -> bool {
        self.properties.remove(property)
    }

    /// Extension elements this type does not model, in document order.
    pub fn extensions(&self) -> &[Node] {
        &self.extensions
    }

    pub fn push_extension(&mut self, node: Node) {
        self.extensions.push(node);
    }

    /// First extension element named `name` in `namespace`.
    pub fn extension(&self, namespace: &str, name: &str) -> Option<&Node> {
        self.extensions.iter().find(|n| n.is(namespace, name))
    }

    /// Remove every extension element named `name` in `namespace`, returning
    /// them in order. Entry kinds use this to claim the elements they model.
    pub(crate) fn take_extensions(&mut self, namespace: &str, name: &str) -> Vec<Node> {
        let (taken, kept) = std::mem::take(&mut self.extensions)
            .into_iter()
            .partition(|n| n.is(namespace, name));
        self.extensions = kept;
        taken
    }

    /// Remove the single extension element `name`, failing if it repeats.
    pub(crate) fn take_extension(
        &mut self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Node>, ParseError> {
        let mut taken = self.take_extensions(namespace, name);
        if taken.len() > 1 {
            return Err(ParseError::DuplicateElement {
                element: name.to_string(),
            });
        }
        Ok(taken.pop())
    }

    /// Attributes of the `entry` element other than `gd:etag`, such as
    /// `gd:kind` or `xml:lang`.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// A member of the JSON representation this type does not model.
    pub fn json_member(&self, key: &str) -> Option<&Value> {
        self.json_extra.get(key)
    }

    /// Whether the server has seen this entry.
    pub fn is_inserted(&self) -> bool {
        self.id.is_some() || self.updated.is_some()
    }

    /// Check the fields a server response must carry.
    pub fn validate_response(&self) -> Result<(), ParseError> {
        match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(()),
            _ => Err(ParseError::missing(Self::ELEMENT, "id")),
        }
    }
}

impl Parsable for Entry {
    const ELEMENT: &'static str = "entry";

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        expect_element(node, ns::ATOM, Self::ELEMENT)?;

        let mut entry = Entry {
            etag: node.ns_attr(ns::GD, "etag").map(str::to_string),
            attributes: node
                .attributes()
                .iter()
                .filter(|a| !(a.namespace.as_deref() == Some(ns::GD) && a.name == "etag"))
                .cloned()
                .collect(),
            ..Entry::default()
        };

        for child in node.elements() {
            if child.namespace() == Some(ns::ATOM) {
                match child.name() {
                    "title" => set_once(&mut entry.title, child.text(), "title")?,
                    "id" => set_once(&mut entry.id, child.text(), "id")?,
                    "updated" => {
                        set_once(&mut entry.updated, parse_time("updated", &child.text())?, "updated")?
                    }
                    "published" => set_once(
                        &mut entry.published,
                        parse_time("published", &child.text())?,
                        "published",
                    )?,
                    "summary" => set_once(&mut entry.summary, child.text(), "summary")?,
                    "rights" => set_once(&mut entry.rights, child.text(), "rights")?,
                    "content" => set_once(&mut entry.content, Content::from_node(child), "content")?,
                    "category" => entry.categories.push(Category::from_node(child)?),
                    "link" => entry.links.push(Link::from_node(child)?),
                    "author" => entry.authors.push(Author::from_node(child)?),
                    _ => entry.extensions.push(child.clone()),
                }
            } else if child.is(ns::DOCS, Property::ELEMENT) {
                entry.properties.add(Property::from_node(child)?);
            } else {
                entry.extensions.push(child.clone());
            }
        }

        Ok(entry)
    }

    fn to_node(&self) -> Node {
        let mut node = Node::new(ns::ATOM, Self::ELEMENT);
        if let Some(etag) = &self.etag {
            node.set_ns_attr(ns::GD, "etag", etag);
        }
        for attribute in &self.attributes {
            node.push_attribute(attribute.clone());
        }

        if let Some(title) = &self.title {
            node.push_child(text_element(ns::ATOM, "title", title));
        }
        if let Some(id) = &self.id {
            node.push_child(text_element(ns::ATOM, "id", id));
        }
        if let Some(updated) = &self.updated {
            node.push_child(text_element(ns::ATOM, "updated", format_time(updated)));
        }
        if let Some(published) = &self.published {
            node.push_child(text_element(ns::ATOM, "published", format_time(published)));
        }
        if let Some(summary) = &self.summary {
            node.push_child(text_element(ns::ATOM, "summary", summary));
        }
        if let Some(rights) = &self.rights {
            node.push_child(text_element(ns::ATOM, "rights", rights));
        }
        if let Some(content) = &self.content {
            node.push_child(content.to_node());
        }
        for category in &self.categories {
            node.push_child(category.to_node());
        }
        for link in &self.links {
            node.push_child(link.to_node());
        }
        for author in &self.authors {
            node.push_child(author.to_node());
        }
        for property in &self.properties {
            node.push_child(property.to_node());
        }
        for extension in &self.extensions {
            node.push_child(extension.clone());
        }
        node
    }
}

impl JsonParsable for Entry {
    fn from_json(value: &Value) -> Result<Self, ParseError> {
        let object = json_object(value, Self::ELEMENT)?;
        let time = |key: &str| -> Result<Option<DateTime<Utc>>, ParseError> {
            json_str(object, Self::ELEMENT, key)?
                .map(|t| parse_time(key, t))
                .transpose()
        };

        let mut entry = Entry {
            id: json_str(object, Self::ELEMENT, "id")?.map(str::to_string),
            etag: json_str(object, Self::ELEMENT, "etag")?.map(str::to_string),
            title: json_str(object, Self::ELEMENT, "title")?.map(str::to_string),
            summary: json_str(object, Self::ELEMENT, "description")?.map(str::to_string),
            updated: time("updated")?,
            published: time("published")?,
            json_extra: unknown_members(object, JSON_MEMBERS),
            ..Entry::default()
        };

        if let Some(href) = json_str(object, Self::ELEMENT, "selfLink")? {
            entry.links.push(Link::new(href, rel::SELF));
        }
        if let Some(kind) = json_str(object, Self::ELEMENT, "kind")? {
            entry.categories.push(Category::kind(kind));
        }
        if let Some(properties) = object.get("properties") {
            entry.properties = Properties::from_json(properties)?;
        }

        Ok(entry)
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();
        let mut put = |key: &str, value: Option<&str>| {
            if let Some(v) = value {
                object.insert(key.to_string(), Value::String(v.to_string()));
            }
        };
        put("id", self.id.as_deref());
        put("etag", self.etag.as_deref());
        put("title", self.title.as_deref());
        put("description", self.summary.as_deref());
        put("kind", self.kind());
        put("selfLink", self.look_up_link(rel::SELF).map(Link::href));
        if let Some(updated) = &self.updated {
            object.insert("updated".to_string(), Value::String(format_time(updated)));
        }
        if let Some(published) = &self.published {
            object.insert("published".to_string(), Value::String(format_time(published)));
        }
        if !self.properties.is_empty() {
            object.insert("properties".to_string(), self.properties.to_json());
        }
        for (k, v) in &self.json_extra {
            object.insert(k.clone(), v.clone());
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ENTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <entry xmlns="http://www.w3.org/2005/Atom"
               xmlns:gd="http://schemas.google.com/g/2005"
               xmlns:docs="http://schemas.google.com/docs/2007"
               xmlns:x="urn:example:ext"
               gd:etag="&quot;Ck8GRH8-fSp7ImA9WhRTEko.&quot;">
            <id>http://example.com/entries/1</id>
            <title>Holiday photos</title>
            <updated>2009-04-26T14:00:00Z</updated>
            <category scheme="http://schemas.google.com/g/2005#kind"
                      term="http://schemas.google.com/docs/2007#document"/>
            <link rel="edit" href="http://example.com/entries/1/edit"/>
            <link rel="self" href="http://example.com/entries/1"/>
            <author><name>Ann</name><email>ann@example.com</email></author>
            <content type="html">&lt;p&gt;hi&lt;/p&gt;</content>
            <docs:property key="color" visibility="PRIVATE" value="blue"/>
            <x:rating stars="4">good</x:rating>
        </entry>"#;

    #[test]
    fn parses_well_known_fields() {
        let entry = Entry::from_xml(ENTRY).unwrap();
        assert_eq!(entry.id(), Some("http://example.com/entries/1"));
        assert_eq!(entry.etag(), Some("\"Ck8GRH8-fSp7ImA9WhRTEko.\""));
        assert_eq!(entry.title(), Some("Holiday photos"));
        assert_eq!(entry.content(), Some(&Content::Html("<p>hi</p>".to_string())));
        assert_eq!(entry.kind(), Some("http://schemas.google.com/docs/2007#document"));
        assert_eq!(
            entry.look_up_link(rel::EDIT).map(Link::href),
            Some("http://example.com/entries/1/edit")
        );
        assert_eq!(entry.authors()[0].email(), Some("ann@example.com"));
        assert_eq!(
            entry.properties().get("color", Visibility::Private).and_then(Property::value),
            Some("blue")
        );
        assert!(entry.is_inserted());
        assert!(entry.validate_response().is_ok());
    }

    #[test]
    fn extensions_survive_round_trip() {
        let entry = Entry::from_xml(ENTRY).unwrap();
        assert_eq!(entry.extensions().len(), 1);
        let rating = entry.extension("urn:example:ext", "rating").unwrap();
        assert_eq!(rating.attr("stars"), Some("4"));

        let xml = entry.to_xml();
        assert!(xml.contains(r#"<x:rating xmlns:x="urn:example:ext" stars="4">good</x:rating>"#));
        assert_eq!(Entry::from_xml(&xml).unwrap(), entry);
    }

    #[test]
    fn serializes_in_schema_order() {
        let entry = Entry::from_xml(ENTRY).unwrap();
        let names: Vec<_> = entry.to_node().elements().map(|n| n.name().to_string()).collect();
        assert_eq!(
            names,
            [
                "title", "id", "updated", "content", "category", "link", "link", "author",
                "property", "rating"
            ]
        );
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><updated>soon</updated></entry>"#;
        assert!(matches!(Entry::from_xml(xml), Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><id>a</id><id>b</id></entry>"#;
        assert_eq!(
            Entry::from_xml(xml),
            Err(ParseError::DuplicateElement {
                element: "id".to_string()
            })
        );
    }

    #[test]
    fn response_entries_need_an_id() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>t</title></entry>"#;
        let entry = Entry::from_xml(xml).unwrap();
        assert!(!entry.is_inserted());
        assert_eq!(
            entry.validate_response(),
            Err(ParseError::missing("entry", "id"))
        );
    }

    #[test]
    fn local_entry_round_trips() {
        let mut entry = Entry::new().with_title("Draft");
        entry.set_content(Some(Content::Text("body".to_string())));
        entry.add_author(Author::new("Ann").with_email("ann@example.com"));
        entry.add_category(Category::new("draft").with_scheme("http://example.com/labels"));
        entry.add_property(Property::new("k").with_value("v"));

        let back = Entry::from_xml(&entry.to_xml()).unwrap();
        assert_eq!(back, entry);
        assert!(!back.is_inserted());
    }

    #[test]
    fn out_of_line_content() {
        let mut entry = Entry::new();
        entry.set_content(Some(Content::Source {
            src: "http://example.com/blob".to_string(),
            content_type: None,
        }));
        let node = entry.to_node();
        let content = node.child(ns::ATOM, "content").unwrap();
        assert_eq!(content.attr("type"), None);
        assert_eq!(content.attr("src"), Some("http://example.com/blob"));
        assert_eq!(Entry::from_xml(&entry.to_xml()).unwrap(), entry);
    }

    #[test]
    fn every_content_form_round_trips() {
        let div = Node::with_prefix(Some(ns::XHTML.to_string()), None, "div")
            .child_node(Node::with_prefix(Some(ns::XHTML.to_string()), None, "p").text_value("Hello"));
        let forms = [
            Content::Text("plain & simple".to_string()),
            Content::Text(String::new()),
            Content::Html("<p>hi</p>".to_string()),
            Content::Xhtml(vec![div]),
            Content::Inline {
                content_type: "image/png".to_string(),
                children: vec![Child::Text("iVBORw0KGgo=".to_string())],
            },
            Content::Source {
                src: "http://example.com/blob".to_string(),
                content_type: Some("image/jpeg".to_string()),
            },
            Content::Source {
                src: "http://example.com/blob".to_string(),
                content_type: None,
            },
        ];

        for content in forms {
            let mut entry = Entry::new();
            entry.set_content(Some(content));
            assert_eq!(Entry::from_xml(&entry.to_xml()).unwrap(), entry);
        }
    }

    #[test]
    fn xhtml_content_keeps_markup() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
            <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><p>Hello</p></div></content>
        </entry>"#;
        let entry = Entry::from_xml(xml).unwrap();
        let Some(Content::Xhtml(nodes)) = entry.content() else {
            panic!("expected xhtml content, got {:?}", entry.content());
        };
        assert!(nodes[0].is(ns::XHTML, "div"));
        assert_eq!(nodes[0].child(ns::XHTML, "p").unwrap().text(), "Hello");

        let out = entry.to_xml();
        assert!(out.contains(r#"<content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><p>Hello</p></div></content>"#));
    }

    #[test]
    fn whitespace_values_survive() {
        let mut entry = Entry::new().with_title("  ");
        entry.set_summary(Some(" ".to_string()));
        entry.set_content(Some(Content::Text("\n".to_string())));
        assert_eq!(Entry::from_xml(&entry.to_xml()).unwrap(), entry);
    }

    #[test]
    fn unknown_entry_attributes_survive() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005"
                gd:etag="W/&quot;1&quot;" gd:kind="docs#document" gd:fields="title" xml:lang="en">
            <title>t</title>
        </entry>"#;
        let entry = Entry::from_xml(xml).unwrap();
        assert_eq!(entry.etag(), Some("W/\"1\""));
        let names: Vec<_> = entry.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["kind", "fields", "lang"]);

        let out = entry.to_xml();
        assert!(out.contains(r#"gd:kind="docs#document""#));
        assert!(out.contains(r#"xml:lang="en""#));
        assert_eq!(Entry::from_xml(&out).unwrap(), entry);
    }

    #[test]
    fn de_duplication_rules() {
        let mut entry = Entry::new();
        entry.add_author(Author::new("Ann"));
        entry.add_author(Author::new("Ann").with_email("other@example.com"));
        assert_eq!(entry.authors().len(), 1);

        entry.add_category(Category::new("a"));
        entry.add_category(Category::new("a").with_label("again"));
        entry.add_category(Category::kind("http://schemas.google.com/docs/2007#document"));
        entry.add_category(Category::kind("http://schemas.google.com/docs/2007#folder"));
        assert_eq!(entry.categories().len(), 2);
        assert_eq!(entry.kind(), Some("http://schemas.google.com/docs/2007#folder"));

        let link = Link::new("http://x", rel::ALTERNATE);
        entry.add_link(link.clone());
        entry.add_link(link.clone());
        assert_eq!(entry.links().len(), 1);
        assert!(entry.remove_link(&link));
        assert!(!entry.remove_link(&link));
    }

    #[test]
    fn json_representation() {
        let value = json!({
            "id": "abc",
            "title": "Report",
            "description": "quarterly",
            "etag": "\"e1\"",
            "kind": "drive#file",
            "selfLink": "https://example.com/files/abc",
            "updated": "2013-01-01T00:00:00Z",
            "mimeType": "text/plain",
            "properties": [{"key": "k", "visibility": "PUBLIC", "value": "v"}]
        });

        let entry = Entry::from_json(&value).unwrap();
        assert_eq!(entry.summary(), Some("quarterly"));
        assert_eq!(entry.kind(), Some("drive#file"));
        assert_eq!(entry.properties().len(), 1);
        assert_eq!(entry.to_json(), value);
    }
}
