//! One page of query results.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::atom::{Author, Category, Link, rel};
use crate::entry::{EntryType, json_kind_of, kind_of};
use crate::error::ParseError;
use crate::parsable::{
    JsonParsable, Parsable, expect_element, format_time, json_object, json_str, parse_time,
    parse_u64, set_once, text_element,
};
use crate::xml::{Node, ns};

/// A page of entries plus paging metadata. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed<E> {
    id: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    etag: Option<String>,
    updated: Option<DateTime<Utc>>,
    generator: Option<String>,
    links: Vec<Link>,
    authors: Vec<Author>,
    categories: Vec<Category>,
    total_results: Option<u64>,
    start_index: Option<u64>,
    items_per_page: Option<u64>,
    next_page_token: Option<String>,
    entries: Vec<E>,
}

impl<E> Feed<E> {
    /// A feed with no entries and no paging links.
    pub fn empty() -> Self {
        Self {
            id: None,
            title: None,
            subtitle: None,
            etag: None,
            updated: None,
            generator: None,
            links: Vec::new(),
            authors: Vec::new(),
            categories: Vec::new(),
            total_results: None,
            start_index: None,
            items_per_page: None,
            next_page_token: None,
            entries: Vec::new(),
        }
    }

    /// A feed holding `entries`.
    pub fn with_entries(entries: Vec<E>) -> Self {
        Self {
            entries,
            ..Self::empty()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    pub fn generator(&self) -> Option<&str> {
        self.generator.as_deref()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Total matches across all pages, as reported by the server.
    pub fn total_results(&self) -> Option<u64> {
        self.total_results
    }

    pub fn start_index(&self) -> Option<u64> {
        self.start_index
    }

    pub fn items_per_page(&self) -> Option<u64> {
        self.items_per_page
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<E> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn look_up_link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.has_rel(rel))
    }

    pub fn next_link(&self) -> Option<&Link> {
        self.look_up_link(rel::NEXT)
    }

    pub fn previous_link(&self) -> Option<&Link> {
        self.look_up_link(rel::PREVIOUS)
    }

    /// Where new entries for this feed are inserted.
    pub fn post_link(&self) -> Option<&Link> {
        self.look_up_link(rel::POST)
    }

    /// Where batch operations on this feed's entries are sent.
    pub fn batch_link(&self) -> Option<&Link> {
        self.look_up_link(rel::BATCH)
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_paging(mut self, total_results: u64, start_index: u64, items_per_page: u64) -> Self {
        self.total_results = Some(total_results);
        self.start_index = Some(start_index);
        self.items_per_page = Some(items_per_page);
        self
    }

    pub fn with_next_page_token(mut self, token: impl Into<String>) -> Self {
        self.next_page_token = Some(token.into());
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// Whether an entry of `kind` belongs in a feed of `E`. Errors for strict
/// entry types.
fn accept<E: EntryType>(kind: Option<&str>) -> Result<bool, ParseError> {
    if E::accepts_kind(kind) {
        return Ok(true);
    }
    if E::STRICT {
        return Err(ParseError::UnknownEntryKind {
            kind: kind.unwrap_or_default().to_string(),
        });
    }
    debug!(kind = kind.unwrap_or("<none>"), "skipping entry of unhandled kind");
    Ok(false)
}

impl<E: EntryType> Parsable for Feed<E> {
    const ELEMENT: &'static str = "feed";

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        expect_element(node, ns::ATOM, Self::ELEMENT)?;

        let mut feed = Self::empty();
        feed.etag = node.ns_attr(ns::GD, "etag").map(str::to_string);

        for child in node.elements() {
            match child.namespace() {
                Some(ns::ATOM) => match child.name() {
                    "id" => set_once(&mut feed.id, child.text(), "id")?,
                    "title" => set_once(&mut feed.title, child.text(), "title")?,
                    "subtitle" => set_once(&mut feed.subtitle, child.text(), "subtitle")?,
                    "generator" => set_once(&mut feed.generator, child.text(), "generator")?,
                    "updated" => set_once(
                        &mut feed.updated,
                        parse_time("updated", &child.text())?,
                        "updated",
                    )?,
                    "link" => feed.links.push(Link::from_node(child)?),
                    "author" => feed.authors.push(Author::from_node(child)?),
                    "category" => feed.categories.push(Category::from_node(child)?),
                    "entry" => {
                        if accept::<E>(kind_of(child))? {
                            let entry = E::from_node(child)?;
                            entry.entry().validate_response()?;
                            feed.entries.push(entry);
                        }
                    }
                    _ => {}
                },
                Some(ns::OPENSEARCH) => {
                    let value = || parse_u64(child.name(), &child.text());
                    match child.name() {
                        "totalResults" => set_once(&mut feed.total_results, value()?, "totalResults")?,
                        "startIndex" => set_once(&mut feed.start_index, value()?, "startIndex")?,
                        "itemsPerPage" => set_once(&mut feed.items_per_page, value()?, "itemsPerPage")?,
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        debug!(
            entries = feed.entries.len(),
            total_results = ?feed.total_results,
            has_next = feed.next_link().is_some(),
            "parsed feed"
        );
        Ok(feed)
    }

    fn to_node(&self) -> Node {
        let mut node = Node::new(ns::ATOM, Self::ELEMENT);
        if let Some(etag) = &self.etag {
            node.set_ns_attr(ns::GD, "etag", etag);
        }
        if let Some(id) = &self.id {
            node.push_child(text_element(ns::ATOM, "id", id));
        }
        if let Some(title) = &self.title {
            node.push_child(text_element(ns::ATOM, "title", title));
        }
        if let Some(subtitle) = &self.subtitle {
            node.push_child(text_element(ns::ATOM, "subtitle", subtitle));
        }
        if let Some(updated) = &self.updated {
            node.push_child(text_element(ns::ATOM, "updated", format_time(updated)));
        }
        if let Some(generator) = &self.generator {
            node.push_child(text_element(ns::ATOM, "generator", generator));
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
        if let Some(total) = self.total_results {
            node.push_child(text_element(ns::OPENSEARCH, "totalResults", total.to_string()));
        }
        if let Some(start) = self.start_index {
            node.push_child(text_element(ns::OPENSEARCH, "startIndex", start.to_string()));
        }
        if let Some(per_page) = self.items_per_page {
            node.push_child(text_element(ns::OPENSEARCH, "itemsPerPage", per_page.to_string()));
        }
        for entry in &self.entries {
            node.push_child(entry.to_node());
        }
        node
    }
}

impl<E: EntryType> JsonParsable for Feed<E> {
    fn from_json(value: &Value) -> Result<Self, ParseError> {
        let object = json_object(value, Self::ELEMENT)?;

        let mut feed = Self::empty();
        feed.id = json_str(object, Self::ELEMENT, "id")?.map(str::to_string);
        feed.title = json_str(object, Self::ELEMENT, "title")?.map(str::to_string);
        feed.etag = json_str(object, Self::ELEMENT, "etag")?.map(str::to_string);
        feed.next_page_token = json_str(object, Self::ELEMENT, "nextPageToken")?.map(str::to_string);
        if let Some(href) = json_str(object, Self::ELEMENT, "selfLink")? {
            feed.links.push(Link::new(href, rel::SELF));
        }
        if let Some(href) = json_str(object, Self::ELEMENT, "nextLink")? {
            feed.links.push(Link::new(href, rel::NEXT));
        }

        let items = match object.get("items") {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => return Err(ParseError::malformed("items", "expected an array")),
        };
        for item in items {
            if accept::<E>(json_kind_of(item))? {
                let entry = E::from_json(item)?;
                entry.entry().validate_response()?;
                feed.entries.push(entry);
            }
        }

        debug!(
            entries = feed.entries.len(),
            has_next = feed.next_page_token.is_some() || feed.next_link().is_some(),
            "parsed JSON feed"
        );
        Ok(feed)
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();
        let mut put = |key: &str, value: Option<&str>| {
            if let Some(v) = value {
                object.insert(key.to_string(), Value::String(v.to_string()));
            }
        };
        put("id", self.id.as_deref());
        put("title", self.title.as_deref());
        put("etag", self.etag.as_deref());
        put("nextPageToken", self.next_page_token.as_deref());
        put("selfLink", self.look_up_link(rel::SELF).map(Link::href));
        put("nextLink", self.next_link().map(Link::href));
        object.insert(
            "items".to_string(),
            Value::Array(self.entries.iter().map(E::to_json).collect()),
        );
        Value::Object(object)
    }
}
