use crate::error::ParseError;
use crate::parsable::{Parsable, expect_element, parse_u64, required_attr};
use crate::xml::{Node, ns};

/// Link relation types.
pub mod rel {
    pub const ALTERNATE: &str = "alternate";
    pub const EDIT: &str = "edit";
    pub const SELF: &str = "self";
    pub const NEXT: &str = "next";
    pub const PREVIOUS: &str = "previous";

    /// The feed an entry owns (for example a photo's comments).
    pub const FEED: &str = "http://schemas.google.com/g/2005#feed";
    /// Where new entries are POSTed.
    pub const POST: &str = "http://schemas.google.com/g/2005#post";
    /// Where batch feeds are POSTed.
    pub const BATCH: &str = "http://schemas.google.com/g/2005#batch";

    /// Prefix of the full IANA relation URIs (`…/relation/next`).
    pub const IANA_PREFIX: &str = "http://www.iana.org/assignments/relation/";

    /// Whether `candidate` names relation `rel`, accepting the IANA URI form
    /// of short relation names.
    pub fn matches(candidate: &str, rel: &str) -> bool {
        candidate == rel
            || candidate
                .strip_prefix(IANA_PREFIX)
                .is_some_and(|short| short == rel)
    }
}

/// An `atom:link`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    href: String,
    rel: String,
    content_type: Option<String>,
    title: Option<String>,
    hreflang: Option<String>,
    length: Option<u64>,
}

impl Link {
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            content_type: None,
            title: None,
            hreflang: None,
            length: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_hreflang(mut self, hreflang: impl Into<String>) -> Self {
        self.hreflang = Some(hreflang.into());
        self
    }

    /// Length of the linked resource in bytes.
    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn rel(&self) -> &str {
        &self.rel
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn hreflang(&self) -> Option<&str> {
        self.hreflang.as_deref()
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn has_rel(&self, rel: &str) -> bool {
        rel::matches(&self.rel, rel)
    }
}

impl Parsable for Link {
    const ELEMENT: &'static str = "link";

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        expect_element(node, ns::ATOM, Self::ELEMENT)?;
        let length = node
            .attr("length")
            .map(|l| parse_u64(Self::ELEMENT, l))
            .transpose()?;

        Ok(Self {
            href: required_attr(node, "href")?.to_string(),
            // RFC 4287: a link without rel is an alternate link
            rel: node.attr("rel").unwrap_or(rel::ALTERNATE).to_string(),
            content_type: node.attr("type").map(str::to_string),
            title: node.attr("title").map(str::to_string),
            hreflang: node.attr("hreflang").map(str::to_string),
            length,
        })
    }

    fn to_node(&self) -> Node {
        let mut node = Node::new(ns::ATOM, Self::ELEMENT);
        node.set_attr("href", &self.href);
        node.set_attr("rel", &self.rel);
        if let Some(t) = &self.content_type {
            node.set_attr("type", t);
        }
        if let Some(title) = &self.title {
            node.set_attr("title", title);
        }
        if let Some(lang) = &self.hreflang {
            node.set_attr("hreflang", lang);
        }
        if let Some(length) = self.length {
            node.set_attr("length", length.to_string());
        }
        node
    }
}
