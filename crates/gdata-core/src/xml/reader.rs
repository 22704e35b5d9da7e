//! XML text to [`Node`] tree.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use super::node::{Attribute, Node};
use crate::error::ParseError;

/// Maximum element nesting accepted from a response.
const MAX_DEPTH: usize = 256;

/// Parse a document into its root element.
///
/// quick-xml never parses `<!ENTITY>` declarations; only the five predefined
/// entities are resolved and anything else is an error. Whitespace-only text
/// is dropped from elements that also contain elements; an element holding
/// only whitespace keeps it.
pub fn parse(input: &str) -> Result<Node, ParseError> {
    let mut reader = NsReader::from_str(input);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = namespace_of(resolved)?;

        match event {
            Event::Start(e) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ParseError::Xml(format!(
                        "nesting depth exceeds maximum of {MAX_DEPTH} levels"
                    )));
                }
                let node = start_node(&reader, &e, namespace)?;
                stack.push(node);
            }
            Event::Empty(e) => {
                let node = start_node(&reader, &e, namespace)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let mut node = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("unbalanced end tag".to_string()))?;
                node.trim_layout_text();
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(text.into_owned());
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8(c.into_inner().into_owned())
                    .map_err(|e| ParseError::Xml(e.to_string()))?;
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml("unexpected end of document".to_string()));
    }

    root.ok_or_else(|| ParseError::Xml("document has no root element".to_string()))
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<Option<String>, ParseError> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ParseError::Xml(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn start_node(
    reader: &NsReader<&[u8]>,
    e: &BytesStart<'_>,
    namespace: Option<String>,
) -> Result<Node, ParseError> {
    let prefix = e
        .name()
        .prefix()
        .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut node = Node::with_prefix(namespace, prefix, name);

    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::Xml(err.to_string()))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }

        let (resolved, local) = reader.resolve_attribute(attr.key);
        let namespace = namespace_of(resolved)?;
        let prefix = attr
            .key
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());
        let value = attr.unescape_value()?.into_owned();

        node.push_attribute(Attribute {
            namespace,
            prefix,
            name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value,
        });
    }

    Ok(node)
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(ParseError::Xml("multiple root elements".to_string())),
    }
}
