//! Building typed values from documents and back.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::ParseError;
use crate::xml::{self, Node, ns};

/// A value with an XML element representation.
///
/// `from_node` reads well-known fields by namespaced name and keeps anything
/// it does not understand; `to_node` writes fields in the order the service
/// schema expects.
pub trait Parsable: Sized {
    /// Local name of the element this type is read from.
    const ELEMENT: &'static str;

    /// Namespace of [`Parsable::ELEMENT`].
    const NAMESPACE: &'static str = ns::ATOM;

    fn from_node(node: &Node) -> Result<Self, ParseError>;

    fn to_node(&self) -> Node;

    /// Parse a complete XML document.
    fn from_xml(input: &str) -> Result<Self, ParseError> {
        Self::from_node(&xml::parse(input)?)
    }

    /// Serialize as a complete XML document.
    fn to_xml(&self) -> String {
        xml::write(&self.to_node())
    }
}

/// A value with a JSON representation.
pub trait JsonParsable: Sized {
    fn from_json(value: &Value) -> Result<Self, ParseError>;

    fn to_json(&self) -> Value;

    fn from_json_str(input: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json(&value)
    }

    fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Fail unless `node` is `name` in `namespace`.
pub(crate) fn expect_element(node: &Node, namespace: &str, name: &str) -> Result<(), ParseError> {
    if node.is(namespace, name) {
        return Ok(());
    }
    Err(ParseError::malformed(
        name,
        format!(
            "expected <{name}> in {namespace}, found <{}> in {}",
            node.name(),
            node.namespace().unwrap_or("no namespace")
        ),
    ))
}

pub(crate) fn required_attr<'a>(node: &'a Node, name: &str) -> Result<&'a str, ParseError> {
    node.attr(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ParseError::missing(node.name(), name))
}

/// Store `value` in `slot`, failing if the element was already seen.
pub(crate) fn set_once<T>(slot: &mut Option<T>, value: T, element: &str) -> Result<(), ParseError> {
    if slot.is_some() {
        return Err(ParseError::DuplicateElement {
            element: element.to_string(),
        });
    }
    *slot = Some(value);
    Ok(())
}

pub(crate) fn parse_time(element: &str, text: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ParseError::malformed(element, format!("invalid timestamp '{text}': {e}")))
}

pub(crate) fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn parse_bool(element: &str, text: &str) -> Result<bool, ParseError> {
    match text.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ParseError::malformed(element, format!("invalid boolean '{other}'"))),
    }
}

pub(crate) fn parse_u64(element: &str, text: &str) -> Result<u64, ParseError> {
    text.trim()
        .parse()
        .map_err(|_| ParseError::malformed(element, format!("invalid integer '{text}'")))
}

/// An element containing only text.
pub(crate) fn text_element(namespace: &str, name: &str, text: impl Into<String>) -> Node {
    Node::new(namespace, name).text_value(text)
}

/// Optional string member of a JSON object.
pub(crate) fn json_str<'a>(
    object: &'a serde_json::Map<String, Value>,
    element: &str,
    key: &str,
) -> Result<Option<&'a str>, ParseError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ParseError::malformed(
            element,
            format!("member '{key}' must be a string, found {other}"),
        )),
    }
}

pub(crate) fn json_object<'a>(
    value: &'a Value,
    element: &str,
) -> Result<&'a serde_json::Map<String, Value>, ParseError> {
    value
        .as_object()
        .ok_or_else(|| ParseError::Json(format!("<{element}> must be a JSON object")))
}

/// Unused members of a JSON object, kept so they can be written back.
pub(crate) fn unknown_members(
    object: &serde_json::Map<String, Value>,
    known: &[&str],
) -> serde_json::Map<String, Value> {
    object
        .iter()
        .filter(|(k, _)| !known.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
