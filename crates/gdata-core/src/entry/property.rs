//! Extended key/value properties attached to an entry.

use std::fmt;
use std::str::FromStr;

use serde_json::{Value, json};

use crate::error::{InvalidInputError, ParseError};
use crate::parsable::{JsonParsable, Parsable, expect_element, json_object, json_str, required_attr};
use crate::xml::{Node, ns};

/// Who can see a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Visible to every app with access to the entry.
    #[default]
    Public,
    /// Visible only to the app that set it.
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLIC" => Ok(Visibility::Public),
            "PRIVATE" => Ok(Visibility::Private),
            _ => Err(InvalidInputError::Visibility {
                value: s.to_string(),
            }),
        }
    }
}

/// A key/value pair with a visibility.
///
/// Two properties are the same property when key and visibility match; the
/// value does not take part in identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    key: String,
    value: Option<String>,
    visibility: Visibility,
}

impl Property {
    /// A public property without a value.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            visibility: Visibility::default(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    /// Set the visibility from its wire name.
    pub fn set_visibility_str(&mut self, visibility: &str) -> Result<(), InvalidInputError> {
        self.visibility = visibility.parse()?;
        Ok(())
    }

    fn same_identity(&self, other: &Property) -> bool {
        self.key == other.key && self.visibility == other.visibility
    }
}

fn parse_visibility(element: &str, value: &str) -> Result<Visibility, ParseError> {
    value
        .parse()
        .map_err(|e: InvalidInputError| ParseError::malformed(element, e.to_string()))
}

impl Parsable for Property {
    const ELEMENT: &'static str = "property";
    const NAMESPACE: &'static str = ns::DOCS;

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        expect_element(node, ns::DOCS, Self::ELEMENT)?;
        let visibility = match node.attr("visibility") {
            Some(v) => parse_visibility(Self::ELEMENT, v)?,
            None => Visibility::default(),
        };
        Ok(Self {
            key: required_attr(node, "key")?.to_string(),
            value: node.attr("value").map(str::to_string),
            visibility,
        })
    }

    fn to_node(&self) -> Node {
        let mut node = Node::new(ns::DOCS, Self::ELEMENT);
        node.set_attr("key", &self.key);
        node.set_attr("visibility", self.visibility.as_str());
        if let Some(value) = &self.value {
            node.set_attr("value", value);
        }
        node
    }
}

impl JsonParsable for Property {
    fn from_json(value: &Value) -> Result<Self, ParseError> {
        let object = json_object(value, Self::ELEMENT)?;
        let key = json_str(object, Self::ELEMENT, "key")?
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ParseError::missing(Self::ELEMENT, "key"))?;
        let visibility = match json_str(object, Self::ELEMENT, "visibility")? {
            Some(v) => parse_visibility(Self::ELEMENT, v)?,
            None => Visibility::default(),
        };
        Ok(Self {
            key: key.to_string(),
            value: json_str(object, Self::ELEMENT, "value")?.map(str::to_string),
            visibility,
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "key": self.key,
            "visibility": self.visibility.as_str(),
            "value": self.value,
        })
    }
}

/// The properties of an entry, keyed by (key, visibility) and kept in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    items: Vec<Property>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `property`, or replace the value of the property with the same
    /// key and visibility in place.
    pub fn add(&mut self, property: Property) {
        match self.items.iter_mut().find(|p| p.same_identity(&property)) {
            Some(existing) => existing.value = property.value,
            None => self.items.push(property),
        }
    }

    /// Remove the property with the same key and visibility as `property`.
    ///
    /// The value is ignored. Returns whether anything was removed.
    pub fn remove(&mut self, property: &Property) -> bool {
        let before = self.items.len();
        self.items.retain(|p| !p.same_identity(property));
        self.items.len() != before
    }

    pub fn get(&self, key: &str, visibility: Visibility) -> Option<&Property> {
        self.items
            .iter()
            .find(|p| p.key == key && p.visibility == visibility)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn to_json(&self) -> Value {
        Value::Array(self.items.iter().map(Property::to_json).collect())
    }

    pub(crate) fn from_json(value: &Value) -> Result<Self, ParseError> {
        let array = value
            .as_array()
            .ok_or_else(|| ParseError::malformed("properties", "expected an array"))?;
        let mut properties = Self::new();
        for item in array {
            properties.add(Property::from_json(item)?);
        }
        Ok(properties)
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Property> for Properties {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut properties = Self::new();
        for property in iter {
            properties.add(property);
        }
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_parses_exact_names() {
        assert_eq!("PUBLIC".parse::<Visibility>(), Ok(Visibility::Public));
        assert_eq!("PRIVATE".parse::<Visibility>(), Ok(Visibility::Private));
        assert_eq!(
            "public".parse::<Visibility>(),
            Err(InvalidInputError::Visibility {
                value: "public".to_string()
            })
        );
    }

    #[test]
    fn setting_unknown_visibility_fails_and_keeps_old_value() {
        let mut p = Property::new("k").with_visibility(Visibility::Private);
        assert!(p.set_visibility_str("SHARED").is_err());
        assert_eq!(p.visibility(), Visibility::Private);
    }

    #[test]
    fn default_visibility_is_public() {
        assert_eq!(Property::new("k").visibility(), Visibility::Public);
    }

    #[test]
    fn add_is_an_upsert() {
        let mut props = Properties::new();
        props.add(Property::new("k").with_value("v1"));
        props.add(Property::new("other").with_value("x"));
        props.add(Property::new("k").with_value("v2"));

        assert_eq!(props.len(), 2);
        let keys: Vec<_> = props.iter().map(Property::key).collect();
        assert_eq!(keys, ["k", "other"]);
        assert_eq!(props.get("k", Visibility::Public).unwrap().value(), Some("v2"));
    }

    #[test]
    fn visibility_is_part_of_identity() {
        let mut props = Properties::new();
        props.add(Property::new("k").with_value("pub"));
        props.add(Property::new("k").with_value("priv").with_visibility(Visibility::Private));
        assert_eq!(props.len(), 2);

        assert!(props.remove(&Property::new("k").with_visibility(Visibility::Private)));
        assert_eq!(props.len(), 1);
        assert_eq!(props.iter().next().unwrap().value(), Some("pub"));
    }

    #[test]
    fn remove_ignores_value_and_missing_is_noop() {
        let mut props = Properties::new();
        props.add(Property::new("k").with_value("v"));

        assert!(!props.remove(&Property::new("absent")));
        assert_eq!(props.len(), 1);

        assert!(props.remove(&Property::new("k").with_value("something else")));
        assert!(props.is_empty());
        assert!(!props.remove(&Property::new("k")));
    }

    #[test]
    fn xml_form() {
        let p = Property::new("color").with_value("blue").with_visibility(Visibility::Private);
        let node = p.to_node();
        assert_eq!(node.prefix(), Some("docs"));
        assert_eq!(node.attr("visibility"), Some("PRIVATE"));
        assert_eq!(Property::from_node(&node).unwrap(), p);

        let bad = Node::new(ns::DOCS, "property")
            .attr_value("key", "k")
            .attr_value("visibility", "NOPE");
        assert!(matches!(Property::from_node(&bad), Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn json_value_may_be_null() {
        let p = Property::from_json(&json!({"key": "k", "visibility": "PUBLIC", "value": null})).unwrap();
        assert_eq!(p, Property::new("k"));
        assert_eq!(p.to_json(), json!({"key": "k", "visibility": "PUBLIC", "value": null}));
    }
}
