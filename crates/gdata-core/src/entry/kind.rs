use serde_json::Value;

use super::Entry;
use crate::parsable::{JsonParsable, Parsable};
use crate::xml::{Node, ns};

/// An entry type a feed can be parsed into.
///
/// The feed parser asks [`EntryType::accepts_kind`] whether an entry's kind
/// discriminator belongs to this type; entries that do not are skipped, or
/// rejected with `UnknownEntryKind` when [`EntryType::STRICT`] is set.
pub trait EntryType: Parsable + JsonParsable + Clone + Send + Sync + 'static {
    /// Reject unknown kinds instead of skipping them.
    const STRICT: bool = false;

    fn entry(&self) -> &Entry;

    fn entry_mut(&mut self) -> &mut Entry;

    /// The ETag sent back with updates. Kinds whose service has no ETag
    /// support return `None`.
    fn etag(&self) -> Option<&str> {
        self.entry().etag()
    }

    fn accepts_kind(kind: Option<&str>) -> bool {
        let _ = kind;
        true
    }
}

impl EntryType for Entry {
    fn entry(&self) -> &Entry {
        self
    }

    fn entry_mut(&mut self) -> &mut Entry {
        self
    }
}

/// Kind term of an `atom:entry` element, read from its kind category.
pub fn kind_of(node: &Node) -> Option<&str> {
    node.elements()
        .filter(|c| c.is(ns::ATOM, "category"))
        .find(|c| c.attr("scheme") == Some(ns::KIND_SCHEME))
        .and_then(|c| c.attr("term"))
}

/// Kind of a JSON entry object.
pub(crate) fn json_kind_of(value: &Value) -> Option<&str> {
    value.get("kind").and_then(Value::as_str)
}
