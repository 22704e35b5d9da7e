//! [`Node`] tree to XML text.
//!
//! Namespace declarations are emitted on the element that first needs them.
//! Prefixes recorded on nodes are reused when they do not clash with a
//! binding already in scope.

use quick_xml::escape::escape;

use super::node::{Attribute, Child, Node};
use super::ns;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A `(prefix, namespace)` binding. `None` prefix is the default namespace;
/// `None` namespace undeclares it.
type Binding = (Option<String>, Option<String>);

#[derive(Default)]
struct Scope {
    frames: Vec<Vec<Binding>>,
}

impl Scope {
    fn lookup<'a>(&'a self, pending: &'a [Binding], prefix: Option<&str>) -> Option<Option<&'a str>> {
        pending
            .iter()
            .rev()
            .chain(self.frames.iter().rev().flat_map(|f| f.iter().rev()))
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_deref())
    }

    /// Any prefix bound to `namespace` that is still visible.
    fn prefix_for<'a>(&'a self, pending: &'a [Binding], namespace: &str) -> Option<&'a str> {
        pending
            .iter()
            .chain(self.frames.iter().flat_map(|f| f.iter()))
            .filter_map(|(p, _)| p.as_deref())
            .find(|p| self.lookup(pending, Some(p)) == Some(Some(namespace)))
    }
}

/// Serialize `root` as a complete document.
pub fn write(root: &Node) -> String {
    let mut out = String::from(DECLARATION);
    out.push_str(&write_fragment(root));
    out
}

/// Serialize `node` without the XML declaration.
pub fn write_fragment(node: &Node) -> String {
    let mut out = String::new();
    let mut scope = Scope::default();
    write_node(node, &mut scope, &mut out);
    out
}

fn write_node(node: &Node, scope: &mut Scope, out: &mut String) {
    let mut pending: Vec<Binding> = Vec::new();
    let qname = element_name(node, scope, &mut pending);

    let mut attrs = String::new();
    for attr in node.attributes() {
        let name = attribute_name(attr, scope, &mut pending);
        attrs.push(' ');
        attrs.push_str(&name);
        attrs.push_str("=\"");
        attrs.push_str(&escape(attr.value.as_str()));
        attrs.push('"');
    }

    out.push('<');
    out.push_str(&qname);
    for (prefix, uri) in &pending {
        match prefix {
            Some(p) => {
                out.push_str(" xmlns:");
                out.push_str(p);
            }
            None => out.push_str(" xmlns"),
        }
        out.push_str("=\"");
        out.push_str(&escape(uri.as_deref().unwrap_or("")));
        out.push('"');
    }
    out.push_str(&attrs);

    if node.children().is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    scope.frames.push(pending);
    for child in node.children() {
        match child {
            Child::Element(n) => write_node(n, scope, out),
            Child::Text(t) => out.push_str(&escape(t.as_str())),
        }
    }
    scope.frames.pop();
    out.push_str("</");
    out.push_str(&qname);
    out.push('>');
}

fn element_name(node: &Node, scope: &Scope, pending: &mut Vec<Binding>) -> String {
    match node.namespace() {
        None => {
            if matches!(scope.lookup(pending, None), Some(Some(uri)) if !uri.is_empty()) {
                pending.push((None, None));
            }
            node.name().to_string()
        }
        Some(uri) if uri == ns::XML => qualify(Some("xml"), node.name()),
        Some(uri) => {
            let prefix = node.prefix();
            if scope.lookup(pending, prefix) != Some(Some(uri)) {
                pending.push((prefix.map(str::to_string), Some(uri.to_string())));
            }
            qualify(prefix, node.name())
        }
    }
}

fn attribute_name(attr: &Attribute, scope: &Scope, pending: &mut Vec<Binding>) -> String {
    let Some(uri) = attr.namespace.as_deref() else {
        return attr.name.clone();
    };
    if uri == ns::XML {
        return qualify(Some("xml"), &attr.name);
    }

    // Namespaced attributes always need a prefix.
    let wanted = attr.prefix.as_deref().or_else(|| ns::preferred_prefix(uri));
    let prefix = match wanted {
        Some(p) => {
            let bound = scope.lookup(pending, Some(p)).map(|u| u.map(str::to_string));
            let clashes = pending.iter().any(|(q, _)| q.as_deref() == Some(p));
            match bound {
                Some(Some(bound)) if bound == uri => p.to_string(),
                Some(_) if clashes => fresh_prefix(scope, pending, uri),
                _ => {
                    pending.push((Some(p.to_string()), Some(uri.to_string())));
                    p.to_string()
                }
            }
        }
        None => match scope.prefix_for(pending, uri).map(str::to_string) {
            Some(p) => p,
            None => fresh_prefix(scope, pending, uri),
        },
    };

    qualify(Some(&prefix), &attr.name)
}

fn fresh_prefix(scope: &Scope, pending: &mut Vec<Binding>, uri: &str) -> String {
    let mut n = 0;
    loop {
        let candidate = format!("ns{n}");
        if scope.lookup(pending, Some(&candidate)).is_none() {
            pending.push((Some(candidate.clone()), Some(uri.to_string())));
            return candidate;
        }
        n += 1;
    }
}

fn qualify(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{name}"),
        None => name.to_string(),
    }
}
