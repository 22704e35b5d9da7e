//! Well-known namespaces and the prefixes they are written with.

/// Atom syndication format. Written as the default namespace.
pub const ATOM: &str = "http://www.w3.org/2005/Atom";

/// GData common elements (`gd:etag`, `gd:feedLink`, ...).
pub const GD: &str = "http://schemas.google.com/g/2005";

/// Atom publishing protocol.
pub const APP: &str = "http://www.w3.org/2007/app";

/// OpenSearch result paging elements.
pub const OPENSEARCH: &str = "http://a9.com/-/spec/opensearch/1.1/";

/// Documents extensions, including `docs:property`.
pub const DOCS: &str = "http://schemas.google.com/docs/2007";

/// PicasaWeb extensions.
pub const GPHOTO: &str = "http://schemas.google.com/photos/2007";

/// Batch operation elements.
pub const BATCH: &str = "http://schemas.google.com/gdata/batch";

/// XHTML, the namespace of inline `xhtml` content.
pub const XHTML: &str = "http://www.w3.org/1999/xhtml";

/// Reserved namespace of the `xml:` prefix.
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// Scheme of the category that carries an entry's kind.
pub const KIND_SCHEME: &str = "http://schemas.google.com/g/2005#kind";

/// Returns the prefix a namespace is written with.
///
/// `None` means the namespace is written as the default namespace (Atom) or
/// has no conventional prefix.
pub fn preferred_prefix(namespace: &str) -> Option<&'static str> {
    match namespace {
        GD => Some("gd"),
        APP => Some("app"),
        OPENSEARCH => Some("openSearch"),
        DOCS => Some("docs"),
        GPHOTO => Some("gphoto"),
        BATCH => Some("batch"),
        XML => Some("xml"),
        _ => None,
    }
}
