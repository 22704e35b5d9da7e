//! Batch operations: queries, inserts, updates and deletes sent together as
//! one feed to a service's batch link.

use std::fmt;

use crate::Error;
use crate::entry::EntryType;
use crate::error::ParseError;
use crate::parsable::{expect_element, text_element};
use crate::service::status_error;
use crate::xml::{self, Child, Node, ns};

/// What one operation of a batch does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperationType {
    Query,
    Insertion,
    Update,
    Deletion,
}

impl BatchOperationType {
    /// Value of the `batch:operation` `type` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOperationType::Query => "query",
            BatchOperationType::Insertion => "insert",
            BatchOperationType::Update => "update",
            BatchOperationType::Deletion => "delete",
        }
    }
}

impl fmt::Display for BatchOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum Target<E> {
    Entry(E),
    /// ID URI of the entry to fetch.
    Query(String),
}

#[derive(Debug, Clone)]
struct Operation<E> {
    id: u32,
    kind: BatchOperationType,
    target: Target<E>,
}

impl<E: EntryType> Operation<E> {
    fn to_node(&self) -> Node {
        let mut node = match &self.target {
            Target::Entry(entry) => entry.to_node(),
            Target::Query(id) => Node::new(ns::ATOM, "entry")
                .child_node(text_element(ns::ATOM, "id", id))
                .child_node(text_element(ns::ATOM, "title", "Batch operation query")),
        };
        node.push_child(text_element(ns::BATCH, "id", self.id.to_string()));
        node.push_child(Node::new(ns::BATCH, "operation").attr_value("type", self.kind.as_str()));
        node
    }

    /// URI reported when the server answers the operation with a 404.
    fn target_uri(&self) -> Option<&str> {
        match &self.target {
            Target::Entry(entry) => entry.entry().id(),
            Target::Query(id) => Some(id),
        }
    }
}

/// Outcome of one operation of a batch.
#[derive(Debug)]
pub struct BatchResult<E> {
    /// ID returned when the operation was added.
    pub id: u32,
    pub operation: BatchOperationType,
    /// The server's entry, or `None` for a deletion. A failed operation
    /// carries its status mapped like the status of a single request.
    pub outcome: Result<Option<E>, Error>,
}

/// A set of operations on one batch feed, usually the feed's
/// [`batch_link`](crate::Feed::batch_link).
///
/// Each `add_*` method returns the operation's ID, which identifies its
/// [`BatchResult`]. Send the batch with
/// [`Service::run_batch`](crate::Service::run_batch).
#[derive(Debug, Clone)]
pub struct BatchOperation<E> {
    feed_uri: String,
    operations: Vec<Operation<E>>,
}

impl<E: EntryType> BatchOperation<E> {
    pub fn new(feed_uri: impl Into<String>) -> Self {
        Self {
            feed_uri: feed_uri.into(),
            operations: Vec::new(),
        }
    }

    pub fn feed_uri(&self) -> &str {
        &self.feed_uri
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Fetch the entry whose ID URI is `entry_id`.
    pub fn add_query(&mut self, entry_id: impl Into<String>) -> u32 {
        self.push(BatchOperationType::Query, Target::Query(entry_id.into()))
    }

    pub fn add_insertion(&mut self, entry: E) -> u32 {
        self.push(BatchOperationType::Insertion, Target::Entry(entry))
    }

    pub fn add_update(&mut self, entry: E) -> u32 {
        self.push(BatchOperationType::Update, Target::Entry(entry))
    }

    pub fn add_deletion(&mut self, entry: E) -> u32 {
        self.push(BatchOperationType::Deletion, Target::Entry(entry))
    }

    fn push(&mut self, kind: BatchOperationType, target: Target<E>) -> u32 {
        // IDs start at 1; the server echoes them back in batch:id
        let id = u32::try_from(self.operations.len()).map_or(u32::MAX, |n| n.saturating_add(1));
        self.operations.push(Operation { id, kind, target });
        id
    }

    /// The request feed: every operation's entry tagged with `batch:id` and
    /// `batch:operation`.
    pub fn to_node(&self) -> Node {
        let mut feed = Node::new(ns::ATOM, "feed")
            .child_node(text_element(ns::ATOM, "id", "batch1"))
            .child_node(text_element(ns::ATOM, "title", "Batch operation feed"));
        for operation in &self.operations {
            feed.push_child(operation.to_node());
        }
        feed
    }

    /// Match the entries of a response feed to their operations, in response
    /// order.
    ///
    /// Every response entry must carry a `batch:id` this batch issued and a
    /// `batch:status`. An entry of a successful operation that does not
    /// parse fails the whole response.
    pub fn read_results(&self, root: &Node) -> Result<Vec<BatchResult<E>>, ParseError> {
        expect_element(root, ns::ATOM, "feed")?;

        let mut results = Vec::new();
        for node in root.elements().filter(|n| n.is(ns::ATOM, "entry")) {
            let id = batch_id(node)?;
            let operation = self
                .operations
                .iter()
                .find(|op| op.id == id)
                .ok_or_else(|| ParseError::malformed("entry", format!("unknown batch:id {id}")))?;
            let (code, message) = batch_status(node)?;

            let outcome = if !(200..300).contains(&code) {
                let uri = operation.target_uri().unwrap_or(&self.feed_uri);
                Err(status_error(uri, code, message))
            } else if operation.kind == BatchOperationType::Deletion {
                Ok(None)
            } else {
                let mut entry_node = node.clone();
                entry_node.retain_elements(|n| n.namespace() != Some(ns::BATCH));
                let entry = E::from_node(&entry_node)?;
                entry.entry().validate_response()?;
                Ok(Some(entry))
            };

            results.push(BatchResult {
                id,
                operation: operation.kind,
                outcome,
            });
        }
        Ok(results)
    }
}

fn batch_id(entry: &Node) -> Result<u32, ParseError> {
    let node = entry
        .child(ns::BATCH, "id")
        .ok_or_else(|| ParseError::missing("entry", "batch:id"))?;
    node.text()
        .trim()
        .parse()
        .map_err(|_| ParseError::malformed("batch:id", format!("'{}' is not an operation ID", node.text())))
}

/// Status code and message of `batch:status`. The message is the `reason`
/// attribute, or the service-specific body when there is one.
fn batch_status(entry: &Node) -> Result<(u16, String), ParseError> {
    let node = entry
        .child(ns::BATCH, "status")
        .ok_or_else(|| ParseError::missing("entry", "batch:status"))?;
    let code = node
        .attr("code")
        .ok_or_else(|| ParseError::missing("batch:status", "code"))?;
    let code: u16 = code
        .parse()
        .map_err(|_| ParseError::malformed("batch:status", format!("bad status code '{code}'")))?;

    let body: String = node
        .children()
        .iter()
        .map(|c| match c {
            Child::Text(t) => t.clone(),
            Child::Element(n) => xml::write_fragment(n),
        })
        .collect();
    let message = match (node.attr("reason"), body.trim()) {
        (_, body) if !body.is_empty() => body.to_string(),
        (Some(reason), _) => reason.to_string(),
        (None, _) => format!("HTTP {code}"),
    };
    Ok((code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::error::ServiceError;
    use crate::parsable::Parsable;
    use pretty_assertions::assert_eq;

    fn inserted(id: &str) -> Entry {
        Entry::from_xml(&format!(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><id>{id}</id><title>t</title></entry>"#
        ))
        .unwrap()
    }

    #[test]
    fn request_feed_tags_every_operation() {
        let mut batch = BatchOperation::new("https://x/feeds/default/batch");
        assert_eq!(batch.add_query("https://x/entries/1"), 1);
        assert_eq!(batch.add_insertion(Entry::new().with_title("new")), 2);
        assert_eq!(batch.add_deletion(inserted("https://x/entries/3")), 3);

        let feed = batch.to_node();
        let entries: Vec<_> = feed.elements().filter(|n| n.is(ns::ATOM, "entry")).collect();
        assert_eq!(entries.len(), 3);

        let tags: Vec<_> = entries
            .iter()
            .map(|e| {
                (
                    e.child(ns::BATCH, "id").unwrap().text(),
                    e.child(ns::BATCH, "operation").unwrap().attr("type").unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(
            tags,
            [
                ("1".to_string(), "query".to_string()),
                ("2".to_string(), "insert".to_string()),
                ("3".to_string(), "delete".to_string()),
            ]
        );
        assert_eq!(
            entries[0].child(ns::ATOM, "id").unwrap().text(),
            "https://x/entries/1"
        );

        let out = xml::write(&feed);
        assert!(out.contains(r#"<batch:id xmlns:batch="http://schemas.google.com/gdata/batch">1</batch:id>"#));
    }

    #[test]
    fn results_follow_statuses() {
        let mut batch = BatchOperation::<Entry>::new("https://x/batch");
        batch.add_query("https://x/entries/1");
        batch.add_update(inserted("https://x/entries/2"));
        batch.add_deletion(inserted("https://x/entries/3"));

        let response = xml::parse(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:batch="http://schemas.google.com/gdata/batch">
                <entry>
                    <batch:id>1</batch:id><batch:status code="200"/>
                    <id>https://x/entries/1</id><title>one</title>
                </entry>
                <entry>
                    <batch:id>2</batch:id><batch:status code="409" reason="Conflict">Version mismatch</batch:status>
                    <id>https://x/entries/2</id>
                </entry>
                <entry>
                    <batch:id>3</batch:id><batch:status code="200" reason="Success"/>
                    <id>https://x/entries/3</id>
                </entry>
            </feed>"#,
        )
        .unwrap();

        let results = batch.read_results(&response).unwrap();
        assert_eq!(results.len(), 3);

        let fetched = results[0].outcome.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(fetched.title(), Some("one"));
        assert!(fetched.extensions().is_empty());

        assert_eq!(results[1].operation, BatchOperationType::Update);
        assert!(matches!(
            &results[1].outcome,
            Err(Error::Service(ServiceError::Conflict { message })) if message == "Version mismatch"
        ));

        assert_eq!(results[2].operation, BatchOperationType::Deletion);
        assert!(matches!(results[2].outcome, Ok(None)));
    }

    #[test]
    fn failed_query_reports_its_entry() {
        let mut batch = BatchOperation::<Entry>::new("https://x/batch");
        batch.add_query("https://x/entries/9");
        let response = xml::parse(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:batch="http://schemas.google.com/gdata/batch">
                <entry><batch:id>1</batch:id><batch:status code="404" reason="Not Found"/></entry>
            </feed>"#,
        )
        .unwrap();

        let results = batch.read_results(&response).unwrap();
        assert!(matches!(
            &results[0].outcome,
            Err(Error::Service(ServiceError::NotFound { uri })) if uri == "https://x/entries/9"
        ));
    }

    #[test]
    fn response_entries_need_batch_elements() {
        let mut batch = BatchOperation::<Entry>::new("https://x/batch");
        batch.add_query("https://x/entries/1");
        let read = |body: &str| batch.read_results(&xml::parse(body).unwrap());

        assert_eq!(
            read(r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><id>a</id></entry></feed>"#).unwrap_err(),
            ParseError::missing("entry", "batch:id")
        );
        assert_eq!(
            read(
                r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:batch="http://schemas.google.com/gdata/batch">
                    <entry><batch:id>1</batch:id></entry></feed>"#
            )
            .unwrap_err(),
            ParseError::missing("entry", "batch:status")
        );
        assert!(matches!(
            read(
                r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:batch="http://schemas.google.com/gdata/batch">
                    <entry><batch:id>7</batch:id><batch:status code="200"/></entry></feed>"#
            ),
            Err(ParseError::Malformed { .. })
        ));
    }
}
