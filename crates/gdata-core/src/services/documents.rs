//! Documents list entries: documents of every type and folders.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::entry::{Entry, EntryType};
use crate::error::ParseError;
use crate::parsable::{
    JsonParsable, Parsable, format_time, parse_bool, parse_time, parse_u64, text_element,
};
use crate::xml::{Node, ns};

/// The document types the documents service distinguishes, keyed by kind term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Spreadsheet,
    Presentation,
    Drawing,
    Pdf,
    File,
    Folder,
}

impl DocumentKind {
    pub fn term(&self) -> &'static str {
        match self {
            DocumentKind::Text => "http://schemas.google.com/docs/2007#document",
            DocumentKind::Spreadsheet => "http://schemas.google.com/docs/2007#spreadsheet",
            DocumentKind::Presentation => "http://schemas.google.com/docs/2007#presentation",
            DocumentKind::Drawing => "http://schemas.google.com/docs/2007#drawing",
            DocumentKind::Pdf => "http://schemas.google.com/docs/2007#pdf",
            DocumentKind::File => "http://schemas.google.com/docs/2007#file",
            DocumentKind::Folder => "http://schemas.google.com/docs/2007#folder",
        }
    }

    pub fn from_term(term: &str) -> Option<Self> {
        [
            DocumentKind::Text,
            DocumentKind::Spreadsheet,
            DocumentKind::Presentation,
            DocumentKind::Drawing,
            DocumentKind::Pdf,
            DocumentKind::File,
            DocumentKind::Folder,
        ]
        .into_iter()
        .find(|k| k.term() == term)
    }

    /// Kind of a Drive-style JSON item, from its MIME type.
    fn from_mime_type(mime_type: &str) -> Self {
        match mime_type {
            "application/vnd.google-apps.folder" => DocumentKind::Folder,
            "application/vnd.google-apps.document" => DocumentKind::Text,
            "application/vnd.google-apps.spreadsheet" => DocumentKind::Spreadsheet,
            "application/vnd.google-apps.presentation" => DocumentKind::Presentation,
            "application/vnd.google-apps.drawing" => DocumentKind::Drawing,
            "application/pdf" => DocumentKind::Pdf,
            _ => DocumentKind::File,
        }
    }
}

/// JSON kind of Drive file resources.
const DRIVE_FILE_KIND: &str = "drive#file";

/// An entry in the documents list, with the `docs`/`gd` extensions the
/// service adds to every document and folder.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentsEntry {
    entry: Entry,
    resource_id: Option<String>,
    edited: Option<DateTime<Utc>>,
    writers_can_invite: Option<bool>,
    quota_bytes_used: Option<u64>,
    is_deleted: bool,
}

impl DocumentsEntry {
    pub fn new(entry: Entry) -> Self {
        Self {
            entry,
            resource_id: None,
            edited: None,
            writers_can_invite: None,
            quota_bytes_used: None,
            is_deleted: false,
        }
    }

    /// Resource ID, of the form `type:id` (for example `folder:abc`).
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    pub fn edited(&self) -> Option<DateTime<Utc>> {
        self.edited
    }

    pub fn writers_can_invite(&self) -> Option<bool> {
        self.writers_can_invite
    }

    pub fn set_writers_can_invite(&mut self, value: Option<bool>) {
        self.writers_can_invite = value;
    }

    pub fn quota_bytes_used(&self) -> Option<u64> {
        self.quota_bytes_used
    }

    /// Whether the entry is in the trash.
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Kind from the kind category, or from the MIME type of a JSON item.
    /// A Drive file without a MIME type is a plain file.
    pub fn document_kind(&self) -> Option<DocumentKind> {
        let kind = self.entry.kind();
        kind.and_then(DocumentKind::from_term).or_else(|| {
            match self.entry.json_member("mimeType").and_then(Value::as_str) {
                Some(mime_type) => Some(DocumentKind::from_mime_type(mime_type)),
                None if kind == Some(DRIVE_FILE_KIND) => Some(DocumentKind::File),
                None => None,
            }
        })
    }
}

impl Parsable for DocumentsEntry {
    const ELEMENT: &'static str = "entry";

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        let mut entry = Entry::from_node(node)?;

        let resource_id = entry.take_extension(ns::GD, "resourceId")?.map(|n| n.text());
        let edited = entry
            .take_extension(ns::APP, "edited")?
            .map(|n| parse_time("edited", &n.text()))
            .transpose()?;
        let writers_can_invite = entry
            .take_extension(ns::DOCS, "writersCanInvite")?
            .map(|n| parse_bool("writersCanInvite", n.attr("value").unwrap_or_default()))
            .transpose()?;
        let quota_bytes_used = entry
            .take_extension(ns::GD, "quotaBytesUsed")?
            .map(|n| parse_u64("quotaBytesUsed", &n.text()))
            .transpose()?;
        let is_deleted = entry.take_extension(ns::GD, "deleted")?.is_some();

        Ok(Self {
            entry,
            resource_id,
            edited,
            writers_can_invite,
            quota_bytes_used,
            is_deleted,
        })
    }

    fn to_node(&self) -> Node {
        let mut node = self.entry.to_node();
        if let Some(id) = &self.resource_id {
            node.push_child(text_element(ns::GD, "resourceId", id));
        }
        if let Some(edited) = &self.edited {
            node.push_child(text_element(ns::APP, "edited", format_time(edited)));
        }
        if let Some(value) = self.writers_can_invite {
            node.push_child(Node::new(ns::DOCS, "writersCanInvite").attr_value("value", value.to_string()));
        }
        if let Some(quota) = self.quota_bytes_used {
            node.push_child(text_element(ns::GD, "quotaBytesUsed", quota.to_string()));
        }
        if self.is_deleted {
            node.push_child(Node::new(ns::GD, "deleted"));
        }
        node
    }
}

impl JsonParsable for DocumentsEntry {
    fn from_json(value: &Value) -> Result<Self, ParseError> {
        let entry = Entry::from_json(value)?;
        let is_deleted = matches!(
            entry.json_member("labels").and_then(|l| l.get("trashed")),
            Some(Value::Bool(true))
        );
        let quota_bytes_used = match entry.json_member("quotaBytesUsed") {
            Some(Value::String(q)) => Some(parse_u64("quotaBytesUsed", q)?),
            _ => None,
        };
        Ok(Self {
            // Drive IDs are resource IDs
            resource_id: entry.id().map(str::to_string),
            is_deleted,
            quota_bytes_used,
            ..Self::new(entry)
        })
    }

    fn to_json(&self) -> Value {
        self.entry.to_json()
    }
}

impl EntryType for DocumentsEntry {
    fn entry(&self) -> &Entry {
        &self.entry
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }
}

/// A documents list item: a document of some kind, or a folder.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentsItem {
    Document(DocumentsEntry),
    Folder(DocumentsEntry),
}

impl DocumentsItem {
    pub fn documents_entry(&self) -> &DocumentsEntry {
        match self {
            DocumentsItem::Document(d) | DocumentsItem::Folder(d) => d,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, DocumentsItem::Folder(_))
    }

    fn from_entry(doc: DocumentsEntry) -> Result<Self, ParseError> {
        match doc.document_kind() {
            Some(DocumentKind::Folder) => Ok(DocumentsItem::Folder(doc)),
            Some(_) => Ok(DocumentsItem::Document(doc)),
            None => Err(ParseError::UnknownEntryKind {
                kind: doc.entry.kind().unwrap_or_default().to_string(),
            }),
        }
    }
}

impl Parsable for DocumentsItem {
    const ELEMENT: &'static str = "entry";

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        Self::from_entry(DocumentsEntry::from_node(node)?)
    }

    fn to_node(&self) -> Node {
        self.documents_entry().to_node()
    }
}

impl JsonParsable for DocumentsItem {
    fn from_json(value: &Value) -> Result<Self, ParseError> {
        Self::from_entry(DocumentsEntry::from_json(value)?)
    }

    fn to_json(&self) -> Value {
        self.documents_entry().to_json()
    }
}

impl EntryType for DocumentsItem {
    fn entry(&self) -> &Entry {
        &self.documents_entry().entry
    }

    fn entry_mut(&mut self) -> &mut Entry {
        match self {
            DocumentsItem::Document(d) | DocumentsItem::Folder(d) => &mut d.entry,
        }
    }

    fn accepts_kind(kind: Option<&str>) -> bool {
        kind.is_some_and(|k| k == DRIVE_FILE_KIND || DocumentKind::from_term(k).is_some())
    }
}
