//! PicasaWeb photos and their comments.

use serde_json::Value;
use url::Url;

use crate::atom::{Link, rel};
use crate::comment::{Comment, Commentable};
use crate::entry::{Entry, EntryType};
use crate::error::{InvalidInputError, ParseError};
use crate::parsable::{JsonParsable, Parsable, parse_bool, parse_u64, text_element};
use crate::xml::{Node, ns};

pub const KIND_PHOTO: &str = "http://schemas.google.com/photos/2007#photo";
pub const KIND_VIDEO: &str = "http://schemas.google.com/photos/2007#video";
pub const KIND_COMMENT: &str = "http://schemas.google.com/photos/2007#comment";

/// A photo or video in an album.
#[derive(Debug, Clone, PartialEq)]
pub struct PicasaWebFile {
    entry: Entry,
    file_id: Option<String>,
    album_id: Option<String>,
    checksum: Option<String>,
    width: Option<u64>,
    height: Option<u64>,
    size: Option<u64>,
    comment_count: Option<u64>,
    commenting_enabled: bool,
}

impl PicasaWebFile {
    pub fn new(entry: Entry) -> Self {
        Self {
            entry,
            file_id: None,
            album_id: None,
            checksum: None,
            width: None,
            height: None,
            size: None,
            comment_count: None,
            commenting_enabled: true,
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    pub fn album_id(&self) -> Option<&str> {
        self.album_id.as_deref()
    }

    pub fn set_album_id(&mut self, album_id: Option<String>) {
        self.album_id = album_id;
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Width and height in pixels, when the server reported both.
    pub fn dimensions(&self) -> Option<(u64, u64)> {
        self.width.zip(self.height)
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn comment_count(&self) -> Option<u64> {
        self.comment_count
    }

    pub fn is_commenting_enabled(&self) -> bool {
        self.commenting_enabled
    }

    pub fn set_commenting_enabled(&mut self, enabled: bool) {
        self.commenting_enabled = enabled;
    }

    fn feed_link(&self) -> Result<&Link, InvalidInputError> {
        self.entry
            .look_up_link(rel::FEED)
            .ok_or_else(|| InvalidInputError::MissingLink {
                rel: rel::FEED.to_string(),
            })
    }
}

fn take_text(entry: &mut Entry, name: &str) -> Result<Option<String>, ParseError> {
    Ok(entry.take_extension(ns::GPHOTO, name)?.map(|n| n.text()))
}

fn take_u64(entry: &mut Entry, name: &str) -> Result<Option<u64>, ParseError> {
    take_text(entry, name)?
        .map(|t| parse_u64(name, &t))
        .transpose()
}

impl Parsable for PicasaWebFile {
    const ELEMENT: &'static str = "entry";

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        let mut entry = Entry::from_node(node)?;
        let commenting_enabled = match take_text(&mut entry, "commentingEnabled")? {
            Some(t) => parse_bool("commentingEnabled", &t)?,
            None => true,
        };

        Ok(Self {
            file_id: take_text(&mut entry, "id")?,
            album_id: take_text(&mut entry, "albumid")?,
            checksum: take_text(&mut entry, "checksum")?,
            width: take_u64(&mut entry, "width")?,
            height: take_u64(&mut entry, "height")?,
            size: take_u64(&mut entry, "size")?,
            comment_count: take_u64(&mut entry, "commentCount")?,
            commenting_enabled,
            entry,
        })
    }

    fn to_node(&self) -> Node {
        let mut node = self.entry.to_node();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(v) = value {
                node.push_child(text_element(ns::GPHOTO, name, v));
            }
        };
        push("id", self.file_id.clone());
        push("albumid", self.album_id.clone());
        push("checksum", self.checksum.clone());
        push("width", self.width.map(|v| v.to_string()));
        push("height", self.height.map(|v| v.to_string()));
        push("size", self.size.map(|v| v.to_string()));
        push("commentCount", self.comment_count.map(|v| v.to_string()));
        push("commentingEnabled", Some(self.commenting_enabled.to_string()));
        node
    }
}

impl JsonParsable for PicasaWebFile {
    fn from_json(value: &Value) -> Result<Self, ParseError> {
        Ok(Self::new(Entry::from_json(value)?))
    }

    fn to_json(&self) -> Value {
        self.entry.to_json()
    }
}

impl EntryType for PicasaWebFile {
    fn entry(&self) -> &Entry {
        &self.entry
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    fn accepts_kind(kind: Option<&str>) -> bool {
        matches!(kind, Some(KIND_PHOTO | KIND_VIDEO))
    }
}

impl Commentable for PicasaWebFile {
    type Comment = PicasaWebComment;

    /// The file's feed link with `kind=comment` set.
    fn query_comments_uri(&self) -> Result<String, InvalidInputError> {
        let href = self.feed_link()?.href();
        let mut url = Url::parse(href).map_err(|e| InvalidInputError::Other {
            message: format!("invalid feed link '{href}': {e}"),
        })?;

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "kind")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair("kind", "comment");

        Ok(url.to_string())
    }

    fn insert_comment_uri(&self, _comment: &PicasaWebComment) -> Result<String, InvalidInputError> {
        Ok(self.feed_link()?.href().to_string())
    }

    fn is_comment_deletable(&self, comment: &PicasaWebComment) -> bool {
        comment.entry.look_up_link(rel::EDIT).is_some()
    }
}

/// A comment on a [`PicasaWebFile`].
///
/// PicasaWeb does not support ETags on comments: any ETag in a response is
/// discarded and none is ever written.
#[derive(Debug, Clone, PartialEq)]
pub struct PicasaWebComment {
    entry: Entry,
}

impl PicasaWebComment {
    /// A new comment with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        let mut entry = Entry::new();
        entry.set_content(Some(crate::entry::Content::Text(text.into())));
        entry.add_category(crate::atom::Category::kind(KIND_COMMENT));
        Self { entry }
    }

    pub fn from_entry(mut entry: Entry) -> Self {
        entry.clear_etag();
        Self { entry }
    }
}

impl Parsable for PicasaWebComment {
    const ELEMENT: &'static str = "entry";

    fn from_node(node: &Node) -> Result<Self, ParseError> {
        Ok(Self::from_entry(Entry::from_node(node)?))
    }

    fn to_node(&self) -> Node {
        // The entry never holds an ETag, so no gd:etag is written.
        self.entry.to_node()
    }
}

impl JsonParsable for PicasaWebComment {
    fn from_json(value: &Value) -> Result<Self, ParseError> {
        Ok(Self::from_entry(Entry::from_json(value)?))
    }

    fn to_json(&self) -> Value {
        self.entry.to_json()
    }
}

impl EntryType for PicasaWebComment {
    fn entry(&self) -> &Entry {
        &self.entry
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    fn etag(&self) -> Option<&str> {
        None
    }

    fn accepts_kind(kind: Option<&str>) -> bool {
        kind == Some(KIND_COMMENT)
    }
}

impl Comment for PicasaWebComment {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Author;

    const PHOTO: &str = r#"<entry xmlns="http://www.w3.org/2005/Atom"
            xmlns:gphoto="http://schemas.google.com/photos/2007"
            xmlns:gd="http://schemas.google.com/g/2005" gd:etag="W/&quot;p1&quot;">
        <id>https://picasaweb.google.com/data/entry/user/u/albumid/1/photoid/2</id>
        <title>beach.jpg</title>
        <category scheme="http://schemas.google.com/g/2005#kind" term="http://schemas.google.com/photos/2007#photo"/>
        <link rel="http://schemas.google.com/g/2005#feed" href="https://picasaweb.google.com/data/feed/api/user/u/albumid/1/photoid/2?alt=atom"/>
        <gphoto:id>2</gphoto:id>
        <gphoto:albumid>1</gphoto:albumid>
        <gphoto:width>640</gphoto:width>
        <gphoto:height>480</gphoto:height>
        <gphoto:commentingEnabled>false</gphoto:commentingEnabled>
        <gphoto:commentCount>3</gphoto:commentCount>
    </entry>"#;

    #[test]
    fn file_fields() {
        let file = PicasaWebFile::from_xml(PHOTO).unwrap();
        assert_eq!(file.file_id(), Some("2"));
        assert_eq!(file.album_id(), Some("1"));
        assert_eq!(file.dimensions(), Some((640, 480)));
        assert_eq!(file.comment_count(), Some(3));
        assert!(!file.is_commenting_enabled());
        assert!(file.entry().extensions().is_empty());
        assert_eq!(EntryType::etag(&file), Some("W/\"p1\""));

        assert_eq!(PicasaWebFile::from_xml(&file.to_xml()).unwrap(), file);
    }

    #[test]
    fn comments_uri_adds_kind() {
        let file = PicasaWebFile::from_xml(PHOTO).unwrap();
        assert_eq!(
            file.query_comments_uri().unwrap(),
            "https://picasaweb.google.com/data/feed/api/user/u/albumid/1/photoid/2?alt=atom&kind=comment"
        );
        assert_eq!(
            file.insert_comment_uri(&PicasaWebComment::new("hi")).unwrap(),
            "https://picasaweb.google.com/data/feed/api/user/u/albumid/1/photoid/2?alt=atom"
        );
    }

    #[test]
    fn missing_feed_link() {
        let file = PicasaWebFile::new(Entry::new());
        assert_eq!(
            file.query_comments_uri(),
            Err(InvalidInputError::MissingLink {
                rel: rel::FEED.to_string()
            })
        );
    }

    #[test]
    fn comment_etag_is_dropped() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005" gd:etag="W/&quot;c1&quot;">
            <id>c1</id>
            <content type="text">Nice!</content>
            <author><name>Bob</name></author>
            <link rel="edit" href="https://example.com/c1"/>
        </entry>"#;

        let comment = PicasaWebComment::from_xml(xml).unwrap();
        assert_eq!(comment.entry().etag(), None);
        assert_eq!(EntryType::etag(&comment), None);
        assert!(!comment.to_xml().contains("etag"));
        assert!(comment.validate().is_ok());

        let file = PicasaWebFile::from_xml(PHOTO).unwrap();
        assert!(file.is_comment_deletable(&comment));
    }

    #[test]
    fn comment_validation() {
        let mut comment = PicasaWebComment::new("  ");
        assert!(matches!(
            comment.validate(),
            Err(InvalidInputError::InvalidComment { .. })
        ));

        comment
            .entry_mut()
            .set_content(Some(crate::entry::Content::Text("ok".to_string())));
        assert!(comment.validate().is_err());

        comment.entry_mut().add_author(Author::new("Ann"));
        assert!(comment.validate().is_ok());

        let file = PicasaWebFile::from_xml(PHOTO).unwrap();
        assert!(!file.is_comment_deletable(&comment));
    }

    #[test]
    fn kinds() {
        assert!(PicasaWebFile::accepts_kind(Some(KIND_PHOTO)));
        assert!(!PicasaWebFile::accepts_kind(Some(KIND_COMMENT)));
        assert!(PicasaWebComment::accepts_kind(Some(KIND_COMMENT)));
        assert!(!PicasaWebComment::accepts_kind(None));
    }
}
