//! Comments and the entries that can carry them.

use crate::entry::EntryType;
use crate::error::InvalidInputError;

/// An entry that is a comment on another entry.
pub trait Comment: EntryType {
    /// Check that the comment has non-empty content and at least one author.
    fn validate(&self) -> Result<(), InvalidInputError> {
        let entry = self.entry();
        if entry.content().is_none_or(|c| c.is_empty()) {
            return Err(InvalidInputError::InvalidComment {
                reason: "comment has no content".to_string(),
            });
        }
        if entry.authors().is_empty() {
            return Err(InvalidInputError::InvalidComment {
                reason: "comment has no author".to_string(),
            });
        }
        Ok(())
    }
}

/// An entry that owns a feed of comments.
pub trait Commentable: EntryType {
    type Comment: Comment;

    /// URI of the feed listing this entry's comments.
    fn query_comments_uri(&self) -> Result<String, InvalidInputError>;

    /// URI new comments are POSTed to.
    fn insert_comment_uri(&self, comment: &Self::Comment) -> Result<String, InvalidInputError>;

    /// Whether the authenticated user may delete `comment`.
    fn is_comment_deletable(&self, comment: &Self::Comment) -> bool;
}
