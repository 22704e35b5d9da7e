//! Atom building blocks shared by entries and feeds.

mod author;
mod category;
mod link;

pub use author::Author;
pub use category::Category;
pub use link::{Link, rel};
