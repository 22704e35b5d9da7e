//! Entry kinds of individual services.

pub mod documents;
pub mod graph;
pub mod picasaweb;

pub use documents::{DocumentKind, DocumentsEntry, DocumentsItem};
pub use graph::{GraphQuery, GraphResult};
pub use picasaweb::{PicasaWebComment, PicasaWebFile};
