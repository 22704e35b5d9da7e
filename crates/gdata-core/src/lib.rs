//! gdata-core - Entry model, wire formats, queries and feeds for GData-style services.
//!
//! Entries are parsed from Atom XML (or JSON) into typed values, mutated by
//! the caller, and written back by a [`Service`] built from an
//! [`Authorizer`] and a [`Transport`]. Service-specific kinds live in
//! [`services`].

pub mod atom;
pub mod batch;
pub mod comment;
pub mod config;
pub mod entry;
pub mod error;
pub mod feed;
pub mod parsable;
pub mod query;
pub mod request;
pub mod service;
pub mod services;
pub mod traits;
pub mod types;
pub mod xml;

pub use atom::{Author, Category, Link};
pub use batch::{BatchOperation, BatchOperationType, BatchResult};
pub use comment::{Comment, Commentable};
pub use config::{ConfigError, ServiceConfig};
pub use entry::{Content, Entry, EntryType, Properties, Property, Visibility};
pub use error::Error;
pub use feed::Feed;
pub use parsable::{JsonParsable, Parsable};
pub use query::{PaginationType, Query};
pub use request::{Method, Request, Response};
pub use service::Service;
pub use traits::{Authorizer, Transport};
pub use types::ServiceUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
