//! gdata-http - HTTP transport and authorizers for gdata-core.
//!
//! [`HttpTransport`] performs requests with reqwest; [`BearerAuthorizer`]
//! and [`ApiKeyAuthorizer`] attach credentials to them.

mod authorizer;
mod tokens;
mod transport;

pub use authorizer::{ApiKeyAuthorizer, BearerAuthorizer};
pub use tokens::AccessToken;
pub use transport::{HttpTransport, HttpTransportBuilder};
