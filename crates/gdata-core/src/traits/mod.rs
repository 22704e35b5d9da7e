//! Capability traits for the collaborators a service is built from.

mod authorizer;
mod transport;

pub use authorizer::Authorizer;
pub use transport::Transport;
