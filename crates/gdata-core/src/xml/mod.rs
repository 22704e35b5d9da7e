//! Namespace-aware XML document model.
//!
//! Responses are parsed into a [`Node`] tree first; typed values are then
//! read out of the tree. Elements nobody claims stay in the tree, which is
//! how unknown extensions survive a round trip.

pub mod ns;
mod node;
mod reader;
mod writer;

pub use node::{Attribute, Child, Node};
pub use reader::parse;
pub use writer::{write, write_fragment};
