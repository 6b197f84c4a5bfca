//! XML serialization.
//!
//! Turns a `Document` back into canonical text. The output is deterministic
//! for a given tree: attributes are written in sorted order after the id,
//! and layout depends only on the tree shape.

pub mod xml;

pub use xml::{escape, serialize, serialize_node, serialize_with_options, SerializeOptions};
