//! # xmlarbor
//!
//! A mutable XML element tree that keeps itself indexed. Every element knows
//! its children in order, its element children grouped by name, and every
//! id in its subtree, and all three views stay consistent across insert,
//! remove, and reparent operations. Documents are built from a streaming
//! event source and serialized back to a deterministic canonical form.
//!
//! ## Quick Start
//!
//! ```
//! use xmlarbor::Document;
//! use xmlarbor::serial::serialize;
//!
//! let mut doc = Document::parse_str(
//!     "<catalog><book id='bk101'><price>44.95</price></book></catalog>",
//! ).unwrap();
//! let catalog = doc.root_element().unwrap();
//!
//! let price = doc.element_by_name(catalog, "book/price").unwrap();
//! assert_eq!(doc.text_as::<f64>(price), Ok(44.95));
//!
//! let book = doc.element_by_id(catalog, "bk101").unwrap();
//! let extra = doc.create_element_with("book", Some("bk102"), [("lang", "de")]).unwrap();
//! doc.append_child(catalog, extra).unwrap();
//! assert_eq!(doc.elements_by_name(catalog, "book"), &[book, extra]);
//!
//! assert!(serialize(&doc).ends_with("<book id=\"bk102\" lang=\"de\"/>\n</catalog>"));
//! ```

pub mod builder;
pub mod error;
pub mod path;
pub mod reader;
pub mod sax;
pub mod serial;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use tree::{Document, NodeId, NodeKind};
