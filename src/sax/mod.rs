//! Streaming event contract.
//!
//! A tokenizer turns text into a sequence of events and pushes them into a
//! [`ContentHandler`]. The tree builder is one handler; anything else that
//! wants the raw event stream (counters, filters, converters) can implement
//! the trait too.
//!
//! # Examples
//!
//! ```
//! use xmlarbor::error::StructuralError;
//! use xmlarbor::reader::parse_events;
//! use xmlarbor::sax::ContentHandler;
//!
//! struct Counter {
//!     elements: usize,
//! }
//!
//! impl ContentHandler for Counter {
//!     fn start_element(
//!         &mut self,
//!         _name: &str,
//!         _attributes: &[(String, String)],
//!     ) -> Result<(), StructuralError> {
//!         self.elements += 1;
//!         Ok(())
//!     }
//! }
//!
//! let mut counter = Counter { elements: 0 };
//! parse_events("<root><a/><b/><c/></root>", &mut counter).unwrap();
//! assert_eq!(counter.elements, 4);
//! ```

use crate::error::StructuralError;

/// Receiver of parse events.
///
/// Every method has a no-op default, so implementors override only what they
/// need. Returning an error aborts the parse.
#[allow(unused_variables)]
pub trait ContentHandler {
    /// Called once before any other event.
    fn start_document(&mut self) -> Result<(), StructuralError> {
        Ok(())
    }

    /// Called for an `<?xml ...?>` declaration.
    fn xml_declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
    ) -> Result<(), StructuralError> {
        Ok(())
    }

    /// Called for a start tag (and for the start half of an empty tag).
    ///
    /// `attributes` holds decoded `(name, value)` pairs in source order.
    fn start_element(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
    ) -> Result<(), StructuralError> {
        Ok(())
    }

    /// Called for decoded character data. A run of text may arrive in
    /// several calls.
    fn characters(&mut self, text: &str) -> Result<(), StructuralError> {
        Ok(())
    }

    /// Called for an end tag (and for the end half of an empty tag).
    fn end_element(&mut self, name: &str) -> Result<(), StructuralError> {
        Ok(())
    }

    /// Called once when the input is exhausted.
    fn end_document(&mut self) -> Result<(), StructuralError> {
        Ok(())
    }
}

/// A handler that ignores every event.
pub struct DefaultHandler;

impl ContentHandler for DefaultHandler {}
