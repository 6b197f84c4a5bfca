//! Event-driven tree construction.
//!
//! [`TreeBuilder`] consumes the [`ContentHandler`] event stream and assembles
//! a [`Document`]. It keeps a stack of open elements plus one pending text
//! buffer. Character data is accumulated until the next start or end event
//! and then committed as a single text node, so a text run split across
//! several `characters` calls still becomes one node.
//!
//! Every attach goes through the same index maintenance as the public
//! mutation API, so a built document and a hand-assembled one are
//! indistinguishable.
//!
//! # Examples
//!
//! ```
//! use xmlarbor::builder::TreeBuilder;
//! use xmlarbor::sax::ContentHandler;
//!
//! let mut builder = TreeBuilder::new();
//! builder.start_document().unwrap();
//! builder.start_element("list", &[]).unwrap();
//! builder
//!     .start_element("item", &[("id".to_string(), "first".to_string())])
//!     .unwrap();
//! builder.characters("one").unwrap();
//! builder.end_element("item").unwrap();
//! builder.end_element("list").unwrap();
//! let doc = builder.finish().unwrap();
//!
//! let list = doc.root_element().unwrap();
//! let item = doc.element_by_id(list, "first").unwrap();
//! assert_eq!(doc.text(item).as_deref(), Some("one"));
//! ```

use std::borrow::Cow;

use crate::error::{Diagnostic, StructuralError, StructuralErrorKind, TreeError};
use crate::sax::ContentHandler;
use crate::tree::{Document, NodeId};

/// Options controlling how character data is turned into text nodes.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Strip tab characters from character data and drop runs that are
    /// whitespace only. Enabled by default, which makes indented input
    /// read back without layout text nodes.
    pub clean_whitespace: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            clean_whitespace: true,
        }
    }
}

impl BuildOptions {
    /// Sets whether layout whitespace is cleaned from character data.
    #[must_use]
    pub fn clean_whitespace(mut self, yes: bool) -> Self {
        self.clean_whitespace = yes;
        self
    }
}

/// Where the builder is in the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// No element has started yet.
    Idle,
    /// At least one element is open.
    InElement,
    /// The root element has closed.
    Done,
}

/// Builds a [`Document`] from a stream of parse events.
#[derive(Debug)]
pub struct TreeBuilder {
    doc: Document,
    options: BuildOptions,
    stack: Vec<NodeId>,
    pending_text: Option<String>,
    state: BuildState,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Creates a builder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(BuildOptions::default())
    }

    /// Creates a builder with the given options.
    #[must_use]
    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            doc: Document::new(),
            options,
            stack: Vec::new(),
            pending_text: None,
            state: BuildState::Idle,
        }
    }

    /// The current state of the builder.
    #[must_use]
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// The number of currently open elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The document built so far.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Finishes the build and returns the document.
    ///
    /// Runs the end-of-document checks if `end_document` was not called.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError`] if elements are still open or no root
    /// element was produced.
    pub fn finish(mut self) -> Result<Document, StructuralError> {
        if self.state != BuildState::Done {
            self.end_document()?;
        }
        Ok(self.doc)
    }

    /// Attaches the pending text, if any, to the innermost open element.
    fn commit_text(&mut self) {
        let Some(text) = self.pending_text.take() else {
            return;
        };
        if let Some(&parent) = self.stack.last() {
            tracing::trace!(len = text.len(), "committing text node");
            let node = self.doc.create_text(text);
            self.doc.link(parent, node);
        }
    }

    /// Applies the whitespace policy to a chunk of character data.
    ///
    /// Returns `None` when the chunk contributes nothing.
    fn clean<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        if self.options.clean_whitespace {
            let cleaned = if text.contains('\t') {
                Cow::Owned(text.replace('\t', ""))
            } else {
                Cow::Borrowed(text)
            };
            (!cleaned.trim().is_empty()).then_some(cleaned)
        } else {
            (!text.is_empty()).then_some(Cow::Borrowed(text))
        }
    }
}

impl ContentHandler for TreeBuilder {
    fn start_document(&mut self) -> Result<(), StructuralError> {
        tracing::debug!("build started");
        Ok(())
    }

    fn xml_declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
    ) -> Result<(), StructuralError> {
        self.doc.set_version(version);
        if let Some(label) = encoding {
            if let Err(err) = self.doc.set_encoding(label) {
                tracing::warn!(%label, "unknown encoding in declaration, keeping default");
                self.doc
                    .push_diagnostic(Diagnostic::warning(format!("declaration: {err}")));
            }
        }
        Ok(())
    }

    fn start_element(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
    ) -> Result<(), StructuralError> {
        if self.state == BuildState::Done {
            return Err(StructuralError::new(
                StructuralErrorKind::MultipleRoots,
                format!("element <{name}> after the root element was closed"),
            ));
        }
        self.commit_text();

        let element = self
            .doc
            .create_element_with(
                name,
                None,
                attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            )
            .map_err(|err| {
                let kind = match err {
                    TreeError::EmptyName => StructuralErrorKind::EmptyName,
                    _ => StructuralErrorKind::InvalidName,
                };
                StructuralError::new(kind, err.to_string())
            })?;

        match self.stack.last() {
            Some(&parent) => self.doc.link(parent, element),
            None => self.doc.adopt_root(element),
        }
        self.stack.push(element);
        self.state = BuildState::InElement;
        tracing::trace!(%name, depth = self.stack.len(), "element opened");
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), StructuralError> {
        if self.stack.is_empty() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(StructuralError::new(
                StructuralErrorKind::TextOutsideRoot,
                format!("character data {:?} outside the root element", text.trim()),
            ));
        }
        if let Some(cleaned) = self.clean(text) {
            self.pending_text
                .get_or_insert_with(String::new)
                .push_str(&cleaned);
        }
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<(), StructuralError> {
        let Some(&top) = self.stack.last() else {
            return Err(StructuralError::new(
                StructuralErrorKind::UnmatchedEnd,
                format!("end of <{name}> with no open element"),
            ));
        };
        let open = self.doc.name(top).unwrap_or_default();
        if open != name {
            return Err(StructuralError::new(
                StructuralErrorKind::MismatchedEnd,
                format!("end of <{name}> while <{open}> is open"),
            ));
        }
        self.commit_text();
        self.stack.pop();
        if self.stack.is_empty() {
            self.state = BuildState::Done;
        }
        tracing::trace!(%name, depth = self.stack.len(), "element closed");
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), StructuralError> {
        if let Some(&top) = self.stack.last() {
            let open = self.doc.name(top).unwrap_or_default();
            return Err(StructuralError::new(
                StructuralErrorKind::UnclosedElement,
                format!("input ended while <{open}> is open ({} open)", self.stack.len()),
            ));
        }
        if self.doc.root_element().is_none() {
            return Err(StructuralError::new(
                StructuralErrorKind::NoRootElement,
                "input contains no root element",
            ));
        }
        self.state = BuildState::Done;
        tracing::debug!(nodes = self.doc.node_count(), "build finished");
        Ok(())
    }
}
