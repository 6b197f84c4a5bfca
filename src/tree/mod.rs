//! Arena-based element tree.
//!
//! All nodes live in a `Vec<NodeData>` owned by the [`Document`] and are
//! referenced by [`NodeId`], a newtype over `NonZeroU32`. The parent link is
//! a plain index, so there are no reference cycles and no per-node
//! reference counting; dropping the `Document` frees everything.
//!
//! # Derived indices
//!
//! Every element keeps its ordered child list plus two indices derived from
//! it:
//!
//! - a **name index** over its direct element children, grouped by name in
//!   child order;
//! - an **id index** over every element with an id strictly below it. Ids are
//!   unique by convention only: when two elements in the same scope share an
//!   id, the one attached last wins and a warning [`Diagnostic`] is recorded.
//!
//! Every mutation goes through `&mut Document` and updates the child list and
//! both indices before returning, so readers never observe a half-applied
//! change.

mod access;
mod equality;
mod index;
mod node;
mod position;

pub use access::FromValue;
pub use node::{ElementData, NodeKind, TextData};

use std::num::NonZeroU32;

use crate::error::{Diagnostic, TreeError, ValueError};
use node::{check_name, is_id_attribute};

/// XML version written in the prolog when none was set.
pub const DEFAULT_VERSION: &str = "1.0";

/// Encoding written in the prolog when none was set.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// A typed index into the document's node arena.
///
/// `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` for the arena slot at `index`.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32 + 1).expect("arena index overflow"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Element or text payload.
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self { kind, parent: None }
    }

    /// The owning element, or `None` for a detached node or a root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the element payload if this is an element.
    #[must_use]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    /// Returns the text payload if this is a text node.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextData> {
        match &self.kind {
            NodeKind::Text(data) => Some(data),
            NodeKind::Element(_) => None,
        }
    }
}

/// A document: the node arena, the root element, and prolog metadata.
///
/// # Examples
///
/// ```
/// use xmlarbor::Document;
///
/// let mut doc = Document::new();
/// let shelf = doc.create_element("shelf").unwrap();
/// let book = doc.create_element_with("book", Some("bk1"), [("lang", "en")]).unwrap();
/// doc.append_child(shelf, book).unwrap();
/// doc.set_root_element(shelf).unwrap();
///
/// assert_eq!(doc.element_by_id(shelf, "bk1"), Some(book));
/// assert_eq!(doc.elements_by_name(shelf, "book"), &[book]);
/// assert_eq!(doc.attribute(book, "lang"), Some("en"));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
    version: String,
    encoding: String,
    diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Creates an empty document with default version and encoding.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(64),
            root: None,
            version: DEFAULT_VERSION.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            diagnostics: Vec::new(),
        }
    }

    // --- Document metadata ---

    /// The XML version written in the prolog.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sets the XML version written in the prolog.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// The canonical name of the document encoding.
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Sets the document encoding from an encoding label.
    ///
    /// The label is matched case-insensitively against the WHATWG encoding
    /// labels and stored under its canonical name, so `"utf8"` becomes
    /// `"UTF-8"`. The encoding is only recorded for the prolog; text is
    /// always held as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Malformed`] if the label is not recognized.
    pub fn set_encoding(&mut self, label: &str) -> Result<(), ValueError> {
        let encoding = encoding_rs::Encoding::for_label(label.trim().as_bytes()).ok_or_else(
            || ValueError::Malformed {
                value: label.to_string(),
                target: "encoding",
            },
        )?;
        self.encoding = encoding.name().to_string();
        Ok(())
    }

    /// Returns the root element, if one has been set.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.root
    }

    /// Makes `element` the root element, detaching it from any parent.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotAnElement`] if `element` is a text node.
    pub fn set_root_element(&mut self, element: NodeId) -> Result<(), TreeError> {
        if !self.is_element(element) {
            return Err(TreeError::NotAnElement);
        }
        self.detach(element)?;
        self.root = Some(element);
        Ok(())
    }

    /// Records a freshly created, detached element as the root.
    pub(crate) fn adopt_root(&mut self, element: NodeId) {
        self.root = Some(element);
    }

    /// Warnings recorded while building or mutating this document.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // --- Construction ---

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(NodeData::new(kind));
        id
    }

    /// Creates a detached element.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyName`] if `name` is empty and
    /// [`TreeError::InvalidName`] if it contains whitespace or markup.
    pub fn create_element(&mut self, name: &str) -> Result<NodeId, TreeError> {
        check_name(name)?;
        Ok(self.alloc(NodeKind::Element(ElementData::new(name.to_string()))))
    }

    /// Creates a detached element with an id and attributes.
    ///
    /// An attribute whose key is `id` (any case) sets the id instead of being
    /// stored; an explicit `id` argument takes precedence over it.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyName`] or [`TreeError::InvalidName`] if
    /// `name` or an attribute key cannot be written as a name.
    pub fn create_element_with<I, K, V>(
        &mut self,
        name: &str,
        id: Option<&str>,
        attributes: I,
    ) -> Result<NodeId, TreeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        check_name(name)?;
        let mut data = ElementData::new(name.to_string());
        for (key, value) in attributes {
            let key = key.into();
            check_name(&key)?;
            if is_id_attribute(&key) {
                data.id = Some(value.into());
            } else {
                data.attributes.insert(key, value.into());
            }
        }
        if let Some(id) = id {
            data.id = Some(id.to_string());
        }
        Ok(self.alloc(NodeKind::Element(data)))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(TextData {
            text: Some(text.into()),
        }))
    }

    /// Creates a detached text node holding no text.
    pub fn create_empty_text(&mut self) -> NodeId {
        self.alloc(NodeKind::Text(TextData::default()))
    }

    // --- Node access ---

    /// Returns the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the element payload, or `None` for a text node.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).as_element()
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    fn text_mut(&mut self, id: NodeId) -> Option<&mut TextData> {
        match &mut self.node_mut(id).kind {
            NodeKind::Text(data) => Some(data),
            NodeKind::Element(_) => None,
        }
    }

    /// Returns `true` if the node is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element(_))
    }

    /// Returns `true` if the node is a text node.
    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    /// Returns the total number of nodes ever allocated, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Element queries ---

    /// Returns the element name, or `None` for text nodes.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::name)
    }

    /// Returns the element id.
    #[must_use]
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(ElementData::id)
    }

    /// Returns an attribute value. `"id"` (any case) reads the element id.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let element = self.element(id)?;
        if is_id_attribute(name) {
            element.id()
        } else {
            element.attributes.get(name).map(String::as_str)
        }
    }

    /// Iterates the plain attributes of an element, sorted by name.
    ///
    /// The id is not included; read it with [`element_id`](Self::element_id).
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.element(id)
            .into_iter()
            .flat_map(|e| e.attributes.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` if the element has the attribute (or, for `"id"`, an id).
    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Children in document order. Empty for text nodes.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id)
            .map(ElementData::children)
            .unwrap_or_default()
    }

    /// Iterates the element children in document order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
    }

    /// Iterates the text children in document order.
    pub fn text_nodes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_text(child))
    }

    /// Returns `true` if the element has any child.
    #[must_use]
    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    /// Returns the text of a text node.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        self.node(id).as_text().and_then(TextData::text)
    }

    /// Returns the text of an element.
    ///
    /// `None` if the element has no direct text child. Otherwise the text of
    /// all descendant text nodes, concatenated in document order.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlarbor::Document;
    ///
    /// let doc = Document::parse_str("<p>Hello <b>big</b> world</p>").unwrap();
    /// let p = doc.root_element().unwrap();
    /// assert_eq!(doc.text(p).as_deref(), Some("Hello big world"));
    ///
    /// let doc = Document::parse_str("<list><item/></list>").unwrap();
    /// assert_eq!(doc.text(doc.root_element().unwrap()), None);
    /// ```
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<String> {
        if self.text_nodes(id).next().is_none() {
            return None;
        }
        Some(self.text_content(id))
    }

    /// Returns the concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut buf = String::new();
        self.collect_text(id, &mut buf);
        buf
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(data) => {
                if let Some(text) = &data.text {
                    buf.push_str(text);
                }
            }
            NodeKind::Element(data) => {
                for &child in &data.children {
                    self.collect_text(child, buf);
                }
            }
        }
    }

    /// Looks up an element by id within the subtree rooted at `scope`.
    ///
    /// The lookup covers everything attached below `scope`, and `scope`
    /// itself. Query the root element for a document-wide lookup.
    #[must_use]
    pub fn element_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        let element = self.element(scope)?;
        element
            .by_id
            .get(id)
            .and_then(|claimants| claimants.last().copied())
            .or_else(|| (element.id() == Some(id)).then_some(scope))
    }

    /// Returns `true` if [`element_by_id`](Self::element_by_id) would find something.
    #[must_use]
    pub fn has_element_with_id(&self, scope: NodeId, id: &str) -> bool {
        self.element_by_id(scope, id).is_some()
    }

    /// Returns the child elements matching a name or slash-separated path.
    ///
    /// See [`crate::path::resolve`] for the path rules.
    #[must_use]
    pub fn elements_by_name(&self, scope: NodeId, path: &str) -> &[NodeId] {
        crate::path::resolve(self, scope, path)
    }

    /// Returns the first element matching a name or path.
    #[must_use]
    pub fn element_by_name(&self, scope: NodeId, path: &str) -> Option<NodeId> {
        crate::path::resolve_first(self, scope, path)
    }

    /// Returns `true` if a name or path matches at least one element.
    #[must_use]
    pub fn has_element_with_name(&self, scope: NodeId, path: &str) -> bool {
        self.element_by_name(scope, path).is_some()
    }

    /// Reads an attribute and converts it to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if the attribute is missing or not a valid `T`.
    /// Conversion to `bool` never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlarbor::Document;
    ///
    /// let doc = Document::parse_str(r#"<pi precision="3.14" digits="2"/>"#).unwrap();
    /// let pi = doc.root_element().unwrap();
    /// assert_eq!(doc.attribute_as::<f64>(pi, "precision"), Ok(3.14));
    /// assert_eq!(doc.attribute_as::<u8>(pi, "digits"), Ok(2));
    /// assert!(doc.attribute_as::<f64>(pi, "missing").is_err());
    /// ```
    pub fn attribute_as<T: FromValue>(&self, id: NodeId, name: &str) -> Result<T, ValueError> {
        T::from_value(self.attribute(id, name))
    }

    /// Reads the element text (see [`text`](Self::text)) and converts it to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if there is no text or it is not a valid `T`.
    pub fn text_as<T: FromValue>(&self, id: NodeId) -> Result<T, ValueError> {
        T::from_value(self.text(id).as_deref())
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns an iterator over a node and its ancestors (walking up).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns a pre-order iterator over all descendants of a node.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    // --- Mutation ---

    /// Appends `child` as the last child of `parent`.
    ///
    /// If `child` already has a parent it is first removed from it, along
    /// with its entries in that parent's (and its ancestors') indices.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NotAnElement`] if `parent` is a text node.
    /// - [`TreeError::Cycle`] if `child` is `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.is_element(parent) {
            return Err(TreeError::NotAnElement);
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(TreeError::Cycle);
        }
        if let Some(old_parent) = self.parent(child) {
            self.unlink(old_parent, child)?;
        }
        if self.root == Some(child) {
            self.root = None;
        }
        self.link(parent, child);
        Ok(())
    }

    /// Removes `child` from `parent`, leaving it detached.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NotAnElement`] if `parent` is a text node.
    /// - [`TreeError::NotAChild`] if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.is_element(parent) {
            return Err(TreeError::NotAnElement);
        }
        if self.parent(child) != Some(parent) {
            return Err(TreeError::NotAChild);
        }
        self.unlink(parent, child)
    }

    /// Detaches a node from its parent, if it has one.
    ///
    /// Returns the former parent.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotAChild`] if the parent link is stale, which
    /// indicates a corrupted tree.
    pub fn detach(&mut self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        let Some(parent) = self.parent(id) else {
            return Ok(None);
        };
        self.unlink(parent, id)?;
        Ok(Some(parent))
    }

    /// Sets an attribute. `"id"` (any case) sets the element id instead.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NotAnElement`] if `id` is a text node.
    /// - [`TreeError::EmptyName`] or [`TreeError::InvalidName`] if `name`
    ///   cannot be written as an attribute name.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        check_name(name)?;
        if is_id_attribute(name) {
            return self.set_id(id, Some(value.into()));
        }
        let element = self.element_mut(id).ok_or(TreeError::NotAnElement)?;
        element.attributes.insert(name.to_string(), value.into());
        self.invalidate(id);
        Ok(())
    }

    /// Removes an attribute and returns its old value. `"id"` clears the id.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotAnElement`] if `id` is a text node.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, TreeError> {
        if is_id_attribute(name) {
            let old = self.element(id).ok_or(TreeError::NotAnElement)?.id.clone();
            self.set_id(id, None)?;
            return Ok(old);
        }
        let element = self.element_mut(id).ok_or(TreeError::NotAnElement)?;
        let old = element.attributes.remove(name);
        self.invalidate(id);
        Ok(old)
    }

    /// Sets or clears the element id.
    ///
    /// The element is re-published in the id index of every ancestor; if
    /// another element in one of those scopes carries the same id, this one
    /// now wins lookups there. The element keeps its position.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotAnElement`] if `id` is a text node.
    pub fn set_id(&mut self, id: NodeId, value: Option<String>) -> Result<(), TreeError> {
        self.republish_id(id, value)
    }

    /// Appends to the text of a text node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotText`] if `id` is an element.
    pub fn append_text(&mut self, id: NodeId, text: &str) -> Result<(), TreeError> {
        let data = self.text_mut(id).ok_or(TreeError::NotText)?;
        data.text.get_or_insert_with(String::new).push_str(text);
        self.invalidate(id);
        Ok(())
    }

    /// Replaces the text of a text node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotText`] if `id` is an element.
    pub fn set_text(&mut self, id: NodeId, text: Option<String>) -> Result<(), TreeError> {
        let data = self.text_mut(id).ok_or(TreeError::NotText)?;
        data.text = text;
        self.invalidate(id);
        Ok(())
    }

    /// Drops memoized renderings of `id` and every ancestor.
    pub(crate) fn invalidate(&mut self, id: NodeId) {
        let mut next = Some(id);
        while let Some(current) = next {
            if let Some(element) = self.element_mut(current) {
                element.rendered = None;
            }
            next = self.parent(current);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over the descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}
