//! Node type definitions.
//!
//! A node is either an element or a text node. `NodeKind` carries the
//! variant payload; the parent back-reference lives in `NodeData` so it can
//! be handled uniformly for both kinds.

use std::collections::{BTreeMap, HashMap};

use super::NodeId;
use crate::error::TreeError;

/// The kind of a node and its associated data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// An element, e.g. `<book id="bk101" lang="en">`.
    Element(ElementData),
    /// Character data.
    Text(TextData),
}

/// Payload of an element node.
///
/// The child list is the single source of truth for document order. The two
/// index maps are derived from it and are only ever updated by `Document`
/// mutation methods, which keep them in step with `children`.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub(crate) name: String,
    pub(crate) id: Option<String>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) children: Vec<NodeId>,
    /// Direct element children grouped by name, in child order.
    pub(crate) by_name: HashMap<String, Vec<NodeId>>,
    /// Every element with an id strictly below this one. Each bucket lists
    /// claimants in attachment order; the last one wins lookups.
    pub(crate) by_id: HashMap<String, Vec<NodeId>>,
    /// Memoized rendering, cleared whenever this subtree changes.
    pub(crate) rendered: Option<String>,
}

impl ElementData {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            id: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            by_name: HashMap::new(),
            by_id: HashMap::new(),
            rendered: None,
        }
    }

    /// The element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element id, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The plain attributes (never includes `id`).
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Payload of a text node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextData {
    pub(crate) text: Option<String>,
}

impl TextData {
    /// The text, if any has been set.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Checks that `name` can be written as an element or attribute name and
/// read back unchanged.
pub(crate) fn check_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() {
        return Err(TreeError::EmptyName);
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '&' | '"' | '\'' | '/' | '='))
    {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Returns `true` if `name` is the reserved id attribute (any case).
pub(crate) fn is_id_attribute(name: &str) -> bool {
    name.eq_ignore_ascii_case("id")
}
