//! Content equality between subtrees.
//!
//! Two elements are equal when their names, ids, and attribute sets match
//! and their children can be paired off one-to-one with equal partners.
//! Child order does not matter; multiplicity does.

use super::{Document, NodeId, NodeKind};

impl Document {
    /// Compares the subtree at `a` with the subtree at `b` in `other`.
    ///
    /// `other` may be `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlarbor::Document;
    ///
    /// let x = Document::parse_str("<r k='1'><a/><b>t</b></r>").unwrap();
    /// let y = Document::parse_str("<r k='1'><b>t</b><a/></r>").unwrap();
    /// let z = Document::parse_str("<r k='1'><a/><a/></r>").unwrap();
    /// let (xr, yr, zr) = (
    ///     x.root_element().unwrap(),
    ///     y.root_element().unwrap(),
    ///     z.root_element().unwrap(),
    /// );
    /// assert!(x.content_eq(xr, &y, yr));
    /// assert!(!x.content_eq(xr, &z, zr));
    /// ```
    #[must_use]
    pub fn content_eq(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        match (&self.node(a).kind, &other.node(b).kind) {
            (NodeKind::Text(x), NodeKind::Text(y)) => x == y,
            (NodeKind::Element(x), NodeKind::Element(y)) => {
                if x.name != y.name
                    || x.id != y.id
                    || x.attributes != y.attributes
                    || x.children.len() != y.children.len()
                {
                    return false;
                }
                let mut matched = vec![false; y.children.len()];
                x.children.iter().all(|&left| {
                    let partner = y.children.iter().enumerate().position(|(i, &right)| {
                        !matched[i] && self.content_eq(left, other, right)
                    });
                    match partner {
                        Some(i) => {
                            matched[i] = true;
                            true
                        }
                        None => false,
                    }
                })
            }
            _ => false,
        }
    }
}

impl PartialEq for Document {
    /// Documents are equal when version, encoding, and root content match.
    fn eq(&self, other: &Self) -> bool {
        if self.version() != other.version() || self.encoding() != other.encoding() {
            return false;
        }
        match (self.root_element(), other.root_element()) {
            (None, None) => true,
            (Some(a), Some(b)) => self.content_eq(a, other, b),
            _ => false,
        }
    }
}
