//! Simple name-path resolution.
//!
//! A path is either a bare element name (`"book"`) or slash-separated names
//! (`"book/author"`). Leading and trailing slashes are ignored. Resolution is
//! a greedy first-match descent through the name indices: every segment but
//! the last selects the *first* child element with that name, and the last
//! segment returns all matching children of the element reached. Siblings
//! other than the first are never explored for intermediate segments.
//!
//! This is a pure read of the current tree; nothing is cached.

use crate::tree::{Document, NodeId};

/// Resolves `path` relative to the element `start`.
///
/// Returns an empty slice when any segment fails to match, when the path is
/// empty, or when `start` is not an element.
///
/// # Examples
///
/// ```
/// use xmlarbor::Document;
/// use xmlarbor::path::resolve;
///
/// let doc = Document::parse_str("<a><b><c>42</c></b></a>").unwrap();
/// let a = doc.root_element().unwrap();
///
/// let found = resolve(&doc, a, "b/c");
/// assert_eq!(found.len(), 1);
/// assert_eq!(doc.text(found[0]).as_deref(), Some("42"));
/// assert!(resolve(&doc, a, "x/y").is_empty());
/// ```
#[must_use]
pub fn resolve<'d>(doc: &'d Document, start: NodeId, path: &str) -> &'d [NodeId] {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return &[];
    }

    let mut segments = path.split('/');
    let Some(last) = segments.next_back() else {
        return &[];
    };

    let mut current = start;
    for segment in segments {
        match bucket(doc, current, segment).first() {
            Some(&first) => current = first,
            None => return &[],
        }
    }
    bucket(doc, current, last)
}

/// Resolves `path` and returns the first match.
#[must_use]
pub fn resolve_first(doc: &Document, start: NodeId, path: &str) -> Option<NodeId> {
    resolve(doc, start, path).first().copied()
}

fn bucket<'d>(doc: &'d Document, element: NodeId, name: &str) -> &'d [NodeId] {
    doc.element(element)
        .and_then(|data| data.by_name.get(name))
        .map(Vec::as_slice)
        .unwrap_or_default()
}
