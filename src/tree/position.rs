//! Position paths: a node's address as child offsets from a scope element.
//!
//! These let external tooling refer to a node by its place in the tree
//! (`[1, 0]` is the first child of the second child of the scope) and map
//! the reference back without touching the attribute namespace.

use super::{Document, NodeId};

impl Document {
    /// Returns the child offsets leading from `scope` down to `node`.
    ///
    /// Returns an empty path when `node == scope` and `None` when `node` is
    /// not inside `scope`. Offsets count every child, text nodes included.
    #[must_use]
    pub fn position_path(&self, scope: NodeId, node: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = node;
        while current != scope {
            let parent = self.parent(current)?;
            let offset = self.children(parent).iter().position(|&c| c == current)?;
            path.push(offset);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Follows a position path from `scope`.
    #[must_use]
    pub fn node_at_position(&self, scope: NodeId, path: &[usize]) -> Option<NodeId> {
        path.iter()
            .try_fold(scope, |current, &offset| self.children(current).get(offset).copied())
    }
}
