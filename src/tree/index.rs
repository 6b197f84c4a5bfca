//! Maintenance of the child list, name index, and id index.
//!
//! `link` and `unlink` are the only places that change a parent/child edge.
//! Both update all three views in one call. Id entries are propagated to
//! every ancestor, since each element indexes its whole subtree.

use std::collections::{HashMap, HashSet};

use super::{Document, NodeId};
use crate::error::{Diagnostic, TreeError};

impl Document {
    /// Attaches a detached `child` at the end of `parent`'s children.
    ///
    /// The caller has already checked that `parent` is an element, `child`
    /// has no parent, and no cycle results.
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        let child_name = self.element(child).map(|e| e.name.clone());

        if let Some(element) = self.element_mut(parent) {
            element.children.push(child);
            if let Some(name) = &child_name {
                element.by_name.entry(name.clone()).or_default().push(child);
            }
        }

        if child_name.is_some() {
            let entries = self.subtree_ids(child);
            self.register_ids(parent, &entries);
        }
        self.invalidate(parent);
    }

    /// Detaches `child` from `parent` and removes it from every index.
    pub(crate) fn unlink(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let position = self
            .element(parent)
            .ok_or(TreeError::NotAnElement)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild)?;
        let child_name = self.element(child).map(|e| e.name.clone());

        if let Some(element) = self.element_mut(parent) {
            element.children.remove(position);
            if let Some(name) = &child_name {
                if let Some(bucket) = element.by_name.get_mut(name) {
                    bucket.retain(|&n| n != child);
                    if bucket.is_empty() {
                        element.by_name.remove(name);
                    }
                }
            }
        }

        if child_name.is_some() {
            let entries = self.subtree_ids(child);
            self.unregister_ids(parent, &entries);
        }
        self.node_mut(child).parent = None;
        self.invalidate(parent);
        Ok(())
    }

    /// Changes an element's id and re-publishes it in every ancestor scope.
    pub(crate) fn republish_id(&mut self, id: NodeId, value: Option<String>) -> Result<(), TreeError> {
        let old = self.element(id).ok_or(TreeError::NotAnElement)?.id.clone();
        let parent = self.parent(id);

        if let (Some(parent), Some(old)) = (parent, old) {
            self.unregister_ids(parent, &[(old, id)]);
        }
        if let Some(element) = self.element_mut(id) {
            element.id.clone_from(&value);
        }
        if let (Some(parent), Some(value)) = (parent, value) {
            self.register_ids(parent, &[(value, id)]);
        }
        self.invalidate(id);
        Ok(())
    }

    /// Every `(id, element)` pair at or below `root`, in an order that keeps
    /// `root`'s own claim last.
    fn subtree_ids(&self, root: NodeId) -> Vec<(String, NodeId)> {
        let Some(element) = self.element(root) else {
            return Vec::new();
        };
        let mut entries: Vec<(String, NodeId)> = element
            .by_id
            .iter()
            .flat_map(|(id, claimants)| claimants.iter().map(move |&n| (id.clone(), n)))
            .collect();
        if let Some(id) = &element.id {
            entries.push((id.clone(), root));
        }
        entries
    }

    /// Adds id entries to `start` and all of its ancestors.
    ///
    /// A collision with an element outside `entries` is reported once, at
    /// `start`. Duplicates within `entries` were reported when they met.
    fn register_ids(&mut self, start: NodeId, entries: &[(String, NodeId)]) {
        let scopes: Vec<NodeId> = self.ancestors(start).collect();
        let incoming: HashSet<NodeId> = entries.iter().map(|&(_, n)| n).collect();
        let mut collisions = Vec::new();

        for (depth, &scope) in scopes.iter().enumerate() {
            let Some(element) = self.element_mut(scope) else {
                continue;
            };
            for (id, node) in entries {
                let bucket = element.by_id.entry(id.clone()).or_default();
                if depth == 0 && bucket.last().is_some_and(|prev| !incoming.contains(prev)) {
                    collisions.push((id.clone(), element.name.clone()));
                }
                bucket.push(*node);
            }
        }

        for (id, scope_name) in collisions {
            tracing::warn!(%id, scope = %scope_name, "duplicate element id replaces earlier element");
            self.push_diagnostic(Diagnostic::warning(format!(
                "duplicate id '{id}' under <{scope_name}>; the earlier element is replaced"
            )));
        }
    }

    /// Removes id entries from `start` and all of its ancestors.
    fn unregister_ids(&mut self, start: NodeId, entries: &[(String, NodeId)]) {
        let scopes: Vec<NodeId> = self.ancestors(start).collect();
        for scope in scopes {
            let Some(element) = self.element_mut(scope) else {
                continue;
            };
            for (id, node) in entries {
                if let Some(bucket) = element.by_id.get_mut(id) {
                    bucket.retain(|n| n != node);
                    if bucket.is_empty() {
                        element.by_id.remove(id);
                    }
                }
            }
        }
    }

    /// Rebuilds every derived index below `root` and compares it with the
    /// stored one.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IndexMismatch`] describing the first
    /// disagreement found.
    pub fn verify_indices(&self, root: NodeId) -> Result<(), TreeError> {
        let scopes = std::iter::once(root).chain(self.descendants(root));
        for scope in scopes {
            let Some(element) = self.element(scope) else {
                continue;
            };
            let name = &element.name;

            let mut expected_names: HashMap<&str, Vec<NodeId>> = HashMap::new();
            for &child in &element.children {
                if self.parent(child) != Some(scope) {
                    return Err(TreeError::IndexMismatch(format!(
                        "child {child:?} of <{name}> does not point back to it"
                    )));
                }
                if let Some(child_element) = self.element(child) {
                    expected_names
                        .entry(child_element.name.as_str())
                        .or_default()
                        .push(child);
                }
            }
            let stored_names: HashMap<&str, Vec<NodeId>> = element
                .by_name
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone()))
                .collect();
            if expected_names != stored_names {
                return Err(TreeError::IndexMismatch(format!(
                    "name index of <{name}> is {stored_names:?}, expected {expected_names:?}"
                )));
            }

            let expected_ids: HashSet<(&str, NodeId)> = self
                .descendants(scope)
                .filter_map(|n| self.element_id(n).map(|id| (id, n)))
                .collect();
            let mut stored_ids = HashSet::new();
            for (id, claimants) in &element.by_id {
                if claimants.is_empty() {
                    return Err(TreeError::IndexMismatch(format!(
                        "id index of <{name}> keeps an empty bucket for '{id}'"
                    )));
                }
                stored_ids.extend(claimants.iter().map(|&n| (id.as_str(), n)));
            }
            if expected_ids != stored_ids {
                return Err(TreeError::IndexMismatch(format!(
                    "id index of <{name}> is {stored_ids:?}, expected {expected_ids:?}"
                )));
            }
        }
        Ok(())
    }
}
