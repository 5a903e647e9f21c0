//! Structural invariants of a test tree, checked between passes.

use std::collections::HashSet;

use crate::core::path::node_path;
use crate::core::tree::{NodeId, TestTree};

/// Check tree invariants that the tree API cannot enforce by construction:
/// - Sibling names are unique
/// - Every cursor is bounded by its child count
/// - Every non-root node is owned by exactly one parent, and its back-reference
///   names that parent
/// - A node still pending its first pass has no children and no recorded runs
pub fn validate_invariants(tree: &TestTree) -> Vec<String> {
    let mut errors = Vec::new();
    let mut owned = HashSet::new();

    for (id, node) in tree.iter() {
        let path = node_path(tree, id);

        if node.next_child > node.children.len() {
            errors.push(format!(
                "{}: cursor {} exceeds child count {}",
                path,
                node.next_child,
                node.children.len()
            ));
        }

        if node.first_pass_pending && (!node.children.is_empty() || node.runs > 0) {
            errors.push(format!("{}: pending first pass but already ran", path));
        }

        let mut names = HashSet::new();
        for &child in &node.children {
            if child.index() >= tree.len() {
                errors.push(format!("{}: child index {} out of range", path, child.index()));
                continue;
            }
            if !owned.insert(child) {
                errors.push(format!("{}: child {} has more than one owner", path, child.index()));
            }
            let child_node = tree.node(child);
            if child_node.parent != Some(id) {
                errors.push(format!(
                    "{}: child '{}' points at a different parent",
                    path, child_node.name
                ));
            }
            if !names.insert(child_node.name.as_str()) {
                errors.push(format!("{}: duplicate child name '{}'", path, child_node.name));
            }
        }
    }

    let orphans = tree
        .iter()
        .filter(|(id, _)| *id != tree.root() && !owned.contains(id))
        .map(|(id, _)| id)
        .collect::<Vec<NodeId>>();
    for orphan in orphans {
        errors.push(format!("node {} is not reachable from the root", orphan.index()));
    }

    errors
}
