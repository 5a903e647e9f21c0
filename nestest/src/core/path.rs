//! Helpers for rendering deterministic node paths.

use crate::core::tree::{NodeId, TestTree};

/// Return the `/`-separated name path from the root to `id`.
pub fn node_path(tree: &TestTree, id: NodeId) -> String {
    let mut names = Vec::new();
    let mut current = Some(id);
    while let Some(node_id) = current {
        let node = tree.node(node_id);
        names.push(node.name.as_str());
        current = node.parent;
    }
    names.reverse();
    names.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::Resolution;
    use std::panic::Location;

    #[test]
    fn node_path_returns_root_name_for_root() {
        let tree = TestTree::new("Parent", Location::caller());
        assert_eq!(node_path(&tree, tree.root()), "Parent");
    }

    #[test]
    fn node_path_joins_ancestors_in_order() {
        let mut tree = TestTree::new("Parent", Location::caller());
        let root = tree.root();
        let Resolution::Execute(child) = tree
            .resolve_child(root, "Child 1", Location::caller())
            .expect("child")
        else {
            panic!("child not selected");
        };
        let Resolution::Execute(grandchild) = tree
            .resolve_child(child, "Grandchild 1", Location::caller())
            .expect("grandchild")
        else {
            panic!("grandchild not selected");
        };

        assert_eq!(
            node_path(&tree, grandchild),
            "Parent/Child 1/Grandchild 1"
        );
    }
}
