//! Shared result types produced by a run.
//!
//! Lists are kept in deterministic order (pass order for failures, discovery
//! order for nodes) so serialized reports are stable across runs.

use serde::Serialize;

use crate::core::path::node_path;
use crate::core::tree::TestTree;
use crate::failure::Failure;

/// A failure recorded at the node where it originated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// 1-indexed pass during which the failure was raised.
    pub pass: u32,
    /// `/`-separated path of the node whose body raised it.
    pub path: String,
    pub failure: Failure,
}

/// Execution count of one node over a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub path: String,
    pub runs: u32,
    pub leaf: bool,
}

/// Summary of one `Runner::run` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub root: String,
    pub passes: u32,
    pub leaves: usize,
    pub failures: Vec<FailureRecord>,
    /// Every discovered node, in discovery order.
    pub nodes: Vec<NodeSummary>,
}

impl RunReport {
    pub fn new(tree: &TestTree, passes: u32, failures: Vec<FailureRecord>) -> Self {
        let nodes = tree
            .iter()
            .map(|(id, node)| NodeSummary {
                path: node_path(tree, id),
                runs: node.runs,
                leaf: node.is_leaf(),
            })
            .collect();
        Self {
            root: tree.node(tree.root()).name.clone(),
            passes,
            leaves: tree.leaves(),
            failures,
            nodes,
        }
    }

    /// True when no pass recorded a failure.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// How many times the node at `path` executed, if it was discovered.
    pub fn runs_of(&self, path: &str) -> Option<u32> {
        self.nodes
            .iter()
            .find(|node| node.path == path)
            .map(|node| node.runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::Resolution;
    use std::panic::Location;

    #[test]
    fn report_lists_nodes_in_discovery_order() {
        let mut tree = TestTree::new("P", Location::caller());
        let root = tree.root();
        tree.begin(root);
        let Resolution::Execute(first) = tree
            .resolve_child(root, "A", Location::caller())
            .expect("A")
        else {
            panic!("A not selected");
        };
        tree.begin(first);
        tree.finish(first);
        tree.resolve_child(root, "B", Location::caller())
            .expect("B");
        tree.finish(root);

        let report = RunReport::new(&tree, 1, Vec::new());

        let paths = report
            .nodes
            .iter()
            .map(|node| node.path.as_str())
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["P", "P/A", "P/B"]);
        assert_eq!(report.runs_of("P/A"), Some(1));
        assert_eq!(report.runs_of("P/B"), Some(0));
        assert_eq!(report.runs_of("P/C"), None);
        assert_eq!(report.leaves, 2);
        assert!(report.is_success());
    }
}
