//! Arena-backed test tree and the per-node cursors that make passes converge.
//!
//! The tree is discovered while it runs: nodes are appended the first time a
//! body declares them and are never removed or reordered. Each node keeps a
//! cursor (`next_child`) naming the child that the next pass reaching it will
//! execute. [`TestTree::advance_after_pass`] moves those cursors so that every
//! pass retires exactly one leaf.

use std::panic::Location;

use crate::core::path::node_path;
use crate::failure::UsageError;

/// Source location of a declaration.
///
/// Bodies borrow their parent's per-pass stack frame and cannot be stored
/// across passes, so the call site stands in for the body's identity.
pub type DeclSite = &'static Location<'static>;

/// Stable index of a node inside a [`TestTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One declared test.
#[derive(Debug, Clone)]
pub struct TestNode {
    /// Unique among siblings.
    pub name: String,
    /// Call site of the first declaration. It is never updated.
    pub declared_at: DeclSite,
    /// The parent's `runs` value when this node was last declared. Equal to
    /// the parent's current `runs` once the running parent body has declared it.
    pub declared_in_run: u32,
    /// Children in discovery order, which is also execution order.
    pub children: Vec<NodeId>,
    /// Index into `children` of the child selected on the next pass.
    pub next_child: usize,
    /// The body has never executed.
    pub first_pass_pending: bool,
    /// Number of times the body executed during this run.
    pub runs: u32,
    pub parent: Option<NodeId>,
}

impl TestNode {
    fn new(
        name: &str,
        declared_at: DeclSite,
        parent: Option<NodeId>,
        declared_in_run: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            declared_at,
            declared_in_run,
            children: Vec::new(),
            next_child: 0,
            first_pass_pending: true,
            runs: 0,
            parent,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Outcome of resolving a nested declaration against its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The child sits under the parent's cursor and still has work: run it now.
    Execute(NodeId),
    /// The child is known (or was just appended) but is not selected this pass.
    Registered(NodeId),
    /// A known name was redeclared from a different call site. The node keeps
    /// its identity, position and recorded call site; `selected` says whether
    /// the body handed in on this pass runs, exactly as for `Execute`.
    Redeclared {
        id: NodeId,
        first_declared_at: DeclSite,
        selected: bool,
    },
}

/// The dynamically grown n-ary tree of one run.
#[derive(Debug, Clone)]
pub struct TestTree {
    nodes: Vec<TestNode>,
}

impl TestTree {
    /// Create a tree holding only the root.
    pub fn new(root_name: &str, declared_at: DeclSite) -> Self {
        Self {
            nodes: vec![TestNode::new(root_name, declared_at, None, 0)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &TestNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in discovery order, root first.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TestNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Number of nodes without declared children.
    pub fn leaves(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// True while the node still needs at least one more pass.
    pub fn is_eligible(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        node.first_pass_pending || node.next_child < node.children.len()
    }

    /// Resolve `name` against the children of `parent`, appending it on first
    /// encounter, and decide whether it runs on this pass.
    ///
    /// Declaring a name twice during one execution of the parent is a
    /// [`UsageError`]. On the parent's first pass that covers every repeat; on
    /// later passes it catches a child that is newly declared twice, which
    /// would otherwise run two live paths through one node.
    pub fn resolve_child(
        &mut self,
        parent: NodeId,
        name: &str,
        declared_at: DeclSite,
    ) -> Result<Resolution, UsageError> {
        let existing = self.nodes[parent.0]
            .children
            .iter()
            .position(|child| self.nodes[child.0].name == name);

        let parent_run = self.nodes[parent.0].runs;
        let (index, id) = match existing {
            Some(index) => {
                let id = self.nodes[parent.0].children[index];
                if self.nodes[id.0].declared_in_run == parent_run {
                    return Err(UsageError::DuplicateName {
                        parent: node_path(self, parent),
                        name: name.to_string(),
                    });
                }
                self.nodes[id.0].declared_in_run = parent_run;
                (index, id)
            }
            None => {
                let id = NodeId(self.nodes.len());
                self.nodes
                    .push(TestNode::new(name, declared_at, Some(parent), parent_run));
                let children = &mut self.nodes[parent.0].children;
                children.push(id);
                (children.len() - 1, id)
            }
        };

        let selected = index == self.nodes[parent.0].next_child && self.is_eligible(id);
        let first_declared_at = self.nodes[id.0].declared_at;
        if first_declared_at != declared_at {
            return Ok(Resolution::Redeclared {
                id,
                first_declared_at,
                selected,
            });
        }
        if selected {
            Ok(Resolution::Execute(id))
        } else {
            Ok(Resolution::Registered(id))
        }
    }

    /// Count an execution of the node's body.
    pub fn begin(&mut self, id: NodeId) {
        self.nodes[id.0].runs += 1;
    }

    /// Record that an execution attempt ended, successfully or not.
    pub fn finish(&mut self, id: NodeId) {
        self.nodes[id.0].first_pass_pending = false;
    }

    /// Prepare the cursors for the next pass.
    ///
    /// Follows the live path down to its terminus (a node whose cursor is past
    /// its last child), then bubbles completion upward: the parent's cursor
    /// moves on, and if that exhausts the parent the notification continues
    /// to the grandparent.
    pub fn advance_after_pass(&mut self) {
        let mut terminus = self.root();
        loop {
            let node = &self.nodes[terminus.0];
            match node.children.get(node.next_child) {
                Some(&child) => terminus = child,
                None => break,
            }
        }

        let mut current = self.nodes[terminus.0].parent;
        while let Some(id) = current {
            self.nodes[id.0].next_child += 1;
            if self.is_eligible(id) {
                break;
            }
            current = self.nodes[id.0].parent;
        }
    }

    #[cfg(test)]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TestNode {
        &mut self.nodes[id.0]
    }
}
