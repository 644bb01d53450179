//! Call tree storage for recorded signal emissions.
//!
//! The live tree is an arena (`Vec<CallNode>` addressed by [`NodeId`]) so the
//! recorder can hold plain indices on its per-thread call stacks. Readers never
//! see the arena: [`CallTree::snapshot`] produces an owned, nested
//! [`ProfileSnapshot`] that can be serialized without holding any lock.
//!
//! ```text
//! [app]                      NodeId(0), never entered
//! ├── Scene.sceneChanged     count 12, 4 100µs
//! │   └── Camera.update      count 12, 1 900µs
//! └── Job.finished           count 3,    250µs
//! ```

use std::collections::HashMap;

use crate::domain::{Micros, NodeId};

/// Label of the synthetic whole-application root frame.
pub const ROOT_LABEL: &str = "[app]";

/// One frame in the live call tree.
#[derive(Debug, Clone)]
pub struct CallNode {
    /// Identifying frame name (the signal's full name).
    pub label: String,
    /// Short human-readable name shown by the front-end.
    pub display_label: String,
    /// Number of times this frame was entered.
    pub call_count: u64,
    /// Time accumulated by matching exits.
    pub cumulative_time: Micros,
    /// Children in first-seen order.
    pub children: Vec<NodeId>,
    child_by_label: HashMap<String, NodeId>,
}

impl CallNode {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            display_label: display_label(label).to_string(),
            call_count: 0,
            cumulative_time: Micros::ZERO,
            children: Vec::new(),
            child_by_label: HashMap::new(),
        }
    }
}

/// Arena-backed call tree with a single synthetic root.
#[derive(Debug, Clone)]
pub struct CallTree {
    nodes: Vec<CallNode>,
}

impl CallTree {
    /// Create a tree containing only the root frame.
    pub fn new() -> Self {
        Self {
            nodes: vec![CallNode::new(ROOT_LABEL)],
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&CallNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut CallNode> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing has been recorded under the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Find the child of `parent` named `label`, creating it if needed.
    ///
    /// Returns `None` only if `parent` does not exist.
    pub fn child_or_insert(&mut self, parent: NodeId, label: &str) -> Option<NodeId> {
        if let Some(&existing) = self.node(parent)?.child_by_label.get(label) {
            return Some(existing);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(CallNode::new(label));

        let parent_node = &mut self.nodes[parent.0];
        parent_node.children.push(id);
        parent_node.child_by_label.insert(label.to_string(), id);
        Some(id)
    }

    /// Copy the arena into an owned nested tree.
    pub fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            root: self.snapshot_node(NodeId::ROOT),
        }
    }

    fn snapshot_node(&self, id: NodeId) -> SnapshotNode {
        let node = &self.nodes[id.0];
        SnapshotNode {
            label: node.label.clone(),
            display_label: node.display_label.clone(),
            call_count: node.call_count,
            cumulative_time: node.cumulative_time,
            children: node
                .children
                .iter()
                .map(|&child| self.snapshot_node(child))
                .collect(),
        }
    }
}

impl Default for CallTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of one call tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    pub label: String,
    pub display_label: String,
    pub call_count: u64,
    pub cumulative_time: Micros,
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn child(&self, label: &str) -> Option<&SnapshotNode> {
        self.children.iter().find(|c| c.label == label)
    }

    /// Sum of `call_count` over this node's descendants.
    pub fn descendant_calls(&self) -> u64 {
        self.children
            .iter()
            .map(|c| c.call_count + c.descendant_calls())
            .sum()
    }

    fn children_time(&self) -> Micros {
        self.children
            .iter()
            .fold(Micros::ZERO, |acc, c| acc.saturating_add(c.cumulative_time))
    }
}

/// Point-in-time copy of the recorded call tree, safe to read without locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSnapshot {
    pub root: SnapshotNode,
}

impl ProfileSnapshot {
    /// A snapshot with only the root frame.
    pub fn empty() -> Self {
        CallTree::new().snapshot()
    }

    /// True when no frame was recorded under the root.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Follow a path of labels from the root.
    pub fn find(&self, path: &[&str]) -> Option<&SnapshotNode> {
        path.iter()
            .try_fold(&self.root, |node, label| node.child(label))
    }

    /// Total frames entered during the session.
    pub fn total_calls(&self) -> u64 {
        self.root.descendant_calls()
    }

    /// Calls attributed to the root: the sum of its top-level frames.
    pub fn root_calls(&self) -> u64 {
        self.root.children.iter().map(|c| c.call_count).sum()
    }

    /// Whole-application time: the root's own time or its children's, whichever is larger.
    pub fn run_time(&self) -> Micros {
        self.root.cumulative_time.max(self.root.children_time())
    }
}

/// Derive the short display name for a frame label.
///
/// Keeps the last `::` or `.` separated segment, so
/// `"cura::scene::Scene.sceneChanged"` becomes `"sceneChanged"`.
pub fn display_label(label: &str) -> &str {
    let tail = label.rsplit("::").next().unwrap_or(label);
    match tail.rsplit('.').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => label,
    }
}
