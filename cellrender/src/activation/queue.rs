//! The activation queue.

use super::ScriptNode;
use crate::dom::{Document, NodeId};
use std::collections::VecDeque;

/// Script nodes awaiting execution, in document order.
///
/// Consumed front to back and never reordered. One queue belongs to one
/// pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationQueue {
    nodes: VecDeque<ScriptNode>,
}

impl ActivationQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every `<script>` below `root` in document order.
    #[must_use]
    pub fn collect(document: &Document, root: NodeId) -> Self {
        document
            .elements_by_tag(root, "script")
            .into_iter()
            .filter_map(|el| ScriptNode::from_element(document, el))
            .collect()
    }

    /// Returns the number of queued nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Takes the next node.
    pub fn pop_front(&mut self) -> Option<ScriptNode> {
        self.nodes.pop_front()
    }

    /// Removes and returns every remaining node.
    pub fn drain(&mut self) -> impl Iterator<Item = ScriptNode> + '_ {
        self.nodes.drain(..)
    }

    /// Iterates the queued nodes without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &ScriptNode> {
        self.nodes.iter()
    }
}

impl FromIterator<ScriptNode> for ActivationQueue {
    fn from_iter<I: IntoIterator<Item = ScriptNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
