//! Render fragments - the output of a component's render function.
//!
//! A fragment is an ordered list of text runs and references to existing
//! host nodes. Committing it into a [`HostNode`] replaces the node's
//! content without touching the node's identity or attributes.

use super::host_node::{HostChild, HostNode};

/// Ordered render output of a single pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    items: Vec<HostChild>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment holding a single text run.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new().with_text(text)
    }

    /// Fragment referencing the given nodes, in order.
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = HostNode>,
    {
        Self {
            items: nodes.into_iter().map(HostChild::Node).collect(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn with_node(mut self, node: &HostNode) -> Self {
        self.push_node(node);
        self
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.items.push(HostChild::Text(text.into()));
    }

    pub fn push_node(&mut self, node: &HostNode) {
        self.items.push(HostChild::Node(node.clone()));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[HostChild] {
        &self.items
    }

    pub(crate) fn into_items(self) -> Vec<HostChild> {
        self.items
    }
}

impl FromIterator<HostNode> for Fragment {
    fn from_iter<I: IntoIterator<Item = HostNode>>(iter: I) -> Self {
        Self::from_nodes(iter)
    }
}
