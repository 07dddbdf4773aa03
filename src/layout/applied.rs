//! Applied-attribute ledger.
//!
//! Each layout instance owns one ledger recording exactly which class
//! tokens it added and which style keys it set, per node. Every apply hands
//! the ledger the full desired attribute set; the ledger diffs against what
//! it applied last time:
//!
//! ```text
//! previous {layout-flex, display:flex, gap:8px}
//! desired  {layout-flex, display:flex}
//!          ──────────────────────────────────
//!          remove gap (restore prior value), keep the rest untouched
//! ```
//!
//! Tokens and keys that were already on a node before the layout touched
//! them are foreign: a class token present beforehand is never tracked (and
//! so never removed), and a style key records its prior value so revert
//! restores it rather than deleting it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::renderer::{HostNode, NodeId, WeakHostNode};

// =============================================================================
// Desired attributes
// =============================================================================

/// Attributes a layout wants on one node for the current apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAttributes {
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
}

impl NodeAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if !token.is_empty() && !self.classes.contains(&token) {
            self.classes.push(token);
        }
        self
    }

    /// Add `token` if present; `None` leaves the node alone.
    pub fn class_opt(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => self.class(token),
            None => self,
        }
    }

    pub fn style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(key.into(), value.into());
        self
    }

    /// Set `key` if a value is present. An absent value leaves the key to
    /// inherited/default behavior.
    pub fn style_opt<V: Into<String>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.style(key, value),
            None => self,
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn styles(&self) -> &BTreeMap<String, String> {
        &self.styles
    }
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Debug)]
struct Entry {
    node: WeakHostNode,
    classes: BTreeSet<String>,
    /// Style key → value the node had before we first set it.
    styles: BTreeMap<String, Option<String>>,
}

impl Entry {
    fn new(node: &HostNode) -> Self {
        Self {
            node: node.downgrade(),
            classes: BTreeSet::new(),
            styles: BTreeMap::new(),
        }
    }

    fn revert(self) {
        let Some(node) = self.node.upgrade() else {
            return;
        };
        for token in &self.classes {
            node.remove_class(token);
        }
        for (key, prior) in self.styles {
            restore_style(&node, &key, prior);
        }
    }
}

fn restore_style(node: &HostNode, key: &str, prior: Option<String>) {
    match prior {
        Some(value) => node.set_style(key, value),
        None => {
            node.remove_style(key);
        }
    }
}

/// Everything one layout instance has applied, keyed by node.
#[derive(Debug, Default)]
pub struct AppliedAttributes {
    entries: HashMap<NodeId, Entry>,
}

impl AppliedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the applied set equal `desired`.
    ///
    /// Nodes not named in `desired` lose everything previously applied to
    /// them. Re-applying an unchanged set leaves every node as it was.
    pub fn reconcile(&mut self, desired: Vec<(HostNode, NodeAttributes)>) {
        let mut seen: HashSet<NodeId> = HashSet::with_capacity(desired.len());

        for (node, attributes) in desired {
            let id = node.id();
            seen.insert(id);
            let entry = self.entries.entry(id).or_insert_with(|| Entry::new(&node));
            apply_entry(entry, &node, &attributes);
        }

        let stale: Vec<NodeId> = self
            .entries
            .keys()
            .filter(|id| !seen.contains(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(entry) = self.entries.remove(&id) {
                entry.revert();
            }
        }
    }

    /// Remove everything this ledger applied.
    pub fn revert_all(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.revert();
        }
    }

    /// Number of nodes currently carrying applied attributes.
    pub fn tracked_nodes(&self) -> usize {
        self.entries.len()
    }

    /// Whether `token` on `node` was added by this ledger.
    pub fn owns_class(&self, node: &HostNode, token: &str) -> bool {
        self.entries
            .get(&node.id())
            .is_some_and(|entry| entry.classes.contains(token))
    }
}

fn apply_entry(entry: &mut Entry, node: &HostNode, attributes: &NodeAttributes) {
    // Classes: drop what we added and no longer want.
    let unwanted: Vec<String> = entry
        .classes
        .iter()
        .filter(|token| !attributes.classes().contains(*token))
        .cloned()
        .collect();
    for token in unwanted {
        node.remove_class(&token);
        entry.classes.remove(&token);
    }
    for token in attributes.classes() {
        if entry.classes.contains(token) {
            node.add_class(token);
        } else if !node.has_class(token) {
            node.add_class(token);
            entry.classes.insert(token.clone());
        }
    }

    // Styles: restore what we set and no longer want.
    let unwanted: Vec<String> = entry
        .styles
        .keys()
        .filter(|key| !attributes.styles().contains_key(*key))
        .cloned()
        .collect();
    for key in unwanted {
        if let Some(prior) = entry.styles.remove(&key) {
            restore_style(node, &key, prior);
        }
    }
    for (key, value) in attributes.styles() {
        if !entry.styles.contains_key(key) {
            entry.styles.insert(key.clone(), node.style(key));
        }
        if node.style(key).as_deref() != Some(value.as_str()) {
            node.set_style(key, value.clone());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_is_idempotent() {
        let node = HostNode::new("div");
        let mut ledger = AppliedAttributes::new();
        let desired = || vec![(node.clone(), NodeAttributes::new().class("a").style("gap", "4px"))];

        ledger.reconcile(desired());
        let first = node.to_markup();
        ledger.reconcile(desired());
        assert_eq!(node.to_markup(), first);
        assert_eq!(node.classes(), vec!["a"]);
    }

    #[test]
    fn test_diff_removes_only_previous_tokens() {
        let node = HostNode::new("div");
        node.add_class("foreign");
        let mut ledger = AppliedAttributes::new();

        ledger.reconcile(vec![(node.clone(), NodeAttributes::new().class("horizontal"))]);
        ledger.reconcile(vec![(node.clone(), NodeAttributes::new().class("vertical"))]);

        assert_eq!(node.classes(), vec!["foreign", "vertical"]);
    }

    #[test]
    fn test_foreign_class_is_never_removed() {
        let node = HostNode::new("div");
        node.add_class("shared");
        let mut ledger = AppliedAttributes::new();

        ledger.reconcile(vec![(node.clone(), NodeAttributes::new().class("shared"))]);
        assert!(!ledger.owns_class(&node, "shared"));
        ledger.revert_all();
        assert!(node.has_class("shared"));
    }

    #[test]
    fn test_style_prior_value_is_restored() {
        let node = HostNode::new("div");
        node.set_style("display", "block");
        let mut ledger = AppliedAttributes::new();

        ledger.reconcile(vec![(node.clone(), NodeAttributes::new().style("display", "flex").style("gap", "2px"))]);
        assert_eq!(node.style("display").as_deref(), Some("flex"));

        ledger.revert_all();
        assert_eq!(node.style("display").as_deref(), Some("block"));
        assert_eq!(node.style("gap"), None);
        assert_eq!(ledger.tracked_nodes(), 0);
    }

    #[test]
    fn test_node_dropped_from_desired_is_reverted() {
        let a = HostNode::new("div");
        let b = HostNode::new("div");
        let mut ledger = AppliedAttributes::new();
        let item = || NodeAttributes::new().class("item");

        ledger.reconcile(vec![(a.clone(), item()), (b.clone(), item())]);
        ledger.reconcile(vec![(a.clone(), item())]);

        assert!(a.has_class("item"));
        assert!(!b.has_class("item"));
        assert_eq!(ledger.tracked_nodes(), 1);
    }

    #[test]
    fn test_optional_values_are_skipped() {
        let attributes = NodeAttributes::new()
            .class_opt(None)
            .style_opt::<String>("align-items", None)
            .style_opt("gap", Some("1px"));
        assert!(attributes.classes().is_empty());
        assert_eq!(attributes.styles().len(), 1);
    }
}
