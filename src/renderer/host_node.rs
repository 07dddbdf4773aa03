//! Host nodes - the render tree components commit into.
//!
//! A [`HostNode`] is the opaque element a component renders into. The
//! runtime relies on a handful of primitives only:
//!
//! - class tokens: [`add_class`](HostNode::add_class) / [`remove_class`](HostNode::remove_class)
//! - style-like properties: [`set_style`](HostNode::set_style) / [`remove_style`](HostNode::remove_style)
//! - ordered content: [`append_child`](HostNode::append_child) and
//!   [`commit`](HostNode::commit)
//!
//! Handles are cheap to clone and share identity. A parent holds its
//! children strongly; a child only points back weakly.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::rc::{Rc, Weak};

use super::fragment::Fragment;

// =============================================================================
// Node Identity
// =============================================================================

thread_local! {
    static NODE_COUNTER: Cell<u64> = const { Cell::new(0) };
}

/// Identity of a host node, stable for its whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NODE_COUNTER.with(|counter| {
            let id = counter.get();
            counter.set(id + 1);
            Self(id)
        })
    }
}

// =============================================================================
// Node Data
// =============================================================================

struct NodeData {
    id: NodeId,
    tag: String,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    content: Vec<HostChild>,
    parent: Option<Weak<RefCell<NodeData>>>,
}

/// One entry of a node's ordered content.
#[derive(Clone)]
pub enum HostChild {
    /// A child host node (moved, never copied).
    Node(HostNode),
    /// A text run.
    Text(String),
}

impl PartialEq for HostChild {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Node(a), Self::Node(b)) => a.ptr_eq(b),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for HostChild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => write!(f, "Node({:?})", node.id()),
            Self::Text(text) => write!(f, "Text({text:?})"),
        }
    }
}

// =============================================================================
// HostNode
// =============================================================================

/// Shared handle to a host render-tree node.
#[derive(Clone)]
pub struct HostNode(Rc<RefCell<NodeData>>);

/// Non-owning handle to a host node.
#[derive(Clone, Debug)]
pub struct WeakHostNode(Weak<RefCell<NodeData>>);

impl WeakHostNode {
    pub fn upgrade(&self) -> Option<HostNode> {
        self.0.upgrade().map(HostNode)
    }
}

impl HostNode {
    /// Create a detached node with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            id: NodeId::next(),
            tag: tag.into(),
            classes: Vec::new(),
            styles: BTreeMap::new(),
            content: Vec::new(),
            parent: None,
        })))
    }

    /// Throwaway container used to mount components off-tree.
    pub fn offscreen() -> Self {
        Self::new("offscreen")
    }

    pub fn id(&self) -> NodeId {
        self.0.borrow().id
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn downgrade(&self) -> WeakHostNode {
        WeakHostNode(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &HostNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // -------------------------------------------------------------------------
    // Class tokens
    // -------------------------------------------------------------------------

    /// Add a class token. Adding a token twice is a no-op.
    pub fn add_class(&self, token: &str) {
        let mut data = self.0.borrow_mut();
        if !data.classes.iter().any(|c| c == token) {
            data.classes.push(token.to_string());
        }
    }

    /// Remove a class token. Returns whether it was present.
    pub fn remove_class(&self, token: &str) -> bool {
        let mut data = self.0.borrow_mut();
        let before = data.classes.len();
        data.classes.retain(|c| c != token);
        data.classes.len() != before
    }

    pub fn has_class(&self, token: &str) -> bool {
        self.0.borrow().classes.iter().any(|c| c == token)
    }

    /// Class tokens in insertion order.
    pub fn classes(&self) -> Vec<String> {
        self.0.borrow().classes.clone()
    }

    // -------------------------------------------------------------------------
    // Style properties
    // -------------------------------------------------------------------------

    pub fn set_style(&self, key: &str, value: impl Into<String>) {
        self.0.borrow_mut().styles.insert(key.to_string(), value.into());
    }

    pub fn remove_style(&self, key: &str) -> Option<String> {
        self.0.borrow_mut().styles.remove(key)
    }

    pub fn style(&self, key: &str) -> Option<String> {
        self.0.borrow().styles.get(key).cloned()
    }

    pub fn styles(&self) -> BTreeMap<String, String> {
        self.0.borrow().styles.clone()
    }

    // -------------------------------------------------------------------------
    // Tree structure
    // -------------------------------------------------------------------------

    pub fn parent(&self) -> Option<HostNode> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(HostNode)
    }

    /// Child host nodes in order (text runs skipped).
    pub fn children(&self) -> Vec<HostNode> {
        self.0
            .borrow()
            .content
            .iter()
            .filter_map(|child| match child {
                HostChild::Node(node) => Some(node.clone()),
                HostChild::Text(_) => None,
            })
            .collect()
    }

    /// Append `child` at the end, moving it out of its previous parent.
    pub fn append_child(&self, child: &HostNode) {
        if child.ptr_eq(self) {
            return;
        }
        child.detach();
        child.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        self.0.borrow_mut().content.push(HostChild::Node(child.clone()));
    }

    /// Remove this node from its parent's content.
    pub fn detach(&self) {
        let parent = self.0.borrow_mut().parent.take().and_then(|p| p.upgrade());
        if let Some(parent) = parent {
            parent.borrow_mut().content.retain(|child| match child {
                HostChild::Node(node) => !Rc::ptr_eq(&node.0, &self.0),
                HostChild::Text(_) => true,
            });
        }
    }

    /// Reconcile a freshly rendered fragment into this node.
    ///
    /// The node keeps its identity, class tokens and styles; only its
    /// content is replaced. Referenced nodes are moved under this node,
    /// previous child nodes missing from the fragment are detached.
    /// Returns whether the content changed.
    pub fn commit(&self, fragment: Fragment) -> bool {
        let next: Vec<HostChild> = fragment
            .into_items()
            .into_iter()
            .filter(|item| !matches!(item, HostChild::Node(node) if node.ptr_eq(self)))
            .collect();

        let previous = std::mem::take(&mut self.0.borrow_mut().content);
        let changed = previous != next;

        for old in &previous {
            if let HostChild::Node(node) = old {
                if !next.contains(old) {
                    node.0.borrow_mut().parent = None;
                }
            }
        }
        for item in &next {
            if let HostChild::Node(node) = item {
                let is_ours = node.parent().is_some_and(|p| p.ptr_eq(self));
                if !is_ours {
                    node.detach();
                    node.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
                }
            }
        }

        self.0.borrow_mut().content = next;
        changed
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in self.0.borrow().content.iter() {
            match child {
                HostChild::Text(text) => out.push_str(text),
                HostChild::Node(node) => node.collect_text(out),
            }
        }
    }

    /// Serialize the subtree as markup, e.g. `<div class="a b" style="gap:4px">hi</div>`.
    ///
    /// Classes keep insertion order, styles are sorted by key.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let data = self.0.borrow();
        let _ = write!(out, "<{}", data.tag);
        if !data.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", data.classes.join(" "));
        }
        if !data.styles.is_empty() {
            let style: Vec<String> = data.styles.iter().map(|(k, v)| format!("{k}:{v}")).collect();
            let _ = write!(out, " style=\"{}\"", style.join(";"));
        }
        out.push('>');
        for child in &data.content {
            match child {
                HostChild::Text(text) => out.push_str(text),
                HostChild::Node(node) => node.write_markup(out),
            }
        }
        let _ = write!(out, "</{}>", data.tag);
    }
}

impl fmt::Debug for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("HostNode")
            .field("id", &data.id)
            .field("tag", &data.tag)
            .field("classes", &data.classes)
            .field("styles", &data.styles)
            .field("content", &data.content)
            .finish()
    }
}
