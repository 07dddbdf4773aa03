//! Layout - Pluggable arrangement strategies for container children.
//!
//! A [`Layout`] derives presentation attributes (class tokens, style keys)
//! for a container's host node and its children's host nodes. It never owns
//! either: a [`LayoutContext`] hands them over by reference on each call.
//!
//! # Contract
//!
//! - `apply` is idempotent. Strategies route every write through an
//!   [`AppliedAttributes`] ledger, which diffs against the previous apply.
//! - Only attributes the layout applied are ever removed.
//! - Layout-wide defaults apply first; a child's own `props["layout"]`
//!   object ([`ItemOverrides`]) wins where present.
//! - Children without a host node are skipped.
//! - Unknown enum values apply nothing.
//! - An empty container still gets its container-level attributes.
//!
//! # Built-ins
//!
//! | type     | strategy        |
//! |----------|-----------------|
//! | `flex`   | [`FlexLayout`]  |
//! | `row`    | [`FlexLayout`], direction forced to row |
//! | `column` | [`FlexLayout`], direction forced to column |
//! | `grid`   | [`GridLayout`]  |
//! | `joined` | [`JoinedLayout`] |

mod applied;
mod flex;
mod grid;
mod joined;
mod registry;
mod types;

use std::fmt;

use serde_json::Value;

use crate::engine::ComponentRef;
use crate::error::Result;
use crate::renderer::HostNode;
use crate::state::StateStore;
use crate::types::Props;

pub use applied::{AppliedAttributes, NodeAttributes};
pub use flex::{FlexLayout, FlexOptions};
pub use grid::{GridLayout, GridOptions};
pub use joined::{JoinedLayout, JoinedOptions};
pub use registry::{
    create_layout, is_layout_registered, register_layout, registered_layouts,
    reset_layout_registry, LayoutFactory,
};
pub use types::*;

// =============================================================================
// Layout Trait
// =============================================================================

/// An arrangement strategy.
pub trait Layout: 'static {
    /// Registry name of the strategy.
    fn name(&self) -> &str;

    /// Bring the host and children attributes in line with the current
    /// configuration and child sequence.
    fn apply(&mut self, cx: &LayoutContext<'_>) -> Result<()>;

    /// Reverse every attribute this instance applied.
    fn dispose(&mut self, _cx: &LayoutContext<'_>) {}
}

/// What a layout is applied to.
pub struct LayoutContext<'a> {
    pub host: &'a HostNode,
    pub children: &'a [ComponentRef],
    pub state: &'a StateStore,
    pub props: &'a Props,
}

impl LayoutContext<'_> {
    /// Children paired with their host nodes, in order. Children without a
    /// host node are left out.
    pub fn child_hosts(&self) -> Vec<(&ComponentRef, HostNode)> {
        self.children
            .iter()
            .filter_map(|child| child.host().map(|host| (child, host)))
            .collect()
    }
}

// =============================================================================
// Layout Spec
// =============================================================================

/// A layout given either as a live instance or as a `{type, ...options}`
/// config resolved through the layout registry.
pub enum LayoutSpec {
    Instance(Box<dyn Layout>),
    Config(Value),
}

impl LayoutSpec {
    pub fn resolve(self) -> Result<Box<dyn Layout>> {
        match self {
            Self::Instance(layout) => Ok(layout),
            Self::Config(config) => create_layout(&config),
        }
    }
}

impl From<Value> for LayoutSpec {
    fn from(config: Value) -> Self {
        Self::Config(config)
    }
}

impl From<Box<dyn Layout>> for LayoutSpec {
    fn from(layout: Box<dyn Layout>) -> Self {
        Self::Instance(layout)
    }
}

impl fmt::Debug for LayoutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(layout) => f.debug_tuple("Instance").field(&layout.name()).finish(),
            Self::Config(config) => f.debug_tuple("Config").field(config).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Component, Lifecycle};
    use crate::renderer::Fragment;
    use serde_json::json;

    struct Bare;

    impl Component for Bare {
        fn type_name(&self) -> &str {
            "bare"
        }

        fn render(&mut self, _cx: &Lifecycle<'_>) -> Result<Fragment> {
            Ok(Fragment::new())
        }
    }

    #[test]
    fn test_child_hosts_skips_unmounted() {
        let root = HostNode::new("body");
        let mounted = ComponentRef::new(Bare, Props::new());
        mounted.mount(&root, None).unwrap();
        let unmounted = ComponentRef::new(Bare, Props::new());
        let children = [unmounted, mounted.clone()];

        let host = HostNode::new("div");
        let state = StateStore::new();
        let props = Props::new();
        let cx = LayoutContext { host: &host, children: &children, state: &state, props: &props };

        let hosts = cx.child_hosts();
        assert_eq!(hosts.len(), 1);
        assert!(hosts[0].0.ptr_eq(&mounted));
    }

    #[test]
    fn test_spec_resolves_config() {
        reset_layout_registry();
        let layout = LayoutSpec::from(json!({"type": "joined"})).resolve().unwrap();
        assert_eq!(layout.name(), "joined");
    }
}
