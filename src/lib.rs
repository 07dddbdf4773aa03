//! # weft
//!
//! Reactive component runtime with coalesced rendering and pluggable
//! container layouts.
//!
//! ## Architecture
//!
//! Components hold a [`StateStore`], render a [`Fragment`] and commit it into
//! a [`HostNode`] whose identity never changes across renders. Containers own
//! an ordered child sequence and re-apply a [`Layout`] after every commit.
//!
//! ```text
//! state.set(key) ─► subscriber ─► request_render() ─┐
//!                                  request_layout() ─┼─► scheduler queue (coalesced)
//!                                                    ▼
//!                      flush() ─► render → commit → after_commit → layout.apply
//! ```
//!
//! Everything is single threaded: registries, the scheduler queue and the
//! runtime configuration are thread-local.
//!
//! ## Modules
//!
//! - [`state`] - Key/value store with weak parent delegation and subscriptions
//! - [`engine`] - Component lifecycle, scheduler, component registry
//! - [`layout`] - Layout protocol, attribute ledger, flex/grid/joined strategies
//! - [`primitives`] - `Element` and `Container`
//! - [`renderer`] - In-memory host render tree
//! - [`config`] - Runtime limits
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use weft::{create, flush, HostNode, StateStore};
//!
//! let app = StateStore::new();
//! app.set("label", "Save");
//!
//! let toolbar = create(&json!({
//!     "type": "group",
//!     "orientation": "horizontal",
//!     "children": [
//!         { "type": "element", "tag": "button", "bind": "label" },
//!         { "type": "element", "tag": "button", "text": "Cancel" },
//!     ],
//! }))?;
//! let root = HostNode::new("body");
//! toolbar.mount(&root, Some(&app))?;
//!
//! app.set("label", "Saved");
//! flush()?;
//! assert!(root.text_content().starts_with("Saved"));
//! # Ok::<(), weft::ComponentError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod primitives;
pub mod renderer;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{configure, reset_runtime_config, runtime_config, RuntimeConfig};

pub use error::{ComponentError, Result, StateError};

pub use engine::{
    clear_defer_hook, config_type, create, flush, has_pending, is_registered, pending_count,
    register_class, registered_types, reset_registry, reset_scheduler, set_defer_hook, Component,
    ComponentFactory, ComponentRef, Lifecycle, MountContext, PendingWork, WeakComponentRef,
};

pub use layout::{
    create_layout, is_layout_registered, register_layout, registered_layouts,
    reset_layout_registry, AppliedAttributes, FlexLayout, GridLayout, ItemOverrides,
    JoinedLayout, Layout, LayoutContext, LayoutSpec, NodeAttributes,
};

pub use primitives::{ChildSpec, Container, ContainerOptions, Element, LayoutPolicy};

pub use renderer::{Fragment, HostChild, HostNode, NodeId, WeakHostNode};

pub use state::{StateStore, Subscription};
