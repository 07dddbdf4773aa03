//! Host render tree.
//!
//! Components render into [`HostNode`]s. A render pass produces a
//! [`Fragment`] which is committed into the component's existing host node:
//!
//! ```text
//! render() → Fragment → HostNode::commit → same node, new content
//! ```

mod fragment;
mod host_node;

pub use fragment::Fragment;
pub use host_node::{HostChild, HostNode, NodeId, WeakHostNode};
