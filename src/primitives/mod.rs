//! Primitives - Built-in components.
//!
//! - [`Element`] - leaf: a host tag with classes and static or state-bound text
//! - [`Container`] - ordered children mounted under its state, arranged by a layout
//!
//! Both are registered in the component registry (`element`, `container`,
//! and `group` for the fixed joined container).

mod container;
mod element;

pub use container::{ChildSpec, Container, ContainerOptions, LayoutPolicy};
pub use element::Element;

use serde_json::Value;

use crate::renderer::HostNode;
use crate::types::Props;

/// Host tag from `props.tag`, defaulting to `div`.
pub(crate) fn host_tag_prop(props: &Props) -> String {
    match props.str("tag").map(str::trim) {
        Some(tag) if !tag.is_empty() => tag.to_string(),
        _ => "div".to_string(),
    }
}

/// Add the tokens of `props.class` (a whitespace separated string or an
/// array of strings) to `host`.
pub(crate) fn apply_class_prop(host: &HostNode, props: &Props) {
    match props.get("class") {
        Some(Value::String(tokens)) => {
            for token in tokens.split_whitespace() {
                host.add_class(token);
            }
        }
        Some(Value::Array(tokens)) => {
            for token in tokens.iter().filter_map(Value::as_str).map(str::trim) {
                if !token.is_empty() {
                    host.add_class(token);
                }
            }
        }
        _ => {}
    }
}
