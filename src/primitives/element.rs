//! Element - Leaf component rendering text into a host node.
//!
//! Props:
//! - `tag`: host tag (default `div`)
//! - `class`: class token string (whitespace separated) or array of tokens
//! - `text`: static text content
//! - `bind`: state key whose value becomes the text content; re-renders on
//!   every write to that key in the element's own store or any ancestor store
//! - `type`: component type name (default `element`)

use serde_json::Value;

use crate::engine::{Component, ComponentRef, Lifecycle};
use crate::error::{ComponentError, Result};
use crate::renderer::Fragment;
use crate::state::Subscription;
use crate::types::Props;

use super::{apply_class_prop, host_tag_prop};

pub struct Element {
    type_name: String,
    subscriptions: Vec<Subscription>,
}

impl Element {
    /// Create an unmounted element.
    pub fn new(props: Props) -> ComponentRef {
        let type_name = props.str("type").unwrap_or("element").to_string();
        ComponentRef::new(Self { type_name, subscriptions: Vec::new() }, props)
    }

    /// Registry factory: the whole config becomes the element's props.
    pub fn from_config(config: &Value) -> Result<ComponentRef> {
        if !config.is_object() {
            return Err(ComponentError::config("element config must be an object"));
        }
        Ok(Self::new(Props::from_value(config.clone())))
    }
}

/// Text shown for a state value.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl Component for Element {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn host_tag(&self, props: &Props) -> String {
        host_tag_prop(props)
    }

    fn render(&mut self, cx: &Lifecycle<'_>) -> Result<Fragment> {
        let text = match cx.props().str("bind") {
            Some(key) => cx.state().get(key).map(|v| display_value(&v)).unwrap_or_default(),
            None => cx.props().str("text").unwrap_or_default().to_string(),
        };
        if text.is_empty() {
            Ok(Fragment::new())
        } else {
            Ok(Fragment::text(text))
        }
    }

    fn after_mount(&mut self, cx: &Lifecycle<'_>) -> Result<()> {
        if let Some(host) = cx.host() {
            apply_class_prop(&host, cx.props());
        }

        let Some(key) = cx.props().str("bind") else {
            return Ok(());
        };
        let mut store = Some(cx.state().clone());
        while let Some(current) = store {
            let component = cx.component().downgrade();
            self.subscriptions.push(current.on(key, move |_| {
                if let Some(component) = component.upgrade() {
                    component.request_render();
                }
            }));
            store = current.parent();
        }
        Ok(())
    }

    fn before_unmount(&mut self, _cx: &Lifecycle<'_>) {
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{flush, reset_scheduler};
    use crate::renderer::HostNode;
    use crate::state::StateStore;
    use serde_json::json;

    #[test]
    fn test_static_text_and_tag() {
        reset_scheduler();
        let root = HostNode::new("body");
        let element = Element::new(Props::new().with("tag", "span").with("text", "hi"));
        element.mount(&root, None).unwrap();

        assert_eq!(element.type_name(), "element");
        assert_eq!(root.to_markup(), "<body><span>hi</span></body>");
    }

    #[test]
    fn test_class_prop_forms() {
        reset_scheduler();
        let root = HostNode::new("body");
        let a = Element::new(Props::new().with("class", "btn  primary"));
        let b = Element::new(Props::new().with("class", json!(["btn", "", "ghost"])));
        a.mount(&root, None).unwrap();
        b.mount(&root, None).unwrap();

        assert_eq!(a.host().unwrap().classes(), vec!["btn", "primary"]);
        assert_eq!(b.host().unwrap().classes(), vec!["btn", "ghost"]);
    }

    #[test]
    fn test_bound_text_follows_state() {
        reset_scheduler();
        let parent = StateStore::new();
        parent.set("count", 1);
        let element = Element::new(Props::new().with("bind", "count"));
        element.mount(&HostNode::new("body"), Some(&parent)).unwrap();
        let host = element.host().unwrap();
        assert_eq!(host.text_content(), "1");

        parent.set("count", 2);
        assert_eq!(host.text_content(), "1");
        flush().unwrap();
        assert_eq!(host.text_content(), "2");

        element.state().unwrap().set("count", "local");
        flush().unwrap();
        assert_eq!(host.text_content(), "local");
    }

    #[test]
    fn test_unmount_disposes_bindings() {
        reset_scheduler();
        let parent = StateStore::new();
        let element = Element::new(Props::new().with("bind", "label"));
        element.mount(&HostNode::new("body"), Some(&parent)).unwrap();
        assert_eq!(parent.subscriber_count("label"), 1);

        element.unmount().unwrap();
        assert_eq!(parent.subscriber_count("label"), 0);
    }

    #[test]
    fn test_from_config_rejects_non_object() {
        assert!(matches!(Element::from_config(&json!(3)), Err(ComponentError::Config(_))));
        let custom = Element::from_config(&json!({"type": "badge", "text": "new"})).unwrap();
        assert_eq!(custom.type_name(), "badge");
    }
}
