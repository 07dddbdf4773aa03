//! Component Registry - Tag to factory lookup.
//!
//! Declarative configurations carry a `"type"` discriminator:
//!
//! ```json
//! { "type": "group", "orientation": "horizontal",
//!   "children": [ { "type": "element", "tag": "button", "text": "Save" } ] }
//! ```
//!
//! [`create`] looks up the factory registered for that tag and hands it
//! the whole config. Entries are registered once at startup and never
//! removed. The built-in `element`, `container` and `group` types are
//! always present.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{ComponentError, Result};
use crate::primitives::{Container, Element};

use super::component::ComponentRef;

/// Builds a component from its declarative config.
pub type ComponentFactory = Rc<dyn Fn(&Value) -> Result<ComponentRef>>;

// =============================================================================
// Registry State
// =============================================================================

fn builtin_factories() -> HashMap<String, ComponentFactory> {
    let mut factories: HashMap<String, ComponentFactory> = HashMap::new();
    factories.insert("element".into(), Rc::new(Element::from_config));
    factories.insert(
        "container".into(),
        Rc::new(|config: &Value| Container::from_config(config).map(|c| c.component().clone())),
    );
    factories.insert(
        "group".into(),
        Rc::new(|config: &Value| Container::group_from_config(config).map(|c| c.component().clone())),
    );
    factories
}

thread_local! {
    static FACTORIES: RefCell<HashMap<String, ComponentFactory>> = RefCell::new(builtin_factories());
}

// =============================================================================
// Registration
// =============================================================================

/// Register a factory for `tag`. A later registration replaces an earlier one.
pub fn register_class<F>(tag: &str, factory: F)
where
    F: Fn(&Value) -> Result<ComponentRef> + 'static,
{
    let replaced = FACTORIES.with(|factories| {
        factories
            .borrow_mut()
            .insert(tag.to_string(), Rc::new(factory))
            .is_some()
    });
    if replaced {
        tracing::warn!(tag, "component factory replaced");
    } else {
        tracing::debug!(tag, "component factory registered");
    }
}

pub fn is_registered(tag: &str) -> bool {
    FACTORIES.with(|factories| factories.borrow().contains_key(tag))
}

/// All registered tags, sorted.
pub fn registered_types() -> Vec<String> {
    let mut tags: Vec<String> = FACTORIES.with(|factories| factories.borrow().keys().cloned().collect());
    tags.sort();
    tags
}

// =============================================================================
// Creation
// =============================================================================

/// Extract the `"type"` discriminator of a config object.
pub fn config_type(config: &Value) -> Result<&str> {
    let object = config
        .as_object()
        .ok_or_else(|| ComponentError::config("component config must be an object"))?;
    object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ComponentError::config("component config is missing a string `type`"))
}

/// Materialize a component from its declarative config.
pub fn create(config: &Value) -> Result<ComponentRef> {
    let tag = config_type(config)?;
    // Clone the factory out so nested `create` calls can borrow the registry.
    let factory = FACTORIES
        .with(|factories| factories.borrow().get(tag).cloned())
        .ok_or_else(|| ComponentError::UnknownComponent(tag.to_string()))?;
    factory(config)
}

/// Drop custom registrations, keeping the built-ins (for testing).
pub fn reset_registry() {
    FACTORIES.with(|factories| *factories.borrow_mut() = builtin_factories());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Element;
    use crate::types::Props;
    use serde_json::json;

    #[test]
    fn test_builtins_present() {
        reset_registry();
        assert_eq!(registered_types(), vec!["container", "element", "group"]);
    }

    #[test]
    fn test_create_builtin_element() {
        reset_registry();
        let component = create(&json!({"type": "element", "text": "hi"})).unwrap();
        assert_eq!(component.type_name(), "element");
        assert_eq!(component.props().str("text"), Some("hi"));
    }

    #[test]
    fn test_register_custom_class() {
        reset_registry();
        register_class("button", |config| {
            let props = Props::from_value(config.clone()).with("tag", "button");
            Ok(Element::new(props))
        });
        assert!(is_registered("button"));

        let button = create(&json!({"type": "button", "text": "Save"})).unwrap();
        assert_eq!(button.props().str("tag"), Some("button"));

        reset_registry();
        assert!(!is_registered("button"));
    }

    #[test]
    fn test_create_errors() {
        reset_registry();
        assert_eq!(
            create(&json!({"type": "nope"})).unwrap_err(),
            ComponentError::UnknownComponent("nope".into())
        );
        assert!(matches!(create(&json!({"text": "x"})), Err(ComponentError::Config(_))));
        assert!(matches!(create(&json!("element")), Err(ComponentError::Config(_))));
    }
}
