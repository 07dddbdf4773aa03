//! Layout Registry - Type name to layout factory.
//!
//! A layout config is either a bare type name (`"joined"`) or an object
//! `{ "type": "joined", ...options }`; the factory receives the object.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ComponentError, Result};

use super::flex::{FlexLayout, FlexOptions};
use super::grid::GridLayout;
use super::joined::JoinedLayout;
use super::types::FlexDirection;
use super::Layout;

/// Builds a layout from its config object.
pub type LayoutFactory = Rc<dyn Fn(&Value) -> Result<Box<dyn Layout>>>;

fn flex_with(direction: FlexDirection) -> LayoutFactory {
    Rc::new(move |config: &Value| {
        let options = FlexOptions { direction, ..FlexOptions::deserialize(config)? };
        Ok(Box::new(FlexLayout::new(options)) as Box<dyn Layout>)
    })
}

fn builtin_layouts() -> HashMap<String, LayoutFactory> {
    let mut layouts: HashMap<String, LayoutFactory> = HashMap::new();
    layouts.insert(
        "flex".into(),
        Rc::new(|config: &Value| Ok(Box::new(FlexLayout::from_config(config)?) as Box<dyn Layout>)),
    );
    layouts.insert("row".into(), flex_with(FlexDirection::Row));
    layouts.insert("column".into(), flex_with(FlexDirection::Column));
    layouts.insert(
        "grid".into(),
        Rc::new(|config: &Value| Ok(Box::new(GridLayout::from_config(config)?) as Box<dyn Layout>)),
    );
    layouts.insert(
        "joined".into(),
        Rc::new(|config: &Value| Ok(Box::new(JoinedLayout::from_config(config)?) as Box<dyn Layout>)),
    );
    layouts
}

thread_local! {
    static LAYOUTS: RefCell<HashMap<String, LayoutFactory>> = RefCell::new(builtin_layouts());
}

/// Register a layout factory under `name`, replacing any earlier one.
pub fn register_layout<F>(name: &str, factory: F)
where
    F: Fn(&Value) -> Result<Box<dyn Layout>> + 'static,
{
    let replaced = LAYOUTS.with(|layouts| {
        layouts
            .borrow_mut()
            .insert(name.to_string(), Rc::new(factory))
            .is_some()
    });
    if replaced {
        tracing::warn!(name, "layout factory replaced");
    } else {
        tracing::debug!(name, "layout factory registered");
    }
}

pub fn is_layout_registered(name: &str) -> bool {
    LAYOUTS.with(|layouts| layouts.borrow().contains_key(name))
}

/// All registered layout names, sorted.
pub fn registered_layouts() -> Vec<String> {
    let mut names: Vec<String> = LAYOUTS.with(|layouts| layouts.borrow().keys().cloned().collect());
    names.sort();
    names
}

/// Build a layout from a type name or a `{type, ...}` object.
pub fn create_layout(config: &Value) -> Result<Box<dyn Layout>> {
    let expanded;
    let (name, config) = match config {
        Value::String(name) => {
            expanded = json!({ "type": name });
            (name.as_str(), &expanded)
        }
        Value::Object(object) => {
            let name = object
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| ComponentError::config("layout config is missing a string `type`"))?;
            (name, config)
        }
        _ => return Err(ComponentError::config("layout config must be a string or an object")),
    };

    let factory = LAYOUTS
        .with(|layouts| layouts.borrow().get(name).cloned())
        .ok_or_else(|| ComponentError::UnknownLayout(name.to_string()))?;
    factory(config)
}

/// Drop custom registrations, keeping the built-ins (for testing).
pub fn reset_layout_registry() {
    LAYOUTS.with(|layouts| *layouts.borrow_mut() = builtin_layouts());
}
