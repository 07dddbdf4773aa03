//! Container - Component owning an ordered child sequence and a layout.
//!
//! ```text
//! before_mount:   resolve layout → normalize children → mount each off-tree
//!                 (throwaway host, container's state as parent)
//! render:         fragment = [child host, child host, ...]  (moved, not copied)
//! after_commit:   layout.apply(host, children, state, props)
//! before_unmount: layout.dispose → unmount children in order
//! ```
//!
//! Children are mounted before the container renders, so their first render
//! already reads through to the container's state.
//!
//! `add` and `remove` request a render and a layout pass; both coalesce, so
//! several mutations in one turn cost one render and one layout apply.
//!
//! # Layout configuration
//!
//! A container's own layout comes from [`ContainerOptions::layout`] or from
//! `props["layout"]` when that value is a layout config (a type name string
//! or an object with a `"type"`). Any other `props["layout"]` object is the
//! container's per-child override when it sits inside another container.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::{json, Value};

use crate::engine::{self, Component, ComponentRef, Lifecycle, MountContext};
use crate::error::{ComponentError, Result};
use crate::layout::{create_layout, Layout, LayoutContext, LayoutSpec};
use crate::renderer::{Fragment, HostNode};
use crate::state::StateStore;
use crate::types::{LifecycleStatus, Props};

use super::{apply_class_prop, host_tag_prop};

// =============================================================================
// Options
// =============================================================================

/// A child given as a live component or as a registry config.
pub enum ChildSpec {
    Instance(ComponentRef),
    Config(Value),
}

impl ChildSpec {
    fn into_component(self) -> Result<ComponentRef> {
        match self {
            Self::Instance(component) => Ok(component),
            Self::Config(config) => engine::create(&config),
        }
    }
}

impl From<ComponentRef> for ChildSpec {
    fn from(component: ComponentRef) -> Self {
        Self::Instance(component)
    }
}

impl From<Container> for ChildSpec {
    fn from(container: Container) -> Self {
        Self::Instance(container.component)
    }
}

impl From<Value> for ChildSpec {
    fn from(config: Value) -> Self {
        Self::Config(config)
    }
}

/// Whether a container accepts a caller-supplied layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LayoutPolicy {
    #[default]
    Custom,
    /// Always this layout config; any supplied layout is rejected.
    Fixed(Value),
}

pub struct ContainerOptions {
    pub type_name: String,
    pub children: Vec<ChildSpec>,
    pub layout: Option<LayoutSpec>,
    pub policy: LayoutPolicy,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            type_name: "container".to_string(),
            children: Vec::new(),
            layout: None,
            policy: LayoutPolicy::Custom,
        }
    }
}

/// `props["layout"]` if it configures the container's own layout.
fn declared_layout(props: &Props) -> Option<&Value> {
    match props.get("layout") {
        Some(value @ Value::String(_)) => Some(value),
        Some(value @ Value::Object(object)) if object.contains_key("type") => Some(value),
        _ => None,
    }
}

// =============================================================================
// Shared State
// =============================================================================

struct ContainerState {
    policy: LayoutPolicy,
    /// Children from options, resolved at mount.
    queued_specs: Vec<ChildSpec>,
    /// Children added before mount.
    queued: Vec<ComponentRef>,
    queued_layout: Option<LayoutSpec>,
    children: Vec<ComponentRef>,
    layout: Option<Box<dyn Layout>>,
}

/// Apply the current layout to the current children.
fn run_layout(component: &ComponentRef, shared: &RefCell<ContainerState>) -> Result<()> {
    let Some(host) = component.host() else {
        return Ok(());
    };
    // Take the layout out so its apply can read the container freely.
    let (layout, children) = {
        let mut state = shared.borrow_mut();
        (state.layout.take(), state.children.clone())
    };
    let Some(mut layout) = layout else {
        return Ok(());
    };

    tracing::trace!(
        id = %component.id(),
        layout = layout.name(),
        children = children.len(),
        "applying layout"
    );
    let state = component.state().unwrap_or_default();
    let props = component.props();
    let result = layout.apply(&LayoutContext {
        host: &host,
        children: &children,
        state: &state,
        props: &props,
    });

    let mut shared = shared.borrow_mut();
    if shared.layout.is_none() {
        shared.layout = Some(layout);
    }
    result
}

// =============================================================================
// Behavior
// =============================================================================

struct ContainerBehavior {
    type_name: String,
    shared: Rc<RefCell<ContainerState>>,
}

impl ContainerBehavior {
    fn resolve_layout(&self, declared: Option<Value>) -> Result<Option<Box<dyn Layout>>> {
        let (policy, queued) = {
            let mut shared = self.shared.borrow_mut();
            (shared.policy.clone(), shared.queued_layout.take())
        };
        match (policy, queued, declared) {
            (LayoutPolicy::Fixed(config), _, _) => create_layout(&config).map(Some),
            (LayoutPolicy::Custom, Some(spec), _) => spec.resolve().map(Some),
            (LayoutPolicy::Custom, None, Some(config)) => create_layout(&config).map(Some),
            (LayoutPolicy::Custom, None, None) => Ok(None),
        }
    }
}

impl Component for ContainerBehavior {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn host_tag(&self, props: &Props) -> String {
        host_tag_prop(props)
    }

    fn before_mount(&mut self, cx: &mut MountContext<'_>) -> Result<()> {
        let declared = if declared_layout(cx.props()).is_some() {
            cx.props_mut().remove("layout")
        } else {
            None
        };
        let layout = self.resolve_layout(declared)?;
        self.shared.borrow_mut().layout = layout;

        // Options first, then declared children, then children added before mount.
        let (mut specs, queued) = {
            let mut shared = self.shared.borrow_mut();
            (std::mem::take(&mut shared.queued_specs), std::mem::take(&mut shared.queued))
        };
        match cx.props_mut().remove("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => specs.extend(items.into_iter().map(ChildSpec::Config)),
            Some(_) => return Err(ComponentError::config("`children` must be an array")),
        }
        specs.extend(queued.into_iter().map(ChildSpec::Instance));

        let state = cx.state().clone();
        for spec in specs {
            let child = spec.into_component()?;
            child.mount(&HostNode::offscreen(), Some(&state))?;
            self.shared.borrow_mut().children.push(child);
        }
        Ok(())
    }

    fn render(&mut self, _cx: &Lifecycle<'_>) -> Result<Fragment> {
        let shared = self.shared.borrow();
        Ok(shared.children.iter().filter_map(ComponentRef::host).collect())
    }

    fn after_commit(&mut self, cx: &Lifecycle<'_>) -> Result<()> {
        if let Some(host) = cx.host() {
            apply_class_prop(&host, cx.props());
        }
        run_layout(cx.component(), &self.shared)
    }

    fn on_layout(&mut self, cx: &Lifecycle<'_>) -> Result<()> {
        run_layout(cx.component(), &self.shared)
    }

    fn before_unmount(&mut self, cx: &Lifecycle<'_>) {
        let (layout, children) = {
            let mut shared = self.shared.borrow_mut();
            (shared.layout.take(), std::mem::take(&mut shared.children))
        };
        if let (Some(mut layout), Some(host)) = (layout, cx.host()) {
            layout.dispose(&LayoutContext {
                host: &host,
                children: &children,
                state: cx.state(),
                props: cx.props(),
            });
        }
        for child in children.iter().filter(|child| child.is_mounted()) {
            if let Err(err) = child.unmount() {
                tracing::warn!(id = %child.id(), error = %err, "child unmount failed");
            }
        }
    }
}

// =============================================================================
// Container Handle
// =============================================================================

/// Handle to a container component.
#[derive(Clone)]
pub struct Container {
    component: ComponentRef,
    shared: Rc<RefCell<ContainerState>>,
}

impl Container {
    /// Create an unmounted container.
    ///
    /// Fails with [`ComponentError::LayoutNotAllowed`] when the policy is
    /// fixed and a layout is supplied through `options` or props.
    pub fn new(props: Props, options: ContainerOptions) -> Result<Self> {
        let ContainerOptions { type_name, children, layout, policy } = options;
        if matches!(policy, LayoutPolicy::Fixed(_))
            && (layout.is_some() || declared_layout(&props).is_some())
        {
            return Err(ComponentError::LayoutNotAllowed(type_name));
        }

        let shared = Rc::new(RefCell::new(ContainerState {
            policy,
            queued: Vec::new(),
            queued_specs: children,
            queued_layout: layout,
            children: Vec::new(),
            layout: None,
        }));
        let behavior = ContainerBehavior { type_name, shared: shared.clone() };
        let extension: Rc<dyn Any> = shared.clone();
        let component = ComponentRef::with_extension(Box::new(behavior), props, extension);
        Ok(Self { component, shared })
    }

    /// Registry factory for `container`: the whole config becomes props.
    pub fn from_config(config: &Value) -> Result<Self> {
        if !config.is_object() {
            return Err(ComponentError::config("container config must be an object"));
        }
        let props = Props::from_value(config.clone());
        let type_name = props.str("type").unwrap_or("container").to_string();
        Self::new(props, ContainerOptions { type_name, ..ContainerOptions::default() })
    }

    /// A `group`: children joined along `props.orientation` (default
    /// horizontal). The layout is fixed.
    pub fn group(props: Props, children: Vec<ChildSpec>) -> Result<Self> {
        let orientation = props
            .get("orientation")
            .cloned()
            .unwrap_or_else(|| json!("horizontal"));
        Self::new(
            props,
            ContainerOptions {
                type_name: "group".to_string(),
                children,
                layout: None,
                policy: LayoutPolicy::Fixed(json!({ "type": "joined", "orientation": orientation })),
            },
        )
    }

    /// Registry factory for `group`.
    pub fn group_from_config(config: &Value) -> Result<Self> {
        if !config.is_object() {
            return Err(ComponentError::config("group config must be an object"));
        }
        Self::group(Props::from_value(config.clone()), Vec::new())
    }

    /// Recover the container handle of a component created as a container.
    pub fn from_component(component: &ComponentRef) -> Option<Self> {
        let shared = component
            .extension()?
            .downcast::<RefCell<ContainerState>>()
            .ok()?;
        Some(Self { component: component.clone(), shared })
    }

    pub fn component(&self) -> &ComponentRef {
        &self.component
    }

    pub fn mount(&self, host: &HostNode, parent_state: Option<&StateStore>) -> Result<()> {
        self.component.mount(host, parent_state)
    }

    pub fn unmount(&self) -> Result<()> {
        self.component.unmount()
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    /// The child sequence, in render order.
    pub fn children(&self) -> Vec<ComponentRef> {
        let shared = self.shared.borrow();
        shared.children.iter().chain(shared.queued.iter()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        let shared = self.shared.borrow();
        shared.children.len() + shared.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a child.
    ///
    /// While mounted the child is mounted off-tree under the container's
    /// state right away, then a render and a layout pass are requested.
    /// Before mount it is queued. On a retired container this is a no-op
    /// returning `None`.
    pub fn add(&self, child: impl Into<ChildSpec>) -> Result<Option<ComponentRef>> {
        if self.component.is_retired() {
            tracing::trace!(id = %self.component.id(), "add on retired container ignored");
            return Ok(None);
        }
        match self.component.status() {
            LifecycleStatus::Unmounting => Ok(None),
            LifecycleStatus::Unmounted => {
                let child = child.into().into_component()?;
                self.shared.borrow_mut().queued.push(child.clone());
                Ok(Some(child))
            }
            LifecycleStatus::Mounting | LifecycleStatus::Mounted => {
                let child = child.into().into_component()?;
                let state = self.component.state();
                child.mount(&HostNode::offscreen(), state.as_ref())?;
                self.shared.borrow_mut().children.push(child.clone());
                self.component.request_render();
                self.component.request_layout();
                Ok(Some(child))
            }
        }
    }

    /// Remove and unmount `child`. Returns `false`, with nothing
    /// requested, if it is not in the sequence.
    pub fn remove(&self, child: &ComponentRef) -> Result<bool> {
        let removed = {
            let mut shared = self.shared.borrow_mut();
            if let Some(index) = shared.children.iter().position(|c| c.ptr_eq(child)) {
                Some(shared.children.remove(index))
            } else if let Some(index) = shared.queued.iter().position(|c| c.ptr_eq(child)) {
                shared.queued.remove(index);
                None
            } else {
                return Ok(false);
            }
        };

        if let Some(child) = removed {
            if child.is_mounted() {
                child.unmount()?;
            }
            self.component.request_render();
            self.component.request_layout();
        }
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    /// Apply the layout now. No-op without a host node or a layout.
    pub fn apply_layout(&self) -> Result<()> {
        run_layout(&self.component, &self.shared)
    }

    /// Ask for a coalesced layout pass.
    pub fn request_layout(&self) {
        self.component.request_layout();
    }

    /// Replace the layout at runtime.
    ///
    /// The new layout is resolved first; on success the old one is disposed
    /// and a layout pass is requested.
    pub fn set_layout(&self, spec: impl Into<LayoutSpec>) -> Result<()> {
        if matches!(self.shared.borrow().policy, LayoutPolicy::Fixed(_)) {
            return Err(ComponentError::LayoutNotAllowed(self.component.type_name()));
        }
        if self.component.is_retired() || self.component.status() == LifecycleStatus::Unmounting {
            return Ok(());
        }

        let next = spec.into().resolve()?;
        if self.component.status() == LifecycleStatus::Unmounted {
            self.shared.borrow_mut().queued_layout = Some(LayoutSpec::Instance(next));
            return Ok(());
        }

        let previous = self.shared.borrow_mut().layout.replace(next);
        if let (Some(mut previous), Some(host)) = (previous, self.component.host()) {
            let children = self.children();
            let state = self.component.state().unwrap_or_default();
            let props = self.component.props();
            previous.dispose(&LayoutContext {
                host: &host,
                children: &children,
                state: &state,
                props: &props,
            });
        }
        self.component.request_layout();
        Ok(())
    }

    /// Name of the active layout.
    pub fn layout_name(&self) -> Option<String> {
        self.shared
            .borrow()
            .layout
            .as_ref()
            .map(|layout| layout.name().to_string())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("component", &self.component)
            .field("children", &self.len())
            .field("layout", &self.layout_name())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
