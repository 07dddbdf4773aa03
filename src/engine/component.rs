//! Component - lifecycle and render passes.
//!
//! A component is a [`Component`] implementation (render function plus
//! overridable hooks) wrapped in a [`ComponentRef`] that the runtime drives:
//!
//! ```text
//! mount:   state store → before_mount → render → commit into new host
//!          → after_commit → (mounted) → after_mount
//! pass:    render → commit into same host → after_commit
//! unmount: before_unmount → detach host → release state store
//! ```
//!
//! Render requests never run inline; they are queued on the
//! [scheduler](super::scheduler) and coalesced per turn.

use std::any::Any;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{ComponentError, Result};
use crate::renderer::{Fragment, HostNode};
use crate::state::StateStore;
use crate::types::{ComponentId, LifecycleStatus, Props};

use super::scheduler::{self, PendingWork};

// =============================================================================
// Component Trait
// =============================================================================

/// Behavior of a component: its render function and lifecycle hooks.
///
/// All hooks except `render` default to no-ops.
pub trait Component: 'static {
    /// Type tag, e.g. `"element"` or `"container"`.
    fn type_name(&self) -> &str;

    /// Tag of the host node created at mount.
    fn host_tag(&self, _props: &Props) -> String {
        "div".to_string()
    }

    /// Produce the fragment committed into the host node.
    fn render(&mut self, cx: &Lifecycle<'_>) -> Result<Fragment>;

    /// Runs before the first render. Props are still mutable here.
    fn before_mount(&mut self, _cx: &mut MountContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs once the component is mounted.
    fn after_mount(&mut self, _cx: &Lifecycle<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs after every commit, including the initial one.
    fn after_commit(&mut self, _cx: &Lifecycle<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs for a layout-only pass (no render pending).
    fn on_layout(&mut self, _cx: &Lifecycle<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs before the host node is detached and the state store released.
    fn before_unmount(&mut self, _cx: &Lifecycle<'_>) {}
}

// =============================================================================
// Hook Contexts
// =============================================================================

/// Context handed to hooks and render.
pub struct Lifecycle<'a> {
    component: &'a ComponentRef,
    state: StateStore,
    props: Rc<Props>,
}

impl Lifecycle<'_> {
    /// Handle of the component running the hook.
    pub fn component(&self) -> &ComponentRef {
        self.component
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Host node, absent during the initial render.
    pub fn host(&self) -> Option<HostNode> {
        self.component.host()
    }
}

/// Context handed to `before_mount`.
pub struct MountContext<'a> {
    component: &'a ComponentRef,
    state: StateStore,
    props: &'a mut Props,
}

impl MountContext<'_> {
    pub fn component(&self) -> &ComponentRef {
        self.component
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn props(&self) -> &Props {
        self.props
    }

    /// Adjust props before the first render.
    pub fn props_mut(&mut self) -> &mut Props {
        self.props
    }
}

// =============================================================================
// Component Cell
// =============================================================================

struct ComponentCore {
    id: ComponentId,
    type_name: String,
    props: Rc<Props>,
    state: Option<StateStore>,
    host: Option<HostNode>,
    status: LifecycleStatus,
    retired: bool,
    pending: PendingWork,
}

struct ComponentCell {
    core: RefCell<ComponentCore>,
    behavior: RefCell<Box<dyn Component>>,
    extension: Option<Rc<dyn Any>>,
}

/// Shared handle to a component instance.
#[derive(Clone)]
pub struct ComponentRef(Rc<ComponentCell>);

/// Non-owning component handle, used by the scheduler queue.
#[derive(Clone)]
pub struct WeakComponentRef(Weak<ComponentCell>);

impl WeakComponentRef {
    pub fn upgrade(&self) -> Option<ComponentRef> {
        self.0.upgrade().map(ComponentRef)
    }
}

impl ComponentRef {
    /// Wrap a behavior and its props into a new, unmounted component.
    pub fn new(behavior: impl Component, props: Props) -> Self {
        Self::build(Box::new(behavior), props, None)
    }

    /// Like [`new`](Self::new), with a typed side channel retrievable
    /// through [`extension`](Self::extension).
    pub(crate) fn with_extension(
        behavior: Box<dyn Component>,
        props: Props,
        extension: Rc<dyn Any>,
    ) -> Self {
        Self::build(behavior, props, Some(extension))
    }

    fn build(behavior: Box<dyn Component>, props: Props, extension: Option<Rc<dyn Any>>) -> Self {
        let type_name = behavior.type_name().to_string();
        Self(Rc::new(ComponentCell {
            core: RefCell::new(ComponentCore {
                id: ComponentId::next(),
                type_name,
                props: Rc::new(props),
                state: None,
                host: None,
                status: LifecycleStatus::Unmounted,
                retired: false,
                pending: PendingWork::empty(),
            }),
            behavior: RefCell::new(behavior),
            extension,
        }))
    }

    fn core_mut(&self) -> RefMut<'_, ComponentCore> {
        self.0.core.borrow_mut()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> ComponentId {
        self.0.core.borrow().id
    }

    pub fn type_name(&self) -> String {
        self.0.core.borrow().type_name.clone()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.0.core.borrow().status
    }

    pub fn is_mounted(&self) -> bool {
        self.status() == LifecycleStatus::Mounted
    }

    /// Whether the component has been unmounted and can no longer mount.
    pub fn is_retired(&self) -> bool {
        self.0.core.borrow().retired
    }

    pub fn props(&self) -> Rc<Props> {
        self.0.core.borrow().props.clone()
    }

    /// State store, present from mount until unmount.
    pub fn state(&self) -> Option<StateStore> {
        self.0.core.borrow().state.clone()
    }

    /// Host node, present while mounted.
    pub fn host(&self) -> Option<HostNode> {
        self.0.core.borrow().host.clone()
    }

    pub(crate) fn extension(&self) -> Option<Rc<dyn Any>> {
        self.0.extension.clone()
    }

    pub fn ptr_eq(&self, other: &ComponentRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakComponentRef {
        WeakComponentRef(Rc::downgrade(&self.0))
    }

    // -------------------------------------------------------------------------
    // Hook plumbing
    // -------------------------------------------------------------------------

    fn lifecycle(&self) -> Lifecycle<'_> {
        let core = self.0.core.borrow();
        Lifecycle {
            component: self,
            state: core.state.clone().unwrap_or_default(),
            props: core.props.clone(),
        }
    }

    /// Run a hook with exclusive access to the behavior.
    fn with_behavior<R>(
        &self,
        hook: &'static str,
        f: impl FnOnce(&mut dyn Component, &Lifecycle<'_>) -> Result<R>,
    ) -> Result<R> {
        let cx = self.lifecycle();
        let mut behavior = self.0.behavior.try_borrow_mut().map_err(|_| ComponentError::Hook {
            hook,
            message: format!("component {} re-entered its own lifecycle", cx.component.id()),
        })?;
        f(&mut **behavior, &cx)
    }

    fn render_fragment(&self) -> Result<Fragment> {
        self.with_behavior("render", |behavior, cx| behavior.render(cx))
    }

    // -------------------------------------------------------------------------
    // Mount
    // -------------------------------------------------------------------------

    /// Mount into `container`, optionally inheriting reads from `parent_state`.
    ///
    /// Legal only from `Unmounted` on a component that was never unmounted.
    /// If the initial render fails the component is torn down, retired, and
    /// the error returned.
    pub fn mount(&self, container: &HostNode, parent_state: Option<&StateStore>) -> Result<()> {
        let state = {
            let mut core = self.core_mut();
            if core.retired {
                return Err(ComponentError::Retired(core.id));
            }
            if core.status != LifecycleStatus::Unmounted {
                return Err(ComponentError::InvalidTransition {
                    id: core.id,
                    operation: "mount",
                    status: core.status,
                });
            }
            core.status = LifecycleStatus::Mounting;
            let state = match parent_state {
                Some(parent) => StateStore::with_parent(parent),
                None => StateStore::new(),
            };
            core.state = Some(state.clone());
            state
        };
        tracing::debug!(id = %self.id(), type_name = %self.type_name(), "mounting component");

        if let Err(err) = self.run_before_mount(state) {
            self.abort_mount();
            return Err(err);
        }

        let fragment = match self.render_fragment() {
            Ok(fragment) => fragment,
            Err(err) => {
                tracing::warn!(id = %self.id(), error = %err, "initial render failed");
                self.abort_mount();
                return Err(err);
            }
        };

        let tag = self.0.behavior.borrow().host_tag(&self.props());
        let host = HostNode::new(tag);
        host.commit(fragment);
        container.append_child(&host);
        self.core_mut().host = Some(host);

        if let Err(err) = self.with_behavior("after_commit", |b, cx| b.after_commit(cx)) {
            self.abort_mount();
            return Err(err);
        }

        self.core_mut().status = LifecycleStatus::Mounted;
        self.with_behavior("after_mount", |b, cx| b.after_mount(cx))
    }

    fn run_before_mount(&self, state: StateStore) -> Result<()> {
        let mut props = Rc::unwrap_or_clone(std::mem::take(&mut self.core_mut().props));
        let result = match self.0.behavior.try_borrow_mut() {
            Ok(mut behavior) => {
                let mut cx = MountContext {
                    component: self,
                    state,
                    props: &mut props,
                };
                behavior.before_mount(&mut cx)
            }
            Err(_) => Err(ComponentError::Hook {
                hook: "before_mount",
                message: format!("component {} re-entered its own lifecycle", self.id()),
            }),
        };
        self.core_mut().props = Rc::new(props);
        result
    }

    /// Roll back a failed mount: release what `before_mount` set up.
    fn abort_mount(&self) {
        self.core_mut().status = LifecycleStatus::Unmounting;
        if let Err(err) = self.with_behavior("before_unmount", |b, cx| {
            b.before_unmount(cx);
            Ok(())
        }) {
            tracing::warn!(id = %self.id(), error = %err, "rollback after failed mount skipped before_unmount");
        }
        self.teardown();
    }

    // -------------------------------------------------------------------------
    // Unmount
    // -------------------------------------------------------------------------

    /// Unmount: `before_unmount`, detach the host node, release the state store.
    ///
    /// Legal only from `Mounted`. The component cannot be mounted again.
    pub fn unmount(&self) -> Result<()> {
        {
            let mut core = self.core_mut();
            if core.status != LifecycleStatus::Mounted {
                return Err(ComponentError::InvalidTransition {
                    id: core.id,
                    operation: "unmount",
                    status: core.status,
                });
            }
            core.status = LifecycleStatus::Unmounting;
            core.pending = PendingWork::empty();
        }
        tracing::debug!(id = %self.id(), type_name = %self.type_name(), "unmounting component");

        let result = self.with_behavior("before_unmount", |b, cx| {
            b.before_unmount(cx);
            Ok(())
        });
        self.teardown();
        result
    }

    fn teardown(&self) {
        let (host, state) = {
            let mut core = self.core_mut();
            core.status = LifecycleStatus::Unmounted;
            core.retired = true;
            core.pending = PendingWork::empty();
            (core.host.take(), core.state.take())
        };
        if let Some(host) = host {
            host.detach();
        }
        if let Some(state) = state {
            state.release();
        }
    }

    // -------------------------------------------------------------------------
    // Scheduling
    // -------------------------------------------------------------------------

    /// Ask for a render pass. Coalesced with other requests of this turn;
    /// dropped if the component is not mounted.
    pub fn request_render(&self) {
        self.request(PendingWork::RENDER);
    }

    /// Ask for a layout-only pass (runs [`Component::on_layout`]).
    pub fn request_layout(&self) {
        self.request(PendingWork::LAYOUT);
    }

    fn request(&self, work: PendingWork) {
        let enqueue = {
            let mut core = self.core_mut();
            if !matches!(core.status, LifecycleStatus::Mounting | LifecycleStatus::Mounted) {
                tracing::trace!(id = %core.id, ?work, "request on inactive component dropped");
                return;
            }
            let idle = core.pending.is_empty();
            core.pending |= work;
            idle
        };
        if enqueue {
            scheduler::enqueue(self.downgrade());
        } else {
            tracing::trace!(id = %self.id(), ?work, "request coalesced");
        }
    }

    /// Whether work is queued for this component.
    pub fn has_pending(&self) -> bool {
        !self.0.core.borrow().pending.is_empty()
    }

    pub(crate) fn clear_pending(&self) {
        self.core_mut().pending = PendingWork::empty();
    }

    /// Execute queued work. Called by the scheduler.
    ///
    /// Status is checked here, not at request time: a component unmounted
    /// after requesting is skipped.
    pub(crate) fn run_pending(&self) -> Result<()> {
        let work = {
            let mut core = self.core_mut();
            let work = std::mem::take(&mut core.pending);
            if core.status != LifecycleStatus::Mounted {
                return Ok(());
            }
            work
        };

        if work.contains(PendingWork::RENDER) {
            // after_commit re-applies layout, so a pending LAYOUT rides along.
            self.render_pass()
        } else if work.contains(PendingWork::LAYOUT) {
            self.with_behavior("on_layout", |b, cx| b.on_layout(cx))
        } else {
            Ok(())
        }
    }

    /// Render and commit into the existing host. On error nothing is committed.
    fn render_pass(&self) -> Result<()> {
        let fragment = self.render_fragment()?;
        let Some(host) = self.host() else {
            return Ok(());
        };
        let changed = host.commit(fragment);
        tracing::trace!(id = %self.id(), changed, "render pass committed");
        self.with_behavior("after_commit", |b, cx| b.after_commit(cx))
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.0.core.borrow();
        f.debug_struct("ComponentRef")
            .field("id", &core.id)
            .field("type_name", &core.type_name)
            .field("status", &core.status)
            .field("retired", &core.retired)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scheduler::{flush, reset_scheduler};
    use serde_json::json;
    use std::cell::Cell;

    /// Renders `label` from state, records hook order, fails on demand.
    struct Tracked {
        log: Rc<RefCell<Vec<String>>>,
        renders: Rc<Cell<usize>>,
        fail: Rc<Cell<bool>>,
    }

    impl Tracked {
        fn new() -> (Self, Rc<RefCell<Vec<String>>>, Rc<Cell<usize>>, Rc<Cell<bool>>) {
            let log = Rc::new(RefCell::new(Vec::new()));
            let renders = Rc::new(Cell::new(0));
            let fail = Rc::new(Cell::new(false));
            let tracked = Self { log: log.clone(), renders: renders.clone(), fail: fail.clone() };
            (tracked, log, renders, fail)
        }
    }

    impl Component for Tracked {
        fn type_name(&self) -> &str {
            "tracked"
        }

        fn host_tag(&self, props: &Props) -> String {
            props.str("tag").unwrap_or("section").to_string()
        }

        fn render(&mut self, cx: &Lifecycle<'_>) -> Result<Fragment> {
            if self.fail.get() {
                return Err(ComponentError::render("boom"));
            }
            self.renders.set(self.renders.get() + 1);
            self.log.borrow_mut().push("render".into());
            let label = cx.state().get("label").and_then(|v| v.as_str().map(String::from));
            Ok(Fragment::text(label.unwrap_or_default()))
        }

        fn before_mount(&mut self, cx: &mut MountContext<'_>) -> Result<()> {
            self.log.borrow_mut().push("before_mount".into());
            cx.props_mut().insert("seen", true);
            Ok(())
        }

        fn after_mount(&mut self, cx: &Lifecycle<'_>) -> Result<()> {
            assert!(cx.host().is_some());
            self.log.borrow_mut().push("after_mount".into());
            Ok(())
        }

        fn after_commit(&mut self, _cx: &Lifecycle<'_>) -> Result<()> {
            self.log.borrow_mut().push("after_commit".into());
            Ok(())
        }

        fn on_layout(&mut self, _cx: &Lifecycle<'_>) -> Result<()> {
            self.log.borrow_mut().push("on_layout".into());
            Ok(())
        }

        fn before_unmount(&mut self, _cx: &Lifecycle<'_>) {
            self.log.borrow_mut().push("before_unmount".into());
        }
    }

    #[test]
    fn test_mount_sequence() {
        reset_scheduler();
        let (tracked, log, _, _) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new().with("tag", "article"));
        let root = HostNode::new("body");

        component.mount(&root, None).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["before_mount", "render", "after_commit", "after_mount"]
        );
        assert!(component.is_mounted());
        assert_eq!(component.props().bool("seen"), Some(true));
        let host = component.host().unwrap();
        assert_eq!(host.tag(), "article");
        assert!(host.parent().unwrap().ptr_eq(&root));
    }

    #[test]
    fn test_mount_twice_is_invalid() {
        reset_scheduler();
        let (tracked, _, _, _) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new());
        let root = HostNode::new("body");
        component.mount(&root, None).unwrap();

        let err = component.mount(&root, None).unwrap_err();
        assert!(matches!(
            err,
            ComponentError::InvalidTransition { operation: "mount", status: LifecycleStatus::Mounted, .. }
        ));
    }

    #[test]
    fn test_unmount_releases_and_retires() {
        reset_scheduler();
        let (tracked, log, _, _) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new());
        let root = HostNode::new("body");
        component.mount(&root, None).unwrap();
        let state = component.state().unwrap();

        component.unmount().unwrap();

        assert_eq!(log.borrow().last().map(String::as_str), Some("before_unmount"));
        assert!(root.children().is_empty());
        assert!(component.host().is_none());
        assert!(state.is_released());
        assert!(component.is_retired());
        assert_eq!(component.mount(&root, None), Err(ComponentError::Retired(component.id())));
        assert!(matches!(
            component.unmount(),
            Err(ComponentError::InvalidTransition { operation: "unmount", .. })
        ));
    }

    #[test]
    fn test_requests_coalesce_into_one_pass() {
        reset_scheduler();
        let (tracked, _, renders, _) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new());
        let root = HostNode::new("body");
        component.mount(&root, None).unwrap();
        assert_eq!(renders.get(), 1);

        for _ in 0..5 {
            component.request_render();
        }
        // Never inline.
        assert_eq!(renders.get(), 1);

        flush().unwrap();
        assert_eq!(renders.get(), 2);

        flush().unwrap();
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn test_render_pass_keeps_host_identity() {
        reset_scheduler();
        let (tracked, _, _, _) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new());
        let root = HostNode::new("body");
        component.mount(&root, None).unwrap();
        let host = component.host().unwrap();

        component.state().unwrap().set("label", "hello");
        component.request_render();
        flush().unwrap();

        assert!(component.host().unwrap().ptr_eq(&host));
        assert_eq!(host.text_content(), "hello");
    }

    #[test]
    fn test_unmount_cancels_pending_pass() {
        reset_scheduler();
        let (tracked, _, renders, _) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new());
        let root = HostNode::new("body");
        component.mount(&root, None).unwrap();

        component.request_render();
        component.unmount().unwrap();
        flush().unwrap();
        assert_eq!(renders.get(), 1);

        // Late requests are silently dropped.
        component.request_render();
        assert!(!component.has_pending());
    }

    #[test]
    fn test_unmount_cancels_pending_layout_pass() {
        reset_scheduler();
        let (tracked, log, renders, _) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new());
        component.mount(&HostNode::new("body"), None).unwrap();

        component.request_layout();
        assert!(component.has_pending());
        component.unmount().unwrap();
        flush().unwrap();

        assert!(!log.borrow().iter().any(|entry| entry == "on_layout"));
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn test_layout_request_skips_render() {
        reset_scheduler();
        let (tracked, log, renders, _) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new());
        component.mount(&HostNode::new("body"), None).unwrap();
        log.borrow_mut().clear();

        component.request_layout();
        flush().unwrap();

        assert_eq!(*log.borrow(), vec!["on_layout"]);
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn test_failed_render_keeps_last_commit() {
        reset_scheduler();
        let (tracked, _, _, fail) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new());
        let root = HostNode::new("body");
        component.mount(&root, None).unwrap();
        let state = component.state().unwrap();
        state.set("label", "good");
        component.request_render();
        flush().unwrap();

        fail.set(true);
        state.set("label", "bad");
        component.request_render();
        assert_eq!(flush(), Err(ComponentError::render("boom")));

        assert!(component.is_mounted());
        assert_eq!(component.host().unwrap().text_content(), "good");
    }

    #[test]
    fn test_failed_initial_render_aborts_mount() {
        reset_scheduler();
        let (tracked, log, _, fail) = Tracked::new();
        fail.set(true);
        let component = ComponentRef::new(tracked, Props::new());
        let root = HostNode::new("body");

        let err = component.mount(&root, None).unwrap_err();
        assert_eq!(err, ComponentError::render("boom"));
        assert!(root.children().is_empty());
        assert_eq!(component.status(), LifecycleStatus::Unmounted);
        assert!(component.is_retired());
        assert_eq!(*log.borrow(), vec!["before_mount", "before_unmount"]);
    }

    #[test]
    fn test_parent_state_is_inherited_at_first_render() {
        reset_scheduler();
        let parent = StateStore::new();
        parent.set("label", json!("from parent"));
        let (tracked, _, _, _) = Tracked::new();
        let component = ComponentRef::new(tracked, Props::new());
        let root = HostNode::new("body");

        component.mount(&root, Some(&parent)).unwrap();
        assert_eq!(component.host().unwrap().text_content(), "from parent");
    }
}
