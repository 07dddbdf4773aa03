//! Scheduler - Coalesced render and layout passes.
//!
//! Requests never run inline. The first request of a component marks it
//! pending and appends it to the queue; further requests in the same turn
//! only OR their work into its pending flags:
//!
//! ```text
//! request_render() ×3 ─┐
//! request_layout()  ───┼─► pending = RENDER | LAYOUT, queued once
//!                      ▼
//! flush() ─► render → commit → after_commit (layout re-applied)   = 1 pass
//! ```
//!
//! Components run in the order their first request was issued. Status is
//! checked when the pass runs, so unmounting cancels outstanding work.
//!
//! The runtime does not own an event loop. Integrators either call
//! [`flush`] at the end of each turn, or install a [`set_defer_hook`] that
//! schedules a `flush` on their own loop (microtask, idle callback, tick).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::config::runtime_config;
use crate::error::{ComponentError, Result};

use super::component::WeakComponentRef;

bitflags::bitflags! {
    /// Work queued for a component.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PendingWork: u8 {
        /// Re-render, commit, then run the post-commit hook.
        const RENDER = 1 << 0;
        /// Re-apply layout without rendering.
        const LAYOUT = 1 << 1;
    }
}

// =============================================================================
// Scheduler State
// =============================================================================

thread_local! {
    /// Components with pending work, in first-request order.
    static QUEUE: RefCell<VecDeque<WeakComponentRef>> = const { RefCell::new(VecDeque::new()) };

    /// Set while `flush` is draining the queue.
    static FLUSHING: Cell<bool> = const { Cell::new(false) };

    /// Called when the queue goes from empty to non-empty outside a flush.
    static DEFER_HOOK: RefCell<Option<Rc<dyn Fn()>>> = const { RefCell::new(None) };
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        FLUSHING.with(|f| f.set(false));
    }
}

/// Queue a component that just became pending.
pub(crate) fn enqueue(component: WeakComponentRef) {
    let was_idle = QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        let was_idle = queue.is_empty();
        queue.push_back(component);
        was_idle
    });

    if was_idle && !FLUSHING.with(Cell::get) {
        let hook = DEFER_HOOK.with(|hook| hook.borrow().clone());
        if let Some(hook) = hook {
            tracing::trace!("scheduling deferred flush");
            hook();
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Run every pending pass.
///
/// Passes requested while flushing run in a follow-up round of the same
/// flush, up to [`RuntimeConfig::max_flush_rounds`](crate::config::RuntimeConfig).
/// A failing pass aborts only itself; the remaining passes still run and
/// the first error is returned. Nested calls are no-ops.
pub fn flush() -> Result<()> {
    if FLUSHING.with(|f| f.replace(true)) {
        return Ok(());
    }
    let _guard = FlushGuard;

    let limit = runtime_config().max_flush_rounds;
    let mut first_error: Option<ComponentError> = None;
    let mut rounds = 0;

    loop {
        let batch: Vec<WeakComponentRef> = QUEUE.with(|queue| queue.borrow_mut().drain(..).collect());
        if batch.is_empty() {
            break;
        }
        if rounds == limit {
            tracing::warn!(rounds, dropped = batch.len(), "flush did not settle");
            for component in batch.iter().filter_map(WeakComponentRef::upgrade) {
                component.clear_pending();
            }
            return Err(ComponentError::FlushLimit(limit));
        }
        rounds += 1;
        tracing::trace!(round = rounds, passes = batch.len(), "flushing");

        for component in batch.iter().filter_map(WeakComponentRef::upgrade) {
            if let Err(err) = component.run_pending() {
                tracing::warn!(id = %component.id(), error = %err, "pass failed");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Whether any component is waiting for a pass.
pub fn has_pending() -> bool {
    QUEUE.with(|queue| !queue.borrow().is_empty())
}

/// Number of queued components.
pub fn pending_count() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

/// Install the callback used to schedule a deferred [`flush`].
///
/// It runs once per turn, when the first request arrives.
pub fn set_defer_hook<F>(hook: F)
where
    F: Fn() + 'static,
{
    DEFER_HOOK.with(|h| *h.borrow_mut() = Some(Rc::new(hook)));
}

pub fn clear_defer_hook() {
    DEFER_HOOK.with(|h| *h.borrow_mut() = None);
}

/// Reset all scheduler state (for testing).
pub fn reset_scheduler() {
    let queued: Vec<WeakComponentRef> = QUEUE.with(|queue| queue.borrow_mut().drain(..).collect());
    for component in queued.iter().filter_map(WeakComponentRef::upgrade) {
        component.clear_pending();
    }
    FLUSHING.with(|f| f.set(false));
    clear_defer_hook();
}

// =============================================================================
// Tests
// =============================================================================
