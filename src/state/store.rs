//! Reactive State Store - Per-component key/value state with subscriptions.
//!
//! Each component owns one store. A store may delegate reads to a parent
//! store (the container it was mounted under):
//!
//! ```text
//! container store { color: "blue" }
//!        ▲ weak
//! child store     { }            get("color") → "blue"
//! child.set("color", "red")      get("color") → "red" (shadowed)
//! ```
//!
//! Writes are always local. Subscribers are notified synchronously, in
//! subscription order, and only for writes to their exact key on this
//! store. Parent writes never fan out to child subscribers.
//!
//! # Re-entrancy
//!
//! A subscriber may write the key it is reacting to. The nested write is
//! stored at once but its notification is queued: the round in progress
//! finishes delivering the older value to every subscriber, then the queued
//! values are delivered in write order. Each queued round counts toward
//! [`RuntimeConfig::max_reentrant_depth`](crate::config::RuntimeConfig);
//! past that the write is dropped and logged instead of looping forever.
//!
//! # Example
//!
//! ```
//! use weft::state::StateStore;
//!
//! let parent = StateStore::new();
//! parent.set("color", "blue");
//!
//! let child = StateStore::with_parent(&parent);
//! assert_eq!(child.get("color"), Some("blue".into()));
//!
//! let sub = child.on("color", |value| println!("color is now {value}"));
//! child.set("color", "red");
//! sub.dispose();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::config::runtime_config;
use crate::error::StateError;

/// Callback invoked with the new value of a key.
pub type Subscriber = Rc<dyn Fn(&Value)>;

// =============================================================================
// Store Internals
// =============================================================================

#[derive(Default)]
struct StoreInner {
    values: HashMap<String, Value>,
    subscribers: HashMap<String, Vec<(usize, Subscriber)>>,
    parent: Option<Weak<RefCell<StoreInner>>>,
    /// Keys currently being delivered to subscribers.
    notifying: HashMap<String, Delivery>,
    next_id: usize,
    released: bool,
}

impl StoreInner {
    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn is_subscribed(&self, key: &str, id: usize) -> bool {
        self.subscribers
            .get(key)
            .is_some_and(|list| list.iter().any(|(sub_id, _)| *sub_id == id))
    }
}

/// Values of one key waiting to be delivered, oldest first.
#[derive(Default)]
struct Delivery {
    queue: VecDeque<Value>,
    rounds: usize,
}

impl Delivery {
    /// Rounds run plus rounds still queued.
    fn depth(&self) -> usize {
        self.rounds + self.queue.len()
    }
}

/// Ends delivery of a key when dropped.
struct NotifyGuard<'a> {
    store: &'a Rc<RefCell<StoreInner>>,
    key: &'a str,
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.store.borrow_mut().notifying.remove(self.key);
    }
}

// =============================================================================
// StateStore
// =============================================================================

/// Shared handle to a component's state store.
///
/// Cloning the handle shares the same store.
#[derive(Clone)]
pub struct StateStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl StateStore {
    /// Create a root store with no parent.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner::default())),
        }
    }

    /// Create a store that falls back to `parent` for keys it never set.
    ///
    /// The child only keeps a weak reference; it does not keep the parent alive.
    pub fn with_parent(parent: &StateStore) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().parent = Some(Rc::downgrade(&parent.inner));
        store
    }

    /// The parent store, if one was linked and is still alive.
    pub fn parent(&self) -> Option<StateStore> {
        let inner = self.inner.borrow();
        inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| StateStore { inner })
    }

    /// Resolve a key: local value first, then up the parent chain.
    pub fn get(&self, key: &str) -> Option<Value> {
        let parent = {
            let inner = self.inner.borrow();
            if inner.released {
                return None;
            }
            if let Some(value) = inner.values.get(key) {
                return Some(value.clone());
            }
            inner.parent.as_ref().and_then(Weak::upgrade)
        };
        parent.and_then(|inner| StateStore { inner }.get(key))
    }

    /// Whether this store holds its own value for `key`.
    pub fn has_local(&self, key: &str) -> bool {
        self.inner.borrow().values.contains_key(key)
    }

    /// Write a value and notify subscribers of `key`.
    ///
    /// Writes to a released store and runaway re-entrant writes are dropped.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        match self.try_set(key, value) {
            Ok(()) => {}
            Err(StateError::Released) => {
                tracing::trace!(key, "write to released state store ignored");
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "state write dropped");
            }
        }
    }

    /// Write a value, reporting why a write was rejected.
    ///
    /// A write made while `key` is already being delivered is stored at once
    /// and delivered after the current round.
    pub fn try_set(&self, key: &str, value: impl Into<Value>) -> Result<(), StateError> {
        let value = value.into();

        {
            let mut inner = self.inner.borrow_mut();
            if inner.released {
                return Err(StateError::Released);
            }

            if let Some(delivery) = inner.notifying.get(key) {
                let depth = delivery.depth();
                if depth >= runtime_config().max_reentrant_depth {
                    return Err(StateError::ReentrantWrite {
                        key: key.to_string(),
                        depth,
                    });
                }
                inner.values.insert(key.to_string(), value.clone());
                if let Some(delivery) = inner.notifying.get_mut(key) {
                    delivery.queue.push_back(value);
                }
                return Ok(());
            }

            inner.values.insert(key.to_string(), value.clone());
            if !inner.subscribers.contains_key(key) {
                return Ok(());
            }
            let mut delivery = Delivery::default();
            delivery.queue.push_back(value);
            inner.notifying.insert(key.to_string(), delivery);
        }

        let _guard = NotifyGuard { store: &self.inner, key };
        while let Some((value, subscribers)) = self.next_round(key) {
            for (id, subscriber) in &subscribers {
                // Skip subscribers disposed (or a store released) by an earlier callback.
                let live = {
                    let inner = self.inner.borrow();
                    !inner.released && inner.is_subscribed(key, *id)
                };
                if live {
                    subscriber(&value);
                }
            }
        }
        Ok(())
    }

    /// Pop the next queued value of `key` with the subscribers to receive it.
    fn next_round(&self, key: &str) -> Option<(Value, Vec<(usize, Subscriber)>)> {
        let mut inner = self.inner.borrow_mut();
        if inner.released {
            return None;
        }
        let delivery = inner.notifying.get_mut(key)?;
        let value = delivery.queue.pop_front()?;
        delivery.rounds += 1;
        let subscribers = inner.subscribers.get(key).cloned().unwrap_or_default();
        Some((value, subscribers))
    }

    /// Subscribe to writes of `key`.
    pub fn on<F>(&self, key: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.subscribe(key, Rc::new(callback))
    }

    /// Subscribe to writes of `key`, first calling `callback` once with the
    /// current value (`Value::Null` when the key resolves to nothing).
    pub fn on_immediate<F>(&self, key: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        if self.is_released() {
            return Subscription::inert(key);
        }
        let current = self.get(key).unwrap_or(Value::Null);
        callback(&current);
        self.subscribe(key, Rc::new(callback))
    }

    fn subscribe(&self, key: &str, subscriber: Subscriber) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        if inner.released {
            return Subscription::inert(key);
        }
        let id = inner.next_id();
        inner
            .subscribers
            .entry(key.to_string())
            .or_default()
            .push((id, subscriber));

        Subscription {
            store: Rc::downgrade(&self.inner),
            key: key.to_string(),
            id,
            active: Cell::new(true),
        }
    }

    /// Number of live subscribers for `key`.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .borrow()
            .subscribers
            .get(key)
            .map_or(0, Vec::len)
    }

    /// Sever every subscription, drop all values and the parent link.
    ///
    /// Called when the owning component unmounts. Later writes are no-ops.
    pub fn release(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.released = true;
        inner.values.clear();
        inner.subscribers.clear();
        inner.parent = None;
    }

    pub fn is_released(&self) -> bool {
        self.inner.borrow().released
    }

    /// Whether two handles point at the same store.
    pub fn ptr_eq(&self, other: &StateStore) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("StateStore")
            .field("values", &inner.values)
            .field("has_parent", &inner.parent.is_some())
            .field("released", &inner.released)
            .finish()
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Disposer for a single subscription.
///
/// Dropping it does not unsubscribe; call [`dispose`](Self::dispose).
/// Disposing twice is harmless.
#[derive(Debug)]
pub struct Subscription {
    store: Weak<RefCell<StoreInner>>,
    key: String,
    id: usize,
    active: Cell<bool>,
}

impl Subscription {
    fn inert(key: &str) -> Self {
        Self {
            store: Weak::new(),
            key: key.to_string(),
            id: usize::MAX,
            active: Cell::new(false),
        }
    }

    /// Remove exactly this subscription.
    pub fn dispose(&self) {
        if !self.active.replace(false) {
            return;
        }
        let Some(store) = self.store.upgrade() else { return };
        let mut inner = store.borrow_mut();
        if let Some(list) = inner.subscribers.get_mut(&self.key) {
            list.retain(|(id, _)| *id != self.id);
            if list.is_empty() {
                inner.subscribers.remove(&self.key);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get() && self.store.strong_count() > 0
    }
}

// =============================================================================
// Tests
// =============================================================================
