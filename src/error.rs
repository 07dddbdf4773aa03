//! Error types for the component runtime.
//!
//! Two families:
//! - [`ComponentError`] - lifecycle, render, configuration and registry failures.
//!   These surface to whoever called `mount`, `flush` or a registry `create`.
//! - [`StateError`] - rejected state writes. [`StateStore::set`](crate::state::StateStore::set)
//!   swallows these (late writes are no-ops); `try_set` reports them.

use thiserror::Error;

use crate::types::{ComponentId, LifecycleStatus};

/// Errors raised by components, containers, layouts and the registries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// A lifecycle operation was called from a status that does not allow it.
    #[error("cannot {operation} component {id}: status is {status}")]
    InvalidTransition {
        /// Component the operation targeted.
        id: ComponentId,
        /// Operation name (`mount`, `unmount`).
        operation: &'static str,
        /// Status at the time of the call.
        status: LifecycleStatus,
    },

    /// The component has already been unmounted once and cannot be mounted again.
    #[error("component {0} has been unmounted and cannot be mounted again")]
    Retired(ComponentId),

    /// Producing a render fragment failed. The previous commit stays visible.
    #[error("render failed: {0}")]
    Render(String),

    /// A lifecycle hook other than render failed.
    #[error("{hook} hook failed: {message}")]
    Hook {
        /// Hook name.
        hook: &'static str,
        /// Failure description.
        message: String,
    },

    /// Malformed declarative configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No component factory registered for this tag.
    #[error("unknown component type `{0}`")]
    UnknownComponent(String),

    /// No layout factory registered for this tag.
    #[error("unknown layout type `{0}`")]
    UnknownLayout(String),

    /// A layout was supplied to a component whose layout is fixed.
    #[error("component type `{0}` does not accept a custom layout")]
    LayoutNotAllowed(String),

    /// A flush kept producing new passes past the configured round limit.
    #[error("flush did not settle after {0} rounds")]
    FlushLimit(usize),
}

impl ComponentError {
    /// Shorthand for a render failure.
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Shorthand for a configuration failure.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<serde_json::Error> for ComponentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for component operations.
pub type Result<T> = std::result::Result<T, ComponentError>;

/// Rejected state store writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The store was released when its component unmounted.
    #[error("state store has been released")]
    Released,

    /// A subscriber kept writing the key it was notified about.
    #[error("re-entrant write to `{key}` exceeded depth {depth}")]
    ReentrantWrite {
        /// Key being written.
        key: String,
        /// Nesting depth at which the write was dropped.
        depth: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ComponentError::InvalidTransition {
            id: ComponentId::from_raw(3),
            operation: "mount",
            status: LifecycleStatus::Mounted,
        };
        assert_eq!(err.to_string(), "cannot mount component #3: status is mounted");

        let err = StateError::ReentrantWrite { key: "count".into(), depth: 8 };
        assert_eq!(err.to_string(), "re-entrant write to `count` exceeded depth 8");
    }

    #[test]
    fn test_json_error_is_config_error() {
        let err: ComponentError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ComponentError::Config(_)));
    }
}
