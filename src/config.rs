//! Runtime configuration.
//!
//! Per-thread tuning knobs for the scheduler and state stores. Like the
//! rest of the runtime, the configuration lives in thread-local storage:
//! every UI thread owns its own component tree.

use std::cell::RefCell;

use serde::Deserialize;

use crate::error::Result;

/// Scheduler and state store limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Follow-up rounds a single `flush` may run before giving up.
    /// Each round drains the passes requested by the previous one.
    pub max_flush_rounds: usize,
    /// Delivery rounds one write may trigger through subscribers writing
    /// the key they are being notified about. Writes past it are dropped.
    pub max_reentrant_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_rounds: 64,
            max_reentrant_depth: 8,
        }
    }
}

impl RuntimeConfig {
    /// Parse from JSON. Missing fields keep their defaults.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
}

/// Install a configuration for the current thread.
pub fn configure(config: RuntimeConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Current thread's configuration.
pub fn runtime_config() -> RuntimeConfig {
    CONFIG.with(|c| *c.borrow())
}

/// Restore defaults (for testing).
pub fn reset_runtime_config() {
    configure(RuntimeConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_partial() {
        let config = RuntimeConfig::from_json(r#"{"max_flush_rounds": 4}"#).unwrap();
        assert_eq!(config.max_flush_rounds, 4);
        assert_eq!(config.max_reentrant_depth, RuntimeConfig::default().max_reentrant_depth);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(RuntimeConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_configure_roundtrip() {
        configure(RuntimeConfig { max_flush_rounds: 2, max_reentrant_depth: 1 });
        assert_eq!(runtime_config().max_flush_rounds, 2);
        reset_runtime_config();
        assert_eq!(runtime_config(), RuntimeConfig::default());
    }
}
