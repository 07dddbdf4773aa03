//! Engine - Component lifecycle, scheduling and the component registry.
//!
//! - Component: [`Component`] behavior + [`ComponentRef`] lifecycle driver
//! - Scheduler: coalesced render/layout passes, drained by [`flush`]
//! - Registry: `type` tag → factory, used to materialize declarative configs

mod component;
mod registry;
pub mod scheduler;

pub use component::*;
pub use registry::*;
pub use scheduler::{
    clear_defer_hook, flush, has_pending, pending_count, reset_scheduler, set_defer_hook,
    PendingWork,
};
