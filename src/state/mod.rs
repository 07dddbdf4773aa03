//! State Module - Per-component reactive state.
//!
//! - **Store** - key/value state with parent delegation and ordered,
//!   synchronous subscriptions

mod store;

pub use store::*;
