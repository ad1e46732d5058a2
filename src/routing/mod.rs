//! Routing infrastructure
//!
//! ## Agent selection (selector.rs)
//!
//! Chooses one registered agent per task: capability filtering, a pluggable
//! [`SelectionPolicy`], and the first-registered fallback.
//!
//! ## Retry policy (retry.rs)
//!
//! Bounded attempts with a per-attempt deadline around the chosen agent's
//! execute call.

pub mod retry;
pub mod selector;

pub use retry::RetryPolicy;
pub use selector::*;
