//! Task and outcome message types
//!
//! This module holds the data exchanged between callers, the delegator, and
//! remote agents.

pub mod messages;

pub use messages::*;
