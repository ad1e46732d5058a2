//! Testing utilities and mock implementations
//!
//! This module provides mock agents for exercising the delegation engine
//! without requiring a remote HTTP peer.

pub mod mocks;

pub use mocks::*;
