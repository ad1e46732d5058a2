//! Agents: the executors tasks are delegated to
//!
//! [`Agent`] is the single interface selection and delegation depend on.
//! Two variants ship with the crate: [`LocalAgent`] echoes in-process and
//! [`RemoteAgent`] forwards to an HTTP peer.

pub mod base;
pub mod local;
pub mod remote;

pub use base::*;
pub use local::*;
pub use remote::*;
