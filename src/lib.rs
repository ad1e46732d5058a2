//! Cloud Delegator
//!
//! An in-process task delegation engine. Callers register agents (local
//! in-process executors or remote HTTP endpoints) and submit typed tasks; the
//! [`Delegator`] picks one agent per task by capability with round-robin load
//! spreading, runs it under a retry policy, and returns its outcome.
//!
//! # Overview
//!
//! - [`agent`]: the [`Agent`] trait, [`LocalAgent`] and [`RemoteAgent`]
//! - [`routing`]: selection policies and the retry policy
//! - [`delegator`]: the registry and `delegate` entry point
//! - [`simulator`]: a standalone cloud task simulator façade
//! - [`config`]: tunables and the TOML file layout
//! - [`observability`]: tracing setup and delegation metrics
//!
//! # Quick Start
//!
//! ```rust
//! use cloud_delegator::{Capabilities, Delegator, DelegatorConfig, LocalAgent, Task};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let delegator = Delegator::new(DelegatorConfig::default())?;
//! delegator.register_agent(Arc::new(LocalAgent::new("a", Capabilities::new(["compute"]))));
//! delegator.register_agent(Arc::new(LocalAgent::new("b", Capabilities::new(["compute"]))));
//!
//! let first = delegator.delegate(Task::new("compute", json!({"n": 1}))).await?;
//! let second = delegator.delegate(Task::new("compute", json!({"n": 2}))).await?;
//!
//! assert_eq!(first.agent_name(), Some("a"));
//! assert_eq!(second.agent_name(), Some("b"));
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod delegator;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod routing;
pub mod simulator;
pub mod testing;

pub use agent::{Agent, AgentStatus, Capabilities, LocalAgent, RemoteAgent};
pub use config::*;
pub use delegator::Delegator;
pub use error::{DelegationError, DelegationResult};
pub use protocol::*;
pub use simulator::CloudTaskSimulator;
