//! Agent abstraction
//!
//! An agent is a named, capability-tagged executor. Every variant shares an
//! [`AgentCore`] holding its name, capability set and lifecycle status, and
//! implements [`Agent::process`]. The provided [`Agent::execute`] wraps
//! `process` with the status bookkeeping:
//!
//! ```text
//! idle --execute--> busy --ok--> idle
//!                        --err-> error
//! ```
//!
//! `error` is advisory only. A later `execute` forces the agent back to
//! `busy` regardless, so agents are always re-enterable.

use crate::error::DelegationResult;
use crate::protocol::{ExecutionOutcome, Task};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Capability that matches every task type
pub const WILDCARD_CAPABILITY: &str = "*";

/// Lifecycle status of an agent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Busy,
    Error,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Busy => "busy",
            AgentStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Declared task types an agent accepts, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(Vec<String>);

impl Capabilities {
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut declared: Vec<String> = Vec::new();
        for capability in capabilities {
            let capability = capability.into();
            if !declared.contains(&capability) {
                declared.push(capability);
            }
        }
        Self(declared)
    }

    /// Capability set accepting any task type
    pub fn wildcard() -> Self {
        Self(vec![WILDCARD_CAPABILITY.to_string()])
    }

    /// Exact, case-sensitive match on the task type, or wildcard
    pub fn allows(&self, task_type: &str) -> bool {
        self.0
            .iter()
            .any(|c| c == task_type || c == WILDCARD_CAPABILITY)
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.iter().any(|c| c == WILDCARD_CAPABILITY)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// State shared by every agent variant
#[derive(Debug)]
pub struct AgentCore {
    name: String,
    capabilities: Capabilities,
    status: RwLock<AgentStatus>,
}

impl AgentCore {
    pub fn new(name: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            name: name.into(),
            capabilities,
            status: RwLock::new(AgentStatus::Idle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn status(&self) -> AgentStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last writer wins; concurrent executions on one agent are not serialized.
    pub(crate) fn set_status(&self, status: AgentStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

/// Executor of tasks
///
/// Implementors supply [`Agent::core`] and [`Agent::process`]; selection and
/// delegation only ever go through this trait.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Shared name, capabilities and status
    fn core(&self) -> &AgentCore;

    /// Agent-specific processing step
    async fn process(&self, task: &Task) -> DelegationResult<ExecutionOutcome>;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn capabilities(&self) -> &Capabilities {
        self.core().capabilities()
    }

    fn status(&self) -> AgentStatus {
        self.core().status()
    }

    /// True iff the task type is declared or the agent is a wildcard
    fn can_handle(&self, task: &Task) -> bool {
        self.core().capabilities().allows(task.task_type())
    }

    /// Run `process` with status tracking
    ///
    /// The failure is returned unchanged after the status moves to `error`.
    async fn execute(&self, task: &Task) -> DelegationResult<ExecutionOutcome> {
        let core = self.core();
        core.set_status(AgentStatus::Busy);
        debug!(agent = %core.name(), task_type = %task.task, "Agent execution started");

        match self.process(task).await {
            Ok(outcome) => {
                core.set_status(AgentStatus::Idle);
                debug!(agent = %core.name(), task_type = %task.task, "Agent execution completed");
                Ok(outcome)
            }
            Err(e) => {
                core.set_status(AgentStatus::Error);
                debug!(
                    agent = %core.name(),
                    task_type = %task.task,
                    error = %e,
                    "Agent execution failed"
                );
                Err(e)
            }
        }
    }
}
