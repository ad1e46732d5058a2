//! In-process echo agent

use crate::agent::base::{Agent, AgentCore, Capabilities};
use crate::error::DelegationResult;
use crate::protocol::{ExecutionOutcome, Task};
use async_trait::async_trait;

/// Agent that completes every task by echoing its payload back
#[derive(Debug)]
pub struct LocalAgent {
    core: AgentCore,
}

impl LocalAgent {
    pub fn new(name: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            core: AgentCore::new(name, capabilities),
        }
    }
}

#[async_trait]
impl Agent for LocalAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn process(&self, task: &Task) -> DelegationResult<ExecutionOutcome> {
        Ok(ExecutionOutcome::completed_by(
            self.name(),
            task,
            task.data.clone(),
        ))
    }
}
