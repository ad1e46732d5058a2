//! Delegator: the single entry point for routing tasks to agents
//!
//! A [`Delegator`] owns an append-only registry of agents, the selection
//! policy with its cursor state, and the retry policy. `delegate` works in
//! one of two modes:
//!
//! - **Simulated**: no agents registered. After a short fixed delay the task
//!   completes with `"Processed: <json payload>"`. This path never fails.
//! - **Routed**: one agent is selected (see [`AgentSelector`]) and its
//!   `execute` runs under the [`RetryPolicy`]. The agent's outcome or failure
//!   is returned verbatim.
//!
//! # Example
//!
//! ```no_run
//! use cloud_delegator::agent::{Capabilities, LocalAgent, RemoteAgent};
//! use cloud_delegator::config::DelegatorConfig;
//! use cloud_delegator::delegator::Delegator;
//! use cloud_delegator::protocol::Task;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let delegator = Delegator::new(DelegatorConfig::default().with_max_retries(1))?;
//!
//! delegator.register_agent(Arc::new(LocalAgent::new("echo", Capabilities::new(["echo"]))));
//! delegator.register_agent(Arc::new(RemoteAgent::new(
//!     "cloud-processor",
//!     "https://cloud.example.com/process",
//!     Capabilities::new(["analyze"]),
//! )?));
//!
//! let outcome = delegator.delegate(Task::new("analyze", json!({"values": [1, 2]}))).await?;
//! assert_eq!(outcome.agent_name(), Some("cloud-processor"));
//! # Ok(())
//! # }
//! ```

use crate::agent::Agent;
use crate::config::{ConfigError, DelegationFileConfig, DelegatorConfig};
use crate::error::DelegationResult;
use crate::observability::metrics;
use crate::protocol::{ExecutionOutcome, Task};
use crate::routing::{AgentSelector, RetryPolicy, SelectionPolicy, SelectionState};
use crate::{agent_span, delegation_span};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Routes tasks to registered agents
pub struct Delegator {
    config: DelegatorConfig,
    agents: RwLock<Vec<Arc<dyn Agent>>>,
    selector: AgentSelector,
    retry: RetryPolicy,
}

impl Delegator {
    /// Create a delegator with per-task-type round-robin selection
    pub fn new(config: DelegatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_validated_config(config))
    }

    /// Build a delegator from a loaded file, registering its agents in file order
    pub fn from_file_config(file: &DelegationFileConfig) -> DelegationResult<Self> {
        let delegator = Self::new(file.delegator.clone())?;
        for agent in file.build_agents()? {
            delegator.register_agent(agent);
        }
        Ok(delegator)
    }

    fn with_validated_config(config: DelegatorConfig) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            config,
            agents: RwLock::new(Vec::new()),
            selector: AgentSelector::default(),
            retry,
        }
    }

    /// Replace the selection policy, resetting cursor state
    pub fn with_policy(mut self, policy: Box<dyn SelectionPolicy>) -> Self {
        self.selector = AgentSelector::new(policy);
        self
    }

    /// Replace the selection policy, starting from seeded cursors
    pub fn with_policy_state(
        mut self,
        policy: Box<dyn SelectionPolicy>,
        state: SelectionState,
    ) -> Self {
        self.selector = AgentSelector::with_state(policy, state);
        self
    }

    /// Override the retry policy derived from the configuration
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &DelegatorConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn policy_name(&self) -> &'static str {
        self.selector.policy_name()
    }

    /// Append an agent to the registry
    ///
    /// No de-duplication and no capacity limit. Registration order decides
    /// round-robin order and the fallback agent.
    pub fn register_agent(&self, agent: Arc<dyn Agent>) {
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        info!(
            agent = %agent.name(),
            position = agents.len(),
            "Registered agent"
        );
        agents.push(agent);
    }

    /// Snapshot of the registry in registration order
    pub fn agents(&self) -> Vec<Arc<dyn Agent>> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn agent_count(&self) -> usize {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Copy of the current round-robin cursors
    pub fn selection_state(&self) -> SelectionState {
        self.selector.state()
    }

    /// Route one task to completion
    ///
    /// Infallible while the registry is empty. Otherwise fails with exactly
    /// the error the selected agent produced.
    pub async fn delegate(&self, task: Task) -> DelegationResult<ExecutionOutcome> {
        let span = delegation_span!(task_type = %task.task);
        self.route(task).instrument(span).await
    }

    async fn route(&self, task: Task) -> DelegationResult<ExecutionOutcome> {
        metrics().delegation_started();

        let registry = self.agents();
        let Some(decision) = self.selector.select(&registry, &task) else {
            return Ok(self.simulate(&task).await);
        };

        if decision.is_fallback() {
            metrics().fallback_selected();
        }
        let agent = decision.into_agent();
        let agent_name = agent.name().to_string();

        info!(agent = %agent_name, "Delegating task to agent");

        let started = Instant::now();
        let result = self
            .retry
            .execute(agent, &task)
            .instrument(agent_span!(agent = %agent_name))
            .await;
        metrics().agent_executed(&agent_name, started.elapsed(), result.is_ok());

        match &result {
            Ok(_) => debug!(agent = %agent_name, "Delegation completed"),
            Err(e) => warn!(agent = %agent_name, error = %e, "Delegation failed"),
        }

        result
    }

    /// Built-in execution used while no agents are registered
    async fn simulate(&self, task: &Task) -> ExecutionOutcome {
        debug!(
            delay_ms = self.config.simulated_delay_ms,
            "No agents registered, simulating execution"
        );
        tokio::time::sleep(self.config.simulated_delay()).await;
        metrics().simulated_execution();
        ExecutionOutcome::simulated(task)
    }
}

impl Default for Delegator {
    fn default() -> Self {
        Self::with_validated_config(DelegatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentStatus, Capabilities, LocalAgent};
    use crate::error::DelegationError;
    use crate::routing::{FirstCapable, GlobalRoundRobin};
    use crate::testing::mocks::MockAgent;
    use serde_json::json;
    use std::time::Duration;

    fn fast_config() -> DelegatorConfig {
        DelegatorConfig::default()
            .with_simulated_delay_ms(10)
            .with_retry_backoff_ms(1)
    }

    fn local(name: &str, caps: &[&str]) -> Arc<dyn Agent> {
        Arc::new(LocalAgent::new(name, Capabilities::new(caps.iter().copied())))
    }

    #[test]
    fn test_new_rejects_zero_timeout() {
        let result = Delegator::new(DelegatorConfig::default().with_timeout_ms(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_uses_default_config() {
        let delegator = Delegator::default();
        assert_eq!(delegator.config(), &DelegatorConfig::default());
        assert_eq!(delegator.agent_count(), 0);
        assert_eq!(delegator.policy_name(), "per_task_round_robin");
        assert_eq!(delegator.retry_policy().max_retries(), 3);
    }

    #[tokio::test]
    async fn test_from_file_config_registers_agents_in_order() {
        let file = DelegationFileConfig::from_toml_str(
            r#"
[delegator]
max_retries = 0

[[agents]]
name = "first"
capabilities = ["compute"]

[[agents]]
name = "second"
capabilities = ["compute"]
"#,
        )
        .unwrap();

        let delegator = Delegator::from_file_config(&file).unwrap();
        assert_eq!(delegator.agent_count(), 2);
        assert_eq!(delegator.retry_policy().max_retries(), 0);

        let outcome = delegator.delegate(Task::new("compute", json!({}))).await.unwrap();
        assert_eq!(outcome.agent_name(), Some("first"));
    }

    #[test]
    fn test_from_file_config_surfaces_config_errors() {
        let mut file = DelegationFileConfig::default();
        file.delegator.timeout_ms = 0;
        let err = Delegator::from_file_config(&file).err().unwrap();
        assert!(matches!(
            err,
            DelegationError::Config(ConfigError::InvalidConfig(_))
        ));

        let file = DelegationFileConfig {
            agents: vec![crate::config::AgentSpec {
                name: "remote".to_string(),
                capabilities: vec!["x".to_string()],
                endpoint: Some("ftp://example.com/drop".to_string()),
            }],
            ..DelegationFileConfig::default()
        };
        let err = Delegator::from_file_config(&file).err().unwrap();
        assert!(matches!(
            err,
            DelegationError::Config(ConfigError::InvalidEndpoint(_))
        ));
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[tokio::test]
    async fn test_simulated_execution_without_agents() {
        let delegator = Delegator::new(fast_config()).unwrap();
        let started = Instant::now();

        let outcome = delegator
            .delegate(Task::new("x", json!({"value": 42})))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(10));
        assert!(outcome.is_completed());
        assert_eq!(outcome.agent, None);
        assert_eq!(outcome.task, "x");
        assert!(outcome
            .result
            .as_str()
            .unwrap()
            .contains("{\"value\":42}"));
        assert!(outcome.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_registration_preserves_order() {
        let delegator = Delegator::new(fast_config()).unwrap();
        delegator.register_agent(local("first", &["a"]));
        delegator.register_agent(local("second", &["b"]));
        delegator.register_agent(local("first", &["a"]));

        let names: Vec<String> = delegator
            .agents()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second", "first"]);
    }

    #[tokio::test]
    async fn test_agent_failure_propagates_verbatim() {
        let delegator = Delegator::new(fast_config().with_max_retries(0)).unwrap();
        let agent = Arc::new(
            MockAgent::new("broken", ["x"])
                .always_fail(|| DelegationError::agent_failure("broken", "disk full")),
        );
        delegator.register_agent(agent.clone());

        let err = delegator
            .delegate(Task::new("x", json!(null)))
            .await
            .unwrap_err();

        match err {
            DelegationError::AgentFailure { agent, message } => {
                assert_eq!(agent, "broken");
                assert_eq!(message, "disk full");
            }
            other => panic!("Expected AgentFailure, got {other:?}"),
        }
        assert_eq!(agent.status(), AgentStatus::Error);
    }

    #[tokio::test]
    async fn test_global_policy_is_pluggable() {
        let delegator = Delegator::new(fast_config())
            .unwrap()
            .with_policy(Box::new(GlobalRoundRobin));
        delegator.register_agent(local("a", &["compute", "analyze"]));
        delegator.register_agent(local("b", &["compute", "analyze"]));

        let first = delegator.delegate(Task::new("compute", json!(1))).await.unwrap();
        let second = delegator.delegate(Task::new("analyze", json!(2))).await.unwrap();

        assert_eq!(first.agent_name(), Some("a"));
        assert_eq!(second.agent_name(), Some("b"));
        assert_eq!(delegator.selection_state().global_cursor(), 2);
    }

    #[tokio::test]
    async fn test_first_capable_policy() {
        let delegator = Delegator::new(fast_config())
            .unwrap()
            .with_policy(Box::new(FirstCapable));
        delegator.register_agent(local("a", &["compute"]));
        delegator.register_agent(local("b", &["compute"]));

        for _ in 0..3 {
            let outcome = delegator.delegate(Task::new("compute", json!({}))).await.unwrap();
            assert_eq!(outcome.agent_name(), Some("a"));
        }
    }

    #[tokio::test]
    async fn test_seeded_cursor_state() {
        let delegator = Delegator::new(fast_config()).unwrap().with_policy_state(
            Box::new(crate::routing::PerTaskRoundRobin),
            SelectionState::new().with_cursor("compute", 1),
        );
        delegator.register_agent(local("a", &["compute"]));
        delegator.register_agent(local("b", &["compute"]));

        let outcome = delegator.delegate(Task::new("compute", json!({}))).await.unwrap();
        assert_eq!(outcome.agent_name(), Some("b"));
    }

    #[tokio::test]
    async fn test_retry_policy_applies_to_delegation() {
        let delegator = Delegator::new(fast_config().with_max_retries(2)).unwrap();
        let agent = Arc::new(
            MockAgent::new("flaky", ["x"])
                .fail_first(2, || DelegationError::transport("connection reset")),
        );
        delegator.register_agent(agent.clone());

        let outcome = delegator.delegate(Task::new("x", json!({}))).await.unwrap();
        assert_eq!(outcome.agent_name(), Some("flaky"));
        assert_eq!(agent.call_count(), 3);
    }
}
