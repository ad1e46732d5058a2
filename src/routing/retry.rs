//! Bounded retry with a per-attempt deadline
//!
//! Wraps one agent's `execute` call. Each attempt runs on its own tokio task
//! and only the *wait* is bounded: an attempt that overruns its deadline keeps
//! running in the background and still settles the agent's status to `idle`
//! or `error` when it finishes.
//!
//! Only transport failures and timeouts are retried. A peer that answered,
//! even with 4xx/5xx, ends the loop immediately. Between attempts the policy
//! sleeps `backoff_base * 2^attempt`.

use crate::agent::Agent;
use crate::config::DelegatorConfig;
use crate::error::{DelegationError, DelegationResult};
use crate::observability::metrics;
use crate::protocol::{ExecutionOutcome, Task};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry and deadline settings for agent execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    attempt_timeout: Duration,
    backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, attempt_timeout: Duration, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            attempt_timeout,
            backoff_base,
        }
    }

    pub fn from_config(config: &DelegatorConfig) -> Self {
        Self::new(
            config.max_retries,
            config.timeout(),
            config.retry_backoff(),
        )
    }

    /// Single attempt, still bounded by `attempt_timeout`
    pub fn no_retry(attempt_timeout: Duration) -> Self {
        Self::new(0, attempt_timeout, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Delay before retrying after the given zero-based attempt (pure function)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2_u32.saturating_pow(attempt))
    }

    /// Run `agent.execute(task)` under this policy
    ///
    /// Returns the first success, or the last failure once attempts are
    /// exhausted or a non-retryable failure occurs.
    pub async fn execute(
        &self,
        agent: Arc<dyn Agent>,
        task: &Task,
    ) -> DelegationResult<ExecutionOutcome> {
        let mut attempt: u32 = 0;

        loop {
            debug!(
                agent = %agent.name(),
                task_type = %task.task,
                attempt = attempt + 1,
                max_attempts = self.max_attempts(),
                "Executing task on agent"
            );

            match self.run_attempt(Arc::clone(&agent), task.clone()).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let backoff = self.backoff_for(attempt);
                    warn!(
                        agent = %agent.name(),
                        task_type = %task.task,
                        attempt = attempt + 1,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Agent execution failed, retrying..."
                    );
                    metrics().retry_attempted();

                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn run_attempt(
        &self,
        agent: Arc<dyn Agent>,
        task: Task,
    ) -> DelegationResult<ExecutionOutcome> {
        let agent_name = agent.name().to_string();
        let handle = tokio::spawn(async move { agent.execute(&task).await });

        match tokio::time::timeout(self.attempt_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(DelegationError::agent_failure(
                agent_name,
                format!("Agent execution aborted: {join_error}"),
            )),
            Err(_) => {
                let timeout_ms = self.attempt_timeout.as_millis() as u64;
                warn!(
                    agent = %agent_name,
                    timeout_ms = timeout_ms,
                    "Agent execution exceeded deadline"
                );
                metrics().execution_timed_out();
                Err(DelegationError::Timeout { timeout_ms })
            }
        }
    }
}
