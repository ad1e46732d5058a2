//! Mock implementations for testing
//!
//! Provides a scriptable [`MockAgent`] so delegation, selection and retry
//! behavior can be exercised without a network peer.

use crate::agent::{Agent, AgentCore, Capabilities};
use crate::error::{DelegationError, DelegationResult};
use crate::protocol::{ExecutionOutcome, Task};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type FailureFactory = Arc<dyn Fn() -> DelegationError + Send + Sync>;

/// Agent with scripted failures, delays and a call log
pub struct MockAgent {
    core: AgentCore,
    calls: AtomicUsize,
    failures_remaining: AtomicUsize,
    failure: Option<FailureFactory>,
    delay: Option<Duration>,
    delayed_calls: usize,
    result: Option<Value>,
    received: Mutex<Vec<Task>>,
}

impl MockAgent {
    pub fn new<I, S>(name: &str, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            core: AgentCore::new(name, Capabilities::new(capabilities)),
            calls: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
            failure: None,
            delay: None,
            delayed_calls: usize::MAX,
            result: None,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Fail the first `count` calls with the produced error
    pub fn fail_first<F>(mut self, count: usize, failure: F) -> Self
    where
        F: Fn() -> DelegationError + Send + Sync + 'static,
    {
        self.failures_remaining = AtomicUsize::new(count);
        self.failure = Some(Arc::new(failure));
        self
    }

    /// Fail every call with the produced error
    pub fn always_fail<F>(self, failure: F) -> Self
    where
        F: Fn() -> DelegationError + Send + Sync + 'static,
    {
        self.fail_first(usize::MAX, failure)
    }

    /// Sleep before answering every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self.delayed_calls = usize::MAX;
        self
    }

    /// Sleep before answering only the first `count` calls
    pub fn with_delay_for_first(mut self, count: usize, delay: Duration) -> Self {
        self.delay = Some(delay);
        self.delayed_calls = count;
        self
    }

    /// Return this value as `result` instead of echoing the payload
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Number of times `process` was entered
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Tasks received, in call order
    pub fn received_tasks(&self) -> Vec<Task> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn process(&self, task: &Task) -> DelegationResult<ExecutionOutcome> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task.clone());

        if let Some(delay) = self.delay {
            if call < self.delayed_calls {
                tokio::time::sleep(delay).await;
            }
        }

        if let Some(failure) = &self.failure {
            let should_fail = self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if should_fail {
                return Err(failure());
            }
        }

        let result = self.result.clone().unwrap_or_else(|| task.data.clone());
        Ok(ExecutionOutcome::completed_by(self.name(), task, result))
    }
}
