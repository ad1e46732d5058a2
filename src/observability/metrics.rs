//! Thread-safe delegation metrics
//!
//! Atomic counters for delegation traffic plus a mutex-protected per-agent
//! table. A single process-wide collector is reachable through [`metrics`].

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Global metrics collector instance
pub static METRICS: Lazy<DelegationMetrics> = Lazy::new(DelegationMetrics::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static DelegationMetrics {
    &METRICS
}

/// Per-agent execution statistics
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AgentExecutionStats {
    pub executions: u64,
    pub failures: u64,
    pub total_time_ms: u64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub delegations_started: u64,
    pub delegations_succeeded: u64,
    pub delegations_failed: u64,
    pub simulated_executions: u64,
    pub fallback_selections: u64,
    pub retry_attempts: u64,
    pub timeouts: u64,
    pub agents: HashMap<String, AgentExecutionStats>,
}

/// Delegation counters
pub struct DelegationMetrics {
    delegations_started: AtomicU64,
    delegations_succeeded: AtomicU64,
    delegations_failed: AtomicU64,
    simulated_executions: AtomicU64,
    fallback_selections: AtomicU64,
    retry_attempts: AtomicU64,
    timeouts: AtomicU64,
    agent_stats: Mutex<HashMap<String, AgentExecutionStats>>,
}

impl Default for DelegationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DelegationMetrics {
    pub fn new() -> Self {
        Self {
            delegations_started: AtomicU64::new(0),
            delegations_succeeded: AtomicU64::new(0),
            delegations_failed: AtomicU64::new(0),
            simulated_executions: AtomicU64::new(0),
            fallback_selections: AtomicU64::new(0),
            retry_attempts: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            agent_stats: Mutex::new(HashMap::new()),
        }
    }

    pub fn delegation_started(&self) {
        self.delegations_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn simulated_execution(&self) {
        self.simulated_executions.fetch_add(1, Ordering::Relaxed);
        self.delegations_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fallback_selected(&self) {
        self.fallback_selections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retry_attempted(&self) {
        self.retry_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn execution_timed_out(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the end of a delegation routed to `agent`
    pub fn agent_executed(&self, agent: &str, duration: Duration, success: bool) {
        if success {
            self.delegations_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.delegations_failed.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut stats) = self.agent_stats.lock() {
            let entry = stats.entry(agent.to_string()).or_default();
            entry.executions += 1;
            entry.total_time_ms += duration.as_millis() as u64;
            if !success {
                entry.failures += 1;
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let agents = self
            .agent_stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default();

        MetricsSnapshot {
            delegations_started: self.delegations_started.load(Ordering::Relaxed),
            delegations_succeeded: self.delegations_succeeded.load(Ordering::Relaxed),
            delegations_failed: self.delegations_failed.load(Ordering::Relaxed),
            simulated_executions: self.simulated_executions.load(Ordering::Relaxed),
            fallback_selections: self.fallback_selections.load(Ordering::Relaxed),
            retry_attempts: self.retry_attempts.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            agents,
        }
    }

    // Reset all metrics (useful for testing)
    pub fn reset(&self) {
        self.delegations_started.store(0, Ordering::Relaxed);
        self.delegations_succeeded.store(0, Ordering::Relaxed);
        self.delegations_failed.store(0, Ordering::Relaxed);
        self.simulated_executions.store(0, Ordering::Relaxed);
        self.fallback_selections.store(0, Ordering::Relaxed);
        self.retry_attempts.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        if let Ok(mut stats) = self.agent_stats.lock() {
            stats.clear();
        }
    }
}
