//! Agent selection
//!
//! Picks exactly one agent from the registry for a task. The registry is
//! first filtered down to agents whose capabilities accept the task type;
//! a [`SelectionPolicy`] then chooses among them. When no agent is capable,
//! the first registered agent is used as a best-effort fallback.
//!
//! Three policies are provided:
//!
//! - [`PerTaskRoundRobin`] (default): one cursor per task type
//! - [`GlobalRoundRobin`]: one cursor shared by every task type
//! - [`FirstCapable`]: always the earliest registered capable agent

use crate::agent::Agent;
use crate::protocol::Task;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Round-robin cursors owned by a delegator
///
/// Cursors grow without bound and wrap by modulo at read time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    cursors: HashMap<String, usize>,
    global_cursor: usize,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cursor for one task type
    pub fn with_cursor(mut self, task_type: impl Into<String>, cursor: usize) -> Self {
        self.cursors.insert(task_type.into(), cursor);
        self
    }

    /// Seed the shared cursor
    pub fn with_global_cursor(mut self, cursor: usize) -> Self {
        self.global_cursor = cursor;
        self
    }

    /// Current cursor for a task type (0 if never seen)
    pub fn cursor(&self, task_type: &str) -> usize {
        self.cursors.get(task_type).copied().unwrap_or(0)
    }

    pub fn global_cursor(&self) -> usize {
        self.global_cursor
    }

    /// Return the cursor for `task_type`, then increment it
    pub fn advance(&mut self, task_type: &str) -> usize {
        let cursor = self.cursors.entry(task_type.to_string()).or_insert(0);
        let current = *cursor;
        *cursor = current.wrapping_add(1);
        current
    }

    /// Return the shared cursor, then increment it
    pub fn advance_global(&mut self) -> usize {
        let current = self.global_cursor;
        self.global_cursor = current.wrapping_add(1);
        current
    }
}

/// Strategy choosing one agent among the capable ones
pub trait SelectionPolicy: Send + Sync {
    /// Policy name for diagnostics
    fn name(&self) -> &'static str;

    /// Choose from `capable`, which is in registration order.
    ///
    /// Returns `None` only when `capable` is empty.
    fn select(
        &self,
        capable: &[Arc<dyn Agent>],
        task: &Task,
        state: &mut SelectionState,
    ) -> Option<Arc<dyn Agent>>;
}

/// Independent round-robin cursor per task type
#[derive(Debug, Clone, Copy, Default)]
pub struct PerTaskRoundRobin;

impl SelectionPolicy for PerTaskRoundRobin {
    fn name(&self) -> &'static str {
        "per_task_round_robin"
    }

    fn select(
        &self,
        capable: &[Arc<dyn Agent>],
        task: &Task,
        state: &mut SelectionState,
    ) -> Option<Arc<dyn Agent>> {
        if capable.is_empty() {
            return None;
        }
        let cursor = state.advance(task.task_type());
        capable.get(cursor % capable.len()).cloned()
    }
}

/// Single round-robin cursor shared across task types
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalRoundRobin;

impl SelectionPolicy for GlobalRoundRobin {
    fn name(&self) -> &'static str {
        "global_round_robin"
    }

    fn select(
        &self,
        capable: &[Arc<dyn Agent>],
        _task: &Task,
        state: &mut SelectionState,
    ) -> Option<Arc<dyn Agent>> {
        if capable.is_empty() {
            return None;
        }
        let cursor = state.advance_global();
        capable.get(cursor % capable.len()).cloned()
    }
}

/// Always the first capable agent in registration order
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCapable;

impl SelectionPolicy for FirstCapable {
    fn name(&self) -> &'static str {
        "first_capable"
    }

    fn select(
        &self,
        capable: &[Arc<dyn Agent>],
        _task: &Task,
        _state: &mut SelectionState,
    ) -> Option<Arc<dyn Agent>> {
        capable.first().cloned()
    }
}

/// Outcome of selecting an agent for a task
pub enum AgentSelectionDecision {
    /// Chosen among agents that declared the task type
    Capable {
        agent: Arc<dyn Agent>,
        candidates: usize,
    },
    /// No agent declared the task type; first registered agent used
    Fallback { agent: Arc<dyn Agent> },
}

impl AgentSelectionDecision {
    pub fn agent(&self) -> &Arc<dyn Agent> {
        match self {
            AgentSelectionDecision::Capable { agent, .. } => agent,
            AgentSelectionDecision::Fallback { agent } => agent,
        }
    }

    pub fn into_agent(self) -> Arc<dyn Agent> {
        match self {
            AgentSelectionDecision::Capable { agent, .. } => agent,
            AgentSelectionDecision::Fallback { agent } => agent,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AgentSelectionDecision::Fallback { .. })
    }
}

impl fmt::Debug for AgentSelectionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentSelectionDecision::Capable { agent, candidates } => f
                .debug_struct("Capable")
                .field("agent", &agent.name())
                .field("candidates", candidates)
                .finish(),
            AgentSelectionDecision::Fallback { agent } => f
                .debug_struct("Fallback")
                .field("agent", &agent.name())
                .finish(),
        }
    }
}

/// Selection policy plus the cursor state it mutates
pub struct AgentSelector {
    policy: Box<dyn SelectionPolicy>,
    state: Mutex<SelectionState>,
}

impl Default for AgentSelector {
    fn default() -> Self {
        Self::new(Box::new(PerTaskRoundRobin))
    }
}

impl AgentSelector {
    pub fn new(policy: Box<dyn SelectionPolicy>) -> Self {
        Self::with_state(policy, SelectionState::new())
    }

    /// Start from pre-seeded cursors
    pub fn with_state(policy: Box<dyn SelectionPolicy>, state: SelectionState) -> Self {
        Self {
            policy,
            state: Mutex::new(state),
        }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Copy of the current cursors
    pub fn state(&self) -> SelectionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Select one agent from `registry` (registration order)
    ///
    /// Returns `None` only for an empty registry. The cursor read and
    /// increment happen under one lock acquisition, so concurrent callers
    /// never observe the same cursor value.
    pub fn select(
        &self,
        registry: &[Arc<dyn Agent>],
        task: &Task,
    ) -> Option<AgentSelectionDecision> {
        let first = registry.first()?;

        let capable: Vec<Arc<dyn Agent>> = registry
            .iter()
            .filter(|agent| agent.can_handle(task))
            .cloned()
            .collect();

        if capable.is_empty() {
            info!(
                task_type = %task.task,
                agent = %first.name(),
                "No capable agent, falling back to first registered agent"
            );
            return Some(AgentSelectionDecision::Fallback {
                agent: Arc::clone(first),
            });
        }

        let candidates = capable.len();
        let chosen = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            self.policy.select(&capable, task, &mut state)
        }?;

        debug!(
            task_type = %task.task,
            agent = %chosen.name(),
            candidates = candidates,
            policy = self.policy.name(),
            "Selected agent"
        );

        Some(AgentSelectionDecision::Capable {
            agent: chosen,
            candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Capabilities, LocalAgent};
    use serde_json::json;

    fn local(name: &str, caps: &[&str]) -> Arc<dyn Agent> {
        Arc::new(LocalAgent::new(name, Capabilities::new(caps.iter().copied())))
    }

    fn task(task_type: &str) -> Task {
        Task::new(task_type, json!({}))
    }

    fn pick(selector: &AgentSelector, registry: &[Arc<dyn Agent>], task_type: &str) -> String {
        selector
            .select(registry, &task(task_type))
            .expect("registry is not empty")
            .agent()
            .name()
            .to_string()
    }

    #[test]
    fn test_empty_registry_selects_nothing() {
        let selector = AgentSelector::default();
        assert!(selector.select(&[], &task("x")).is_none());
    }

    #[test]
    fn test_per_task_round_robin_cycles_in_registration_order() {
        let selector = AgentSelector::default();
        let registry = vec![local("agent-1", &["compute"]), local("agent-2", &["compute"])];

        let picks: Vec<String> = (0..4).map(|_| pick(&selector, &registry, "compute")).collect();
        assert_eq!(picks, vec!["agent-1", "agent-2", "agent-1", "agent-2"]);
        assert_eq!(selector.state().cursor("compute"), 4);
    }

    #[test]
    fn test_per_task_cursors_are_independent() {
        let selector = AgentSelector::default();
        let registry = vec![
            local("a", &["compute", "analyze"]),
            local("b", &["compute", "analyze"]),
        ];

        assert_eq!(pick(&selector, &registry, "compute"), "a");
        assert_eq!(pick(&selector, &registry, "analyze"), "a");
        assert_eq!(pick(&selector, &registry, "analyze"), "b");
        assert_eq!(pick(&selector, &registry, "compute"), "b");
        assert_eq!(pick(&selector, &registry, "analyze"), "a");
        assert_eq!(pick(&selector, &registry, "compute"), "a");
    }

    #[test]
    fn test_only_capable_agents_rotate() {
        let selector = AgentSelector::default();
        let registry = vec![
            local("a", &["compute"]),
            local("b", &["other"]),
            local("c", &["*"]),
        ];

        let picks: Vec<String> = (0..4).map(|_| pick(&selector, &registry, "compute")).collect();
        assert_eq!(picks, vec!["a", "c", "a", "c"]);
    }

    #[test]
    fn test_fallback_to_first_registered() {
        let selector = AgentSelector::default();
        let registry = vec![local("only-y", &["y"]), local("only-z", &["z"])];

        let decision = selector.select(&registry, &task("x")).unwrap();
        assert!(decision.is_fallback());
        assert_eq!(decision.agent().name(), "only-y");
        // Fallback does not touch the cursor
        assert_eq!(selector.state().cursor("x"), 0);
    }

    #[test]
    fn test_global_round_robin_shares_cursor() {
        let selector = AgentSelector::new(Box::new(GlobalRoundRobin));
        let registry = vec![
            local("a", &["compute", "analyze"]),
            local("b", &["compute", "analyze"]),
        ];

        assert_eq!(pick(&selector, &registry, "compute"), "a");
        assert_eq!(pick(&selector, &registry, "analyze"), "b");
        assert_eq!(pick(&selector, &registry, "compute"), "a");
        assert_eq!(selector.state().global_cursor(), 3);
        assert_eq!(selector.policy_name(), "global_round_robin");
    }

    #[test]
    fn test_first_capable_is_sticky() {
        let selector = AgentSelector::new(Box::new(FirstCapable));
        let registry = vec![local("a", &["y"]), local("b", &["x"]), local("c", &["x"])];

        for _ in 0..3 {
            assert_eq!(pick(&selector, &registry, "x"), "b");
        }
    }

    #[test]
    fn test_seeded_state_starts_mid_cycle() {
        let state = SelectionState::new().with_cursor("compute", 5);
        let selector = AgentSelector::with_state(Box::new(PerTaskRoundRobin), state);
        let registry = vec![local("a", &["compute"]), local("b", &["compute"])];

        assert_eq!(pick(&selector, &registry, "compute"), "b");
        assert_eq!(pick(&selector, &registry, "compute"), "a");
    }

    #[test]
    fn test_cursor_wraps_without_panicking() {
        let mut state = SelectionState::new().with_cursor("t", usize::MAX);
        assert_eq!(state.advance("t"), usize::MAX);
        assert_eq!(state.cursor("t"), 0);
    }

    #[test]
    fn test_decision_debug_shows_agent_name() {
        let registry = vec![local("a", &["x"])];
        let decision = AgentSelector::default().select(&registry, &task("x")).unwrap();
        let rendered = format!("{decision:?}");
        assert!(rendered.contains("Capable"));
        assert!(rendered.contains("\"a\""));
    }
}
