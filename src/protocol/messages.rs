//! Task and outcome message types
//!
//! Defines the unit of work handed to the delegator, the outcome every
//! successful execution produces, and the JSON body sent to remote agents.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A unit of work identified by a type string and an opaque payload
///
/// # Examples
/// ```
/// use cloud_delegator::protocol::Task;
/// use serde_json::json;
///
/// let task = Task::new("compute", json!({"values": [1, 2, 3]}));
/// assert_eq!(task.task_type(), "compute");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Task type, matched against agent capabilities
    pub task: String,
    /// Opaque payload
    #[serde(default)]
    pub data: Value,
}

impl Task {
    pub fn new(task: impl Into<String>, data: Value) -> Self {
        Self {
            task: task.into(),
            data,
        }
    }

    pub fn task_type(&self) -> &str {
        &self.task
    }
}

/// Terminal state reported in an [`ExecutionOutcome`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Completed,
}

/// Result of a successful execution
///
/// `agent` is absent for simulated execution, and `timestamp` is only
/// stamped by simulated execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionOutcome {
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub task: String,
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ExecutionOutcome {
    /// Outcome produced by a named agent
    pub fn completed_by(agent: impl Into<String>, task: &Task, result: Value) -> Self {
        Self {
            status: OutcomeStatus::Completed,
            agent: Some(agent.into()),
            task: task.task.clone(),
            result,
            timestamp: None,
        }
    }

    /// Outcome of the delegator's built-in simulated execution
    pub fn simulated(task: &Task) -> Self {
        Self {
            status: OutcomeStatus::Completed,
            agent: None,
            task: task.task.clone(),
            result: Value::String(format!("Processed: {}", task.data)),
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == OutcomeStatus::Completed
    }

    pub fn agent_name(&self) -> Option<&str> {
        self.agent.as_deref()
    }
}

/// JSON body POSTed to a remote agent endpoint
#[derive(Debug, Serialize)]
pub struct RemoteTaskRequest<'a> {
    pub task: &'a str,
    pub data: &'a Value,
}

impl<'a> From<&'a Task> for RemoteTaskRequest<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            task: &task.task,
            data: &task.data,
        }
    }
}
