//! Cloud task simulator
//!
//! A standalone façade that accepts loosely-typed task requests and answers
//! with synthetic receipts, progress and results. It has no agents and does
//! no network I/O; it never consults the [`Delegator`](crate::delegator::Delegator).
//!
//! Task IDs look like `task-1718000000000-k3j9x2a1b`: epoch milliseconds plus
//! a nine-character lowercase alphanumeric suffix.

use crate::error::{DelegationError, DelegationResult};
use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Seconds until a delegated task is reported as likely complete
const ESTIMATED_COMPLETION_SECS: i64 = 60;

const TASK_ID_SUFFIX_LEN: usize = 9;

/// Simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub settings: SimulatorSettings,
}

fn default_enabled() -> bool {
    true
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            capabilities: Vec::new(),
            settings: SimulatorSettings::default(),
        }
    }
}

/// Settings echoed into every delegation request record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorSettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_priority() -> String {
    "normal".to_string()
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            priority: default_priority(),
        }
    }
}

/// Record of a delegation, built for every accepted task
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationRequest {
    pub task_id: String,
    pub timestamp: String,
    pub task: Value,
    pub config: SimulatorSettings,
}

/// Answer to `delegate_task`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DelegationReceipt {
    pub status: String,
    pub task_id: String,
    pub message: String,
    pub estimated_completion: String,
}

/// Answer to `get_task_status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusReport {
    pub task_id: String,
    pub status: String,
    pub progress: u8,
    pub message: String,
}

/// Answer to `get_task_results`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskResultsReport {
    pub task_id: String,
    pub status: String,
    pub results: Value,
    pub completed_at: String,
}

/// Synthetic delegation façade
#[derive(Debug, Clone)]
pub struct CloudTaskSimulator {
    config: SimulatorConfig,
}

impl Default for CloudTaskSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl CloudTaskSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn capabilities(&self) -> &[String] {
        &self.config.capabilities
    }

    /// Accept a task of shape `{type, payload, options}`
    pub async fn delegate_task(&self, task: &Value) -> DelegationResult<DelegationReceipt> {
        if !self.config.enabled {
            return Err(DelegationError::SimulatorDisabled);
        }

        Self::validate_task(task)?;

        let task_type = task.get("type").map(render_task_type).unwrap_or_default();
        info!(task_type = %task_type, "Delegating task to cloud agent");

        let request = DelegationRequest {
            task_id: generate_task_id(),
            timestamp: Utc::now().to_rfc3339(),
            task: task.clone(),
            config: self.config.settings.clone(),
        };
        debug!(
            task_id = %request.task_id,
            priority = %request.config.priority,
            "Prepared delegation request"
        );

        Ok(DelegationReceipt {
            status: "delegated".to_string(),
            task_id: request.task_id,
            message: "Task successfully delegated to cloud agent".to_string(),
            estimated_completion: (Utc::now()
                + ChronoDuration::seconds(ESTIMATED_COMPLETION_SECS))
            .to_rfc3339(),
        })
    }

    pub async fn get_task_status(&self, task_id: &str) -> TaskStatusReport {
        debug!(task_id = %task_id, "Checking task status");
        TaskStatusReport {
            task_id: task_id.to_string(),
            status: "processing".to_string(),
            progress: 50,
            message: "Task is being processed by cloud agent".to_string(),
        }
    }

    pub async fn get_task_results(&self, task_id: &str) -> TaskResultsReport {
        debug!(task_id = %task_id, "Retrieving task results");
        TaskResultsReport {
            task_id: task_id.to_string(),
            status: "completed".to_string(),
            results: Value::Object(serde_json::Map::new()),
            completed_at: Utc::now().to_rfc3339(),
        }
    }

    /// Require a JSON object with truthy `type` and `payload` (pure function)
    pub fn validate_task(task: &Value) -> DelegationResult<()> {
        let Some(fields) = task.as_object() else {
            return Err(DelegationError::validation("Task must be an object"));
        };
        if !fields.get("type").is_some_and(is_truthy) {
            return Err(DelegationError::validation("Task must have a type"));
        }
        if !fields.get("payload").is_some_and(is_truthy) {
            return Err(DelegationError::validation("Task must have a payload"));
        }
        Ok(())
    }
}

/// JSON truthiness: null, false, 0 and "" are falsy; objects and arrays are truthy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn render_task_type(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `task-<epoch-ms>-<9 lowercase alphanumerics>`
pub fn generate_task_id() -> String {
    let suffix = base36_suffix(Uuid::new_v4().as_u128());
    format!("task-{}-{suffix}", Utc::now().timestamp_millis())
}

/// Low-order base-36 digits of `value`, least significant first (pure function)
fn base36_suffix(mut value: u128) -> String {
    (0..TASK_ID_SUFFIX_LEN)
        .map(|_| {
            let digit = BASE36_ALPHABET[(value % 36) as usize];
            value /= 36;
            char::from(digit)
        })
        .collect()
}
