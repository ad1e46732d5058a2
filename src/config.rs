//! Configuration for the delegation engine
//!
//! [`DelegatorConfig`] carries the delegator's tunables and is immutable once
//! a [`Delegator`](crate::delegator::Delegator) is built. Unknown fields are
//! kept in `extra`, so callers can shallow-merge their own settings over the
//! defaults.
//!
//! [`DelegationFileConfig`] is the TOML file layout used by the CLI:
//!
//! ```toml
//! [delegator]
//! max_retries = 2
//! timeout_ms = 5000
//!
//! [[agents]]
//! name = "local-echo"
//! capabilities = ["echo"]
//!
//! [[agents]]
//! name = "cloud-processor"
//! capabilities = ["analyze", "transform"]
//! endpoint = "https://cloud.example.com/process"
//! ```

use crate::agent::{http_client, Agent, Capabilities, LocalAgent, RemoteAgent};
use crate::simulator::SimulatorConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Delegator tunables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DelegatorConfig {
    /// Extra attempts after a retryable failure (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Per-attempt deadline in milliseconds (default: 30000, must be > 0)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Base of the exponential backoff between attempts (default: 100)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Delay of simulated execution when no agents are registered (default: 100)
    #[serde(default = "default_simulated_delay_ms")]
    pub simulated_delay_ms: u64,
    /// Caller-supplied fields, carried through untouched
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_simulated_delay_ms() -> u64 {
    100
}

impl Default for DelegatorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_ms: default_timeout_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            simulated_delay_ms: default_simulated_delay_ms(),
            extra: HashMap::new(),
        }
    }
}

impl DelegatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge caller fields over the defaults
    ///
    /// Known keys override the defaults; anything else lands in `extra`.
    pub fn from_overrides(overrides: Value) -> Result<Self, ConfigError> {
        let Value::Object(overrides) = overrides else {
            return Err(ConfigError::InvalidConfig(
                "delegator overrides must be a JSON object".to_string(),
            ));
        };

        let mut merged = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        merged.extend(overrides);

        let config: Self = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry_backoff_ms(mut self, retry_backoff_ms: u64) -> Self {
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }

    pub fn with_simulated_delay_ms(mut self, simulated_delay_ms: u64) -> Self {
        self.simulated_delay_ms = simulated_delay_ms;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Declarative agent entry in a configuration file
///
/// An `endpoint` makes it a [`RemoteAgent`]; otherwise a [`LocalAgent`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSpec {
    /// Agent name (must match [a-zA-Z0-9._-]+)
    pub name: String,
    /// Task types the agent accepts; "*" accepts everything
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Remote endpoint URL (http or https)
    pub endpoint: Option<String>,
}

impl AgentSpec {
    pub fn is_remote(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Configuration file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DelegationFileConfig {
    #[serde(default)]
    pub delegator: DelegatorConfig,
    /// Agents registered in file order
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    /// Settings for the cloud task simulator
    pub simulator: Option<SimulatorConfig>,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid agent name: {0}")]
    InvalidAgentName(String),
    #[error("Invalid endpoint {0}")]
    InvalidEndpoint(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl DelegationFileConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML content
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DelegationFileConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delegator.validate()?;

        for spec in &self.agents {
            validate_agent_name(&spec.name)?;
        }

        // Endpoint checks are the same ones RemoteAgent applies
        self.build_agents().map(|_| ())
    }

    /// Instantiate the configured agents in file order
    ///
    /// Remote agents share one HTTP client.
    pub fn build_agents(&self) -> Result<Vec<Arc<dyn Agent>>, ConfigError> {
        let client = http_client()?;

        self.agents
            .iter()
            .map(|spec| {
                let capabilities = Capabilities::new(spec.capabilities.iter().cloned());
                let agent: Arc<dyn Agent> = match &spec.endpoint {
                    Some(endpoint) => Arc::new(RemoteAgent::with_client(
                        spec.name.clone(),
                        endpoint,
                        capabilities,
                        client.clone(),
                    )?),
                    None => Arc::new(LocalAgent::new(spec.name.clone(), capabilities)),
                };
                Ok(agent)
            })
            .collect()
    }
}

/// Validate agent name format
fn validate_agent_name(name: &str) -> Result<(), ConfigError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if name.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidAgentName(format!(
            "Agent name '{name}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}
