//! Remote HTTP agent
//!
//! Forwards each task to a remote peer as a JSON `POST` and maps the reply
//! onto the delegation error taxonomy.
//!
//! # Wire format
//!
//! ```json
//! POST <endpoint>
//! Content-Type: application/json
//!
//! {"task": "analyze", "data": {"values": [10, 20, 30]}}
//! ```
//!
//! | Peer reply                     | Result                          |
//! |--------------------------------|---------------------------------|
//! | 2xx, JSON body                 | `Ok`, body returned as `result` |
//! | 2xx, malformed body            | `ResponseParseError`            |
//! | non-2xx                        | `HttpStatusError{code, body}`   |
//! | connect/DNS/reset/read failure | `TransportError`                |
//!
//! Redirects are not followed, so a 3xx reply is an `HttpStatusError` too.
//! No retry or timeout is applied here; the delegator's
//! [`RetryPolicy`](crate::routing::RetryPolicy) bounds the wait.
//!
//! # Example
//!
//! ```no_run
//! use cloud_delegator::agent::{Agent, Capabilities, RemoteAgent};
//! use cloud_delegator::protocol::Task;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let agent = RemoteAgent::new(
//!     "cloud-processor",
//!     "http://localhost:8888/process",
//!     Capabilities::new(["analyze", "transform"]),
//! )?;
//!
//! let outcome = agent.execute(&Task::new("analyze", json!({"values": [10, 20]}))).await?;
//! println!("{}", outcome.result);
//! # Ok(())
//! # }
//! ```

use crate::agent::base::{Agent, AgentCore, Capabilities};
use crate::config::ConfigError;
use crate::error::{DelegationError, DelegationResult};
use crate::protocol::{ExecutionOutcome, RemoteTaskRequest, Task};
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Agent that executes tasks on a remote HTTP peer
pub struct RemoteAgent {
    core: AgentCore,
    endpoint: Url,
    client: reqwest::Client,
}

impl RemoteAgent {
    /// Create a remote agent with its own HTTP client
    pub fn new(
        name: impl Into<String>,
        endpoint: &str,
        capabilities: Capabilities,
    ) -> Result<Self, ConfigError> {
        Self::with_client(name, endpoint, capabilities, http_client()?)
    }

    /// Create a remote agent sharing an existing HTTP client
    pub fn with_client(
        name: impl Into<String>,
        endpoint: &str,
        capabilities: Capabilities,
        client: reqwest::Client,
    ) -> Result<Self, ConfigError> {
        let endpoint = parse_endpoint(endpoint)?;
        Ok(Self {
            core: AgentCore::new(name, capabilities),
            endpoint,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether requests go over TLS
    pub fn uses_tls(&self) -> bool {
        self.endpoint.scheme() == "https"
    }

    /// Explicit endpoint port, or the scheme's standard port
    pub fn effective_port(&self) -> Option<u16> {
        self.endpoint.port_or_known_default()
    }

    /// Map a fully read peer reply to an outcome (pure function)
    fn interpret_response(
        &self,
        task: &Task,
        status: u16,
        body: String,
    ) -> DelegationResult<ExecutionOutcome> {
        if !(200..300).contains(&status) {
            warn!(
                agent = %self.name(),
                status = status,
                "Remote agent returned non-success status"
            );
            return Err(DelegationError::http_status(status, body));
        }

        let result: Value = serde_json::from_str(&body)
            .map_err(|e| DelegationError::response_parse(e.to_string()))?;

        Ok(ExecutionOutcome::completed_by(self.name(), task, result))
    }
}

/// HTTP client for remote agents
///
/// Redirects are never followed: a 3xx reply is a non-2xx answer from the
/// configured peer and must surface as `HttpStatusError`.
pub fn http_client() -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Parse and check an endpoint URL (pure function)
fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidEndpoint(format!("'{endpoint}': {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::InvalidEndpoint(format!(
                "'{endpoint}': unsupported scheme '{other}', expected http or https"
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEndpoint(format!(
            "'{endpoint}': missing host"
        )));
    }

    Ok(url)
}

#[async_trait]
impl Agent for RemoteAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn process(&self, task: &Task) -> DelegationResult<ExecutionOutcome> {
        let body = serde_json::to_vec(&RemoteTaskRequest::from(task)).map_err(|e| {
            DelegationError::agent_failure(self.name(), format!("Failed to encode task: {e}"))
        })?;

        debug!(
            agent = %self.name(),
            endpoint = %self.endpoint,
            bytes = body.len(),
            "Sending task to remote agent"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .map_err(|e| DelegationError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| DelegationError::transport(e.to_string()))?;

        self.interpret_response(task, status, text)
    }
}
