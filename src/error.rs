//! Error types for task delegation
//!
//! Every failure the delegation engine can surface lives in [`DelegationError`].
//! The delegator never wraps agent failures: whatever an agent's `execute`
//! returns is what `delegate` returns.

use thiserror::Error;

/// Main error type for delegation operations
#[derive(Debug, Error)]
pub enum DelegationError {
    /// Malformed task handed to the cloud task simulator
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// Network-level failure reaching a remote agent
    #[error("Request failed: {message}")]
    TransportError { message: String },

    /// Remote peer answered with a status outside 200..300
    #[error("HTTP {code}: {body}")]
    HttpStatusError { code: u16, body: String },

    /// Remote peer answered 2xx but the body was not valid JSON
    #[error("Failed to parse response: {message}")]
    ResponseParseError { message: String },

    /// A single execution attempt exceeded its deadline
    #[error("Agent execution timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Failure raised by an agent's own processing step
    #[error("Agent '{agent}' failed: {message}")]
    AgentFailure { agent: String, message: String },

    #[error("Cloud agent delegation is not enabled")]
    SimulatorDisabled,

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl DelegationError {
    /// Create validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Create transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    /// Create HTTP status error
    pub fn http_status<S: Into<String>>(code: u16, body: S) -> Self {
        Self::HttpStatusError {
            code,
            body: body.into(),
        }
    }

    /// Create response parse error
    pub fn response_parse<S: Into<String>>(message: S) -> Self {
        Self::ResponseParseError {
            message: message.into(),
        }
    }

    /// Create agent failure
    pub fn agent_failure<A: Into<String>, S: Into<String>>(agent: A, message: S) -> Self {
        Self::AgentFailure {
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// Only transport failures and timeouts qualify; a peer that answered
    /// (even with 4xx/5xx) is not retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DelegationError::TransportError { .. } | DelegationError::Timeout { .. }
        )
    }

    /// HTTP status code carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DelegationError::HttpStatusError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for delegation operations
pub type DelegationResult<T> = Result<T, DelegationError>;
