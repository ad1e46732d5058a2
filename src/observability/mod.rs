//! Observability: structured logging and delegation metrics

pub mod logging;
pub mod metrics;

// Re-export for convenience
pub use logging::{init_default_logging, init_logging, parse_level, LogFormat};
pub use metrics::{metrics, AgentExecutionStats, DelegationMetrics, MetricsSnapshot};

// Span macros for structured logging
pub use logging::{agent_span, delegation_span};
