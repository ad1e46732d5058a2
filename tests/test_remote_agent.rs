//! Integration tests for the HTTP remote agent
//!
//! Tests the wire contract against a mock peer:
//! - request shape (method, headers, body, path and query)
//! - success, non-2xx and malformed replies
//! - transport failures and per-attempt timeouts
//! - agent status after each outcome

use cloud_delegator::agent::{Agent, AgentStatus, Capabilities, RemoteAgent};
use cloud_delegator::config::DelegationFileConfig;
use cloud_delegator::{DelegationError, Delegator, DelegatorConfig, Task};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote(server: &MockServer, route: &str) -> RemoteAgent {
    RemoteAgent::new(
        "cloud",
        &format!("{}{}", server.uri(), route),
        Capabilities::new(["analyze"]),
    )
    .unwrap()
}

#[tokio::test]
async fn test_remote_success_returns_peer_json_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"echo": 42})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let agent = remote(&mock_server, "/process");
    let outcome = agent
        .execute(&Task::new("analyze", json!({"values": [1, 2]})))
        .await
        .unwrap();

    assert_eq!(outcome.agent_name(), Some("cloud"));
    assert_eq!(outcome.task, "analyze");
    assert_eq!(outcome.result, json!({"echo": 42}));
    assert_eq!(agent.status(), AgentStatus::Idle);
}

#[tokio::test]
async fn test_remote_request_carries_json_body_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/jobs"))
        .and(query_param("region", "eu"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"task": "analyze", "data": {"values": [1, 2]}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let agent = remote(&mock_server, "/v1/jobs?region=eu");
    let outcome = agent
        .execute(&Task::new("analyze", json!({"values": [1, 2]})))
        .await
        .unwrap();

    assert_eq!(outcome.result, json!(true));

    let requests = mock_server.received_requests().await.unwrap();
    let content_length = requests[0]
        .headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    assert_eq!(content_length, Some(requests[0].body.len()));
}

#[tokio::test]
async fn test_remote_non_success_status_fails_with_raw_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let agent = remote(&mock_server, "/process");
    let err = agent
        .execute(&Task::new("analyze", json!({})))
        .await
        .unwrap_err();

    match err {
        DelegationError::HttpStatusError { code, body } => {
            assert_eq!(code, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("Expected HttpStatusError, got {other:?}"),
    }
    assert_eq!(agent.status(), AgentStatus::Error);
}

#[tokio::test]
async fn test_remote_redirect_is_not_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/other")
                .set_body_string("moved"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"redirected": true})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let agent = remote(&mock_server, "/process");
    let err = agent
        .execute(&Task::new("analyze", json!({})))
        .await
        .unwrap_err();

    match err {
        DelegationError::HttpStatusError { code, body } => {
            assert_eq!(code, 302);
            assert_eq!(body, "moved");
        }
        other => panic!("Expected HttpStatusError, got {other:?}"),
    }
    assert_eq!(agent.status(), AgentStatus::Error);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_configured_remote_agents_do_not_follow_redirects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/elsewhere"))
        .mount(&mock_server)
        .await;

    let config = DelegationFileConfig::from_toml_str(&format!(
        "[[agents]]\nname = \"cloud\"\ncapabilities = [\"analyze\"]\nendpoint = \"{}/process\"\n",
        mock_server.uri()
    ))
    .unwrap();
    let agents = config.build_agents().unwrap();

    let err = agents[0]
        .execute(&Task::new("analyze", json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(301));
    assert_eq!(agents[0].status(), AgentStatus::Error);
}

#[tokio::test]
async fn test_remote_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let agent = remote(&mock_server, "/process");
    let err = agent
        .execute(&Task::new("analyze", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, DelegationError::ResponseParseError { .. }));
    assert_eq!(agent.status(), AgentStatus::Error);
}

#[tokio::test]
async fn test_remote_connection_refused_is_transport_error() {
    let agent = RemoteAgent::new(
        "unreachable",
        "http://127.0.0.1:1/process",
        Capabilities::wildcard(),
    )
    .unwrap();

    let err = agent
        .execute(&Task::new("analyze", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, DelegationError::TransportError { .. }));
    assert!(err.is_retryable());
    assert_eq!(agent.status(), AgentStatus::Error);
}

#[tokio::test]
async fn test_delegator_does_not_retry_http_status_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let delegator = Delegator::new(
        DelegatorConfig::default()
            .with_max_retries(3)
            .with_retry_backoff_ms(1),
    )
    .unwrap();
    delegator.register_agent(Arc::new(remote(&mock_server, "/process")));

    let err = delegator
        .delegate(Task::new("analyze", json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn test_delegator_retries_transport_failures_until_exhausted() {
    let delegator = Delegator::new(
        DelegatorConfig::default()
            .with_max_retries(2)
            .with_retry_backoff_ms(1),
    )
    .unwrap();
    let agent = Arc::new(
        RemoteAgent::new("unreachable", "http://127.0.0.1:1/", Capabilities::wildcard())
            .unwrap(),
    );
    delegator.register_agent(agent.clone());

    let err = delegator
        .delegate(Task::new("analyze", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, DelegationError::TransportError { .. }));
    assert_eq!(agent.status(), AgentStatus::Error);
}

#[tokio::test]
async fn test_slow_peer_times_out_and_agent_still_settles() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"late": true}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    let delegator = Delegator::new(
        DelegatorConfig::default()
            .with_max_retries(0)
            .with_timeout_ms(50),
    )
    .unwrap();
    let agent = Arc::new(remote(&mock_server, "/process"));
    delegator.register_agent(agent.clone());

    let err = delegator
        .delegate(Task::new("analyze", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, DelegationError::Timeout { timeout_ms: 50 }));
    assert_eq!(agent.status(), AgentStatus::Busy);

    // The in-flight request keeps running and completes normally
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(agent.status(), AgentStatus::Idle);
}
