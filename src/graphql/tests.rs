//! Tests for the GraphQL fetcher

use super::*;
use crate::error::Error;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GraphqlClient {
    let config = GraphqlClientConfig::builder()
        .endpoint(format!("{}/graphql", server.uri()))
        .timeout(Duration::from_secs(5))
        .build();
    GraphqlClient::new(config).unwrap()
}

// ============================================================================
// QueryDescriptor Tests
// ============================================================================

#[test]
fn test_page_variables_layer_cursor_and_size() {
    let descriptor = QueryDescriptor::new("query { x }")
        .variable("startTime", "2024-01-01T00:00:00+0000")
        .variable("granularity", "DAILY");

    let first = descriptor.page_variables(None, 1000);
    assert_eq!(first[FIRST_VARIABLE], 1000);
    assert!(first[AFTER_VARIABLE].is_null());
    assert_eq!(first["granularity"], "DAILY");

    let next = descriptor.page_variables(Some("abc"), 1000);
    assert_eq!(next[AFTER_VARIABLE], "abc");

    // Base filters are never touched by paging
    assert!(!descriptor.base_variables().contains_key(AFTER_VARIABLE));
    assert!(!descriptor.base_variables().contains_key(FIRST_VARIABLE));
}

#[test]
fn test_client_config_builder() {
    let config = GraphqlClientConfig::builder()
        .endpoint("https://example.com/graphql")
        .timeout(Duration::from_secs(10))
        .header("X-Trace", "1")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.endpoint, "https://example.com/graphql");
    assert_eq!(config.timeout, Duration::from_secs(10));
    assert_eq!(config.default_headers.get("X-Trace"), Some(&"1".to_string()));
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_client_rejects_invalid_endpoint() {
    let config = GraphqlClientConfig::builder().endpoint("not a url").build();
    assert!(matches!(
        GraphqlClient::new(config),
        Err(Error::InvalidUrl(_))
    ));
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[tokio::test]
async fn test_execute_sends_query_variables_and_credential() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("Authorization", "Bearer key-123"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "query": "query { campaignGroupInsight }",
            "variables": {"first": 50, "after": "c1", "startTime": "2024-01-01T00:00:00+0000"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"campaignGroupInsight": {"records": {"nodes": []}}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let descriptor = QueryDescriptor::new("query { campaignGroupInsight }")
        .variable("startTime", "2024-01-01T00:00:00+0000");
    let request = PageRequest {
        credential: "Bearer key-123",
        descriptor: &descriptor,
        cursor: Some("c1"),
        page_size: 50,
    };

    let payload = client.execute(&request).await.unwrap();
    assert!(payload["data"]["campaignGroupInsight"].is_object());
}

#[tokio::test]
async fn test_execute_non_2xx_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let descriptor = QueryDescriptor::new("query { x }");
    let request = PageRequest {
        credential: "Bearer k",
        descriptor: &descriptor,
        cursor: None,
        page_size: 10,
    };

    let err = client.execute(&request).await.unwrap_err();
    match &err {
        Error::HttpStatus { status, body } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "unavailable");
        }
        other => panic!("Expected HttpStatus, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_execute_errors_field_is_upstream_query_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Invalid cursor"}],
            "data": null
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let descriptor = QueryDescriptor::new("query { x }");
    let request = PageRequest {
        credential: "Bearer k",
        descriptor: &descriptor,
        cursor: Some("stale"),
        page_size: 10,
    };

    let err = client.execute(&request).await.unwrap_err();
    match &err {
        Error::UpstreamQuery { errors } => {
            assert_eq!(errors[0]["message"], "Invalid cursor");
        }
        other => panic!("Expected UpstreamQuery, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_execute_non_json_body_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let descriptor = QueryDescriptor::new("query { x }");
    let request = PageRequest {
        credential: "Bearer k",
        descriptor: &descriptor,
        cursor: None,
        page_size: 10,
    };

    let err = client.execute(&request).await.unwrap_err();
    assert!(matches!(err, Error::JsonParse(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_execute_connection_refused_is_transport_error() {
    // Reserve a free port, then release it so nothing is listening
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = GraphqlClientConfig::builder()
        .endpoint(format!("http://127.0.0.1:{port}/graphql"))
        .timeout(Duration::from_secs(2))
        .build();
    let client = GraphqlClient::new(config).unwrap();
    let descriptor = QueryDescriptor::new("query { x }");
    let request = PageRequest {
        credential: "Bearer k",
        descriptor: &descriptor,
        cursor: None,
        page_size: 10,
    };

    let err = client.execute(&request).await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
    assert!(err.is_transient());
}
