//! Gateway client tests against a mocked gateway.
//!
//! Run with:
//!   cargo test -p study-buddy-cli --test client

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use study_buddy_cli::{
    ChatClient, ChatRequest, ClientError, ExplainLevel, ExplainRequest, TutorSettings,
};
use study_buddy_core::ConversationMessage;

const SSE: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";

fn request() -> ChatRequest {
    let settings = TutorSettings {
        topic: Some("Biology".into()),
        ..TutorSettings::default()
    };
    ChatRequest::new(vec![ConversationMessage::user("What is a cell?")], &settings)
}

async fn error_for(status: u16, body: Option<serde_json::Value>) -> ClientError {
    let server = MockServer::start().await;
    let mut template = ResponseTemplate::new(status);
    if let Some(body) = body {
        template = template.set_body_json(body);
    }
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(template)
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri(), None);
    match client.open_stream(&request()).await {
        Err(err) => err,
        Ok(_) => panic!("expected status {status} to fail"),
    }
}

#[tokio::test]
async fn open_stream_sends_conversation_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(header("authorization", "Bearer publishable-key"))
        .and(body_partial_json(json!({
            "messages": [{ "role": "user", "content": "What is a cell?" }],
            "topic": "Biology",
            "language": "en",
            "communicationStyle": "neutral"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(format!("{}/", server.uri()), Some("publishable-key".into()));
    let response = client.open_stream(&request()).await.unwrap();

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(body, SSE.as_bytes());
}

#[tokio::test]
async fn statuses_map_to_distinct_errors() {
    assert!(matches!(error_for(404, None).await, ClientError::NotDeployed));
    assert!(matches!(error_for(401, None).await, ClientError::Unauthorized));
    assert!(matches!(error_for(403, None).await, ClientError::Unauthorized));
    assert!(matches!(error_for(429, None).await, ClientError::RateLimited));
    assert!(matches!(error_for(402, None).await, ClientError::QuotaExceeded));
}

#[tokio::test]
async fn other_status_uses_gateway_message() {
    let err = error_for(
        500,
        Some(json!({ "error": { "code": "upstream_error", "message": "AI gateway error" } })),
    )
    .await;
    match err {
        ClientError::Upstream { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "AI gateway error");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn other_status_without_body_is_unknown() {
    match error_for(503, None).await {
        ClientError::Upstream { message, .. } => assert_eq!(message, "Unknown error"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_success_is_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri(), None);
    assert!(matches!(
        client.open_stream(&request()).await,
        Err(ClientError::NoBody)
    ));
}

#[tokio::test]
async fn unreachable_gateway_is_transport_error() {
    // Port 9 (discard) is not expected to accept connections.
    let client = ChatClient::new("http://127.0.0.1:9", None);
    let err = client.open_stream(&request()).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.remediation().contains("**How to fix this:**"));
}

#[tokio::test]
async fn explain_returns_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/explain"))
        .and(body_partial_json(json!({
            "topic": "Entropy",
            "level": "advanced",
            "examples": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "Disorder." })))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri(), None);
    let text = client
        .explain(&ExplainRequest {
            topic: "Entropy".into(),
            level: ExplainLevel::Advanced,
            examples: true,
        })
        .await
        .unwrap();
    assert_eq!(text, "Disorder.");
}

#[tokio::test]
async fn explain_with_bad_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/explain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri(), None);
    let result = client
        .explain(&ExplainRequest {
            topic: "x".into(),
            level: ExplainLevel::Basic,
            examples: false,
        })
        .await;
    assert!(matches!(result, Err(ClientError::Parse(_))));
}

#[tokio::test]
async fn health_reports_gateway_setup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "version": "0.1.0",
            "upstream_configured": false,
            "client_key_required": true
        })))
        .mount(&server)
        .await;

    let client = ChatClient::new(server.uri(), Some("key".into()));
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert!(!health.upstream_configured);
    assert_eq!(health.problems(client.has_token()).len(), 1);
}

#[tokio::test]
async fn health_of_unreachable_gateway_is_transport_error() {
    let client = ChatClient::new("http://127.0.0.1:9", None);
    assert!(matches!(client.health().await, Err(ClientError::Transport(_))));
}
