use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jgrants_llm::{ClaudeAdapter, OpenAiAdapter};
use jgrants_tool_runtime::{LlmError, Message, ProviderAdapter, ToolDefinition};

fn claude(server: &MockServer) -> ClaudeAdapter {
    ClaudeAdapter::new("test-api-key", "claude-test", server.uri(), Duration::from_secs(5))
        .unwrap()
        .with_max_tokens(1024)
}

fn openai(server: &MockServer) -> OpenAiAdapter {
    OpenAiAdapter::new("test-api-key", "gpt-test", server.uri(), Duration::from_secs(5)).unwrap()
}

fn tools() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: "search_subsidies".into(),
        description: "補助金を検索".into(),
        input_schema: json!({
            "type": "object",
            "properties": {"keyword": {"type": "string"}},
            "required": ["keyword"]
        }),
    }]
}

async fn last_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    serde_json::from_slice(&requests.last().unwrap().body).unwrap()
}

#[tokio::test]
async fn claude_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-api-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"model": "claude-test", "max_tokens": 1024})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "こんにちは"}],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = claude(&server);
    let wire_tools = adapter.to_wire_tools(&tools());
    let response = adapter.send(&[Message::user("hello")], &wire_tools).await.unwrap();
    assert_eq!(adapter.extract_final_text(&response), "こんにちは");

    let body = last_body(&server).await;
    assert_eq!(body["messages"], json!([{"role": "user", "content": "hello"}]));
    assert_eq!(body["tools"][0]["input_schema"]["required"][0], "keyword");
    assert!(body.get("tool_choice").is_none());
}

#[tokio::test]
async fn claude_omits_empty_tool_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let adapter = claude(&server);
    adapter.send(&[Message::user("hi")], &adapter.to_wire_tools(&[])).await.unwrap();
    assert!(last_body(&server).await.get("tools").is_none());
}

#[tokio::test]
async fn openai_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({"model": "gpt-test", "tool_choice": "auto"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "了解"},
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = openai(&server);
    let response = adapter
        .send(&[Message::user("hello")], &adapter.to_wire_tools(&tools()))
        .await
        .unwrap();
    assert_eq!(adapter.extract_final_text(&response), "了解");

    let body = last_body(&server).await;
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "search_subsidies");
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-api-key", "bad-key"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        })))
        .mount(&server)
        .await;

    let unauthorized =
        ClaudeAdapter::new("bad-key", "claude-test", server.uri(), Duration::from_secs(5))
            .unwrap();
    let err = unauthorized.send(&[Message::user("q")], &json!([])).await.unwrap_err();
    assert!(matches!(err, LlmError::AuthError));

    let err = openai(&server).send(&[Message::user("q")], &json!([])).await.unwrap_err();
    assert!(matches!(err, LlmError::RateLimited { retry_after_secs: 7 }));

    let err = claude(&server).send(&[Message::user("q")], &json!([])).await.unwrap_err();
    match err {
        LlmError::ApiError { status, message } => {
            assert_eq!(status, 529);
            assert_eq!(message, "Overloaded");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = openai(&server).send(&[Message::user("q")], &json!([])).await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let adapter =
        ClaudeAdapter::new("k", "m", "http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    let err = adapter.send(&[Message::user("q")], &json!([])).await.unwrap_err();
    assert!(matches!(err, LlmError::NetworkError(_)));
}
