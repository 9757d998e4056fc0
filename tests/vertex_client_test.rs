use std::sync::Arc;

use serde_json::json;
use tracing_test::traced_test;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vertex_cache_chat::prelude::*;

const MODEL_PATH: &str = "/v1/models/gemini-2.5-flash:generateContent";
const CACHE: &str = "projects/p/locations/us-central1/cachedContents/c1";

fn builder(server: &MockServer) -> VertexGeminiBuilder {
    VertexGeminiBuilder::new()
        .project("p")
        .model("gemini-2.5-flash")
        .base_url(format!("{}/v1", server.uri()))
        .access_token("test-token")
        .temperature(0.3)
        .thinking_budget(1024)
}

fn success_body() -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "The report covers Q3."}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 55182,
            "candidatesTokenCount": 336,
            "totalTokenCount": 55518,
            "cachedContentTokenCount": 55176
        },
        "modelVersion": "gemini-2.5-flash"
    })
}

#[tokio::test]
async fn cached_model_sends_cached_content_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "cachedContent": CACHE,
            "generationConfig": {"thinkingConfig": {"thinkingBudget": 1024}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let model = builder(&server).cached_content(CACHE).build().unwrap();
    let response = model
        .chat(vec![
            ChatMessage::system("Answer from the cached report"),
            ChatMessage::user("What does it cover?"),
        ])
        .await
        .unwrap();

    assert_eq!(response.text(), Some("The report covers Q3."));
    let usage = response.usage();
    assert_eq!(usage.prompt_tokens, 55182);
    assert_eq!(usage.completion_tokens, 336);
    assert_eq!(usage.total_tokens, 55518);
    assert_eq!(usage.cached_tokens, Some(55176));

    // With cached content, system text travels as the first user turn
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("systemInstruction").is_none());
    assert!(body.get("tools").is_none());
    assert_eq!(
        body["contents"][0]["parts"][0]["text"],
        "Answer from the cached report"
    );
}

#[traced_test]
#[tokio::test]
async fn cache_hit_is_logged_once_per_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .mount(&server)
        .await;

    let model = builder(&server).cached_content(CACHE).build().unwrap();
    let response = model.chat(vec![ChatMessage::user("hi")]).await.unwrap();
    // Reading usage again stays silent
    assert_eq!(response.usage(), response.usage());

    logs_assert(|lines: &[&str]| {
        match lines
            .iter()
            .filter(|line| line.contains("Token usage with context cache hit"))
            .count()
        {
            1 => Ok(()),
            n => Err(format!("expected one cache-hit line, got {n}")),
        }
    });
}

#[tokio::test]
async fn uncached_model_sends_system_instruction_and_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "lookup_order", "args": {"order_id": "A1"}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 20,
                "candidatesTokenCount": 5,
                "totalTokenCount": 25
            }
        })))
        .mount(&server)
        .await;

    let model = builder(&server).build().unwrap();
    let tool = Tool::function(
        "lookup_order",
        "Find an order",
        json!({
            "type": "object",
            "properties": {"order_id": {"type": "string"}},
            "required": ["order_id"]
        }),
    );
    let with_tools = model
        .as_tool_binding()
        .unwrap()
        .bind_tools(
            vec![tool],
            BindToolsOptions::default().with_tool_choice(ToolChoice::Required),
        )
        .unwrap();

    let response = with_tools
        .chat(vec![
            ChatMessage::system("be terse"),
            ChatMessage::user("where is A1?"),
        ])
        .await
        .unwrap();
    assert!(response.has_tool_calls());
    assert_eq!(response.tool_calls()[0].name, "lookup_order");
    assert_eq!(response.tool_calls()[0].arguments, json!({"order_id": "A1"}));
    let usage = response.usage();
    assert_eq!(usage, Usage::new(20, 5));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
    assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "lookup_order");
    assert_eq!(body["toolConfig"]["functionCallingConfig"]["mode"], "ANY");
    assert!(body.get("cachedContent").is_none());
}

#[tokio::test]
async fn vendor_errors_propagate_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "CachedContent can not be used with GenerateContent request setting system_instruction, tools or tool_config.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = builder(&server).cached_content(CACHE).build().unwrap();
    let err = model.chat(vec![ChatMessage::user("hi")]).await.unwrap_err();
    match &err {
        LlmError::ApiError {
            code,
            message,
            details,
        } => {
            assert_eq!(*code, 400);
            assert!(message.starts_with("CachedContent can not be used"));
            assert_eq!(details.as_ref().unwrap()["error"]["status"], "INVALID_ARGUMENT");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_errors_are_reported_as_retryable_but_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let model = builder(&server).build().unwrap();
    let err = model.chat(vec![ChatMessage::user("hi")]).await.unwrap_err();
    assert_eq!(err.status_code(), Some(503));
    assert!(err.is_retryable());
    assert!(matches!(
        err,
        LlmError::ApiError { ref message, .. } if message == "backend unavailable"
    ));
}

#[tokio::test]
async fn per_call_tools_on_cached_model_never_reach_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(0)
        .mount(&server)
        .await;

    let model = builder(&server).cached_content(CACHE).build().unwrap();
    let options = CallOptions::new().with_tools(vec![Tool::function("a", "A", json!({}))]);
    let err = model
        .generate(vec![ChatMessage::user("hi")], options)
        .await
        .unwrap_err();
    assert!(err.as_tool_cache_conflict().is_some());
}

#[tokio::test]
async fn custom_token_provider_is_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("authorization", "Bearer from-provider"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let model = VertexGeminiBuilder::new()
        .project("p")
        .model("gemini-2.5-flash")
        .base_url(format!("{}/v1", server.uri()))
        .token_provider(Arc::new(StaticTokenProvider::new("from-provider")))
        .build()
        .unwrap();
    model.chat(vec![ChatMessage::user("hi")]).await.unwrap();
}
