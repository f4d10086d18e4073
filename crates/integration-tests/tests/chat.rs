//! End-to-end chat completion flows

mod harness;

use harness::mock_openai::MockOpenAi;
use harness::server::TestServer;

#[tokio::test]
async fn openai_request_round_trips() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .post_json(
            "/v1/chat/completions",
            &serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Hello!"}]
            }),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["choices"][0]["message"]["role"], "assistant");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    assert_eq!(body["choices"][0]["message"]["content"], "Hello from mock");
}

#[tokio::test]
async fn target_format_bedrock_claude_converts_the_response() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .post_json(
            "/v1/chat/completions?target_format=bedrock_claude",
            &serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Hello!"}]
            }),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    // Anthropic response shape, even though the upstream provider is OpenAI
    assert_eq!(body["type"], "message");
    assert_eq!(body["role"], "assistant");
    assert_eq!(body["content"][0]["type"], "text");
    assert_eq!(body["stop_reason"], "end_turn");

    // The upstream really was the mock OpenAI backend
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn bedrock_claude_dialect_gets_a_claude_shaped_response_by_default() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    // Claude-dialect ingress; the model still routes to the OpenAI backend
    let response = server
        .post_json(
            "/v1/chat/completions",
            &serde_json::json!({
                "anthropic_version": "bedrock-2023-05-31",
                "model": "gpt-4o-mini",
                "max_tokens": 1000,
                "messages": [{"role": "user", "content": "Hello!"}]
            }),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    // Format preservation: no target_format, so the source dialect answers
    assert_eq!(body["type"], "message");
    assert_eq!(body["role"], "assistant");
    assert_eq!(body["content"][0]["type"], "text");
    assert_eq!(body["stop_reason"], "end_turn");
}

#[tokio::test]
async fn unknown_target_format_fails_before_any_provider_call() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .post_json(
            "/v1/chat/completions?target_format=claude",
            &serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Hello!"}]
            }),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "validation");
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn empty_messages_fail_validation_before_routing() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .post_json(
            "/v1/chat/completions",
            &serde_json::json!({"model": "gpt-4o-mini", "messages": []}),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn unrecognized_dialect_is_a_400() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .post_json("/v1/chat/completions", &serde_json::json!({"prompt": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "validation");
}

#[tokio::test]
async fn unknown_model_family_is_a_404() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .post_json(
            "/v1/chat/completions",
            &serde_json::json!({
                "model": "my-custom-model",
                "messages": [{"role": "user", "content": "hi"}]
            }),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "unsupported_model");
}

#[tokio::test]
async fn missing_bearer_token_is_a_401() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .json(&serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn wrong_bearer_token_is_a_401() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .bearer_auth("not-the-key")
        .json(&serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn models_listing_is_available() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server.get("/v1/models").send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["object"], "list");
    assert!(!body["data"].as_array().unwrap().is_empty());
}
