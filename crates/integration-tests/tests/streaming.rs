//! Streaming flows over `text/event-stream`

mod harness;

use harness::mock_openai::MockOpenAi;
use harness::server::TestServer;

/// Collect the `data:` payloads of an SSE body
fn data_frames(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(ToOwned::to_owned)
        .collect()
}

#[tokio::test]
async fn streaming_emits_deltas_then_finish_then_done() {
    let mock = MockOpenAi::start_with_response("Bonjour tout le monde").await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .post_json(
            "/v1/chat/completions",
            &serde_json::json!({
                "model": "gpt-4o-mini",
                "stream": true,
                "messages": [{"role": "user", "content": "Hello!"}]
            }),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(content_type.starts_with("text/event-stream"));

    let body = response.text().await.unwrap();
    let frames = data_frames(&body);

    assert_eq!(frames.last().map(String::as_str), Some("[DONE]"));

    let chunks: Vec<serde_json::Value> = frames
        .iter()
        .filter(|f| f.as_str() != "[DONE]")
        .map(|f| serde_json::from_str(f).unwrap())
        .collect();

    // All chunks share one id
    let ids: std::collections::HashSet<&str> = chunks
        .iter()
        .filter_map(|c| c["id"].as_str())
        .collect();
    assert_eq!(ids.len(), 1);

    // Reassembled content equals the canned response
    let text: String = chunks
        .iter()
        .filter_map(|c| c["choices"][0]["delta"]["content"].as_str())
        .collect();
    assert_eq!(text, "Bonjour tout le monde");

    // Exactly one finish_reason, on a chunk without delta content
    let finishes: Vec<&serde_json::Value> = chunks
        .iter()
        .filter(|c| !c["choices"][0]["finish_reason"].is_null() && !c["choices"].as_array().unwrap().is_empty())
        .collect();
    assert_eq!(finishes.len(), 1);
    assert_eq!(finishes[0]["choices"][0]["finish_reason"], "stop");
    assert!(finishes[0]["choices"][0]["delta"]["content"].is_null());
}

#[tokio::test]
async fn streaming_matches_non_streaming_content() {
    let mock = MockOpenAi::start_with_response("same words either way").await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let request = serde_json::json!({
        "model": "gpt-4o-mini",
        "messages": [{"role": "user", "content": "Hello!"}]
    });

    let non_streaming: serde_json::Value = server
        .post_json("/v1/chat/completions", &request)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let expected = non_streaming["choices"][0]["message"]["content"].as_str().unwrap();

    let mut streaming_request = request.clone();
    streaming_request["stream"] = serde_json::json!(true);
    let body = server
        .post_json("/v1/chat/completions", &streaming_request)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let text: String = data_frames(&body)
        .iter()
        .filter(|f| f.as_str() != "[DONE]")
        .filter_map(|f| serde_json::from_str::<serde_json::Value>(f).ok())
        .filter_map(|c| c["choices"][0]["delta"]["content"].as_str().map(ToOwned::to_owned))
        .collect();

    assert_eq!(text, expected);
}

#[tokio::test]
async fn streaming_with_bedrock_claude_target_emits_anthropic_events() {
    let mock = MockOpenAi::start_with_response("Salut").await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let body = server
        .post_json(
            "/v1/chat/completions?target_format=bedrock_claude",
            &serde_json::json!({
                "model": "gpt-4o-mini",
                "stream": true,
                "messages": [{"role": "user", "content": "Hello!"}]
            }),
        )
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let frames = data_frames(&body);
    assert_eq!(frames.last().map(String::as_str), Some("[DONE]"));

    let events: Vec<serde_json::Value> = frames
        .iter()
        .filter(|f| f.as_str() != "[DONE]")
        .map(|f| serde_json::from_str(f).unwrap())
        .collect();

    assert_eq!(events.first().map(|e| e["type"].clone()), Some("message_start".into()));
    assert!(events.iter().any(|e| e["type"] == "content_block_delta"));
    assert!(events.iter().any(|e| {
        e["type"] == "message_delta" && e["delta"]["stop_reason"] == "end_turn"
    }));
    assert_eq!(
        events.last().map(|e| e["type"].clone()),
        Some("message_stop".into())
    );
}
