//! Mock OpenAI backend returning canned responses
//!
//! Implements just enough of the chat completions API for the gateway's
//! OpenAI provider: JSON responses, SSE streaming, and request capture so
//! tests can assert what the provider actually saw.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Mock backend handle
pub struct MockOpenAi {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    /// Bodies of every chat completion request received
    requests: Mutex<Vec<serde_json::Value>>,
    /// Canned response content
    content: String,
}

impl MockOpenAi {
    /// Start with the default canned response
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with_response("Hello from mock").await
    }

    /// Start with custom canned content
    pub async fn start_with_response(content: &str) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            requests: Mutex::new(Vec::new()),
            content: content.to_owned(),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL to configure as the gateway's OpenAI endpoint
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Body of the most recent chat completion request
    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.state.requests.lock().unwrap().last().cloned()
    }

    /// Number of chat completion requests received
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }
}

impl Drop for MockOpenAi {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Wire types --

#[derive(Debug, Serialize)]
struct StreamChunk {
    id: String,
    object: String,
    created: u64,
    model: String,
    choices: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<serde_json::Value>,
}

// -- Handler --

async fn handle_chat(
    State(state): State<Arc<MockState>>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    state.requests.lock().unwrap().push(body.clone());

    let model = body
        .get("model")
        .and_then(|m| m.as_str())
        .unwrap_or("mock-model")
        .to_owned();
    let streaming = body.get("stream").and_then(|s| s.as_bool()).unwrap_or(false);

    if streaming {
        return streaming_body(&state.content, &model);
    }

    Json(serde_json::json!({
        "id": "chatcmpl-mock-123",
        "object": "chat.completion",
        "created": 1_700_000_000u64,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": state.content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
    .into_response()
}

/// SSE body: role chunk, one chunk per word, finish chunk, usage, [DONE]
fn streaming_body(content: &str, model: &str) -> axum::response::Response {
    let id = "chatcmpl-mock-stream";
    let created = 1_700_000_000u64;
    let mut body = String::new();

    let mut push = |chunk: &StreamChunk| {
        body.push_str(&format!("data: {}\n\n", serde_json::to_string(chunk).unwrap()));
    };

    push(&StreamChunk {
        id: id.to_owned(),
        object: "chat.completion.chunk".to_owned(),
        created,
        model: model.to_owned(),
        choices: vec![serde_json::json!({
            "index": 0,
            "delta": {"role": "assistant", "content": ""},
            "finish_reason": null
        })],
        usage: None,
    });

    let words: Vec<&str> = content.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        let text = if i + 1 == words.len() {
            (*word).to_owned()
        } else {
            format!("{word} ")
        };
        push(&StreamChunk {
            id: id.to_owned(),
            object: "chat.completion.chunk".to_owned(),
            created,
            model: model.to_owned(),
            choices: vec![serde_json::json!({
                "index": 0,
                "delta": {"content": text},
                "finish_reason": null
            })],
            usage: None,
        });
    }

    push(&StreamChunk {
        id: id.to_owned(),
        object: "chat.completion.chunk".to_owned(),
        created,
        model: model.to_owned(),
        choices: vec![serde_json::json!({
            "index": 0,
            "delta": {},
            "finish_reason": "stop"
        })],
        usage: None,
    });

    push(&StreamChunk {
        id: id.to_owned(),
        object: "chat.completion.chunk".to_owned(),
        created,
        model: model.to_owned(),
        choices: vec![],
        usage: Some(serde_json::json!({
            "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15
        })),
    });

    body.push_str("data: [DONE]\n\n");

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
        body,
    )
        .into_response()
}
