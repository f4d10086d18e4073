//! Axum handlers for the unified chat-completions endpoint
//!
//! Inbound payloads are dialect-detected and canonicalized; outbound
//! responses and stream chunks are converted into the caller's requested
//! `target_format` (default OpenAI). Streams use `text/event-stream`
//! framing terminated by a literal `data: [DONE]`.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::StreamExt;
use prism_core::HttpError;
use serde::Deserialize;

use crate::convert::anthropic::{AnthropicEventWriter, response_to_anthropic};
use crate::convert::openai::{chunk_to_openai, response_to_openai};
use crate::convert::titan::{chunk_to_titan, response_to_titan};
use crate::detect::{Dialect, detect};
use crate::error::GatewayError;
use crate::protocol::anthropic::{AnthropicRequest, AnthropicStreamEvent};
use crate::protocol::openai::{OpenAiModel, OpenAiModelList, OpenAiRequest};
use crate::protocol::titan::TitanRequest;
use crate::routing::ModelRouter;
use crate::state::GatewayState;
use crate::stream::ChunkStream;
use crate::types::{ChatChunk, ChatRequest, ChatResponse};

/// Response dialect selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFormat {
    #[default]
    OpenAi,
    BedrockClaude,
    BedrockTitan,
}

impl TargetFormat {
    /// Parse the `target_format` query value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(Self::OpenAi),
            "bedrock_claude" => Some(Self::BedrockClaude),
            "bedrock_titan" => Some(Self::BedrockTitan),
            _ => None,
        }
    }

    /// Default egress dialect: the dialect the request arrived in
    ///
    /// Format is preserved across conversion unless the caller overrides it
    /// with an explicit `target_format`.
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::BedrockClaude => Self::BedrockClaude,
            Dialect::BedrockTitan => Self::BedrockTitan,
            Dialect::OpenAi | Dialect::Unknown => Self::OpenAi,
        }
    }
}

/// Build the chat router
pub fn chat_router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/chat/completions", routing::post(chat_completions))
        .route("/v1/chat/completions/health", routing::get(chat_health))
        .route("/v1/models", routing::get(list_models))
        .with_state(state)
}

/// Query parameters on `POST /v1/chat/completions`
#[derive(Debug, Deserialize)]
struct ChatQuery {
    #[serde(default)]
    target_format: Option<String>,
}

/// Handle `POST /v1/chat/completions` for every recognized dialect
async fn chat_completions(
    State(state): State<GatewayState>,
    Query(query): Query<ChatQuery>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    // Invalid target formats fail before any provider call
    let explicit_target = match query.target_format.as_deref() {
        None => None,
        Some(raw) => match TargetFormat::parse(raw) {
            Some(target) => Some(target),
            None => {
                return error_response(&GatewayError::Validation(format!(
                    "unknown target_format: {raw} (expected openai, bedrock_claude, or bedrock_titan)"
                )));
            }
        },
    };

    let (dialect, request) = match canonicalize(&payload) {
        Ok(converted) => converted,
        Err(e) => return error_response(&e),
    };
    let target = explicit_target.unwrap_or_else(|| TargetFormat::for_dialect(dialect));

    if request.stream {
        match state.complete_stream(request).await {
            Ok(chunks) => stream_response(chunks, target),
            Err(e) => error_response(&e),
        }
    } else {
        match state.complete(request).await {
            Ok(response) => egress_response(&response, target),
            Err(e) => error_response(&e),
        }
    }
}

/// Detect the inbound dialect and convert to the canonical request
///
/// Either yields a complete canonical request or a typed error — never a
/// half-converted form.
fn canonicalize(payload: &serde_json::Value) -> Result<(Dialect, ChatRequest), GatewayError> {
    let dialect = detect(payload);
    tracing::debug!(?dialect, "detected request dialect");

    let request = match dialect {
        Dialect::OpenAi => serde_json::from_value::<OpenAiRequest>(payload.clone())
            .map(Into::into)
            .map_err(|e| GatewayError::Validation(format!("invalid OpenAI request: {e}")))?,
        Dialect::BedrockClaude => serde_json::from_value::<AnthropicRequest>(payload.clone())
            .map(Into::into)
            .map_err(|e| GatewayError::Validation(format!("invalid Bedrock Claude request: {e}")))?,
        Dialect::BedrockTitan => serde_json::from_value::<TitanRequest>(payload.clone())
            .map(Into::into)
            .map_err(|e| GatewayError::Validation(format!("invalid Bedrock Titan request: {e}")))?,
        Dialect::Unknown => {
            return Err(GatewayError::Validation(
                "unrecognized request format; expected OpenAI, Bedrock Claude, or Bedrock Titan".to_owned(),
            ));
        }
    };

    Ok((dialect, request))
}

/// Render a canonical response in the requested dialect
fn egress_response(response: &ChatResponse, target: TargetFormat) -> Response {
    match target {
        TargetFormat::OpenAi => Json(response_to_openai(response)).into_response(),
        TargetFormat::BedrockClaude => Json(response_to_anthropic(response)).into_response(),
        TargetFormat::BedrockTitan => Json(response_to_titan(response)).into_response(),
    }
}

/// Per-target stream frame writer
enum FrameWriter {
    OpenAi,
    Claude(AnthropicEventWriter),
    Titan,
}

impl FrameWriter {
    fn new(target: TargetFormat) -> Self {
        match target {
            TargetFormat::OpenAi => Self::OpenAi,
            TargetFormat::BedrockClaude => Self::Claude(AnthropicEventWriter::new()),
            TargetFormat::BedrockTitan => Self::Titan,
        }
    }

    /// Data frames for one canonical chunk
    fn frames_for_chunk(&mut self, chunk: &ChatChunk) -> Vec<Event> {
        match self {
            Self::OpenAi => vec![json_frame(&chunk_to_openai(chunk))],
            Self::Titan => vec![json_frame(&chunk_to_titan(chunk))],
            Self::Claude(writer) => writer
                .events_for_chunk(chunk)
                .iter()
                .map(|event: &AnthropicStreamEvent| json_frame(event))
                .collect(),
        }
    }

    /// Closing frames once the canonical stream ends; always ends in `[DONE]`
    fn tail(&mut self) -> Vec<Event> {
        let mut frames = Vec::new();
        if let Self::Claude(writer) = self {
            frames.extend(writer.finish().iter().map(|event| json_frame(event)));
        }
        frames.push(Event::default().data("[DONE]"));
        frames
    }
}

/// A `data: <json>` frame
fn json_frame<T: serde::Serialize>(value: &T) -> Event {
    Event::default().data(serde_json::to_string(value).unwrap_or_default())
}

/// An in-band error frame, delivered before `[DONE]`
fn error_frame(error: &GatewayError) -> Event {
    let body = serde_json::json!({
        "error": {
            "type": error.error_type(),
            "message": error.client_message(),
        }
    });
    Event::default().data(body.to_string())
}

/// Build the SSE response for a canonical chunk stream
fn stream_response(chunks: ChunkStream, target: TargetFormat) -> Response {
    struct EgressState {
        chunks: ChunkStream,
        writer: FrameWriter,
        done: bool,
    }

    let state = EgressState {
        chunks,
        writer: FrameWriter::new(target),
        done: false,
    };

    let frames = futures_util::stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        match state.chunks.next().await {
            Some(Ok(chunk)) => Some((state.writer.frames_for_chunk(&chunk), state)),
            Some(Err(e)) => {
                // Mid-stream errors become a final error frame, then [DONE]
                tracing::warn!(error = %e, "stream failed mid-flight");
                state.done = true;
                let mut frames = vec![error_frame(&e)];
                frames.extend(state.writer.tail());
                Some((frames, state))
            }
            None => {
                state.done = true;
                Some((state.writer.tail(), state))
            }
        }
    })
    .flat_map(futures_util::stream::iter)
    .map(Ok::<Event, std::convert::Infallible>);

    Sse::new(frames).keep_alive(KeepAlive::default()).into_response()
}

/// Handle `GET /v1/chat/completions/health`
async fn chat_health() -> Response {
    Json(serde_json::json!({
        "status": "healthy",
        "supported_input_formats": ["openai", "bedrock_claude", "bedrock_titan"],
        "model_routing": "enabled",
        "streaming_support": "enabled",
    }))
    .into_response()
}

/// Handle `GET /v1/models`
async fn list_models() -> Response {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let data = ModelRouter::known_models()
        .iter()
        .map(|id| OpenAiModel {
            id: (*id).to_owned(),
            object: "model".to_owned(),
            created: now,
            owned_by: "prism".to_owned(),
        })
        .collect();

    Json(OpenAiModelList {
        object: "list".to_owned(),
        data,
    })
    .into_response()
}

/// Render a gateway error in the shared `{error: {...}}` shape
fn error_response(error: &GatewayError) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": error.error_type(),
            "message": error.client_message(),
        }
    });
    (error.status_code(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_format_parses_known_values_only() {
        assert_eq!(TargetFormat::parse("openai"), Some(TargetFormat::OpenAi));
        assert_eq!(TargetFormat::parse("bedrock_claude"), Some(TargetFormat::BedrockClaude));
        assert_eq!(TargetFormat::parse("bedrock_titan"), Some(TargetFormat::BedrockTitan));
        assert_eq!(TargetFormat::parse("claude"), None);
        assert_eq!(TargetFormat::parse(""), None);
    }

    #[test]
    fn canonicalize_rejects_unknown_shapes() {
        let err = canonicalize(&serde_json::json!({"prompt": "hi"})).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn canonicalize_openai_request() {
        let (dialect, request) = canonicalize(&serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "Hello!"}]
        }))
        .unwrap();
        assert_eq!(dialect, Dialect::OpenAi);
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.messages.len(), 1);
        assert!(!request.stream);
    }

    #[test]
    fn canonicalize_bedrock_claude_request() {
        let (dialect, request) = canonicalize(&serde_json::json!({
            "anthropic_version": "bedrock-2023-05-31",
            "model": "anthropic.claude-3-haiku-20240307-v1:0",
            "max_tokens": 1000,
            "system": "be brief",
            "messages": [{"role": "user", "content": "Hello!"}]
        }))
        .unwrap();
        assert_eq!(dialect, Dialect::BedrockClaude);
        assert_eq!(request.params.max_tokens, Some(1000));
        // System slot becomes a leading system message
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn canonicalize_titan_request() {
        let (dialect, request) = canonicalize(&serde_json::json!({
            "model": "amazon.titan-text-express-v1",
            "inputText": "User: Hello!\nBot:",
            "textGenerationConfig": {"maxTokenCount": 128, "temperature": 0.5}
        }))
        .unwrap();
        assert_eq!(dialect, Dialect::BedrockTitan);
        assert_eq!(request.params.max_tokens, Some(128));
        assert_eq!(request.messages[0].content.as_text(), "User: Hello!\nBot:");
    }

    #[test]
    fn default_egress_dialect_preserves_the_source_format() {
        assert_eq!(TargetFormat::for_dialect(Dialect::OpenAi), TargetFormat::OpenAi);
        assert_eq!(
            TargetFormat::for_dialect(Dialect::BedrockClaude),
            TargetFormat::BedrockClaude
        );
        assert_eq!(
            TargetFormat::for_dialect(Dialect::BedrockTitan),
            TargetFormat::BedrockTitan
        );
    }
}
