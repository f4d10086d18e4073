//! Conversion between canonical types and the Amazon Titan wire format
//!
//! Titan has no role model, so outbound conversion flattens the whole
//! conversation into one prompt string with `User: ` / `Bot: ` prefixes and
//! a trailing `Bot:` cue for the model to continue.

use crate::protocol::titan::{TitanRequest, TitanResponse, TitanResult, TitanStreamChunk, TitanTextGenerationConfig};
use crate::types::{
    AssistantMessage, ChatChunk, ChatRequest, ChatResponse, Choice, ChunkDelta, FinishReason, GenerationParams,
    Message, Role, Usage,
};

// -- Inbound: Titan wire format -> canonical --

impl From<TitanRequest> for ChatRequest {
    fn from(req: TitanRequest) -> Self {
        let config = req.text_generation_config.unwrap_or_default();

        Self {
            model: req.model.unwrap_or_default(),
            messages: vec![Message::text(Role::User, req.input_text)],
            params: GenerationParams {
                temperature: config.temperature,
                top_p: config.top_p,
                max_tokens: config.max_token_count,
                stop_sequences: config.stop_sequences,
            },
            tools: None,
            tool_choice: None,
            stream: req.stream.unwrap_or(false),
            file_ids: None,
            knowledge_base_id: None,
            auto_kb: false,
            retrieval_config: None,
            citation_format: None,
        }
    }
}

// -- Outbound: canonical -> Titan invoke body --

/// Flatten canonical messages into Titan's single `inputText` prompt
///
/// System content is prepended as a `System: ` preamble. Tool-role messages
/// have no native Titan representation and are rendered as plain text.
pub fn flatten_messages(messages: &[Message]) -> String {
    let mut parts: Vec<String> = Vec::new();

    for msg in messages {
        if msg.role == Role::System {
            parts.push(format!("System: {}", msg.content.as_text()));
        }
    }

    for msg in messages {
        let line = match msg.role {
            Role::System => continue,
            Role::User => format!("User: {}", msg.content.as_text()),
            Role::Assistant => format!("Bot: {}", msg.content.as_text()),
            Role::Tool => format!(
                "User (Tool Response - {}): {}",
                msg.name.as_deref().unwrap_or("unknown_tool"),
                msg.content.as_text()
            ),
        };
        parts.push(line);
    }

    // Trailing cue prompting the model to answer
    parts.push("Bot:".to_owned());

    parts.join("\n")
}

/// Shape a canonical request into the Titan invoke body
pub fn request_to_titan(req: &ChatRequest, default_max_tokens: u32) -> TitanRequest {
    TitanRequest {
        model: None,
        stream: None,
        input_text: flatten_messages(&req.messages),
        text_generation_config: Some(TitanTextGenerationConfig {
            max_token_count: Some(req.params.max_tokens.unwrap_or(default_max_tokens)),
            temperature: req.params.temperature,
            top_p: req.params.top_p,
            stop_sequences: req.params.stop_sequences.clone(),
        }),
    }
}

// -- Responses --

/// Parse a Titan response body into canonical form
///
/// Titan provides neither a response id nor a timestamp; the caller supplies
/// both so the values stay stable across streaming chunks.
pub fn response_from_titan(resp: &TitanResponse, id: &str, created: u64, model: &str) -> Option<ChatResponse> {
    let result = resp.results.first()?;

    let finish_reason = result
        .completion_reason
        .as_deref()
        .map_or(FinishReason::Stop, FinishReason::from_titan);

    let completion_tokens = result.token_count;
    let prompt_tokens = resp.input_text_token_count;

    Some(ChatResponse {
        id: id.to_owned(),
        created,
        model: model.to_owned(),
        choices: vec![Choice {
            index: 0,
            message: AssistantMessage {
                role: "assistant".to_owned(),
                content: Some(result.output_text.clone()),
                tool_calls: None,
            },
            finish_reason: Some(finish_reason),
        }],
        usage: Some(Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }),
    })
}

/// Canonical response in the Titan egress shape
pub fn response_to_titan(resp: &ChatResponse) -> TitanResponse {
    let usage = resp.usage.unwrap_or_default();

    TitanResponse {
        input_text_token_count: usage.prompt_tokens,
        results: resp
            .choices
            .iter()
            .map(|c| TitanResult {
                token_count: usage.completion_tokens,
                output_text: c.message.content.clone().unwrap_or_default(),
                completion_reason: c.finish_reason.map(|fr| fr.as_titan().to_owned()),
            })
            .collect(),
    }
}

// -- Streaming --

/// Canonical chunks for one Titan stream payload
///
/// `role_sent` tracks whether the opening assistant-role chunk has been
/// emitted for this stream.
pub fn chunks_from_titan(
    payload: &TitanStreamChunk,
    id: &str,
    created: u64,
    model: &str,
    role_sent: &mut bool,
) -> Vec<ChatChunk> {
    let mut chunks = Vec::new();

    if let Some(text) = &payload.output_text
        && !text.is_empty()
    {
        let mut delta = ChunkDelta {
            role: None,
            content: Some(text.clone()),
            tool_calls: None,
        };
        if !*role_sent {
            *role_sent = true;
            delta.role = Some("assistant".to_owned());
        }
        chunks.push(ChatChunk::delta(id, created, model, 0, delta));
    }

    if let Some(reason) = payload.completion_reason.as_deref() {
        chunks.push(ChatChunk::finish(
            id,
            created,
            model,
            0,
            FinishReason::from_titan(reason),
        ));

        if let Some(output_tokens) = payload.total_output_text_token_count {
            let input_tokens = payload.input_text_token_count.unwrap_or(0);
            chunks.push(ChatChunk::usage(
                id,
                created,
                model,
                Usage {
                    prompt_tokens: input_tokens,
                    completion_tokens: output_tokens,
                    total_tokens: input_tokens + output_tokens,
                },
            ));
        }
    }

    chunks
}

/// Canonical chunk in the Titan egress shape
pub fn chunk_to_titan(chunk: &ChatChunk) -> TitanStreamChunk {
    let choice = chunk.choices.first();

    TitanStreamChunk {
        output_text: choice.and_then(|c| c.delta.content.clone()),
        index: choice.map(|c| c.index),
        total_output_text_token_count: chunk.usage.map(|u| u.completion_tokens),
        input_text_token_count: chunk.usage.map(|u| u.prompt_tokens),
        completion_reason: choice
            .and_then(|c| c.finish_reason)
            .map(|fr| fr.as_titan().to_owned()),
    }
}
