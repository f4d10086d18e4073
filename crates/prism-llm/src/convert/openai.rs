//! Conversion between canonical types and the OpenAI wire format

use crate::protocol::openai::{
    OpenAiChoice, OpenAiChoiceMessage, OpenAiContent, OpenAiContentPart, OpenAiFunction, OpenAiFunctionCall,
    OpenAiImageUrl, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiStop, OpenAiStreamChoice, OpenAiStreamChunk,
    OpenAiStreamDelta, OpenAiStreamFunctionCall, OpenAiStreamToolCall, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};
use crate::types::{
    AssistantMessage, ChatChunk, ChatRequest, ChatResponse, Choice, ChunkChoice, ChunkDelta, CitationFormat, Content,
    ContentBlock, FinishReason, GenerationParams, Message, RetrievalConfig, Role, ToolCall, ToolCallDelta, ToolChoice,
    ToolDefinition, Usage,
};

// -- Inbound: OpenAI wire format -> canonical --

impl From<OpenAiRequest> for ChatRequest {
    fn from(req: OpenAiRequest) -> Self {
        Self {
            model: req.model,
            messages: req.messages.into_iter().map(Into::into).collect(),
            params: GenerationParams {
                temperature: req.temperature,
                top_p: req.top_p,
                max_tokens: req.max_tokens,
                stop_sequences: req.stop.map(OpenAiStop::into_vec),
            },
            tools: req.tools.map(|tools| tools.into_iter().map(Into::into).collect()),
            tool_choice: req.tool_choice.as_ref().and_then(parse_tool_choice),
            stream: req.stream.unwrap_or(false),
            file_ids: req.file_ids,
            knowledge_base_id: req.knowledge_base_id,
            auto_kb: req.auto_kb.unwrap_or(false),
            retrieval_config: req
                .retrieval_config
                .and_then(|v| serde_json::from_value::<RetrievalConfig>(v).ok()),
            citation_format: req.citation_format.as_deref().and_then(|s| match s {
                "inline" => Some(CitationFormat::Inline),
                "footnote" => Some(CitationFormat::Footnote),
                "none" => Some(CitationFormat::None),
                _ => None,
            }),
        }
    }
}

impl From<OpenAiMessage> for Message {
    fn from(msg: OpenAiMessage) -> Self {
        let role = match msg.role.as_str() {
            "system" => Role::System,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            _ => Role::User,
        };

        let content = match msg.content {
            Some(OpenAiContent::Text(text)) => Content::Text(text),
            Some(OpenAiContent::Parts(parts)) => {
                Content::Blocks(parts.into_iter().map(Into::into).collect())
            }
            None => Content::Text(String::new()),
        };

        let tool_calls = msg
            .tool_calls
            .map(|calls| calls.into_iter().map(Into::into).collect());

        Self {
            role,
            content,
            name: msg.name,
            tool_calls,
            tool_call_id: msg.tool_call_id,
        }
    }
}

impl From<OpenAiContentPart> for ContentBlock {
    fn from(part: OpenAiContentPart) -> Self {
        match part {
            OpenAiContentPart::Text { text } => Self::Text { text },
            OpenAiContentPart::ImageUrl { image_url } => {
                // Inline data URIs become base64 blocks; anything else stays a URL
                if let Some(rest) = image_url.url.strip_prefix("data:")
                    && let Some((mime_and_encoding, data)) = rest.split_once(',')
                {
                    let media_type = mime_and_encoding
                        .strip_suffix(";base64")
                        .unwrap_or(mime_and_encoding);
                    Self::Image {
                        media_type: Some(media_type.to_owned()),
                        data: Some(data.to_owned()),
                        url: None,
                    }
                } else {
                    Self::Image {
                        media_type: None,
                        data: None,
                        url: Some(image_url.url),
                    }
                }
            }
        }
    }
}

impl From<OpenAiTool> for ToolDefinition {
    fn from(tool: OpenAiTool) -> Self {
        Self {
            name: tool.function.name,
            description: tool.function.description,
            input_schema: tool
                .function
                .parameters
                .unwrap_or_else(|| serde_json::json!({"type": "object"})),
        }
    }
}

impl From<OpenAiToolCall> for ToolCall {
    fn from(tc: OpenAiToolCall) -> Self {
        Self {
            id: tc.id,
            name: tc.function.name,
            arguments: tc.function.arguments,
        }
    }
}

/// Parse OpenAI's flexible `tool_choice` field
fn parse_tool_choice(value: &serde_json::Value) -> Option<ToolChoice> {
    match value {
        serde_json::Value::String(s) => match s.as_str() {
            "none" => Some(ToolChoice::None),
            "auto" => Some(ToolChoice::Auto),
            "required" => Some(ToolChoice::Required),
            _ => None,
        },
        serde_json::Value::Object(_) => value
            .pointer("/function/name")
            .and_then(|n| n.as_str())
            .map(|name| ToolChoice::Named { name: name.to_owned() }),
        _ => None,
    }
}

// -- Outbound: canonical -> OpenAI wire request --

impl From<&ChatRequest> for OpenAiRequest {
    fn from(req: &ChatRequest) -> Self {
        Self {
            model: req.model.clone(),
            messages: req.messages.iter().map(Into::into).collect(),
            temperature: req.params.temperature,
            top_p: req.params.top_p,
            max_tokens: req.params.max_tokens,
            stop: req.params.stop_sequences.clone().map(OpenAiStop::Many),
            stream: if req.stream { Some(true) } else { None },
            stream_options: None,
            tools: req.tools.as_ref().map(|tools| {
                tools
                    .iter()
                    .map(|t| OpenAiTool {
                        tool_type: "function".to_owned(),
                        function: OpenAiFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: Some(t.input_schema.clone()),
                        },
                    })
                    .collect()
            }),
            tool_choice: req.tool_choice.as_ref().map(tool_choice_to_value),
            // Gateway extensions never leave the gateway
            file_ids: None,
            knowledge_base_id: None,
            auto_kb: None,
            retrieval_config: None,
            citation_format: None,
        }
    }
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };

        let mut tool_calls: Vec<OpenAiToolCall> = msg
            .tool_calls
            .iter()
            .flatten()
            .map(|tc| OpenAiToolCall {
                id: tc.id.clone(),
                tool_type: "function".to_owned(),
                function: OpenAiFunctionCall {
                    name: tc.name.clone(),
                    arguments: tc.arguments.clone(),
                },
            })
            .collect();

        let content = match &msg.content {
            Content::Text(text) => Some(OpenAiContent::Text(text.clone())),
            Content::Blocks(blocks) => {
                let mut parts = Vec::new();
                for block in blocks {
                    match block {
                        ContentBlock::Text { text } => {
                            parts.push(OpenAiContentPart::Text { text: text.clone() });
                        }
                        ContentBlock::Image { media_type, data, url } => {
                            let url = url.clone().or_else(|| {
                                data.as_ref().map(|d| {
                                    let mime = media_type.as_deref().unwrap_or("image/png");
                                    format!("data:{mime};base64,{d}")
                                })
                            });
                            if let Some(url) = url {
                                parts.push(OpenAiContentPart::ImageUrl {
                                    image_url: OpenAiImageUrl { url, detail: None },
                                });
                            }
                        }
                        // Tool use travels as tool_calls on the OpenAI wire
                        ContentBlock::ToolUse { id, name, input } => {
                            tool_calls.push(OpenAiToolCall {
                                id: id.clone(),
                                tool_type: "function".to_owned(),
                                function: OpenAiFunctionCall {
                                    name: name.clone(),
                                    arguments: serde_json::to_string(input)
                                        .unwrap_or_else(|_| "{}".to_owned()),
                                },
                            });
                        }
                        ContentBlock::ToolResult { content, .. } => {
                            parts.push(OpenAiContentPart::Text { text: content.clone() });
                        }
                    }
                }
                Some(OpenAiContent::Parts(parts))
            }
        };

        Self {
            role: role.to_owned(),
            content,
            name: msg.name.clone(),
            tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

/// Canonical tool choice as an OpenAI JSON value
fn tool_choice_to_value(choice: &ToolChoice) -> serde_json::Value {
    match choice {
        ToolChoice::Auto => serde_json::Value::String("auto".to_owned()),
        ToolChoice::None => serde_json::Value::String("none".to_owned()),
        ToolChoice::Required => serde_json::Value::String("required".to_owned()),
        ToolChoice::Named { name } => serde_json::json!({
            "type": "function",
            "function": {"name": name}
        }),
    }
}

// -- Responses --

impl From<OpenAiResponse> for ChatResponse {
    fn from(resp: OpenAiResponse) -> Self {
        Self {
            id: resp.id,
            created: resp.created,
            model: resp.model,
            choices: resp
                .choices
                .into_iter()
                .map(|c| Choice {
                    index: c.index,
                    message: AssistantMessage {
                        role: c.message.role,
                        content: c.message.content,
                        tool_calls: c
                            .message
                            .tool_calls
                            .map(|calls| calls.into_iter().map(Into::into).collect()),
                    },
                    finish_reason: c.finish_reason.as_deref().and_then(parse_finish_reason),
                })
                .collect(),
            usage: resp.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        }
    }
}

/// Canonical response in the OpenAI egress shape
pub fn response_to_openai(resp: &ChatResponse) -> OpenAiResponse {
    OpenAiResponse {
        id: resp.id.clone(),
        object: "chat.completion".to_owned(),
        created: resp.created,
        model: resp.model.clone(),
        choices: resp
            .choices
            .iter()
            .map(|c| OpenAiChoice {
                index: c.index,
                message: OpenAiChoiceMessage {
                    role: c.message.role.clone(),
                    content: c.message.content.clone(),
                    tool_calls: c.message.tool_calls.as_ref().map(|calls| {
                        calls
                            .iter()
                            .map(|tc| OpenAiToolCall {
                                id: tc.id.clone(),
                                tool_type: "function".to_owned(),
                                function: OpenAiFunctionCall {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect()
                    }),
                },
                finish_reason: c.finish_reason.map(|fr| fr.as_openai().to_owned()),
            })
            .collect(),
        usage: resp.usage.map(|u| OpenAiUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    }
}

// -- Streaming --

/// Provider stream chunk into the canonical chunk shape
pub fn chunk_from_openai(chunk: OpenAiStreamChunk) -> ChatChunk {
    ChatChunk {
        id: chunk.id,
        created: chunk.created,
        model: chunk.model,
        choices: chunk
            .choices
            .into_iter()
            .map(|c| ChunkChoice {
                index: c.index,
                delta: ChunkDelta {
                    role: c.delta.role,
                    content: c.delta.content,
                    tool_calls: c.delta.tool_calls.map(|calls| {
                        calls
                            .into_iter()
                            .map(|tc| ToolCallDelta {
                                index: tc.index,
                                id: tc.id,
                                name: tc.function.as_ref().and_then(|f| f.name.clone()),
                                arguments: tc.function.and_then(|f| f.arguments),
                            })
                            .collect()
                    }),
                },
                finish_reason: c.finish_reason.as_deref().and_then(parse_finish_reason),
            })
            .collect(),
        usage: chunk.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    }
}

/// Canonical chunk in the OpenAI egress shape
pub fn chunk_to_openai(chunk: &ChatChunk) -> OpenAiStreamChunk {
    OpenAiStreamChunk {
        id: chunk.id.clone(),
        object: "chat.completion.chunk".to_owned(),
        created: chunk.created,
        model: chunk.model.clone(),
        choices: chunk
            .choices
            .iter()
            .map(|c| OpenAiStreamChoice {
                index: c.index,
                delta: OpenAiStreamDelta {
                    role: c.delta.role.clone(),
                    content: c.delta.content.clone(),
                    tool_calls: c.delta.tool_calls.as_ref().map(|calls| {
                        calls
                            .iter()
                            .map(|tc| OpenAiStreamToolCall {
                                index: tc.index,
                                id: tc.id.clone(),
                                tool_type: tc.id.as_ref().map(|_| "function".to_owned()),
                                function: Some(OpenAiStreamFunctionCall {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                }),
                            })
                            .collect()
                    }),
                },
                finish_reason: c.finish_reason.map(|fr| fr.as_openai().to_owned()),
            })
            .collect(),
        usage: chunk.usage.map(|u| OpenAiUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    }
}

/// Parse a finish-reason string from any OpenAI-compatible backend
fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    FinishReason::from_openai(s).or_else(|| FinishReason::from_anthropic(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".to_owned(),
            messages: vec![
                Message::text(Role::System, "be brief"),
                Message::text(Role::User, "Hello!"),
                Message::text(Role::Assistant, "Hi."),
                Message::text(Role::User, "Bye"),
            ],
            params: GenerationParams {
                temperature: Some(0.25),
                top_p: None,
                max_tokens: Some(128),
                stop_sequences: None,
            },
            tools: None,
            tool_choice: None,
            stream: false,
            file_ids: None,
            knowledge_base_id: None,
            auto_kb: false,
            retrieval_config: None,
            citation_format: None,
        }
    }

    #[test]
    fn text_only_round_trip_preserves_request() {
        let original = text_request();
        let wire: OpenAiRequest = (&original).into();
        let back: ChatRequest = wire.into();

        assert_eq!(back.model, original.model);
        assert_eq!(back.messages, original.messages);
        assert_eq!(back.params, original.params);
        assert_eq!(back.stream, original.stream);
    }

    #[test]
    fn string_stop_normalizes_to_list() {
        let wire: OpenAiRequest = serde_json::from_value(serde_json::json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "hi"}],
            "stop": "END"
        }))
        .unwrap();
        let req: ChatRequest = wire.into();
        assert_eq!(req.params.stop_sequences, Some(vec!["END".to_owned()]));
    }

    #[test]
    fn tool_choice_round_trips() {
        assert_eq!(
            parse_tool_choice(&serde_json::json!("required")),
            Some(ToolChoice::Required)
        );
        let named = ToolChoice::Named { name: "get_weather".to_owned() };
        assert_eq!(parse_tool_choice(&tool_choice_to_value(&named)), Some(named));
    }

    #[test]
    fn tool_role_message_survives_conversion() {
        let wire: OpenAiRequest = serde_json::from_value(serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "assistant", "content": null, "tool_calls": [
                    {"id": "call_1", "type": "function",
                     "function": {"name": "get_weather", "arguments": "{\"city\":\"SF\"}"}}
                ]},
                {"role": "tool", "content": "{\"temp\": 17}", "tool_call_id": "call_1"}
            ]
        }))
        .unwrap();
        let req: ChatRequest = wire.into();

        let assistant = &req.messages[0];
        assert_eq!(
            assistant.tool_calls.as_ref().unwrap()[0],
            ToolCall {
                id: "call_1".into(),
                name: "get_weather".into(),
                arguments: "{\"city\":\"SF\"}".into()
            }
        );
        let tool = &req.messages[1];
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn egress_response_carries_object_tag() {
        let resp = ChatResponse {
            id: "chatcmpl-1".into(),
            created: 1,
            model: "gpt-4o".into(),
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".into(),
                    content: Some("hi".into()),
                    tool_calls: None,
                },
                finish_reason: Some(FinishReason::Stop),
            }],
            usage: None,
        };
        let wire = response_to_openai(&resp);
        assert_eq!(wire.object, "chat.completion");
        assert_eq!(wire.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn chunk_round_trip_preserves_tool_fragments() {
        let chunk = ChatChunk {
            id: "chatcmpl-1".into(),
            created: 1,
            model: "gpt-4o".into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: None,
                    tool_calls: Some(vec![ToolCallDelta {
                        index: 0,
                        id: Some("call_1".into()),
                        name: Some("get_weather".into()),
                        arguments: None,
                    }]),
                },
                finish_reason: None,
            }],
            usage: None,
        };
        let back = chunk_from_openai(chunk_to_openai(&chunk));
        assert_eq!(back, chunk);
    }
}
