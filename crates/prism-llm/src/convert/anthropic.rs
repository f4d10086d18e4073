//! Conversion between canonical types and the Anthropic (Bedrock) wire format

use crate::protocol::anthropic::{
    AnthropicContent, AnthropicContentBlock, AnthropicImageSource, AnthropicMessage, AnthropicMessageDelta,
    AnthropicRequest, AnthropicResponse, AnthropicResponseBlock, AnthropicStreamContentBlock, AnthropicStreamDelta,
    AnthropicStreamEvent, AnthropicStreamMessage, AnthropicTool, AnthropicToolChoice, AnthropicUsage,
};
use crate::types::{
    AssistantMessage, ChatChunk, ChatRequest, ChatResponse, Choice, ChunkDelta, Content, ContentBlock, FinishReason,
    GenerationParams, Message, Role, ToolCall, ToolCallDelta, ToolChoice, ToolDefinition, Usage,
};

/// Wire version stamped on every Bedrock invoke body
pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

// -- Inbound: Anthropic wire format -> canonical --

impl From<AnthropicRequest> for ChatRequest {
    fn from(req: AnthropicRequest) -> Self {
        let mut messages: Vec<Message> = Vec::new();

        // The top-level system prompt becomes a leading system message
        if let Some(system) = req.system {
            messages.push(Message::text(Role::System, system));
        }

        for msg in req.messages {
            messages.push(anthropic_message_to_canonical(msg));
        }

        Self {
            model: req.model.unwrap_or_default(),
            messages,
            params: GenerationParams {
                temperature: req.temperature,
                top_p: req.top_p,
                max_tokens: Some(req.max_tokens),
                stop_sequences: req.stop_sequences,
            },
            tools: req.tools.map(|tools| tools.into_iter().map(Into::into).collect()),
            tool_choice: req.tool_choice.map(|tc| anthropic_tool_choice_to_canonical(&tc)),
            stream: req.stream.unwrap_or(false),
            file_ids: None,
            knowledge_base_id: None,
            auto_kb: false,
            retrieval_config: None,
            citation_format: None,
        }
    }
}

/// Convert one Anthropic message, lifting tool blocks into canonical fields
fn anthropic_message_to_canonical(msg: AnthropicMessage) -> Message {
    let role = match msg.role.as_str() {
        "assistant" => Role::Assistant,
        _ => Role::User,
    };

    match msg.content {
        AnthropicContent::Text(text) => Message {
            role,
            content: Content::Text(text),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
        AnthropicContent::Blocks(blocks) => {
            let mut parts = Vec::new();
            let mut tool_calls = Vec::new();
            let mut tool_result: Option<(String, String)> = None;

            for block in blocks {
                match block {
                    AnthropicContentBlock::Text { text } => {
                        parts.push(ContentBlock::Text { text });
                    }
                    AnthropicContentBlock::Image { source } => {
                        if source.source_type == "base64" {
                            parts.push(ContentBlock::Image {
                                media_type: source.media_type,
                                data: Some(source.data),
                                url: None,
                            });
                        } else {
                            parts.push(ContentBlock::Image {
                                media_type: source.media_type,
                                data: None,
                                url: Some(source.data),
                            });
                        }
                    }
                    AnthropicContentBlock::ToolUse { id, name, input } => {
                        tool_calls.push(ToolCall {
                            id,
                            name,
                            arguments: serde_json::to_string(&input).unwrap_or_else(|_| "{}".to_owned()),
                        });
                    }
                    AnthropicContentBlock::ToolResult { tool_use_id, content, .. } => {
                        tool_result = Some((tool_use_id, content.unwrap_or_default()));
                    }
                }
            }

            // A tool_result block turns the whole message into a tool message
            if let Some((tool_use_id, content)) = tool_result {
                return Message {
                    role: Role::Tool,
                    content: Content::Text(content),
                    name: None,
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id),
                };
            }

            let content = match parts.len() {
                0 => Content::Text(String::new()),
                1 => match parts.into_iter().next() {
                    Some(ContentBlock::Text { text }) => Content::Text(text),
                    Some(other) => Content::Blocks(vec![other]),
                    None => Content::Text(String::new()),
                },
                _ => Content::Blocks(parts),
            };

            Message {
                role,
                content,
                name: None,
                tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
                tool_call_id: None,
            }
        }
    }
}

impl From<AnthropicTool> for ToolDefinition {
    fn from(tool: AnthropicTool) -> Self {
        Self {
            name: tool.name,
            description: tool.description,
            input_schema: tool.input_schema,
        }
    }
}

fn anthropic_tool_choice_to_canonical(tc: &AnthropicToolChoice) -> ToolChoice {
    match tc.choice_type.as_str() {
        "any" => ToolChoice::Required,
        "tool" => tc
            .name
            .as_ref()
            .map_or(ToolChoice::Auto, |name| ToolChoice::Named { name: name.clone() }),
        _ => ToolChoice::Auto,
    }
}

// -- Outbound: canonical -> Anthropic invoke body --

/// Shape a canonical request into the Bedrock invoke body
///
/// Leading system content lands in the top-level `system` slot.
/// `max_tokens` is required on the wire; `default_max_tokens` fills the gap.
pub fn request_to_anthropic(req: &ChatRequest, default_max_tokens: u32) -> AnthropicRequest {
    let mut system_parts: Vec<String> = Vec::new();
    let mut messages = Vec::new();

    for msg in &req.messages {
        match msg.role {
            Role::System => system_parts.push(msg.content.as_text()),
            _ => messages.push(canonical_message_to_anthropic(msg)),
        }
    }

    let tools = req.tools.as_ref().map(|tools| {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    });

    AnthropicRequest {
        model: None,
        anthropic_version: Some(ANTHROPIC_VERSION.to_owned()),
        max_tokens: req.params.max_tokens.unwrap_or(default_max_tokens),
        system: if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        },
        messages,
        temperature: req.params.temperature,
        top_p: req.params.top_p,
        stop_sequences: req.params.stop_sequences.clone(),
        // Streaming on Bedrock is selected by the RPC, not the body
        stream: None,
        tools,
        tool_choice: req.tool_choice.as_ref().map(canonical_tool_choice_to_anthropic),
    }
}

fn canonical_message_to_anthropic(msg: &Message) -> AnthropicMessage {
    // Tool results travel as user messages holding a tool_result block
    if msg.role == Role::Tool
        && let Some(tool_call_id) = &msg.tool_call_id
    {
        return AnthropicMessage {
            role: "user".to_owned(),
            content: AnthropicContent::Blocks(vec![AnthropicContentBlock::ToolResult {
                tool_use_id: tool_call_id.clone(),
                content: Some(msg.content.as_text()),
                is_error: None,
            }]),
        };
    }

    let role = if msg.role == Role::Assistant { "assistant" } else { "user" };

    // Assistant tool calls become tool_use blocks
    if let Some(tool_calls) = &msg.tool_calls {
        let mut blocks = Vec::new();

        let text = msg.content.as_text();
        if !text.is_empty() {
            blocks.push(AnthropicContentBlock::Text { text });
        }

        for tc in tool_calls {
            let input = serde_json::from_str(&tc.arguments).unwrap_or_else(|_| serde_json::json!({}));
            blocks.push(AnthropicContentBlock::ToolUse {
                id: tc.id.clone(),
                name: tc.name.clone(),
                input,
            });
        }

        return AnthropicMessage {
            role: role.to_owned(),
            content: AnthropicContent::Blocks(blocks),
        };
    }

    let content = match &msg.content {
        Content::Text(text) => AnthropicContent::Text(text.clone()),
        Content::Blocks(blocks) => {
            let converted = blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => {
                        Some(AnthropicContentBlock::Text { text: text.clone() })
                    }
                    ContentBlock::Image { media_type, data, url } => {
                        if let Some(data) = data {
                            Some(AnthropicContentBlock::Image {
                                source: AnthropicImageSource {
                                    source_type: "base64".to_owned(),
                                    media_type: media_type.clone(),
                                    data: data.clone(),
                                },
                            })
                        } else {
                            url.as_ref().map(|url| AnthropicContentBlock::Image {
                                source: AnthropicImageSource {
                                    source_type: "url".to_owned(),
                                    media_type: None,
                                    data: url.clone(),
                                },
                            })
                        }
                    }
                    ContentBlock::ToolUse { id, name, input } => Some(AnthropicContentBlock::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    }),
                    ContentBlock::ToolResult { tool_use_id, content } => {
                        Some(AnthropicContentBlock::ToolResult {
                            tool_use_id: tool_use_id.clone(),
                            content: Some(content.clone()),
                            is_error: None,
                        })
                    }
                })
                .collect();
            AnthropicContent::Blocks(converted)
        }
    };

    AnthropicMessage {
        role: role.to_owned(),
        content,
    }
}

fn canonical_tool_choice_to_anthropic(choice: &ToolChoice) -> AnthropicToolChoice {
    match choice {
        // Anthropic has no "none" mode; both None and Auto map to auto
        ToolChoice::Auto | ToolChoice::None => AnthropicToolChoice {
            choice_type: "auto".to_owned(),
            name: None,
        },
        ToolChoice::Required => AnthropicToolChoice {
            choice_type: "any".to_owned(),
            name: None,
        },
        ToolChoice::Named { name } => AnthropicToolChoice {
            choice_type: "tool".to_owned(),
            name: Some(name.clone()),
        },
    }
}

// -- Responses --

/// Parse an Anthropic response body into canonical form
pub fn response_from_anthropic(resp: AnthropicResponse, model: &str, created: u64) -> ChatResponse {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in &resp.content {
        match block {
            AnthropicResponseBlock::Text { text: t } => text.push_str(t),
            AnthropicResponseBlock::ToolUse { id, name, input } => {
                tool_calls.push(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    arguments: serde_json::to_string(input).unwrap_or_else(|_| "{}".to_owned()),
                });
            }
        }
    }

    let finish_reason = resp
        .stop_reason
        .as_deref()
        .and_then(FinishReason::from_anthropic)
        .or(Some(FinishReason::Stop));

    let message = AssistantMessage {
        role: "assistant".to_owned(),
        content: if text.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(text)
        },
        tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
    };

    ChatResponse {
        id: resp.id,
        created,
        model: model.to_owned(),
        choices: vec![Choice {
            index: 0,
            message,
            finish_reason,
        }],
        usage: Some(Usage {
            prompt_tokens: resp.usage.input_tokens,
            completion_tokens: resp.usage.output_tokens,
            total_tokens: resp.usage.input_tokens + resp.usage.output_tokens,
        }),
    }
}

/// Canonical response in the Anthropic egress shape
pub fn response_to_anthropic(resp: &ChatResponse) -> AnthropicResponse {
    let choice = resp.choices.first();

    let mut content = Vec::new();
    if let Some(c) = choice {
        if let Some(text) = &c.message.content
            && !text.is_empty()
        {
            content.push(AnthropicResponseBlock::Text { text: text.clone() });
        }
        for tc in c.message.tool_calls.iter().flatten() {
            let input = serde_json::from_str(&tc.arguments).unwrap_or_else(|_| serde_json::json!({}));
            content.push(AnthropicResponseBlock::ToolUse {
                id: tc.id.clone(),
                name: tc.name.clone(),
                input,
            });
        }
    }

    let stop_reason = choice
        .and_then(|c| c.finish_reason)
        .map(|fr| fr.as_anthropic().to_owned());

    let usage = resp.usage.unwrap_or_default();

    AnthropicResponse {
        id: resp.id.clone(),
        response_type: "message".to_owned(),
        role: "assistant".to_owned(),
        content,
        model: resp.model.clone(),
        stop_reason,
        stop_sequence: None,
        usage: AnthropicUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
    }
}

// -- Streaming: provider events -> canonical chunks --

/// State machine converting Anthropic stream events into canonical chunks
///
/// Tracks the tool call currently being streamed so fragments carry a
/// sequential tool-call index rather than Anthropic's shared content-block
/// index, and remembers whether the opening role chunk has been emitted.
#[derive(Debug, Default)]
pub struct AnthropicStreamState {
    role_sent: bool,
    current_tool_call_index: u32,
    next_tool_call_index: u32,
}

impl AnthropicStreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical chunks for one provider event; may be empty
    pub fn chunks_for_event(
        &mut self,
        event: &AnthropicStreamEvent,
        id: &str,
        created: u64,
        model: &str,
    ) -> Vec<ChatChunk> {
        match event {
            AnthropicStreamEvent::MessageStart { .. } => {
                self.role_sent = true;
                vec![ChatChunk::delta(
                    id,
                    created,
                    model,
                    0,
                    ChunkDelta {
                        role: Some("assistant".to_owned()),
                        content: None,
                        tool_calls: None,
                    },
                )]
            }

            AnthropicStreamEvent::Ping | AnthropicStreamEvent::ContentBlockStop { .. } => Vec::new(),

            AnthropicStreamEvent::ContentBlockStart { content_block, .. } => match content_block {
                AnthropicStreamContentBlock::Text { .. } => Vec::new(),
                AnthropicStreamContentBlock::ToolUse { id: tool_id, name, .. } => {
                    self.current_tool_call_index = self.next_tool_call_index;
                    self.next_tool_call_index += 1;
                    vec![self.delta_chunk(
                        id,
                        created,
                        model,
                        ChunkDelta {
                            role: None,
                            content: None,
                            tool_calls: Some(vec![ToolCallDelta {
                                index: self.current_tool_call_index,
                                id: Some(tool_id.clone()),
                                name: Some(name.clone()),
                                arguments: None,
                            }]),
                        },
                    )]
                }
            },

            AnthropicStreamEvent::ContentBlockDelta { delta, .. } => match delta {
                AnthropicStreamDelta::TextDelta { text } => {
                    vec![self.delta_chunk(
                        id,
                        created,
                        model,
                        ChunkDelta {
                            role: None,
                            content: Some(text.clone()),
                            tool_calls: None,
                        },
                    )]
                }
                AnthropicStreamDelta::InputJsonDelta { partial_json } => {
                    vec![self.delta_chunk(
                        id,
                        created,
                        model,
                        ChunkDelta {
                            role: None,
                            content: None,
                            tool_calls: Some(vec![ToolCallDelta {
                                index: self.current_tool_call_index,
                                id: None,
                                name: None,
                                arguments: Some(partial_json.clone()),
                            }]),
                        },
                    )]
                }
            },

            AnthropicStreamEvent::MessageDelta { delta, usage } => {
                let mut chunks = Vec::new();

                if let Some(reason) = delta.stop_reason.as_deref().and_then(FinishReason::from_anthropic) {
                    chunks.push(ChatChunk::finish(id, created, model, 0, reason));
                }

                if let Some(usage) = usage {
                    chunks.push(ChatChunk::usage(
                        id,
                        created,
                        model,
                        Usage {
                            prompt_tokens: usage.input_tokens,
                            completion_tokens: usage.output_tokens,
                            total_tokens: usage.input_tokens + usage.output_tokens,
                        },
                    ));
                }

                chunks
            }

            AnthropicStreamEvent::MessageStop => Vec::new(),
        }
    }

    /// A delta chunk, prefixing the assistant role if not yet emitted
    fn delta_chunk(&mut self, id: &str, created: u64, model: &str, mut delta: ChunkDelta) -> ChatChunk {
        if !self.role_sent {
            self.role_sent = true;
            delta.role = Some("assistant".to_owned());
        }
        ChatChunk::delta(id, created, model, 0, delta)
    }
}

// -- Streaming: canonical chunks -> Anthropic egress events --

/// Writer turning canonical chunks into Anthropic stream-event frames
#[derive(Debug, Default)]
pub struct AnthropicEventWriter {
    started: bool,
    block_open: bool,
    finished: bool,
}

impl AnthropicEventWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anthropic events for one canonical chunk, in emit order
    pub fn events_for_chunk(&mut self, chunk: &ChatChunk) -> Vec<AnthropicStreamEvent> {
        let mut events = Vec::new();

        if !self.started {
            self.started = true;
            events.push(AnthropicStreamEvent::MessageStart {
                message: AnthropicStreamMessage {
                    id: chunk.id.clone(),
                    message_type: "message".to_owned(),
                    role: "assistant".to_owned(),
                    model: chunk.model.clone(),
                    usage: None,
                },
            });
        }

        for choice in &chunk.choices {
            if let Some(content) = &choice.delta.content
                && !content.is_empty()
            {
                if !self.block_open {
                    self.block_open = true;
                    events.push(AnthropicStreamEvent::ContentBlockStart {
                        index: 0,
                        content_block: AnthropicStreamContentBlock::Text { text: String::new() },
                    });
                }
                events.push(AnthropicStreamEvent::ContentBlockDelta {
                    index: 0,
                    delta: AnthropicStreamDelta::TextDelta { text: content.clone() },
                });
            }

            for tc in choice.delta.tool_calls.iter().flatten() {
                if let Some(args) = &tc.arguments {
                    events.push(AnthropicStreamEvent::ContentBlockDelta {
                        index: tc.index,
                        delta: AnthropicStreamDelta::InputJsonDelta { partial_json: args.clone() },
                    });
                }
            }

            if let Some(reason) = choice.finish_reason {
                if self.block_open {
                    self.block_open = false;
                    events.push(AnthropicStreamEvent::ContentBlockStop { index: 0 });
                }
                self.finished = true;
                events.push(AnthropicStreamEvent::MessageDelta {
                    delta: AnthropicMessageDelta {
                        stop_reason: Some(reason.as_anthropic().to_owned()),
                        stop_sequence: None,
                    },
                    usage: None,
                });
            }
        }

        if let Some(usage) = chunk.usage {
            events.push(AnthropicStreamEvent::MessageDelta {
                delta: AnthropicMessageDelta::default(),
                usage: Some(AnthropicUsage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                }),
            });
        }

        events
    }

    /// Terminal event once the canonical stream ends
    pub fn finish(&mut self) -> Vec<AnthropicStreamEvent> {
        if self.started {
            vec![AnthropicStreamEvent::MessageStop]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_system() -> ChatRequest {
        ChatRequest {
            model: "anthropic.claude-3-haiku-20240307-v1:0".to_owned(),
            messages: vec![
                Message::text(Role::System, "be terse"),
                Message::text(Role::User, "Hello!"),
            ],
            params: GenerationParams {
                temperature: Some(0.5),
                top_p: None,
                max_tokens: None,
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
    fn system_message_lands_in_top_level_slot() {
        let wire = request_to_anthropic(&request_with_system(), 1024);
        assert_eq!(wire.system.as_deref(), Some("be terse"));
        assert_eq!(wire.messages.len(), 1);
        assert_eq!(wire.messages[0].role, "user");
    }

    #[test]
    fn missing_max_tokens_gets_family_default() {
        let wire = request_to_anthropic(&request_with_system(), 1024);
        assert_eq!(wire.max_tokens, 1024);

        let mut req = request_with_system();
        req.params.max_tokens = Some(42);
        assert_eq!(request_to_anthropic(&req, 1024).max_tokens, 42);
    }

    #[test]
    fn text_only_round_trip_preserves_request() {
        let original = request_with_system();
        let mut wire = request_to_anthropic(&original, 999);
        wire.model = Some(original.model.clone());
        let back: ChatRequest = wire.into();

        assert_eq!(back.model, original.model);
        assert_eq!(back.messages, original.messages);
        assert_eq!(back.params.temperature, original.params.temperature);
        // The wire requires max_tokens, so the default materializes
        assert_eq!(back.params.max_tokens, Some(999));
    }

    #[test]
    fn tool_use_blocks_become_canonical_tool_calls() {
        let wire: AnthropicRequest = serde_json::from_value(serde_json::json!({
            "model": "anthropic.claude-3-haiku-20240307-v1:0",
            "anthropic_version": "bedrock-2023-05-31",
            "max_tokens": 100,
            "messages": [
                {"role": "assistant", "content": [
                    {"type": "text", "text": "checking"},
                    {"type": "tool_use", "id": "tu_1", "name": "get_weather", "input": {"city": "SF"}}
                ]},
                {"role": "user", "content": [
                    {"type": "tool_result", "tool_use_id": "tu_1", "content": "17C"}
                ]}
            ]
        }))
        .unwrap();

        let req: ChatRequest = wire.into();
        let assistant = &req.messages[0];
        let calls = assistant.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].name, "get_weather");

        let tool = &req.messages[1];
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("tu_1"));
        assert_eq!(tool.content.as_text(), "17C");
    }

    #[test]
    fn stream_state_emits_role_first_and_single_finish() {
        let mut state = AnthropicStreamState::new();
        let events = [
            AnthropicStreamEvent::ContentBlockDelta {
                index: 0,
                delta: AnthropicStreamDelta::TextDelta { text: "Hi".into() },
            },
            AnthropicStreamEvent::ContentBlockDelta {
                index: 0,
                delta: AnthropicStreamDelta::TextDelta { text: " there".into() },
            },
            AnthropicStreamEvent::MessageDelta {
                delta: AnthropicMessageDelta {
                    stop_reason: Some("end_turn".into()),
                    stop_sequence: None,
                },
                usage: Some(AnthropicUsage {
                    input_tokens: 3,
                    output_tokens: 2,
                }),
            },
            AnthropicStreamEvent::MessageStop,
        ];

        let chunks: Vec<ChatChunk> = events
            .iter()
            .flat_map(|e| state.chunks_for_event(e, "msg_1", 1, "claude"))
            .collect();

        assert_eq!(chunks[0].choices[0].delta.role.as_deref(), Some("assistant"));

        let finishes: Vec<_> = chunks
            .iter()
            .flat_map(|c| &c.choices)
            .filter_map(|c| c.finish_reason)
            .collect();
        assert_eq!(finishes, vec![FinishReason::Stop]);

        let text: String = chunks
            .iter()
            .flat_map(|c| &c.choices)
            .filter_map(|c| c.delta.content.as_deref())
            .collect();
        assert_eq!(text, "Hi there");

        assert!(chunks.iter().any(|c| c.usage.is_some()));
    }

    #[test]
    fn stop_sequence_maps_to_stop() {
        let mut state = AnthropicStreamState::new();
        let chunks = state.chunks_for_event(
            &AnthropicStreamEvent::MessageDelta {
                delta: AnthropicMessageDelta {
                    stop_reason: Some("stop_sequence".into()),
                    stop_sequence: Some("END".into()),
                },
                usage: None,
            },
            "msg_1",
            1,
            "claude",
        );
        assert_eq!(chunks[0].choices[0].finish_reason, Some(FinishReason::Stop));
    }

    #[test]
    fn event_writer_opens_and_closes_message() {
        let mut writer = AnthropicEventWriter::new();
        let chunk = ChatChunk::delta(
            "msg_1",
            1,
            "claude",
            0,
            ChunkDelta {
                role: Some("assistant".into()),
                content: Some("Hi".into()),
                tool_calls: None,
            },
        );
        let events = writer.events_for_chunk(&chunk);
        assert!(matches!(events[0], AnthropicStreamEvent::MessageStart { .. }));
        assert!(matches!(events[1], AnthropicStreamEvent::ContentBlockStart { .. }));
        assert!(matches!(events[2], AnthropicStreamEvent::ContentBlockDelta { .. }));

        let finish = ChatChunk::finish("msg_1", 1, "claude", 0, FinishReason::Stop);
        let events = writer.events_for_chunk(&finish);
        assert!(matches!(events[0], AnthropicStreamEvent::ContentBlockStop { .. }));
        assert!(matches!(events[1], AnthropicStreamEvent::MessageDelta { .. }));

        assert!(matches!(writer.finish()[0], AnthropicStreamEvent::MessageStop));
    }
}
