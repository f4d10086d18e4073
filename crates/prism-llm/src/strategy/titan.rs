//! Titan-on-Bedrock strategy

use prism_config::FamilyDefaults;

use super::{ModelStrategy, StreamEventParser, StreamMeta};
use crate::convert::titan::{chunks_from_titan, request_to_titan, response_from_titan};
use crate::error::GatewayError;
use crate::protocol::titan::{TitanResponse, TitanStreamChunk};
use crate::types::{ChatChunk, ChatRequest, ChatResponse};

/// Strategy for `amazon.titan-*` model ids
pub struct TitanStrategy;

impl ModelStrategy for TitanStrategy {
    fn shape_request(&self, request: &ChatRequest, defaults: &FamilyDefaults) -> Result<Vec<u8>, GatewayError> {
        if request.tools.is_some() || request.tool_choice.is_some() {
            return Err(GatewayError::Validation(
                "Titan models do not support tools or tool_choice".to_owned(),
            ));
        }

        let body = request_to_titan(request, defaults.titan_max_tokens);
        serde_json::to_vec(&body)
            .map_err(|e| GatewayError::Internal(anyhow::anyhow!("failed to serialize invoke body: {e}")))
    }

    fn parse_response(
        &self,
        body: &[u8],
        request: &ChatRequest,
        response_id: &str,
        created: u64,
    ) -> Result<ChatResponse, GatewayError> {
        let wire: TitanResponse = serde_json::from_slice(body).map_err(|e| GatewayError::Upstream {
            status: 502,
            message: format!("malformed Titan response: {e}"),
        })?;

        response_from_titan(&wire, response_id, created, &request.model).ok_or(GatewayError::Upstream {
            status: 502,
            message: "Titan response contained no results".to_owned(),
        })
    }

    fn stream_parser(&self, meta: StreamMeta) -> Box<dyn StreamEventParser> {
        Box::new(TitanStreamParser { meta, role_sent: false })
    }
}

struct TitanStreamParser {
    meta: StreamMeta,
    role_sent: bool,
}

impl StreamEventParser for TitanStreamParser {
    fn parse_event(&mut self, payload: &[u8]) -> Result<Vec<ChatChunk>, GatewayError> {
        let chunk: TitanStreamChunk = serde_json::from_slice(payload).map_err(|e| GatewayError::Upstream {
            status: 502,
            message: format!("malformed Titan stream chunk: {e}"),
        })?;
        Ok(chunks_from_titan(
            &chunk,
            &self.meta.response_id,
            self.meta.created,
            &self.meta.model,
            &mut self.role_sent,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GenerationParams, Message, Role, ToolDefinition};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "amazon.titan-text-express-v1".to_owned(),
            messages: vec![
                Message::text(Role::System, "be brief"),
                Message::text(Role::User, "Hello!"),
            ],
            params: GenerationParams::default(),
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
    fn shaped_body_flattens_conversation() {
        let body = TitanStrategy
            .shape_request(&request(), &FamilyDefaults::default())
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let input_text = value["inputText"].as_str().unwrap();
        assert!(input_text.starts_with("System: be brief"));
        assert!(input_text.ends_with("Bot:"));
        assert_eq!(value["textGenerationConfig"]["maxTokenCount"], 512);
    }

    #[test]
    fn tools_are_rejected() {
        let mut req = request();
        req.tools = Some(vec![ToolDefinition {
            name: "t".into(),
            description: None,
            input_schema: serde_json::json!({}),
        }]);
        let err = TitanStrategy
            .shape_request(&req, &FamilyDefaults::default())
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn stream_parser_skips_empty_chunks() {
        let mut parser = TitanStrategy.stream_parser(StreamMeta {
            response_id: "titan-1".to_owned(),
            created: 1,
            model: "amazon.titan-text-express-v1".to_owned(),
        });

        let empty = parser.parse_event(b"{}").unwrap();
        assert!(empty.is_empty());

        let chunks = parser
            .parse_event(br#"{"outputText": "Hi", "index": 0}"#)
            .unwrap();
        assert_eq!(chunks[0].choices[0].delta.role.as_deref(), Some("assistant"));
    }
}
