//! Anthropic-on-Bedrock strategy

use prism_config::FamilyDefaults;

use super::{ModelStrategy, StreamEventParser, StreamMeta};
use crate::convert::anthropic::{AnthropicStreamState, request_to_anthropic, response_from_anthropic};
use crate::error::GatewayError;
use crate::protocol::anthropic::{AnthropicResponse, AnthropicStreamEvent};
use crate::types::{ChatChunk, ChatRequest, ChatResponse};

/// Strategy for `anthropic.*` model ids
pub struct AnthropicStrategy;

impl ModelStrategy for AnthropicStrategy {
    fn shape_request(&self, request: &ChatRequest, defaults: &FamilyDefaults) -> Result<Vec<u8>, GatewayError> {
        let body = request_to_anthropic(request, defaults.anthropic_max_tokens);
        serde_json::to_vec(&body)
            .map_err(|e| GatewayError::Internal(anyhow::anyhow!("failed to serialize invoke body: {e}")))
    }

    fn parse_response(
        &self,
        body: &[u8],
        request: &ChatRequest,
        _response_id: &str,
        created: u64,
    ) -> Result<ChatResponse, GatewayError> {
        let wire: AnthropicResponse = serde_json::from_slice(body).map_err(|e| GatewayError::Upstream {
            status: 502,
            message: format!("malformed Anthropic response: {e}"),
        })?;
        Ok(response_from_anthropic(wire, &request.model, created))
    }

    fn stream_parser(&self, meta: StreamMeta) -> Box<dyn StreamEventParser> {
        Box::new(AnthropicStreamParser {
            meta,
            state: AnthropicStreamState::new(),
        })
    }
}

struct AnthropicStreamParser {
    meta: StreamMeta,
    state: AnthropicStreamState,
}

impl StreamEventParser for AnthropicStreamParser {
    fn parse_event(&mut self, payload: &[u8]) -> Result<Vec<ChatChunk>, GatewayError> {
        let event: AnthropicStreamEvent = serde_json::from_slice(payload).map_err(|e| GatewayError::Upstream {
            status: 502,
            message: format!("malformed Anthropic stream event: {e}"),
        })?;
        Ok(self.state.chunks_for_event(
            &event,
            &self.meta.response_id,
            self.meta.created,
            &self.meta.model,
        ))
    }
}
