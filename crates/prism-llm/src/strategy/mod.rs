//! Per-model-family request shaping and response parsing
//!
//! A strategy owns everything model-specific about talking to Bedrock:
//! shaping the invoke body, parsing the one-shot response, and parsing
//! stream payloads into canonical chunks. The Bedrock client stays pure
//! transport. Adding a family means one new strategy and one routing-prefix
//! row.

mod anthropic;
mod titan;

pub use anthropic::AnthropicStrategy;
pub use titan::TitanStrategy;

use prism_config::FamilyDefaults;

use crate::error::GatewayError;
use crate::types::{ChatChunk, ChatRequest, ChatResponse};

/// Identity shared by every stream chunk of one response
#[derive(Debug, Clone)]
pub struct StreamMeta {
    pub response_id: String,
    pub created: u64,
    pub model: String,
}

/// Model-family behavior behind the Bedrock transport
pub trait ModelStrategy: Send + Sync {
    /// Serialize the canonical request into the family's invoke body
    fn shape_request(&self, request: &ChatRequest, defaults: &FamilyDefaults) -> Result<Vec<u8>, GatewayError>;

    /// Parse the family's one-shot response body into a canonical response
    fn parse_response(
        &self,
        body: &[u8],
        request: &ChatRequest,
        response_id: &str,
        created: u64,
    ) -> Result<ChatResponse, GatewayError>;

    /// Create a stateful parser for one response stream
    fn stream_parser(&self, meta: StreamMeta) -> Box<dyn StreamEventParser>;
}

/// Stateful parser for one provider event stream
///
/// Tracks whatever the family needs across events (role emission, tool-call
/// indices) so the produced canonical chunks honor the streaming contract:
/// role on the first chunk, exactly one terminal chunk per choice.
pub trait StreamEventParser: Send {
    /// Canonical chunks for one raw stream payload; may be empty
    fn parse_event(&mut self, payload: &[u8]) -> Result<Vec<ChatChunk>, GatewayError>;
}
