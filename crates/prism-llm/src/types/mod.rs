//! Canonical, dialect-neutral chat types
//!
//! Every dialect adapter converts to and from these. Pure values, no I/O.

mod message;
mod request;
mod response;
mod stream;
mod tool;

pub use message::{Content, ContentBlock, Message, Role, ToolCall};
pub use request::{ChatRequest, CitationFormat, GenerationParams, RetrievalConfig};
pub use response::{AssistantMessage, ChatResponse, Choice, FinishReason, Usage};
pub use stream::{ChatChunk, ChunkChoice, ChunkDelta, ToolCallDelta};
pub use tool::{ToolChoice, ToolDefinition};
