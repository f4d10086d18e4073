//! Thin provider clients
//!
//! Transport only: authentication, HTTP/RPC plumbing, and raw stream
//! consumption. All request shaping and response parsing is owned by the
//! dialect converts (OpenAI) or the model strategies (Bedrock).

mod bedrock;
mod openai;

pub use bedrock::BedrockClient;
pub use openai::OpenAiClient;
