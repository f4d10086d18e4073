//! Amazon Titan text-generation wire format

use serde::{Deserialize, Serialize};

// -- Request types --

/// Titan invoke body
///
/// Titan has no role model: the whole conversation is one `inputText`
/// prompt. On ingress a `model` field rides alongside for routing; it is
/// omitted on the Bedrock wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Gateway extension: Titan itself has no streaming flag in the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(rename = "inputText")]
    pub input_text: String,
    #[serde(
        rename = "textGenerationConfig",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub text_generation_config: Option<TitanTextGenerationConfig>,
}

/// Generation knobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitanTextGenerationConfig {
    #[serde(rename = "maxTokenCount", default, skip_serializing_if = "Option::is_none")]
    pub max_token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "topP", default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(rename = "stopSequences", default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

// -- Response types --

/// Titan invoke response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitanResponse {
    #[serde(rename = "inputTextTokenCount", default)]
    pub input_text_token_count: u32,
    pub results: Vec<TitanResult>,
}

/// One generation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitanResult {
    #[serde(rename = "tokenCount", default)]
    pub token_count: u32,
    #[serde(rename = "outputText")]
    pub output_text: String,
    #[serde(rename = "completionReason", default)]
    pub completion_reason: Option<String>,
}

// -- Streaming types --

/// Chunk payload from a Titan response stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitanStreamChunk {
    #[serde(rename = "outputText", default, skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(
        rename = "totalOutputTextTokenCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_output_text_token_count: Option<u32>,
    #[serde(
        rename = "inputTextTokenCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub input_text_token_count: Option<u32>,
    #[serde(rename = "completionReason", default, skip_serializing_if = "Option::is_none")]
    pub completion_reason: Option<String>,
}
