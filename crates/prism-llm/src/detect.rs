//! Inbound request dialect detection
//!
//! Classifies a decoded JSON document by looking at a handful of
//! discriminating top-level keys. Rules are evaluated in priority order and
//! the first match wins; no schema validation happens here.

use serde_json::Value;

/// Recognized request dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages as sent to Bedrock
    BedrockClaude,
    /// Amazon Titan text generation
    BedrockTitan,
    /// No recognized shape
    Unknown,
}

/// Classify an inbound JSON payload
///
/// Priority order:
/// 1. `anthropic_version` present → `BedrockClaude`
/// 2. `inputText` present → `BedrockTitan`
/// 3. `model` present and `messages` is a list → `OpenAi`
/// 4. A bare `messages` list → `OpenAi` (ambiguous payloads default here)
///
/// Keys 1 and 2 never co-occur in valid input; if they do, 1 wins.
pub fn detect(payload: &Value) -> Dialect {
    let Some(map) = payload.as_object() else {
        return Dialect::Unknown;
    };

    if map.contains_key("anthropic_version") {
        return Dialect::BedrockClaude;
    }

    if map.contains_key("inputText") {
        return Dialect::BedrockTitan;
    }

    let has_message_list = map.get("messages").is_some_and(Value::is_array);

    if has_message_list && map.contains_key("model") {
        return Dialect::OpenAi;
    }

    if has_message_list {
        tracing::debug!("ambiguous request shape, defaulting to OpenAI dialect");
        return Dialect::OpenAi;
    }

    Dialect::Unknown
}
