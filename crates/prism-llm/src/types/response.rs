use serde::{Deserialize, Serialize};

use super::message::ToolCall;

/// Why a choice stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
}

impl FinishReason {
    /// OpenAI wire string
    pub const fn as_openai(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool_calls",
            Self::ContentFilter => "content_filter",
            Self::Error => "error",
        }
    }

    /// Parse an OpenAI wire string
    pub fn from_openai(s: &str) -> Option<Self> {
        match s {
            "stop" => Some(Self::Stop),
            "length" => Some(Self::Length),
            "tool_calls" => Some(Self::ToolCalls),
            "content_filter" => Some(Self::ContentFilter),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Map an Anthropic `stop_reason`
    pub fn from_anthropic(s: &str) -> Option<Self> {
        match s {
            "end_turn" | "stop_sequence" => Some(Self::Stop),
            "max_tokens" => Some(Self::Length),
            "tool_use" => Some(Self::ToolCalls),
            "content_filtered" => Some(Self::ContentFilter),
            _ => None,
        }
    }

    /// Anthropic `stop_reason` wire string
    pub const fn as_anthropic(self) -> &'static str {
        match self {
            Self::Stop => "end_turn",
            Self::Length => "max_tokens",
            Self::ToolCalls => "tool_use",
            Self::ContentFilter => "content_filtered",
            Self::Error => "end_turn",
        }
    }

    /// Map a Titan `completionReason`; anything unrecognized is an error
    pub fn from_titan(s: &str) -> Self {
        match s {
            "FINISH" => Self::Stop,
            "LENGTH" => Self::Length,
            "CONTENT_FILTERED" => Self::ContentFilter,
            _ => Self::Error,
        }
    }

    /// Titan `completionReason` wire string
    pub const fn as_titan(self) -> &'static str {
        match self {
            Self::Stop | Self::ToolCalls => "FINISH",
            Self::Length => "LENGTH",
            Self::ContentFilter => "CONTENT_FILTERED",
            Self::Error => "ERROR",
        }
    }
}

/// Assistant message inside a response choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Always "assistant"
    pub role: String,
    /// Text content, absent for pure tool-call turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls requested by the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// One completion alternative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Stable index of this alternative
    pub index: u32,
    /// The generated message
    pub message: AssistantMessage,
    /// Always populated on non-streaming responses
    pub finish_reason: Option<FinishReason>,
}

/// Token accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Canonical chat response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Response identifier, stable across all chunks of one response
    pub id: String,
    /// Unix timestamp of creation
    pub created: u64,
    /// Model that produced the response
    pub model: String,
    /// At least one choice
    pub choices: Vec<Choice>,
    /// Token usage when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anthropic_stop_reasons_map_per_contract() {
        assert_eq!(FinishReason::from_anthropic("end_turn"), Some(FinishReason::Stop));
        assert_eq!(FinishReason::from_anthropic("stop_sequence"), Some(FinishReason::Stop));
        assert_eq!(FinishReason::from_anthropic("max_tokens"), Some(FinishReason::Length));
        assert_eq!(FinishReason::from_anthropic("tool_use"), Some(FinishReason::ToolCalls));
        assert_eq!(
            FinishReason::from_anthropic("content_filtered"),
            Some(FinishReason::ContentFilter)
        );
        assert_eq!(FinishReason::from_anthropic("bogus"), None);
    }

    #[test]
    fn titan_completion_reasons_map_per_contract() {
        assert_eq!(FinishReason::from_titan("FINISH"), FinishReason::Stop);
        assert_eq!(FinishReason::from_titan("LENGTH"), FinishReason::Length);
        assert_eq!(FinishReason::from_titan("CONTENT_FILTERED"), FinishReason::ContentFilter);
        assert_eq!(FinishReason::from_titan("SOMETHING_NEW"), FinishReason::Error);
    }
}
