use serde::{Deserialize, Serialize};

use super::response::{FinishReason, Usage};

/// Incremental tool-call fragment inside a streaming delta
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Which tool call this fragment extends
    pub index: u32,
    /// Present only on the fragment that opens the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Present only on the fragment that opens the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Partial JSON of the argument object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Incremental content for one choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Set on the first chunk of a choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool-call fragments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

impl ChunkDelta {
    /// Whether the delta carries no payload at all
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.content.is_none() && self.tool_calls.is_none()
    }
}

/// Per-choice slice of a streaming chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Stable choice index
    pub index: u32,
    /// Incremental payload
    pub delta: ChunkDelta,
    /// Set exactly once, on the terminal chunk for this index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Canonical streaming chunk
///
/// The `id` is stable across all chunks of one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChunk {
    pub id: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
    /// Usage accounting, reported on a trailing chunk when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatChunk {
    /// A chunk carrying a single delta for choice `index`
    pub fn delta(id: &str, created: u64, model: &str, index: u32, delta: ChunkDelta) -> Self {
        Self {
            id: id.to_owned(),
            created,
            model: model.to_owned(),
            choices: vec![ChunkChoice {
                index,
                delta,
                finish_reason: None,
            }],
            usage: None,
        }
    }

    /// The terminal chunk for choice `index`
    pub fn finish(id: &str, created: u64, model: &str, index: u32, reason: FinishReason) -> Self {
        Self {
            id: id.to_owned(),
            created,
            model: model.to_owned(),
            choices: vec![ChunkChoice {
                index,
                delta: ChunkDelta::default(),
                finish_reason: Some(reason),
            }],
            usage: None,
        }
    }

    /// A trailing chunk reporting usage only
    pub fn usage(id: &str, created: u64, model: &str, usage: Usage) -> Self {
        Self {
            id: id.to_owned(),
            created,
            model: model.to_owned(),
            choices: Vec::new(),
            usage: Some(usage),
        }
    }
}
