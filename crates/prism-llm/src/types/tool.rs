use serde::{Deserialize, Serialize};

/// A tool the model may invoke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema describing the argument object
    pub input_schema: serde_json::Value,
}

/// How the model should select among the provided tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides whether to call a tool
    Auto,
    /// Tool calling disabled
    None,
    /// Model must call some tool
    Required,
    /// Model must call the named tool
    Named { name: String },
}
