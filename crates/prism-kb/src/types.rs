use serde::{Deserialize, Serialize};

/// A snippet retrieved from a knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedSnippet {
    /// Snippet text
    pub text: String,
    /// Source location (e.g. an S3 URI) when the KB reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Relevance score when the KB reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A citation attached to a generated answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Cited source location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Excerpt the answer relied on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

/// Result of a retrieve-and-generate call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    /// Generated answer text
    pub text: String,
    /// Citations backing the answer
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// Knowledge-base listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
}
