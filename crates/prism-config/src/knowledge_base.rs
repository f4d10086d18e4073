use serde::Deserialize;

/// Knowledge-base (RAG) configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeBaseConfig {
    /// Region override for Bedrock Agent calls; falls back to the Bedrock region
    #[serde(default)]
    pub region: Option<String>,
    /// Knowledge base consulted when a request opts into auto-detection
    /// (`auto_kb`) without naming one
    #[serde(default)]
    pub default_id: Option<String>,
    /// Confidence at or above which retrieve-and-generate is used directly
    #[serde(default = "default_direct_rag_threshold")]
    pub direct_rag_threshold: f64,
    /// Confidence at or above which retrieved snippets augment the prompt
    #[serde(default = "default_augmentation_threshold")]
    pub augmentation_threshold: f64,
    /// Snippets retrieved per query when the request does not say otherwise
    #[serde(default = "default_top_k")]
    pub default_top_k: u32,
}

const fn default_direct_rag_threshold() -> f64 {
    0.7
}

const fn default_augmentation_threshold() -> f64 {
    0.4
}

const fn default_top_k() -> u32 {
    5
}
