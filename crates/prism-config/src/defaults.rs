use serde::Deserialize;

/// Per-model-family defaults applied when a request omits `max_tokens`
///
/// Anthropic models require the field on the wire, so a default is always
/// substituted; Titan needs `maxTokenCount` for the same reason.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyDefaults {
    #[serde(default = "default_anthropic_max_tokens")]
    pub anthropic_max_tokens: u32,
    #[serde(default = "default_titan_max_tokens")]
    pub titan_max_tokens: u32,
}

impl Default for FamilyDefaults {
    fn default() -> Self {
        Self {
            anthropic_max_tokens: default_anthropic_max_tokens(),
            titan_max_tokens: default_titan_max_tokens(),
        }
    }
}

const fn default_anthropic_max_tokens() -> u32 {
    1024
}

const fn default_titan_max_tokens() -> u32 {
    512
}
