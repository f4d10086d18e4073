use serde::Deserialize;

/// Provider retry policy knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff wait
    #[serde(default = "default_wait_min_seconds")]
    pub wait_min_seconds: u64,
    /// Backoff ceiling
    #[serde(default = "default_wait_max_seconds")]
    pub wait_max_seconds: u64,
    /// Per-attempt provider call timeout
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            wait_min_seconds: default_wait_min_seconds(),
            wait_max_seconds: default_wait_max_seconds(),
            provider_timeout_secs: default_provider_timeout_secs(),
        }
    }
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_wait_min_seconds() -> u64 {
    1
}

const fn default_wait_max_seconds() -> u64 {
    10
}

const fn default_provider_timeout_secs() -> u64 {
    120
}
