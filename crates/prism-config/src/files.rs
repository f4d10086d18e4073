use serde::Deserialize;

/// File storage configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    /// Object-store bucket holding uploaded artifacts
    pub bucket: String,
    /// Region override for the object store; falls back to the Bedrock region
    #[serde(default)]
    pub region: Option<String>,
    /// Largest accepted upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Timeout for fetching one artifact during context injection
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

const fn default_fetch_timeout_secs() -> u64 {
    10
}
