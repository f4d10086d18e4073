//! Configuration for the Prism gateway
//!
//! Loaded from a TOML file with `{{ env.VAR }}` placeholder expansion, so
//! secrets like `SERVER_API_KEY` and `OPENAI_API_KEY` stay in the
//! environment while the file documents the shape.

mod aws;
mod defaults;
mod env;
mod files;
mod knowledge_base;
mod loader;
mod providers;
mod retry;
mod server;
mod telemetry;

use serde::Deserialize;

pub use defaults::FamilyDefaults;
pub use env::expand_env;
pub use files::FilesConfig;
pub use knowledge_base::KnowledgeBaseConfig;
pub use providers::{BedrockConfig, BedrockCredentials, OpenAiConfig};
pub use retry::RetryConfig;
pub use server::ServerConfig;
pub use telemetry::{LogLevel, TelemetryConfig};

/// Top-level gateway configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server settings, including the required API key
    pub server: ServerConfig,
    /// Logging settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// AWS Bedrock provider settings
    #[serde(default)]
    pub bedrock: Option<BedrockConfig>,
    /// File storage settings; absent disables the files subsystem
    #[serde(default)]
    pub files: Option<FilesConfig>,
    /// Knowledge-base settings; absent disables KB routing
    #[serde(default)]
    pub knowledge_base: Option<KnowledgeBaseConfig>,
    /// Per-family defaults applied when requests omit tuning values
    #[serde(default)]
    pub defaults: FamilyDefaults,
    /// Provider retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}
