use std::path::PathBuf;

use clap::Parser;

/// Prism chat-completions gateway
#[derive(Debug, Parser)]
#[command(name = "prism", about = "Provider-agnostic chat-completions gateway")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "prism.toml", env = "PRISM_CONFIG")]
    pub config: PathBuf,
}
