use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if any section carries values the gateway cannot
    /// operate with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.api_key.expose_secret().is_empty() {
            anyhow::bail!("server.api_key must not be empty");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if self.retry.wait_min_seconds > self.retry.wait_max_seconds {
            anyhow::bail!("retry.wait_min_seconds must not exceed retry.wait_max_seconds");
        }

        if let Some(ref files) = self.files {
            if files.bucket.is_empty() {
                anyhow::bail!("files.bucket must not be empty");
            }
            if files.max_upload_bytes == 0 {
                anyhow::bail!("files.max_upload_bytes must be greater than 0");
            }
        }

        if let Some(ref kb) = self.knowledge_base {
            for (name, value) in [
                ("direct_rag_threshold", kb.direct_rag_threshold),
                ("augmentation_threshold", kb.augmentation_threshold),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    anyhow::bail!("knowledge_base.{name} must be between 0.0 and 1.0");
                }
            }
            if kb.augmentation_threshold > kb.direct_rag_threshold {
                anyhow::bail!(
                    "knowledge_base.augmentation_threshold must not exceed direct_rag_threshold"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn minimal_config_loads() {
        let file = write_config(
            r#"
[server]
api_key = "sk-test"
"#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.files.is_none());
    }

    #[test]
    fn empty_api_key_rejected() {
        let file = write_config(
            r#"
[server]
api_key = ""
"#,
        );
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn env_placeholder_expands() {
        temp_env::with_var("PRISM_CFG_KEY", Some("sk-env"), || {
            let file = write_config(
                r#"
[server]
api_key = "{{ env.PRISM_CFG_KEY }}"
"#,
            );
            let config = Config::load(file.path()).unwrap();
            assert_eq!(config.server.api_key.expose_secret(), "sk-env");
        });
    }

    #[test]
    fn inverted_retry_bounds_rejected() {
        let file = write_config(
            r#"
[server]
api_key = "sk-test"

[retry]
wait_min_seconds = 30
wait_max_seconds = 5
"#,
        );
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn kb_threshold_range_enforced() {
        let file = write_config(
            r#"
[server]
api_key = "sk-test"

[knowledge_base]
direct_rag_threshold = 1.5
"#,
        );
        assert!(Config::load(file.path()).is_err());
    }
}
