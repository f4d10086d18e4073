use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// OpenAI provider configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key for the OpenAI routing path
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override (tests and OpenAI-compatible backends)
    #[serde(default)]
    pub base_url: Option<Url>,
}

/// AWS Bedrock provider configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BedrockConfig {
    /// AWS region for Bedrock runtime calls
    pub region: String,
    /// How AWS credentials are obtained
    #[serde(default)]
    pub credentials: BedrockCredentials,
}

/// AWS credential source, resolved before any client is constructed
///
/// Mirrors the standard SDK options: explicit keys, a shared-config
/// profile, an assumed role, a web-identity token, or the ambient
/// default chain.
#[derive(Debug, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BedrockCredentials {
    /// Static access key pair, optionally with a session token
    Static {
        access_key_id: SecretString,
        secret_access_key: SecretString,
        #[serde(default)]
        session_token: Option<SecretString>,
    },
    /// Named profile from the shared AWS config files
    Profile { name: String },
    /// Role assumed via STS
    AssumedRole {
        role_arn: String,
        #[serde(default)]
        external_id: Option<String>,
        #[serde(default)]
        session_name: Option<String>,
        #[serde(default)]
        duration_secs: Option<u64>,
    },
    /// Web-identity token file exchanged for role credentials
    WebIdentity {
        token_file: String,
        role_arn: String,
    },
    /// Default provider chain (env, IMDS, ECS, ...)
    #[default]
    Ambient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Wrapper {
        credentials: BedrockCredentials,
    }

    #[test]
    fn ambient_mode_parses() {
        let wrapper: Wrapper = toml::from_str("credentials = { mode = \"ambient\" }").unwrap();
        assert!(matches!(wrapper.credentials, BedrockCredentials::Ambient));
    }

    #[test]
    fn static_mode_parses() {
        let wrapper: Wrapper = toml::from_str(
            r#"
[credentials]
mode = "static"
access_key_id = "AKIA..."
secret_access_key = "secret"
"#,
        )
        .unwrap();
        assert!(matches!(
            wrapper.credentials,
            BedrockCredentials::Static { session_token: None, .. }
        ));
    }

    #[test]
    fn assumed_role_mode_parses() {
        let wrapper: Wrapper = toml::from_str(
            r#"
[credentials]
mode = "assumed_role"
role_arn = "arn:aws:iam::123456789012:role/prism"
external_id = "xid"
"#,
        )
        .unwrap();
        let BedrockCredentials::AssumedRole {
            role_arn,
            external_id,
            session_name,
            duration_secs,
        } = wrapper.credentials
        else {
            panic!("expected assumed_role");
        };
        assert_eq!(role_arn, "arn:aws:iam::123456789012:role/prism");
        assert_eq!(external_id.as_deref(), Some("xid"));
        assert!(session_name.is_none());
        assert!(duration_secs.is_none());
    }
}
