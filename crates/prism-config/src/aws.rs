//! AWS SDK configuration from the configured credential group
//!
//! Credentials resolve once, before any client is constructed; rotation
//! inside the SDK providers is transparent to the rest of the gateway.

use std::time::Duration;

use secrecy::ExposeSecret;

use crate::providers::BedrockCredentials;

impl BedrockCredentials {
    /// Build an SDK configuration for `region` using this credential source
    pub async fn load_sdk_config(&self, region: &str) -> aws_config::SdkConfig {
        let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_owned()));

        match self {
            Self::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => {
                let credentials = aws_credential_types::Credentials::new(
                    access_key_id.expose_secret(),
                    secret_access_key.expose_secret(),
                    session_token.as_ref().map(|t| t.expose_secret().to_owned()),
                    None,
                    "prism-config",
                );
                base.credentials_provider(credentials).load().await
            }

            Self::Profile { name } => {
                let provider = aws_config::profile::ProfileFileCredentialsProvider::builder()
                    .profile_name(name)
                    .build();
                base.credentials_provider(provider).load().await
            }

            Self::AssumedRole {
                role_arn,
                external_id,
                session_name,
                duration_secs,
            } => {
                let mut builder = aws_config::sts::AssumeRoleProvider::builder(role_arn)
                    .region(aws_config::Region::new(region.to_owned()))
                    .session_name(session_name.clone().unwrap_or_else(|| "prism-gateway".to_owned()));
                if let Some(external_id) = external_id {
                    builder = builder.external_id(external_id);
                }
                if let Some(secs) = duration_secs {
                    builder = builder.session_length(Duration::from_secs(*secs));
                }
                let provider = builder.build().await;
                base.credentials_provider(provider).load().await
            }

            Self::WebIdentity { token_file, role_arn } => {
                let provider = aws_config::web_identity_token::WebIdentityTokenCredentialsProvider::builder()
                    .static_configuration(aws_config::web_identity_token::StaticConfiguration {
                        web_identity_token_file: token_file.into(),
                        role_arn: role_arn.clone(),
                        session_name: "prism-gateway".to_owned(),
                    })
                    .build();
                base.credentials_provider(provider).load().await
            }

            Self::Ambient => base.load().await,
        }
    }
}
