//! AWS Bedrock runtime client
//!
//! Raw `InvokeModel` / `InvokeModelWithResponseStream` transport. Bodies are
//! shaped and parsed by the model strategies; this client moves bytes.

use std::pin::Pin;

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::operation::invoke_model::InvokeModelError;
use aws_sdk_bedrockruntime::operation::invoke_model_with_response_stream::InvokeModelWithResponseStreamError;
use aws_sdk_bedrockruntime::types::ResponseStream;
use aws_smithy_types::Blob;
use futures_util::Stream;
use prism_config::BedrockConfig;

use crate::error::GatewayError;

/// Raw payloads from a Bedrock response stream
pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, GatewayError>> + Send>>;

/// Bedrock runtime transport
pub struct BedrockClient {
    client: Client,
}

impl BedrockClient {
    /// Create from provider configuration, resolving credentials first
    pub async fn new(config: &BedrockConfig) -> Self {
        let sdk_config = config.credentials.load_sdk_config(&config.region).await;
        Self {
            client: Client::new(&sdk_config),
        }
    }

    /// One-shot invoke; returns the raw response body
    pub async fn invoke(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, GatewayError> {
        let output = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| map_invoke_error(model_id, &e))?;

        Ok(output.body.into_inner())
    }

    /// Streaming invoke; yields each chunk's raw payload bytes
    pub async fn invoke_stream(&self, model_id: &str, body: Vec<u8>) -> Result<PayloadStream, GatewayError> {
        let output = self
            .client
            .invoke_model_with_response_stream()
            .model_id(model_id)
            .content_type("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| map_stream_invoke_error(model_id, &e))?;

        let receiver = output.body;

        let stream = futures_util::stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(Some(ResponseStream::Chunk(part))) => {
                        let Some(blob) = part.bytes else {
                            continue;
                        };
                        return Some((Ok(blob.into_inner()), receiver));
                    }
                    // Future event-stream variants are skipped
                    Ok(Some(_)) => continue,
                    Ok(None) => return None,
                    Err(e) => {
                        return Some((
                            Err(GatewayError::Upstream {
                                status: 502,
                                message: format!("Bedrock stream error: {e}"),
                            }),
                            receiver,
                        ));
                    }
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

/// Map an `InvokeModel` failure onto the gateway taxonomy
fn map_invoke_error<R>(
    model_id: &str,
    err: &aws_sdk_bedrockruntime::error::SdkError<InvokeModelError, R>,
) -> GatewayError {
    let Some(service) = err.as_service_error() else {
        return GatewayError::Transport(err.to_string());
    };

    if service.is_throttling_exception() || service.is_service_quota_exceeded_exception() {
        return GatewayError::RateLimited;
    }
    if service.is_access_denied_exception() {
        return GatewayError::Authorization(format!("Bedrock denied access to {model_id}"));
    }
    if service.is_resource_not_found_exception() {
        return GatewayError::UnsupportedModel {
            model: model_id.to_owned(),
        };
    }
    if service.is_service_unavailable_exception() || service.is_model_not_ready_exception() {
        return GatewayError::ServiceUnavailable(service.to_string());
    }
    if service.is_model_timeout_exception() {
        return GatewayError::Upstream {
            status: 408,
            message: service.to_string(),
        };
    }
    if service.is_validation_exception() {
        return GatewayError::Upstream {
            status: 400,
            message: service.to_string(),
        };
    }

    GatewayError::Upstream {
        status: 502,
        message: service.to_string(),
    }
}

/// Map an `InvokeModelWithResponseStream` establishment failure
fn map_stream_invoke_error<R>(
    model_id: &str,
    err: &aws_sdk_bedrockruntime::error::SdkError<InvokeModelWithResponseStreamError, R>,
) -> GatewayError {
    let Some(service) = err.as_service_error() else {
        return GatewayError::Transport(err.to_string());
    };

    if service.is_throttling_exception() || service.is_service_quota_exceeded_exception() {
        return GatewayError::RateLimited;
    }
    if service.is_access_denied_exception() {
        return GatewayError::Authorization(format!("Bedrock denied access to {model_id}"));
    }
    if service.is_resource_not_found_exception() {
        return GatewayError::UnsupportedModel {
            model: model_id.to_owned(),
        };
    }
    if service.is_service_unavailable_exception() || service.is_model_not_ready_exception() {
        return GatewayError::ServiceUnavailable(service.to_string());
    }
    if service.is_model_timeout_exception() {
        return GatewayError::Upstream {
            status: 408,
            message: service.to_string(),
        };
    }
    if service.is_validation_exception() {
        return GatewayError::Upstream {
            status: 400,
            message: service.to_string(),
        };
    }

    GatewayError::Upstream {
        status: 502,
        message: service.to_string(),
    }
}
