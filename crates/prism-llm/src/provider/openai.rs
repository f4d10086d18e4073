//! OpenAI chat-completions client

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use prism_config::OpenAiConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::convert::openai::chunk_from_openai;
use crate::error::GatewayError;
use crate::protocol::openai::{OpenAiRequest, OpenAiResponse, OpenAiStreamChunk, OpenAiStreamOptions};
use crate::stream::ChunkStream;
use crate::types::{ChatRequest, ChatResponse};

/// Default OpenAI API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTPS client for the OpenAI chat completions API
pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl OpenAiClient {
    /// Create from provider configuration
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (never happens).
    pub fn new(config: &OpenAiConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        Self {
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
        }
    }

    /// Chat completions endpoint URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    fn post(&self, wire_request: &OpenAiRequest) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(self.completions_url()).json(wire_request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        builder
    }

    /// One-shot completion
    pub async fn invoke(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        let wire_request: OpenAiRequest = request.into();

        let response = self
            .post(&wire_request)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(map_status_error(request, &response.status(), response.text().await.ok()));
        }

        let wire_response: OpenAiResponse = response.json().await.map_err(|e| GatewayError::Upstream {
            status: 502,
            message: format!("failed to parse OpenAI response: {e}"),
        })?;

        Ok(wire_response.into())
    }

    /// Streaming completion as canonical chunks
    pub async fn stream(&self, request: &ChatRequest) -> Result<ChunkStream, GatewayError> {
        let mut wire_request: OpenAiRequest = request.into();
        wire_request.stream = Some(true);
        wire_request.stream_options = Some(OpenAiStreamOptions { include_usage: true });

        let response = self
            .post(&wire_request)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(map_status_error(request, &response.status(), response.text().await.ok()));
        }

        let event_stream = response.bytes_stream().eventsource();

        let mapped = event_stream
            .map(|result| match result {
                Ok(event) => {
                    let data = event.data.trim().to_owned();
                    if data == "[DONE]" {
                        return Vec::new();
                    }
                    match serde_json::from_str::<OpenAiStreamChunk>(&data) {
                        Ok(chunk) => vec![Ok(chunk_from_openai(chunk))],
                        Err(e) => {
                            tracing::debug!(error = %e, data = %data, "skipping unparseable SSE frame");
                            Vec::new()
                        }
                    }
                }
                Err(e) => vec![Err(GatewayError::Upstream {
                    status: 502,
                    message: format!("stream error: {e}"),
                })],
            })
            .flat_map(futures_util::stream::iter);

        Ok(Box::pin(mapped))
    }
}

/// Map a reqwest transport failure
fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout("provider call".to_owned())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

/// Map an unsuccessful HTTP status from the provider
fn map_status_error(request: &ChatRequest, status: &reqwest::StatusCode, body: Option<String>) -> GatewayError {
    let message = body.unwrap_or_default();
    tracing::warn!(model = %request.model, status = %status, "OpenAI returned an error");

    match status.as_u16() {
        401 | 403 => GatewayError::Authorization(format!("OpenAI rejected the configured credential: {message}")),
        404 => GatewayError::UnsupportedModel {
            model: request.model.clone(),
        },
        429 => GatewayError::RateLimited,
        500..=599 => GatewayError::ServiceUnavailable(format!("OpenAI returned {status}")),
        other => GatewayError::Upstream {
            status: other,
            message,
        },
    }
}
