//! Request orchestration
//!
//! One pipeline per request: validate → inject file context → (optional KB)
//! → route → invoke → hand back canonical values for egress conversion.
//! All shared state is wired once at startup and never mutated afterwards;
//! the routing cache is the only map that grows.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use prism_config::{Config, FamilyDefaults};
use prism_files::FileContextService;
use prism_kb::KnowledgeBaseService;

use crate::error::GatewayError;
use crate::provider::{BedrockClient, OpenAiClient};
use crate::retry::RetryPolicy;
use crate::routing::{Family, ModelRouter, Provider, Route};
use crate::stream::{ChunkStream, normalize_stream, response_to_chunks};
use crate::strategy::{AnthropicStrategy, ModelStrategy, StreamMeta, TitanStrategy};
use crate::types::{
    AssistantMessage, ChatRequest, ChatResponse, Choice, CitationFormat, Content, ContentBlock, FinishReason, Message,
    Role, Usage,
};

/// Knowledge-base runtime wiring
struct KbRuntime {
    service: Arc<KnowledgeBaseService>,
    region: String,
    default_id: Option<String>,
    direct_rag_threshold: f64,
    augmentation_threshold: f64,
    default_top_k: u32,
}

impl KbRuntime {
    /// The knowledge base a request resolves to, if any
    ///
    /// Explicit ids win unconditionally; auto-detection falls back to the
    /// configured default KB once the query scores above the augmentation
    /// threshold.
    fn effective_kb_id(&self, request: &ChatRequest, score: f64) -> Option<String> {
        if let Some(id) = &request.knowledge_base_id {
            return Some(id.clone());
        }
        if request.auto_kb && score >= self.augmentation_threshold {
            return self.default_id.clone();
        }
        None
    }
}

struct GatewayInner {
    router: ModelRouter,
    openai: OpenAiClient,
    bedrock: Option<BedrockClient>,
    anthropic: AnthropicStrategy,
    titan: TitanStrategy,
    retry: RetryPolicy,
    provider_timeout: Duration,
    defaults: FamilyDefaults,
    files: Option<Arc<FileContextService>>,
    kb: Option<KbRuntime>,
}

/// Shared gateway state behind the chat handlers
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<GatewayInner>,
}

impl GatewayState {
    /// Wire the gateway from configuration and optional subsystems
    pub async fn from_config(
        config: &Config,
        files: Option<Arc<FileContextService>>,
        kb: Option<Arc<KnowledgeBaseService>>,
    ) -> Self {
        let bedrock = match &config.bedrock {
            Some(bedrock_config) => Some(BedrockClient::new(bedrock_config).await),
            None => None,
        };

        let kb_runtime = match (&config.knowledge_base, kb) {
            (Some(kb_config), Some(service)) => Some(KbRuntime {
                service,
                region: kb_config
                    .region
                    .clone()
                    .or_else(|| config.bedrock.as_ref().map(|b| b.region.clone()))
                    .unwrap_or_else(|| "us-east-1".to_owned()),
                default_id: kb_config.default_id.clone(),
                direct_rag_threshold: kb_config.direct_rag_threshold,
                augmentation_threshold: kb_config.augmentation_threshold,
                default_top_k: kb_config.default_top_k,
            }),
            _ => None,
        };

        Self {
            inner: Arc::new(GatewayInner {
                router: ModelRouter::new(),
                openai: OpenAiClient::new(&config.openai),
                bedrock,
                anthropic: AnthropicStrategy,
                titan: TitanStrategy,
                retry: RetryPolicy::new(&config.retry),
                provider_timeout: Duration::from_secs(config.retry.provider_timeout_secs),
                defaults: config.defaults.clone(),
                files,
                kb: kb_runtime,
            }),
        }
    }

    /// Resolve a model id through the routing table
    pub fn route(&self, model_id: &str) -> Result<Route, GatewayError> {
        self.inner.router.route(model_id)
    }

    /// Non-streaming pipeline
    pub async fn complete(&self, mut request: ChatRequest) -> Result<ChatResponse, GatewayError> {
        validate(&request)?;
        self.inject_file_context(&mut request).await?;

        let route = self.inner.router.route(&request.model)?;

        if let Some(answer) = self.try_direct_rag(&request, &route).await? {
            return Ok(answer);
        }
        self.augment_with_kb(&mut request, &route).await?;

        self.invoke(&request, &route).await
    }

    /// Streaming pipeline; chunks arrive already canonical and normalized
    pub async fn complete_stream(&self, mut request: ChatRequest) -> Result<ChunkStream, GatewayError> {
        validate(&request)?;
        self.inject_file_context(&mut request).await?;

        let route = self.inner.router.route(&request.model)?;

        if let Some(answer) = self.try_direct_rag(&request, &route).await? {
            // Direct RAG answers are not produced incrementally; replay the
            // finished response as a minimal chunk sequence.
            let chunks = response_to_chunks(&answer);
            return Ok(Box::pin(futures_util::stream::iter(chunks.into_iter().map(Ok))));
        }
        self.augment_with_kb(&mut request, &route).await?;

        self.invoke_stream(&request, &route).await
    }

    // -- Providers --

    fn strategy(&self, family: Family) -> Result<&dyn ModelStrategy, GatewayError> {
        match family {
            Family::Anthropic => Ok(&self.inner.anthropic),
            Family::Titan => Ok(&self.inner.titan),
            Family::OpenAiChat => Err(GatewayError::Internal(anyhow::anyhow!(
                "OpenAI models do not use a Bedrock strategy"
            ))),
        }
    }

    fn bedrock(&self) -> Result<&BedrockClient, GatewayError> {
        self.inner.bedrock.as_ref().ok_or_else(|| {
            GatewayError::ServiceUnavailable("no Bedrock credentials are configured".to_owned())
        })
    }

    async fn invoke(&self, request: &ChatRequest, route: &Route) -> Result<ChatResponse, GatewayError> {
        let mut provider_request = request.clone();
        provider_request.model = route.provider_model_id.clone();
        let timeout = self.inner.provider_timeout;

        match route.provider {
            Provider::OpenAi => {
                self.inner
                    .retry
                    .run("openai.invoke", |_| async {
                        tokio::time::timeout(timeout, self.inner.openai.invoke(&provider_request))
                            .await
                            .map_err(|_| GatewayError::Timeout("provider call".to_owned()))?
                    })
                    .await
            }
            Provider::Bedrock => {
                let bedrock = self.bedrock()?;
                let strategy = self.strategy(route.family)?;
                let body = strategy.shape_request(&provider_request, &self.inner.defaults)?;
                let model_id = provider_request.model.clone();

                let raw = self
                    .inner
                    .retry
                    .run("bedrock.invoke", |_| {
                        let body = body.clone();
                        let model_id = model_id.clone();
                        async move {
                            tokio::time::timeout(timeout, bedrock.invoke(&model_id, body))
                                .await
                                .map_err(|_| GatewayError::Timeout("provider call".to_owned()))?
                        }
                    })
                    .await?;

                let (response_id, created) = response_identity();
                let mut response = strategy.parse_response(&raw, &provider_request, &response_id, created)?;
                // Echo the caller's model id, not the normalized provider id
                response.model = request.model.clone();
                Ok(response)
            }
        }
    }

    async fn invoke_stream(&self, request: &ChatRequest, route: &Route) -> Result<ChunkStream, GatewayError> {
        let mut provider_request = request.clone();
        provider_request.model = route.provider_model_id.clone();
        let timeout = self.inner.provider_timeout;
        let (response_id, created) = response_identity();

        match route.provider {
            Provider::OpenAi => {
                // Retry covers stream establishment only
                let upstream = self
                    .inner
                    .retry
                    .run("openai.stream", |_| async {
                        tokio::time::timeout(timeout, self.inner.openai.stream(&provider_request))
                            .await
                            .map_err(|_| GatewayError::Timeout("provider call".to_owned()))?
                    })
                    .await?;

                Ok(normalize_stream(upstream, response_id, created, request.model.clone()))
            }
            Provider::Bedrock => {
                let bedrock = self.bedrock()?;
                let strategy = self.strategy(route.family)?;
                let body = strategy.shape_request(&provider_request, &self.inner.defaults)?;
                let model_id = provider_request.model.clone();

                let payloads = self
                    .inner
                    .retry
                    .run("bedrock.stream", |_| {
                        let body = body.clone();
                        let model_id = model_id.clone();
                        async move {
                            tokio::time::timeout(timeout, bedrock.invoke_stream(&model_id, body))
                                .await
                                .map_err(|_| GatewayError::Timeout("provider call".to_owned()))?
                        }
                    })
                    .await?;

                let mut parser = strategy.stream_parser(StreamMeta {
                    response_id: response_id.clone(),
                    created,
                    model: request.model.clone(),
                });

                use futures_util::StreamExt;
                let chunks = payloads
                    .map(move |result| {
                        let items = match result {
                            Ok(bytes) => match parser.parse_event(&bytes) {
                                Ok(chunks) => chunks.into_iter().map(Ok).collect(),
                                Err(e) => vec![Err(e)],
                            },
                            Err(e) => vec![Err(e)],
                        };
                        futures_util::stream::iter(items)
                    })
                    .flatten();

                Ok(normalize_stream(
                    Box::pin(chunks),
                    response_id,
                    created,
                    request.model.clone(),
                ))
            }
        }
    }

    // -- File context --

    async fn inject_file_context(&self, request: &mut ChatRequest) -> Result<(), GatewayError> {
        let Some(file_ids) = request.file_ids.clone() else {
            return Ok(());
        };
        if file_ids.is_empty() {
            return Ok(());
        }

        let Some(files) = &self.inner.files else {
            return Err(GatewayError::Validation(
                "file_ids were provided but the files subsystem is not configured".to_owned(),
            ));
        };

        let preamble = files.build_context(&file_ids).await?;
        tracing::debug!(
            files = file_ids.len(),
            chars = preamble.len(),
            "injecting file context"
        );
        prepend_to_first_user_message(&mut request.messages, &preamble);
        Ok(())
    }

    // -- Knowledge bases --

    /// Direct retrieve-and-generate, when a resolved KB id and a
    /// sufficiently retrieval-shaped query call for it
    async fn try_direct_rag(
        &self,
        request: &ChatRequest,
        route: &Route,
    ) -> Result<Option<ChatResponse>, GatewayError> {
        let Some(kb) = &self.inner.kb else { return Ok(None) };
        // Direct RAG runs inside Bedrock; other providers fall back to
        // context augmentation.
        if route.provider != Provider::Bedrock {
            return Ok(None);
        }

        let Some(query) = request.last_user_text() else { return Ok(None) };
        let score = prism_kb::detector::retrieval_confidence(&query);
        let Some(kb_id) = kb.effective_kb_id(request, score) else {
            return Ok(None);
        };
        if score < kb.direct_rag_threshold {
            return Ok(None);
        }

        tracing::info!(knowledge_base_id = %kb_id, score, "routing through direct retrieve-and-generate");

        let model_arn = prism_kb::model_arn(&kb.region, &route.provider_model_id);
        let answer = match kb.service.retrieve_and_generate(&kb_id, &query, &model_arn).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "direct RAG failed, falling back to normal routing");
                return Ok(None);
            }
        };

        let (response_id, created) = response_identity();
        let text = render_answer(&answer, request.citation_format);

        Ok(Some(ChatResponse {
            id: response_id,
            created,
            model: request.model.clone(),
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".to_owned(),
                    content: Some(text),
                    tool_calls: None,
                },
                finish_reason: Some(FinishReason::Stop),
            }],
            usage: Some(Usage::default()),
        }))
    }

    /// Context augmentation: retrieve snippets and prepend them as context
    async fn augment_with_kb(&self, request: &mut ChatRequest, _route: &Route) -> Result<(), GatewayError> {
        let Some(kb) = &self.inner.kb else { return Ok(()) };
        let Some(query) = request.last_user_text() else { return Ok(()) };

        let score = prism_kb::detector::retrieval_confidence(&query);
        let Some(kb_id) = kb.effective_kb_id(request, score) else {
            return Ok(());
        };

        let top_k = request
            .retrieval_config
            .as_ref()
            .and_then(|c| c.top_k)
            .unwrap_or(kb.default_top_k);

        let snippets = match kb.service.retrieve(&kb_id, &query, top_k).await {
            Ok(snippets) => snippets,
            Err(e) => {
                // Explicit KB ids surface lookup failures; auto-detected
                // defaults degrade to normal routing
                if request.knowledge_base_id.is_some() && matches!(e, prism_kb::KbError::NotFound { .. }) {
                    return Err(e.into());
                }
                tracing::warn!(error = %e, "KB retrieval failed, continuing without augmentation");
                return Ok(());
            }
        };

        if snippets.is_empty() {
            return Ok(());
        }

        let mut block = String::from("=== KNOWLEDGE BASE CONTEXT ===\n");
        for (i, snippet) in snippets.iter().enumerate() {
            match &snippet.source {
                Some(source) => block.push_str(&format!("[{}] ({source}) {}\n", i + 1, snippet.text)),
                None => block.push_str(&format!("[{}] {}\n", i + 1, snippet.text)),
            }
        }
        block.push_str("==============================");

        tracing::debug!(knowledge_base_id = %kb_id, snippets = snippets.len(), "injecting KB context");
        prepend_to_first_user_message(&mut request.messages, &block);
        Ok(())
    }
}

/// Reject requests the pipeline cannot route
fn validate(request: &ChatRequest) -> Result<(), GatewayError> {
    if request.model.is_empty() {
        return Err(GatewayError::Validation(
            "could not determine a model id for routing".to_owned(),
        ));
    }

    if request.messages.is_empty() {
        return Err(GatewayError::Validation("messages must not be empty".to_owned()));
    }

    for id in request.file_ids.iter().flatten() {
        if !id.starts_with(prism_files::FILE_ID_PREFIX) {
            return Err(GatewayError::Validation(format!("invalid file id: {id}")));
        }
    }

    Ok(())
}

/// Prepend a context block to the first user message
///
/// The original message text follows on the next line(s). Without any user
/// message the block becomes a leading system message.
fn prepend_to_first_user_message(messages: &mut Vec<Message>, block: &str) {
    for message in messages.iter_mut() {
        if message.role != Role::User {
            continue;
        }

        message.content = match &message.content {
            Content::Text(text) => Content::Text(format!("{block}\n\n{text}")),
            Content::Blocks(blocks) => {
                let mut combined = Vec::with_capacity(blocks.len() + 1);
                combined.push(ContentBlock::Text {
                    text: format!("{block}\n\n"),
                });
                combined.extend(blocks.iter().cloned());
                Content::Blocks(combined)
            }
        };
        return;
    }

    messages.insert(0, Message::text(Role::System, block));
}

/// Render a generated answer with its citations
fn render_answer(answer: &prism_kb::GeneratedAnswer, format: Option<CitationFormat>) -> String {
    let sources: Vec<&str> = answer
        .citations
        .iter()
        .filter_map(|c| c.source.as_deref())
        .collect();

    if sources.is_empty() {
        return answer.text.clone();
    }

    match format.unwrap_or(CitationFormat::Inline) {
        CitationFormat::None => answer.text.clone(),
        CitationFormat::Inline => format!("{} (Sources: {})", answer.text, sources.join(", ")),
        CitationFormat::Footnote => {
            let footnotes: Vec<String> = sources
                .iter()
                .enumerate()
                .map(|(i, s)| format!("[{}] {s}", i + 1))
                .collect();
            format!("{}\n\n{}", answer.text, footnotes.join("\n"))
        }
    }
}

/// Fresh response id and creation timestamp
fn response_identity() -> (String, u64) {
    let created = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    (format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()), created)
}
