//! Server assembly: routes, middleware, and lifecycle
//!
//! Initialization order: credentials → provider clients → gateway state →
//! HTTP handlers. Subsystems absent from the configuration simply do not
//! mount their routes.

mod auth;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use prism_config::{BedrockCredentials, Config};
use prism_files::{ExtractionLimits, FileContextService, FilesState, MemoryStore, S3Store};
use prism_kb::{KbState, KnowledgeBaseService};
use prism_llm::GatewayState;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

/// Storage backend selection for the files subsystem
pub enum FilesBackend {
    /// S3 bucket from configuration
    S3,
    /// In-memory store (tests, credential-free development)
    Memory,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if subsystem initialization fails
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_files_backend(config, FilesBackend::S3).await
    }

    /// Build the server choosing the files storage backend explicitly
    ///
    /// # Errors
    ///
    /// Returns an error if subsystem initialization fails
    pub async fn with_files_backend(config: Config, backend: FilesBackend) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address();

        let ambient = BedrockCredentials::default();
        let credentials = config
            .bedrock
            .as_ref()
            .map_or(&ambient, |bedrock| &bedrock.credentials);
        let default_region = config
            .bedrock
            .as_ref()
            .map_or("us-east-1", |bedrock| bedrock.region.as_str());

        // Files subsystem
        let mut files_routes = None;
        let mut files_service = None;
        if let Some(ref files_config) = config.files {
            let store: Arc<dyn prism_files::ArtifactStore> = match backend {
                FilesBackend::S3 => {
                    let region = files_config.region.as_deref().unwrap_or(default_region);
                    let sdk_config = credentials.load_sdk_config(region).await;
                    Arc::new(S3Store::new(
                        aws_sdk_s3::Client::new(&sdk_config),
                        files_config.bucket.clone(),
                    ))
                }
                FilesBackend::Memory => Arc::new(MemoryStore::new()),
            };

            files_service = Some(Arc::new(FileContextService::new(
                Arc::clone(&store),
                ExtractionLimits::default(),
                Duration::from_secs(files_config.fetch_timeout_secs),
            )));
            files_routes = Some(prism_files::files_router(FilesState {
                store,
                max_upload_bytes: files_config.max_upload_bytes,
            }));
        }

        // Knowledge-base subsystem
        let mut kb_routes = None;
        let mut kb_service = None;
        if let Some(ref kb_config) = config.knowledge_base {
            let region = kb_config.region.as_deref().unwrap_or(default_region);
            let sdk_config = credentials.load_sdk_config(region).await;
            let service = Arc::new(KnowledgeBaseService::new(&sdk_config));

            kb_service = Some(Arc::clone(&service));
            kb_routes = Some(prism_kb::kb_router(KbState {
                service,
                region: region.to_owned(),
            }));
        }

        // Gateway core
        let gateway = GatewayState::from_config(&config, files_service, kb_service).await;

        let mut app = Router::new()
            .route("/health", axum::routing::get(health::health_handler))
            .merge(prism_llm::chat_router(gateway));

        if let Some(files) = files_routes {
            app = app.merge(files);
        }
        if let Some(kb) = kb_routes {
            app = app.merge(kb);
        }

        // Bearer-key auth on /v1/*; /health stays public
        let api_key = config.server.api_key.clone();
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let api_key = api_key.clone();
            async move { auth::require_api_key(api_key, req, next).await }
        }));

        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Configured listen address
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for tests that manage the listener themselves.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve until the cancellation token fires
    ///
    /// # Errors
    ///
    /// Returns an error if binding the listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "prism listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
