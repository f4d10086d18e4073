//! Embedded gateway server for tests

use std::net::SocketAddr;

use prism_config::Config;
use prism_server::{FilesBackend, Server};
use tokio_util::sync::CancellationToken;

use super::TEST_API_KEY;

/// Running gateway bound to an ephemeral port
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a gateway routing OpenAI traffic to `openai_base_url`
    ///
    /// Uses the in-memory files backend; no AWS credentials are touched.
    pub async fn start(openai_base_url: &str) -> anyhow::Result<Self> {
        let toml = format!(
            r#"
[server]
listen_address = "127.0.0.1:0"
api_key = "{TEST_API_KEY}"

[openai]
api_key = "sk-mock"
base_url = "{openai_base_url}"

[files]
bucket = "test-bucket"

[retry]
max_attempts = 1
"#
        );

        let config: Config = toml::from_str(&toml)?;
        config.validate()?;

        let server = Server::with_files_backend(config, FilesBackend::Memory).await?;
        let router = server.into_router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            client: reqwest::Client::new(),
        })
    }

    /// Absolute URL for a path on the gateway
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// POST JSON with the test bearer token
    pub fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .bearer_auth(TEST_API_KEY)
            .json(body)
    }

    /// GET with the test bearer token
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(TEST_API_KEY)
    }

    /// Raw client for unauthenticated requests
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
