//! Shared test harness: an embedded gateway in front of a mock OpenAI backend

pub mod mock_openai;
pub mod server;

/// API key every harness server is configured with
pub const TEST_API_KEY: &str = "test-key";
