//! Knowledge-base retrieval (RAG) support
//!
//! Two paths: direct retrieve-and-generate through the provider's KB API,
//! and context augmentation where retrieved snippets are injected into the
//! prompt before normal routing. A keyword detector scores retrieval intent
//! to pick between them.

pub mod detector;
mod error;
mod routes;
mod service;
mod types;

pub use error::KbError;
pub use routes::{KbState, kb_router, model_arn};
pub use service::KnowledgeBaseService;
pub use types::{Citation, GeneratedAnswer, KnowledgeBaseSummary, RetrievedSnippet};
