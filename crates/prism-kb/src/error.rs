use http::StatusCode;
use prism_core::HttpError;
use thiserror::Error;

/// Errors from knowledge-base operations
#[derive(Debug, Error)]
pub enum KbError {
    /// The knowledge base does not exist
    #[error("knowledge base not found: {knowledge_base_id}")]
    NotFound { knowledge_base_id: String },

    /// IAM denied the KB operation
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Provider throttled the KB call
    #[error("knowledge base request throttled")]
    Throttled,

    /// Other provider-side failure
    #[error("knowledge base service error: {0}")]
    Service(String),

    /// Unexpected internal condition
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for KbError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AccessDenied(_) => StatusCode::FORBIDDEN,
            Self::Throttled => StatusCode::TOO_MANY_REQUESTS,
            Self::Service(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AccessDenied(_) => "authorization",
            Self::Throttled => "rate_limited",
            Self::Service(_) => "upstream",
            Self::Internal(_) => "internal",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}
