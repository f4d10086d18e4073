use http::StatusCode;
use prism_core::HttpError;
use thiserror::Error;

/// Errors surfaced by the gateway pipeline
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or unsupported input (unknown dialect, missing fields)
    #[error("invalid request: {0}")]
    Validation(String),

    /// Missing or mismatching server API key
    #[error("authentication required")]
    Authentication,

    /// Provider-side credential failure or IAM denial
    #[error("not authorized: {0}")]
    Authorization(String),

    /// No strategy matches the model identifier
    #[error("unsupported model: {model}")]
    UnsupportedModel { model: String },

    /// A referenced artifact does not exist
    #[error("file not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Transient transport failure reaching the provider
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider throttled the request (after retries)
    #[error("rate limited by provider")]
    RateLimited,

    /// Provider unavailable (after retries)
    #[error("provider unavailable: {0}")]
    ServiceUnavailable(String),

    /// Provider returned a structured error
    #[error("upstream error: {message}")]
    Upstream { status: u16, message: String },

    /// A per-phase timeout expired
    #[error("timed out during {0}")]
    Timeout(String),

    /// The caller disconnected mid-request
    #[error("request cancelled by client")]
    Cancelled,

    /// Unexpected internal condition
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl GatewayError {
    /// Whether the retry policy may re-attempt after this error
    ///
    /// Streaming requests consult this only while establishing the stream;
    /// once a chunk has been delivered errors are surfaced, not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimited | Self::ServiceUnavailable(_) => true,
            Self::Upstream { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl HttpError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::UnsupportedModel { .. } | Self::FileNotFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Transport(_) | Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            // The caller is gone; the status is only ever logged
            Self::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Validation(_) => "validation",
            Self::Authentication => "authentication",
            Self::Authorization(_) => "authorization",
            Self::UnsupportedModel { .. } => "unsupported_model",
            Self::FileNotFound { .. } => "file_not_found",
            Self::Transport(_) => "transport",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Upstream { .. } => "upstream",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
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

impl From<prism_files::FilesError> for GatewayError {
    fn from(err: prism_files::FilesError) -> Self {
        match err {
            prism_files::FilesError::NotFound { file_id } => Self::FileNotFound { file_id },
            prism_files::FilesError::InvalidFileId { file_id } => {
                Self::Validation(format!("invalid file id: {file_id}"))
            }
            prism_files::FilesError::TooLarge { .. } => Self::Validation(err.to_string()),
            other => Self::Internal(anyhow::anyhow!(other)),
        }
    }
}

impl From<prism_kb::KbError> for GatewayError {
    fn from(err: prism_kb::KbError) -> Self {
        match err {
            prism_kb::KbError::NotFound { knowledge_base_id } => Self::Validation(format!(
                "knowledge base not found: {knowledge_base_id}"
            )),
            prism_kb::KbError::AccessDenied(msg) => Self::Authorization(msg),
            prism_kb::KbError::Throttled => Self::RateLimited,
            other => Self::Internal(anyhow::anyhow!(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_errors_are_not_retryable() {
        assert!(!GatewayError::Validation("bad".into()).is_retryable());
        assert!(!GatewayError::Authentication.is_retryable());
        assert!(!GatewayError::Authorization("iam".into()).is_retryable());
        assert!(!GatewayError::UnsupportedModel { model: "x".into() }.is_retryable());
        assert!(!GatewayError::FileNotFound { file_id: "file-1".into() }.is_retryable());
        assert!(!GatewayError::Timeout("provider call".into()).is_retryable());
        assert!(!GatewayError::Cancelled.is_retryable());
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(GatewayError::Transport("reset".into()).is_retryable());
        assert!(GatewayError::RateLimited.is_retryable());
        assert!(GatewayError::ServiceUnavailable("503".into()).is_retryable());
        assert!(GatewayError::Upstream { status: 408, message: "t".into() }.is_retryable());
        assert!(GatewayError::Upstream { status: 500, message: "t".into() }.is_retryable());
        assert!(!GatewayError::Upstream { status: 400, message: "t".into() }.is_retryable());
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            GatewayError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::UnsupportedModel { model: "m".into() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(GatewayError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            GatewayError::Timeout("x".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
