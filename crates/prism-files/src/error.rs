use http::StatusCode;
use prism_core::HttpError;
use thiserror::Error;

/// Errors from the files subsystem
#[derive(Debug, Error)]
pub enum FilesError {
    /// No artifact exists for the id
    #[error("file not found: {file_id}")]
    NotFound { file_id: String },

    /// Id does not carry the `file-` prefix
    #[error("invalid file id: {file_id}")]
    InvalidFileId { file_id: String },

    /// Upload exceeds the configured size cap
    #[error("file of {size_bytes} bytes exceeds the {limit_bytes} byte limit")]
    TooLarge { size_bytes: usize, limit_bytes: usize },

    /// Malformed upload request (missing field, empty body)
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// Object-store failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Unexpected internal condition
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for FilesError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidFileId { .. } | Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::NotFound { .. } => "file_not_found",
            Self::InvalidFileId { .. } | Self::InvalidUpload(_) | Self::TooLarge { .. } => "validation",
            Self::Storage(_) => "service_unavailable",
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
