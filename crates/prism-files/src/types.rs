use serde::{Deserialize, Serialize};

/// Literal prefix carried by every artifact id
pub const FILE_ID_PREFIX: &str = "file-";

/// Mint a new artifact id: `file-` followed by 32 hex characters
pub fn new_file_id() -> String {
    format!("{FILE_ID_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

/// Reduce a filename to `[A-Za-z0-9._-]` so it can embed in an object key
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() { "upload".to_owned() } else { sanitized }
}

/// Artifact lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    Uploaded,
    Processed,
    Error,
}

impl ArtifactStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processed => "processed",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "processed" => Self::Processed,
            "error" => Self::Error,
            _ => Self::Uploaded,
        }
    }
}

/// Stored metadata for one uploaded artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// `file-`-prefixed identifier
    pub id: String,
    /// Original filename as uploaded
    pub filename: String,
    /// Declared media type
    pub media_type: String,
    /// Payload size
    pub size_bytes: u64,
    /// Unix timestamp of upload
    pub created: i64,
    /// Caller-declared purpose (e.g. "assistants")
    pub purpose: String,
    /// Lifecycle state
    pub status: ArtifactStatus,
    /// Object-store key: `files/<id>-<sanitized_filename>`
    pub key: String,
}

impl ArtifactRecord {
    /// Canonical object key for an id and original filename
    pub fn object_key(id: &str, filename: &str) -> String {
        format!("files/{id}-{}", sanitize_filename(filename))
    }

    /// ISO-8601 rendering of the upload time
    pub fn created_iso8601(&self) -> String {
        chrono::DateTime::from_timestamp(self.created, 0)
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            .unwrap_or_else(|| self.created.to_string())
    }
}

// -- Wire DTOs (OpenAI files API shapes) --

/// `POST /v1/files` and `GET /v1/files/{id}` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub object: String,
    pub bytes: u64,
    pub created_at: i64,
    pub filename: String,
    pub purpose: String,
    pub status: String,
}

impl From<&ArtifactRecord> for FileObject {
    fn from(record: &ArtifactRecord) -> Self {
        Self {
            id: record.id.clone(),
            object: "file".to_owned(),
            bytes: record.size_bytes,
            created_at: record.created,
            filename: record.filename.clone(),
            purpose: record.purpose.clone(),
            status: record.status.as_str().to_owned(),
        }
    }
}

/// `GET /v1/files` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileList {
    pub object: String,
    pub data: Vec<FileObject>,
}

/// `DELETE /v1/files/{id}` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDeleted {
    pub id: String,
    pub object: String,
    pub deleted: bool,
}
