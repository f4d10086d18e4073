//! Artifact persistence
//!
//! The S3 store keeps each artifact's metadata on the object itself, so a
//! record can be rebuilt from a `HEAD` without a separate index. The memory
//! store backs tests and credential-free development.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::FilesError;
use crate::types::{ArtifactRecord, ArtifactStatus};

/// Object-store interface for uploaded artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist an artifact's bytes and metadata
    async fn put(&self, record: &ArtifactRecord, bytes: Vec<u8>) -> Result<(), FilesError>;

    /// Fetch metadata for an id
    async fn get_record(&self, file_id: &str) -> Result<ArtifactRecord, FilesError>;

    /// Fetch the stored payload for an id
    async fn get_bytes(&self, file_id: &str) -> Result<Vec<u8>, FilesError>;

    /// List records, optionally filtered by purpose, newest first
    async fn list(&self, purpose: Option<&str>, limit: usize) -> Result<Vec<ArtifactRecord>, FilesError>;

    /// Delete an artifact; missing ids are an error
    async fn delete(&self, file_id: &str) -> Result<(), FilesError>;

    /// Probe the backing storage
    async fn health(&self) -> Result<(), FilesError>;

    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;
}

// -- S3 --

/// S3-backed artifact store
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

/// Object prefix under which all artifacts live
const KEY_PREFIX: &str = "files/";

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Find the object key for an id by listing under the shared prefix
    async fn key_for(&self, file_id: &str) -> Result<String, FilesError> {
        let wanted = format!("{KEY_PREFIX}{file_id}-");
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&wanted)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| FilesError::Storage(format!("list failed: {e}")))?;

        output
            .contents()
            .first()
            .and_then(|obj| obj.key())
            .map(ToOwned::to_owned)
            .ok_or_else(|| FilesError::NotFound {
                file_id: file_id.to_owned(),
            })
    }

    /// Rebuild a record from object metadata
    async fn record_for_key(&self, key: &str) -> Result<ArtifactRecord, FilesError> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| FilesError::Storage(format!("head failed: {e}")))?;

        let meta = head.metadata().cloned().unwrap_or_default();
        let get = |name: &str| meta.get(name).cloned().unwrap_or_default();

        Ok(ArtifactRecord {
            id: get("file-id"),
            filename: get("filename"),
            media_type: head
                .content_type()
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| "application/octet-stream".to_owned()),
            size_bytes: head.content_length().unwrap_or(0).max(0) as u64,
            created: get("created").parse().unwrap_or(0),
            purpose: get("purpose"),
            status: ArtifactStatus::parse(&get("status")),
            key: key.to_owned(),
        })
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    async fn put(&self, record: &ArtifactRecord, bytes: Vec<u8>) -> Result<(), FilesError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&record.key)
            .content_type(&record.media_type)
            .metadata("file-id", &record.id)
            .metadata("filename", &record.filename)
            .metadata("purpose", &record.purpose)
            .metadata("status", record.status.as_str())
            .metadata("created", record.created.to_string())
            .body(aws_sdk_s3::primitives::ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| FilesError::Storage(format!("upload failed: {e}")))?;

        tracing::debug!(file_id = %record.id, key = %record.key, "artifact stored");
        Ok(())
    }

    async fn get_record(&self, file_id: &str) -> Result<ArtifactRecord, FilesError> {
        let key = self.key_for(file_id).await?;
        self.record_for_key(&key).await
    }

    async fn get_bytes(&self, file_id: &str) -> Result<Vec<u8>, FilesError> {
        let key = self.key_for(file_id).await?;
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| FilesError::Storage(format!("download failed: {e}")))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| FilesError::Storage(format!("failed to read body: {e}")))?;

        Ok(bytes.to_vec())
    }

    async fn list(&self, purpose: Option<&str>, limit: usize) -> Result<Vec<ArtifactRecord>, FilesError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(KEY_PREFIX)
            .send()
            .await
            .map_err(|e| FilesError::Storage(format!("list failed: {e}")))?;

        let mut records = Vec::new();
        for object in output.contents() {
            let Some(key) = object.key() else { continue };
            let record = self.record_for_key(key).await?;
            if purpose.is_none_or(|p| record.purpose == p) {
                records.push(record);
            }
        }

        records.sort_by_key(|r| std::cmp::Reverse(r.created));
        records.truncate(limit);
        Ok(records)
    }

    async fn delete(&self, file_id: &str) -> Result<(), FilesError> {
        let key = self.key_for(file_id).await?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| FilesError::Storage(format!("delete failed: {e}")))?;
        Ok(())
    }

    async fn health(&self) -> Result<(), FilesError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| FilesError::Storage(format!("bucket probe failed: {e}")))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}

// -- In-memory --

/// In-memory artifact store for tests and local development
#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<String, (ArtifactRecord, Vec<u8>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put(&self, record: &ArtifactRecord, bytes: Vec<u8>) -> Result<(), FilesError> {
        self.objects.insert(record.id.clone(), (record.clone(), bytes));
        Ok(())
    }

    async fn get_record(&self, file_id: &str) -> Result<ArtifactRecord, FilesError> {
        self.objects
            .get(file_id)
            .map(|entry| entry.0.clone())
            .ok_or_else(|| FilesError::NotFound {
                file_id: file_id.to_owned(),
            })
    }

    async fn get_bytes(&self, file_id: &str) -> Result<Vec<u8>, FilesError> {
        self.objects
            .get(file_id)
            .map(|entry| entry.1.clone())
            .ok_or_else(|| FilesError::NotFound {
                file_id: file_id.to_owned(),
            })
    }

    async fn list(&self, purpose: Option<&str>, limit: usize) -> Result<Vec<ArtifactRecord>, FilesError> {
        let mut records: Vec<ArtifactRecord> = self
            .objects
            .iter()
            .map(|entry| entry.0.clone())
            .filter(|r| purpose.is_none_or(|p| r.purpose == p))
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse(r.created));
        records.truncate(limit);
        Ok(records)
    }

    async fn delete(&self, file_id: &str) -> Result<(), FilesError> {
        self.objects
            .remove(file_id)
            .map(|_| ())
            .ok_or_else(|| FilesError::NotFound {
                file_id: file_id.to_owned(),
            })
    }

    async fn health(&self) -> Result<(), FilesError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
