//! File context assembly for chat requests
//!
//! Fetches referenced artifacts (bounded fan-out), extracts text per media
//! type, and frames the result as the preamble the orchestrator prepends to
//! the first user message.
//!
//! Determinism contract: identical `file_ids` sets produce identical
//! preamble bytes — fetches join in request order and every rendered field
//! comes from the stored record.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;

use crate::error::FilesError;
use crate::extract::{ExtractionLimits, extract_text};
use crate::store::ArtifactStore;
use crate::types::{ArtifactRecord, FILE_ID_PREFIX};

/// Header opening the injected block
const CONTEXT_HEADER: &str = "=== UPLOADED FILES CONTEXT ===";
/// Separator terminating the injected block
const CONTEXT_FOOTER: &str = "========================";
/// Concurrent artifact fetches per request
const FETCH_FAN_OUT: usize = 4;

/// Builds injected context preambles from stored artifacts
pub struct FileContextService {
    store: Arc<dyn ArtifactStore>,
    limits: ExtractionLimits,
    fetch_timeout: Duration,
}

impl FileContextService {
    pub fn new(store: Arc<dyn ArtifactStore>, limits: ExtractionLimits, fetch_timeout: Duration) -> Self {
        Self {
            store,
            limits,
            fetch_timeout,
        }
    }

    /// Access the backing store (shared with the HTTP routes)
    pub fn store(&self) -> Arc<dyn ArtifactStore> {
        Arc::clone(&self.store)
    }

    /// Build the framed context preamble for a set of artifact ids
    ///
    /// # Errors
    ///
    /// Fails fast with `InvalidFileId` for ids missing the `file-` prefix
    /// and `NotFound` for ids with no stored record. Extraction failures for
    /// individual files degrade to in-band placeholders; only when every
    /// file fails to extract does the whole call fail.
    pub async fn build_context(&self, file_ids: &[String]) -> Result<String, FilesError> {
        for id in file_ids {
            if !id.starts_with(FILE_ID_PREFIX) {
                return Err(FilesError::InvalidFileId { file_id: id.clone() });
            }
        }

        // Bounded fan-out; buffered() joins results back in request order
        let fetched: Vec<Result<(ArtifactRecord, Vec<u8>), FilesError>> =
            futures_util::stream::iter(file_ids.iter().cloned())
                .map(|id| {
                    let store = Arc::clone(&self.store);
                    let timeout = self.fetch_timeout;
                    async move {
                        let fetch = async {
                            let record = store.get_record(&id).await?;
                            let bytes = store.get_bytes(&id).await?;
                            Ok::<_, FilesError>((record, bytes))
                        };
                        tokio::time::timeout(timeout, fetch)
                            .await
                            .map_err(|_| FilesError::Storage(format!("fetch of {id} timed out")))?
                    }
                })
                .buffered(FETCH_FAN_OUT)
                .collect()
                .await;

        let mut blocks = Vec::with_capacity(file_ids.len());
        let mut failures = 0usize;

        for result in fetched {
            let (record, bytes) = result?;

            let content = match extract_text(&record.media_type, &bytes, &self.limits) {
                Ok(text) => text,
                Err(reason) => {
                    failures += 1;
                    tracing::warn!(file_id = %record.id, %reason, "file content not extractable");
                    format!("[File content could not be processed: {reason}]")
                }
            };

            blocks.push(render_block(&record, &content));
        }

        if !blocks.is_empty() && failures == blocks.len() {
            return Err(FilesError::InvalidUpload(
                "none of the referenced files could be processed".to_owned(),
            ));
        }

        let mut preamble = String::new();
        preamble.push_str(CONTEXT_HEADER);
        preamble.push('\n');
        for block in blocks {
            preamble.push_str(&block);
            preamble.push('\n');
        }
        preamble.push_str(CONTEXT_FOOTER);

        if preamble.chars().count() > self.limits.max_total_chars {
            let cut: String = preamble.chars().take(self.limits.max_total_chars).collect();
            preamble = format!("{cut}\n... (truncated)\n{CONTEXT_FOOTER}");
        }

        Ok(preamble)
    }
}

/// One file's framed block inside the preamble
fn render_block(record: &ArtifactRecord, content: &str) -> String {
    format!(
        "📄 **File: {}** ({}, {})\nCreated: {}\n\n**Processed Content:**\n{}\n",
        record.filename,
        record.media_type,
        format_size(record.size_bytes),
        record.created_iso8601(),
        content,
    )
}

/// Human-readable size
fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    match bytes {
        b if b >= MIB => format!("{:.1} MB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.1} KB", b as f64 / KIB as f64),
        b => format!("{b} bytes"),
    }
}
