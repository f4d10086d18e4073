//! `/v1/files` HTTP endpoints

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use prism_core::HttpError;
use serde::Deserialize;

use crate::error::FilesError;
use crate::store::ArtifactStore;
use crate::types::{ArtifactRecord, ArtifactStatus, FileDeleted, FileList, FileObject, new_file_id};

/// Shared state for the files routes
#[derive(Clone)]
pub struct FilesState {
    pub store: Arc<dyn ArtifactStore>,
    pub max_upload_bytes: usize,
}

/// Build the files router
pub fn files_router(state: FilesState) -> Router {
    // Leave headroom above the payload cap for multipart framing
    let body_limit = state.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/v1/files", routing::post(upload_file).get(list_files))
        .route("/v1/files/health", routing::get(files_health))
        .route("/v1/files/{id}", routing::get(get_file).delete(delete_file))
        .route("/v1/files/{id}/content", routing::get(get_file_content))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Handle `POST /v1/files` (multipart: `file`, `purpose`)
async fn upload_file(State(state): State<FilesState>, mut multipart: Multipart) -> Response {
    let mut filename = None;
    let mut media_type = None;
    let mut bytes: Option<Vec<u8>> = None;
    let mut purpose = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(&FilesError::InvalidUpload(format!("malformed multipart body: {e}")));
            }
        };

        let field_name = field.name().map(ToOwned::to_owned);
        match field_name.as_deref() {
            Some("file") => {
                filename = field.file_name().map(ToOwned::to_owned);
                media_type = field.content_type().map(ToOwned::to_owned);
                match field.bytes().await {
                    Ok(data) => bytes = Some(data.to_vec()),
                    Err(e) => {
                        return error_response(&FilesError::InvalidUpload(format!("failed to read file field: {e}")));
                    }
                }
            }
            Some("purpose") => match field.text().await {
                Ok(text) => purpose = Some(text),
                Err(e) => {
                    return error_response(&FilesError::InvalidUpload(format!("failed to read purpose field: {e}")));
                }
            },
            _ => {}
        }
    }

    let Some(bytes) = bytes else {
        return error_response(&FilesError::InvalidUpload("missing 'file' field".to_owned()));
    };

    if bytes.len() > state.max_upload_bytes {
        return error_response(&FilesError::TooLarge {
            size_bytes: bytes.len(),
            limit_bytes: state.max_upload_bytes,
        });
    }

    let filename = filename.unwrap_or_else(|| "upload".to_owned());
    let media_type = media_type.unwrap_or_else(|| "application/octet-stream".to_owned());
    let purpose = purpose.unwrap_or_else(|| "assistants".to_owned());

    let id = new_file_id();
    let record = ArtifactRecord {
        key: ArtifactRecord::object_key(&id, &filename),
        id,
        filename,
        media_type: media_type.clone(),
        size_bytes: bytes.len() as u64,
        created: chrono::Utc::now().timestamp(),
        purpose,
        status: if crate::extract::is_extractable(&media_type) {
            ArtifactStatus::Processed
        } else {
            ArtifactStatus::Uploaded
        },
    };

    match state.store.put(&record, bytes).await {
        Ok(()) => {
            tracing::info!(file_id = %record.id, filename = %record.filename, "file uploaded");
            Json(FileObject::from(&record)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Query parameters for `GET /v1/files`
#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    purpose: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Handle `GET /v1/files`
async fn list_files(State(state): State<FilesState>, Query(query): Query<ListQuery>) -> Response {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    match state.store.list(query.purpose.as_deref(), limit).await {
        Ok(records) => Json(FileList {
            object: "list".to_owned(),
            data: records.iter().map(FileObject::from).collect(),
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Handle `GET /v1/files/{id}`
async fn get_file(State(state): State<FilesState>, Path(id): Path<String>) -> Response {
    match state.store.get_record(&id).await {
        Ok(record) => Json(FileObject::from(&record)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Handle `GET /v1/files/{id}/content`
async fn get_file_content(State(state): State<FilesState>, Path(id): Path<String>) -> Response {
    let record = match state.store.get_record(&id).await {
        Ok(record) => record,
        Err(e) => return error_response(&e),
    };

    match state.store.get_bytes(&id).await {
        Ok(bytes) => (
            [(http::header::CONTENT_TYPE, record.media_type)],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Handle `DELETE /v1/files/{id}`
async fn delete_file(State(state): State<FilesState>, Path(id): Path<String>) -> Response {
    match state.store.delete(&id).await {
        Ok(()) => Json(FileDeleted {
            id,
            object: "file".to_owned(),
            deleted: true,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Handle `GET /v1/files/health`
async fn files_health(State(state): State<FilesState>) -> Response {
    match state.store.health().await {
        Ok(()) => Json(serde_json::json!({
            "status": "healthy",
            "storage": state.store.backend(),
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "files storage probe failed");
            (
                http::StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "storage": state.store.backend(),
                })),
            )
                .into_response()
        }
    }
}

/// Render a files error in the shared `{error: {...}}` shape
fn error_response(error: &FilesError) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": error.error_type(),
            "message": error.client_message(),
        }
    });
    (error.status_code(), Json(body)).into_response()
}
