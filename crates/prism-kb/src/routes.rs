//! `/v1/knowledge-bases` HTTP endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use prism_core::HttpError;
use serde::Deserialize;

use crate::error::KbError;
use crate::service::KnowledgeBaseService;

/// Shared state for the knowledge-base routes
#[derive(Clone)]
pub struct KbState {
    pub service: Arc<KnowledgeBaseService>,
    /// ARN template for retrieve-and-generate when the caller names a model
    pub region: String,
}

/// Build the knowledge-base router
pub fn kb_router(state: KbState) -> Router {
    Router::new()
        .route("/v1/knowledge-bases", routing::get(list_knowledge_bases))
        .route(
            "/v1/knowledge-bases/{id}",
            routing::get(get_knowledge_base).delete(delete_knowledge_base),
        )
        .route("/v1/knowledge-bases/{id}/query", routing::post(query_knowledge_base))
        .route(
            "/v1/knowledge-bases/{id}/retrieve-and-generate",
            routing::post(retrieve_and_generate),
        )
        .with_state(state)
}

async fn list_knowledge_bases(State(state): State<KbState>) -> Response {
    match state.service.list_knowledge_bases().await {
        Ok(summaries) => Json(serde_json::json!({
            "object": "list",
            "data": summaries,
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn get_knowledge_base(State(state): State<KbState>, Path(id): Path<String>) -> Response {
    match state.service.get_knowledge_base(&id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn delete_knowledge_base(State(state): State<KbState>, Path(id): Path<String>) -> Response {
    match state.service.delete_knowledge_base(&id).await {
        Ok(()) => Json(serde_json::json!({
            "id": id,
            "deleted": true,
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// `POST /v1/knowledge-bases/{id}/query` body
#[derive(Debug, Deserialize)]
struct QueryBody {
    query: String,
    #[serde(default)]
    top_k: Option<u32>,
}

async fn query_knowledge_base(
    State(state): State<KbState>,
    Path(id): Path<String>,
    Json(body): Json<QueryBody>,
) -> Response {
    let top_k = body.top_k.unwrap_or(5).clamp(1, 25);

    match state.service.retrieve(&id, &body.query, top_k).await {
        Ok(snippets) => Json(serde_json::json!({
            "knowledge_base_id": id,
            "query": body.query,
            "results": snippets,
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// `POST /v1/knowledge-bases/{id}/retrieve-and-generate` body
#[derive(Debug, Deserialize)]
struct RagBody {
    query: String,
    model: String,
}

async fn retrieve_and_generate(
    State(state): State<KbState>,
    Path(id): Path<String>,
    Json(body): Json<RagBody>,
) -> Response {
    let model_arn = model_arn(&state.region, &body.model);

    match state.service.retrieve_and_generate(&id, &body.query, &model_arn).await {
        Ok(answer) => Json(serde_json::json!({
            "knowledge_base_id": id,
            "answer": answer.text,
            "citations": answer.citations,
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Foundation-model ARN for a bare model id
pub fn model_arn(region: &str, model_id: &str) -> String {
    if model_id.starts_with("arn:") {
        return model_id.to_owned();
    }
    format!("arn:aws:bedrock:{region}::foundation-model/{model_id}")
}

/// Render a KB error in the shared `{error: {...}}` shape
fn error_response(error: &KbError) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": error.error_type(),
            "message": error.client_message(),
        }
    });
    (error.status_code(), Json(body)).into_response()
}
