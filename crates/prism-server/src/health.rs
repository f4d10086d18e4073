use axum::Json;
use axum::response::IntoResponse;

/// Handle `GET /health`
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "prism",
    }))
}
