use axum::Json;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use secrecy::{ExposeSecret, SecretString};

/// Require `Authorization: Bearer <server api key>` on all `/v1/*` routes
///
/// Missing or mismatching keys produce 401; non-versioned paths (health)
/// pass through unauthenticated.
pub async fn require_api_key(api_key: SecretString, request: Request, next: Next) -> Response {
    if !request.uri().path().starts_with("/v1/") {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if token == api_key.expose_secret() => next.run(request).await,
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "rejected mismatching API key");
            unauthorized("invalid API key")
        }
        None => unauthorized("missing bearer token"),
    }
}

fn unauthorized(message: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": "authentication",
            "message": message,
        }
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
