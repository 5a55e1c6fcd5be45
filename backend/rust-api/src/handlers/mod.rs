use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::metrics;
use crate::services::errors::StoreError;
use crate::services::AppState;

const STORE_PING_TIMEOUT: Duration = Duration::from_secs(1);
const SESSION_PING_TIMEOUT: Duration = Duration::from_millis(500);

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let annotations = check_dependency(
        state.annotations.backend_name(),
        STORE_PING_TIMEOUT,
        state.annotations.ping(),
    )
    .await;
    let sessions = check_dependency(
        state.sessions.backend_name(),
        SESSION_PING_TIMEOUT,
        state.sessions.ping(),
    )
    .await;

    let all_healthy = [&annotations, &sessions]
        .iter()
        .all(|dep| dep.get("status").and_then(|v| v.as_str()) == Some("healthy"));

    let (status_code, status) = if all_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "annotation-api",
            "version": env!("CARGO_PKG_VERSION"),
            "datasets": state.catalog.names(),
            "dependencies": {
                "annotation_store": annotations,
                "session_store": sessions,
            }
        })),
    )
}

async fn check_dependency(
    backend: &str,
    timeout: Duration,
    ping: impl Future<Output = Result<(), StoreError>>,
) -> serde_json::Value {
    match tokio::time::timeout(timeout, ping).await {
        Ok(Ok(())) => json!({ "status": "healthy", "backend": backend }),
        Ok(Err(e)) => {
            tracing::warn!("Health check failed for {}: {}", backend, e);
            json!({ "status": "unhealthy", "backend": backend, "error": e.to_string() })
        }
        Err(_) => json!({
            "status": "unhealthy",
            "backend": backend,
            "error": format!("timeout after {}ms", timeout.as_millis())
        }),
    }
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Guards `/metrics` with HTTP Basic credentials from `METRICS_AUTH` (`user:password`)
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let credentials = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|encoded| general_purpose::STANDARD.decode(encoded.trim()).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());
    if credentials != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

pub mod catalog;
pub mod sessions;
