use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::proxy::ProxyState;

pub async fn index() -> &'static str {
    concat!("module-proxy ", env!("CARGO_PKG_VERSION"), "\n")
}

/// Serve a cached artifact by its cache-relative path.
pub async fn artifact(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    Path(path): Path<String>,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
            "method not allowed\n",
        )
            .into_response();
    }

    let Some(name) = cache_name(&path) else {
        tracing::debug!(path = %path, "Rejected artifact path");
        return (StatusCode::BAD_REQUEST, "invalid module path\n").into_response();
    };

    let Some(cache) = state.cache.as_ref() else {
        return not_found();
    };

    match cache.get(name).await {
        Ok(Some(data)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(name))],
            Body::from(data),
        )
            .into_response(),
        Ok(None) => not_found(),
        Err(e) => {
            tracing::error!(name = %name, error = %e, "Failed to read cached artifact");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error\n").into_response()
        }
    }
}

pub async fn record_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let response = next.run(request).await;
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found\n").into_response()
}

/// Validate a request path as a name inside the cache root.
///
/// Rejects anything that could leave the root or that no module path can
/// contain.
fn cache_name(path: &str) -> Option<&str> {
    if path.is_empty() || path.contains(['\\', '\0']) {
        return None;
    }
    let escapes = path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    (!escapes).then_some(path)
}

fn content_type(name: &str) -> &'static str {
    let file = name.rsplit('/').next().unwrap_or(name);
    if file == "@latest" {
        return "application/json";
    }
    match file.rsplit_once('.').map(|(_, ext)| ext) {
        Some("info") | Some("json") => "application/json",
        Some("zip") => "application/zip",
        _ => "text/plain; charset=utf-8",
    }
}
