//! Module proxy request handling.
//!
//! # Data Flow
//! ```text
//! GET /{module}/@v/{version}.{info,mod,zip}
//!     → handlers.rs (method check, path validation)
//!     → CacheHandle::get (read-only)
//!     → 200 with artifact | 404 | 400 | 405
//! ```
//!
//! # Design Decisions
//! - The handler only serves what is already in the disk cache; resolving
//!   modules against upstream sources is out of scope
//! - Without a cache every artifact request is a 404

pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::cache::CacheHandle;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};

/// State shared with the handlers.
#[derive(Debug, Default)]
pub struct ProxyState {
    /// Disk cache, when one was configured.
    pub cache: Option<CacheHandle>,
}

/// The module proxy handler.
#[derive(Debug, Default)]
pub struct ModuleProxy {
    cache: Option<CacheHandle>,
}

impl ModuleProxy {
    /// A proxy with no persistent cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve artifacts from `cache`.
    pub fn with_cache(mut self, cache: CacheHandle) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The configured cache, if any.
    pub fn cache(&self) -> Option<&CacheHandle> {
        self.cache.as_ref()
    }

    /// Build the Axum router with all middleware layers.
    pub fn into_router(self) -> Router {
        let state = Arc::new(ProxyState { cache: self.cache });

        Router::new()
            .route("/", get(handlers::index))
            .route("/{*path}", any(handlers::artifact))
            .with_state(state)
            .layer(middleware::from_fn(handlers::record_metrics))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &axum::http::Request<axum::body::Body>| {
                            tracing::info_span!(
                                "request",
                                request_id = %request_id(request),
                                method = %request.method(),
                                uri = %request.uri(),
                            )
                        },
                    ))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }
}
