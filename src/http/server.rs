//! HTTP server: the accept/serve loop.
//!
//! # Responsibilities
//! - Accept connections from the bound [`Listener`]
//! - Serve each connection (HTTP/1.1 and HTTP/2) on its own task
//! - Retry transient accept failures with backoff
//! - Return cleanly once the listener is closed
//!
//! Open connections are not drained at shutdown; they end with the process.

use std::net::SocketAddr;

use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::Instrument;

use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::proxy::ModuleProxy;
use crate::resilience::backoff::{is_transient_accept_error, AcceptBackoff};

/// The serve loop stopped for a reason other than a deliberate close.
#[derive(Debug, Error)]
#[error("http serve error: {source}")]
pub struct ServeError {
    #[from]
    source: ListenerError,
}

/// HTTP server for the module proxy.
pub struct HttpServer {
    router: axum::Router,
    connections: ConnectionTracker,
}

impl HttpServer {
    /// Create a server around the module proxy handler.
    pub fn new(proxy: ModuleProxy) -> Self {
        Self {
            router: proxy.into_router(),
            connections: ConnectionTracker::new(),
        }
    }

    /// Run the server until `listener` is closed.
    ///
    /// A deliberate close is a normal stop and returns `Ok(())`. Any other
    /// non-transient accept failure is returned as a [`ServeError`].
    pub async fn run(self, mut listener: Listener) -> Result<(), ServeError> {
        tracing::info!(address = %listener.local_addr(), "HTTP server starting");

        let closer = listener.closer();
        let mut backoff = AcceptBackoff::default();

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    backoff.reset();
                    self.spawn_connection(stream, peer);
                }
                Err(ListenerError::Closed) => break,
                Err(ListenerError::Accept(e)) if is_transient_accept_error(&e) => {
                    metrics::record_accept_error(e.kind());
                    let delay = backoff.next_delay();
                    tracing::warn!(error = %e, retry_in = ?delay, "Accept error; retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = closer.closed() => {}
                    }
                }
                Err(e) => {
                    if let ListenerError::Accept(io) = &e {
                        metrics::record_accept_error(io.kind());
                    }
                    return Err(e.into());
                }
            }
        }

        tracing::info!(
            abandoned_connections = self.connections.active_count(),
            "HTTP server stopped"
        );
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let guard = self.connections.track();
        let span = tracing::debug_span!("connection", id = %guard.id(), peer = %peer);
        let service = TowerToHyperService::new(self.router.clone());

        tokio::spawn(
            async move {
                tracing::debug!("Connection accepted");
                let builder = auto::Builder::new(TokioExecutor::new());
                if let Err(e) = builder.serve_connection(TokioIo::new(stream), service).await {
                    tracing::debug!(error = %e, "Connection ended with error");
                }
                drop(guard);
            }
            .instrument(span),
        );
    }
}
